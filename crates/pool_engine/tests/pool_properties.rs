//! Behavioural properties of pools, weighted selection and spawn gating

use approx::assert_abs_diff_eq;
use pool_engine::foundation::logging;
use pool_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
struct Token {
    serial: u32,
    active: bool,
}

impl Poolable for Token {
    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

#[derive(Default)]
struct TokenFactory {
    next: u32,
}

impl InstanceFactory<Token> for TokenFactory {
    fn construct(&mut self, _kind: &KindId) -> Result<Token, ConstructionError> {
        self.next += 1;
        Ok(Token {
            serial: self.next,
            active: false,
        })
    }
}

fn pool(entries: &[PoolEntry]) -> Pool<Token, TokenFactory> {
    let mut pool = Pool::with_seed("tokens", TokenFactory::default(), 1234);
    pool.prewarm(entries).expect("prewarm");
    pool
}

fn assert_conserved(pool: &Pool<Token, TokenFactory>) {
    assert_eq!(
        pool.active_count() + pool.total_available(),
        pool.total_constructed()
    );
}

#[test]
fn conservation_holds_under_churn() {
    let mut pool = pool(&[
        PoolEntry::new("a", 3).with_weight(2),
        PoolEntry::new("b", 0).with_weight(1),
        PoolEntry::new("c", 5).with_weight(4),
    ]);
    let mut rng = StdRng::seed_from_u64(99);
    let mut live = Vec::new();

    for _ in 0..5_000 {
        if live.is_empty() || rng.gen_bool(0.55) {
            live.push(pool.acquire_weighted().unwrap());
        } else {
            let index = rng.gen_range(0..live.len());
            let handle = live.swap_remove(index);
            assert_eq!(pool.release(handle), ReleaseOutcome::Reclaimed);
        }
        assert_conserved(&pool);
        assert_eq!(pool.active_count(), live.len());
    }

    for handle in live {
        pool.release(handle);
    }
    assert_eq!(pool.active_count(), 0);
    assert_conserved(&pool);
}

#[test]
fn released_instances_are_reused_in_fifo_order() {
    let mut pool = pool(&[PoolEntry::new("a", 2)]);
    let kind = KindId::from("a");
    let first = pool.acquire(&kind).unwrap();
    let second = pool.acquire(&kind).unwrap();

    pool.release(first);
    pool.release(second);

    let again_first = pool.acquire(&kind).unwrap();
    let again_second = pool.acquire(&kind).unwrap();
    assert!(again_first.same_instance(&first));
    assert!(again_second.same_instance(&second));
    assert_eq!(pool.total_constructed(), 2);
}

#[test]
fn weighted_draws_converge_to_weight_share() {
    let mut pool = pool(&[
        PoolEntry::new("light", 1).with_weight(1),
        PoolEntry::new("heavy", 1).with_weight(3),
    ]);
    let heavy = KindId::from("heavy");
    let draws = 100_000;
    let mut heavy_count = 0u32;

    for _ in 0..draws {
        let handle = pool.acquire_weighted().unwrap();
        if pool.kind_of(handle) == Some(&heavy) {
            heavy_count += 1;
        }
        pool.release(handle);
    }

    let share = f64::from(heavy_count) / f64::from(draws);
    assert_abs_diff_eq!(share, 0.75, epsilon = 0.01);
    // Release after every draw keeps the pool at its prewarmed size
    assert_eq!(pool.total_constructed(), 2);
}

#[test]
fn zero_total_weight_is_a_configuration_error() {
    let mut pool = pool(&[PoolEntry::new("a", 1).with_weight(0)]);
    assert_eq!(
        pool.acquire_weighted(),
        Err(PoolError::Configuration(ConfigurationError::ZeroTotalWeight))
    );
    // Direct requests still work
    assert!(pool.acquire(&KindId::from("a")).is_ok());
}

#[test]
fn double_release_enqueues_once() {
    logging::init_with_level("warn");
    let mut pool = pool(&[PoolEntry::new("a", 1)]);
    let kind = KindId::from("a");
    let handle = pool.acquire(&kind).unwrap();

    assert_eq!(pool.release(handle), ReleaseOutcome::Reclaimed);
    assert_eq!(pool.release(handle), ReleaseOutcome::AlreadyInactive);
    assert_eq!(pool.available_count(&kind), 1);
    assert_eq!(pool.stats().redundant_releases, 1);
    assert_conserved(&pool);
}

#[test]
fn foreign_handles_are_orphaned() {
    let mut home = pool(&[PoolEntry::new("a", 1)]);
    let mut other = pool(&[PoolEntry::new("a", 1)]);
    let foreign = other.acquire(&KindId::from("a")).unwrap();

    assert_eq!(home.release(foreign), ReleaseOutcome::Orphaned);
    assert_eq!(home.available_count(&KindId::from("a")), 1);
    assert_eq!(home.stats().orphan_releases, 1);
    assert!(other.is_active(foreign));
}

#[test]
fn starved_pool_grows_instead_of_failing() {
    let mut pool = pool(&[PoolEntry::new("a", 2)]);
    let kind = KindId::from("a");
    assert_eq!(pool.total_constructed(), 2);

    let handles: Vec<_> = (0..3).map(|_| pool.acquire(&kind).unwrap()).collect();
    let serials: Vec<u32> = handles
        .iter()
        .map(|handle| pool.get(*handle).unwrap().serial)
        .collect();

    assert_eq!(serials, vec![1, 2, 3]);
    assert_eq!(pool.total_constructed(), 3);
    assert_eq!(pool.stats().grown, 1);
    assert!(handles.iter().all(|handle| pool.get(*handle).unwrap().active));
}

#[test]
fn governor_gates_exactly_the_attempts_made_while_closed() {
    let mut governor = SpawnGovernor::new(GovernorConfig::new(10, 1.0)).unwrap();
    assert!(!governor.tick(11, 10));
    assert!(governor.tick(9, 10));

    let mut pool = pool(&[PoolEntry::new("a", 4)]);
    let config = SpawnerConfig::fixed("gated", "a", 0.5, Vec2::zeros()).with_seed(3);
    let mut spawner = Spawner::new(config).unwrap();
    spawner.attach(&mut governor);

    // Open: two attempts, two spawns
    assert_eq!(spawner.update(1.0, &mut pool).unwrap().len(), 2);

    // Closed: three attempts, all skipped, pool untouched
    governor.tick(11, 10);
    assert!(spawner.update(1.5, &mut pool).unwrap().is_empty());
    assert_eq!(pool.active_count(), 2);

    // Open again
    governor.tick(2, 10);
    assert_eq!(spawner.update(0.5, &mut pool).unwrap().len(), 1);

    let stats = spawner.stats();
    assert_eq!(stats.attempts, 6);
    assert_eq!(stats.skipped_gated, 3);
    assert_eq!(stats.spawned, 3);
}

#[test]
fn pool_from_toml_config() {
    let config = PoolConfig::from_str_as(
        r#"
        name = "tabs"
        seed = 7

        [[entries]]
        kind_id = "basic"
        initial_count = 4
        weight = 3

        [[entries]]
        kind_id = "explosive"
        initial_count = 1
        "#,
        pool_engine::core::config::ConfigFormat::Toml,
    )
    .unwrap();

    let pool: Pool<Token, TokenFactory> = Pool::from_config(&config, TokenFactory::default()).unwrap();
    assert_eq!(pool.total_constructed(), 5);
    assert_eq!(pool.selector().total_weight(), 4);
}
