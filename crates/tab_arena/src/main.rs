//! Tab arena headless runner
//!
//! Usage: `tab_arena [config.toml|config.ron]`

use pool_engine::core::config::Config;
use pool_engine::foundation::logging;
use tab_arena::{Arena, ArenaConfig, ArenaSummary};

fn log_summary(summary: &ArenaSummary) {
    log::info!(
        "Simulated {} frames ({:.1}s)",
        summary.frames,
        summary.elapsed
    );
    log::info!(
        "Bullets fired {}, hits {}, kills {}, self-destructs {}, explosions {}, drags {}",
        summary.bullets_fired,
        summary.bullet_hits,
        summary.kills,
        summary.self_destructs,
        summary.explosions,
        summary.drags
    );
    log::info!(
        "Tab spawner: {} attempts, {} spawned, {} gated, {} lost to chance; peak {} tabs",
        summary.spawner.attempts,
        summary.spawner.spawned,
        summary.spawner.skipped_gated,
        summary.spawner.skipped_chance,
        summary.peak_tabs
    );
    for (name, stats) in &summary.pools {
        log::info!(
            "Pool '{}': constructed {} (grown {}), acquired {}, released {}, peak active {}, warnings {}",
            name,
            stats.constructed(),
            stats.grown,
            stats.acquired,
            stats.released,
            stats.peak_active,
            stats.warnings()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => ArenaConfig::load_from_file(&path)?,
        None => ArenaConfig::default(),
    };

    env_logger::Builder::from_default_env()
        .filter_level(logging::parse_level(&config.engine.log_level))
        .parse_default_env()
        .init();
    log::info!("Starting Tab Arena");

    let mut arena = Arena::new(config)?;
    match arena.run() {
        Ok(summary) => {
            log_summary(&summary);
            let destroyed = arena.shutdown();
            log::info!("Tab Arena finished, {} instances destroyed", destroyed);
            Ok(())
        }
        Err(e) => {
            log::error!("Tab Arena failed: {:?}", e);
            Err(e.into())
        }
    }
}
