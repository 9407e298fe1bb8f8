//! Multi-kind object pool
//!
//! Owns every instance it constructs. Inactive instances wait in one FIFO
//! queue per kind (oldest returned is reused first); active instances are
//! reached through handles. When a kind queue runs dry the pool grows
//! instead of failing, trading memory bounds for availability.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut pool = Pool::with_seed("tabs", factory, 7);
//! pool.prewarm(&[PoolEntry::new("basic", 8).with_weight(3), PoolEntry::new("explosive", 2)])?;
//!
//! let handle = pool.acquire_weighted()?;
//! // ... the instance lives in the world ...
//! pool.release(handle);
//! ```

use super::entry::{validate_entries, KindId, PoolEntry};
use super::error::{ConfigurationError, PoolResult};
use super::instance::{
    InstanceFactory, InstanceHandle, InstanceId, InstanceState, Poolable, PoolId, PooledInstance,
    ReleaseOutcome,
};
use super::stats::PoolStats;
use super::weighted::WeightedSelector;
use crate::core::config::PoolConfig;
use crate::foundation::collections::{InstanceKey, InstanceMap};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, VecDeque};

/// Pool of reusable instances of one or more kinds
pub struct Pool<T, F> {
    id: PoolId,
    name: String,
    factory: F,
    /// Provenance: every instance this pool built, keyed by identity
    instances: InstanceMap<PooledInstance<T>>,
    available_by_kind: HashMap<KindId, VecDeque<InstanceKey>>,
    constructed_by_kind: HashMap<KindId, usize>,
    selector: WeightedSelector,
    active_count: usize,
    rng: StdRng,
    stats: PoolStats,
}

impl<T, F> Pool<T, F>
where
    T: Poolable,
    F: InstanceFactory<T>,
{
    /// Create an empty pool seeded from OS entropy
    pub fn new(name: impl Into<String>, factory: F) -> Self {
        Self::with_rng(name, factory, StdRng::from_entropy())
    }

    /// Create an empty pool with a reproducible draw sequence
    pub fn with_seed(name: impl Into<String>, factory: F, seed: u64) -> Self {
        Self::with_rng(name, factory, StdRng::seed_from_u64(seed))
    }

    /// Create an empty pool drawing from the given generator
    pub fn with_rng(name: impl Into<String>, factory: F, rng: StdRng) -> Self {
        Self {
            id: PoolId::next(),
            name: name.into(),
            factory,
            instances: InstanceMap::with_key(),
            available_by_kind: HashMap::new(),
            constructed_by_kind: HashMap::new(),
            selector: WeightedSelector::new(),
            active_count: 0,
            rng,
            stats: PoolStats::default(),
        }
    }

    /// Build and prewarm a pool from configuration
    pub fn from_config(config: &PoolConfig, factory: F) -> PoolResult<Self> {
        config.validate()?;
        let mut pool = match config.seed {
            Some(seed) => Self::with_seed(config.name.clone(), factory, seed),
            None => Self::new(config.name.clone(), factory),
        };
        pool.prewarm(&config.entries)?;
        Ok(pool)
    }

    /// Identity stamped into every handle this pool issues
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Name used in log output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register kinds and pre-construct their initial instances.
    ///
    /// Every entry is validated and every instance built before any kind is
    /// registered, so a rejected or failed call leaves the pool untouched.
    pub fn prewarm(&mut self, entries: &[PoolEntry]) -> PoolResult<()> {
        validate_entries(entries)?;
        if let Some(entry) = entries
            .iter()
            .find(|entry| self.available_by_kind.contains_key(&entry.kind_id))
        {
            return Err(ConfigurationError::DuplicateKind(entry.kind_id.clone()).into());
        }

        // Build everything before registering so a failed construction
        // leaves the pool as it was.
        let mut built = Vec::with_capacity(entries.len());
        for entry in entries {
            let count = usize::try_from(entry.initial_count).unwrap_or_default();
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(self.build(&entry.kind_id)?);
            }
            built.push(items);
        }

        for (entry, items) in entries.iter().zip(built) {
            self.available_by_kind
                .insert(entry.kind_id.clone(), VecDeque::new());
            self.constructed_by_kind.insert(entry.kind_id.clone(), 0);
            self.selector.push(entry.kind_id.clone(), entry.weight);

            let count = items.len();
            for item in items {
                let key = self.store(&entry.kind_id, item);
                self.enqueue(&entry.kind_id, key);
                self.stats.prewarmed += 1;
            }
            log::debug!(
                "Pool '{}' prewarmed {} x '{}' (weight {})",
                self.name,
                count,
                entry.kind_id,
                entry.weight
            );
        }

        log::info!(
            "Pool '{}' ready: {} kinds, {} instances",
            self.name,
            self.selector.len(),
            self.instances.len()
        );
        Ok(())
    }

    /// Hand out an instance of `kind`, growing the pool if its queue is empty
    pub fn acquire(&mut self, kind: &KindId) -> PoolResult<InstanceHandle> {
        let reused = self
            .available_by_kind
            .get_mut(kind)
            .ok_or_else(|| ConfigurationError::UnknownKind(kind.clone()))?
            .pop_front();

        let key = match reused {
            Some(key) => key,
            None => {
                let key = self.construct(kind)?;
                self.stats.grown += 1;
                log::debug!(
                    "Pool '{}' grew kind '{}' to {} instances",
                    self.name,
                    kind,
                    self.constructed_of(kind)
                );
                key
            }
        };

        Ok(self.activate(key))
    }

    /// Hand out an instance of a kind chosen by weight
    pub fn acquire_weighted(&mut self) -> PoolResult<InstanceHandle> {
        let kind = self.draw_kind()?;
        self.acquire(&kind)
    }

    /// Draw a kind by weight without acquiring anything
    pub fn draw_kind(&mut self) -> PoolResult<KindId> {
        Ok(self.selector.sample(&mut self.rng)?.clone())
    }

    /// Return an instance to the queue of the kind that built it.
    ///
    /// Never fails: unknown handles are logged and dropped from circulation,
    /// repeated releases of one activation are logged and ignored.
    pub fn release(&mut self, handle: InstanceHandle) -> ReleaseOutcome {
        let slot = if handle.pool() == self.id {
            self.instances.get_mut(handle.id().key())
        } else {
            None
        };

        let Some(slot) = slot else {
            self.stats.orphan_releases += 1;
            log::warn!(
                "Pool '{}': released instance does not belong to this pool ({:?})",
                self.name,
                handle
            );
            return ReleaseOutcome::Orphaned;
        };

        if slot.state != InstanceState::Active || slot.activation != handle.activation() {
            self.stats.redundant_releases += 1;
            log::warn!(
                "Pool '{}': instance of '{}' released twice ({:?})",
                self.name,
                slot.owning_kind,
                handle
            );
            return ReleaseOutcome::AlreadyInactive;
        }

        slot.state = InstanceState::Available;
        slot.item.set_active(false);
        let kind = slot.owning_kind.clone();
        self.enqueue(&kind, handle.id().key());
        self.active_count -= 1;
        self.stats.released += 1;
        log::trace!("Pool '{}' reclaimed {:?}", self.name, handle);
        ReleaseOutcome::Reclaimed
    }

    /// Deactivate and destroy every instance. Returns how many were destroyed.
    ///
    /// Kinds stay registered; a later `acquire` grows from zero.
    pub fn teardown(&mut self) -> usize {
        let destroyed = self.instances.len();
        for (_, slot) in self.instances.iter_mut() {
            if slot.is_active() {
                slot.item.set_active(false);
            }
        }
        self.instances.clear();
        for queue in self.available_by_kind.values_mut() {
            queue.clear();
        }
        for count in self.constructed_by_kind.values_mut() {
            *count = 0;
        }
        self.active_count = 0;
        log::info!("Pool '{}' torn down, {} instances destroyed", self.name, destroyed);
        destroyed
    }

    /// Change the draw weight of a registered kind
    pub fn set_weight(&mut self, kind: &KindId, weight: u32) -> PoolResult<()> {
        if self.selector.set_weight(kind, weight) {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownKind(kind.clone()).into())
        }
    }

    fn construct(&mut self, kind: &KindId) -> PoolResult<InstanceKey> {
        let item = self.build(kind)?;
        Ok(self.store(kind, item))
    }

    fn build(&mut self, kind: &KindId) -> PoolResult<T> {
        let mut item = self.factory.construct(kind)?;
        item.set_active(false);
        Ok(item)
    }

    fn store(&mut self, kind: &KindId, item: T) -> InstanceKey {
        let key = self
            .instances
            .insert(PooledInstance::new(kind.clone(), item));
        *self.constructed_by_kind.entry(kind.clone()).or_default() += 1;
        key
    }

    fn enqueue(&mut self, kind: &KindId, key: InstanceKey) {
        self.available_by_kind
            .entry(kind.clone())
            .or_default()
            .push_back(key);
    }

    fn activate(&mut self, key: InstanceKey) -> InstanceHandle {
        let mut activation = 0;
        if let Some(slot) = self.instances.get_mut(key) {
            slot.activation = slot.activation.wrapping_add(1);
            slot.state = InstanceState::Active;
            slot.item.set_active(true);
            activation = slot.activation;
        }
        self.active_count += 1;
        self.stats.acquired += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.active_count);

        let handle = InstanceHandle::new(InstanceId::new(self.id, key), activation);
        log::trace!("Pool '{}' activated {:?}", self.name, handle);
        handle
    }
}

impl<T, F> Pool<T, F> {
    fn slot(&self, handle: InstanceHandle) -> Option<&PooledInstance<T>> {
        if handle.pool() != self.id {
            return None;
        }
        self.instances
            .get(handle.id().key())
            .filter(|slot| slot.is_active() && slot.activation == handle.activation())
    }

    /// Whether the handle refers to the current activation of an instance
    pub fn is_active(&self, handle: InstanceHandle) -> bool {
        self.slot(handle).is_some()
    }

    /// Borrow an active instance
    pub fn get(&self, handle: InstanceHandle) -> Option<&T> {
        self.slot(handle).map(|slot| &slot.item)
    }

    /// Mutably borrow an active instance
    pub fn get_mut(&mut self, handle: InstanceHandle) -> Option<&mut T> {
        if handle.pool() != self.id {
            return None;
        }
        self.instances
            .get_mut(handle.id().key())
            .filter(|slot| slot.is_active() && slot.activation == handle.activation())
            .map(|slot| &mut slot.item)
    }

    /// Kind an instance was built from, whatever its state
    pub fn kind_of(&self, handle: InstanceHandle) -> Option<&KindId> {
        if handle.pool() != self.id {
            return None;
        }
        self.instances
            .get(handle.id().key())
            .map(PooledInstance::owning_kind_id)
    }

    /// Iterate over active instances
    pub fn iter_active(&self) -> impl Iterator<Item = (InstanceHandle, &T)> + '_ {
        let id = self.id;
        self.instances
            .iter()
            .filter(|(_, slot)| slot.is_active())
            .map(move |(key, slot)| {
                (
                    InstanceHandle::new(InstanceId::new(id, key), slot.activation),
                    &slot.item,
                )
            })
    }

    /// Iterate mutably over active instances
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (InstanceHandle, &mut T)> + '_ {
        let id = self.id;
        self.instances
            .iter_mut()
            .filter(|(_, slot)| slot.is_active())
            .map(move |(key, slot)| {
                (
                    InstanceHandle::new(InstanceId::new(id, key), slot.activation),
                    &mut slot.item,
                )
            })
    }

    /// Handles of all active instances
    pub fn active_handles(&self) -> Vec<InstanceHandle> {
        self.iter_active().map(|(handle, _)| handle).collect()
    }

    /// Active instances of one kind
    pub fn active_count_of(&self, kind: &KindId) -> usize {
        self.instances
            .values()
            .filter(|slot| slot.is_active() && &slot.owning_kind == kind)
            .count()
    }

    /// Number of instances in use by the world
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Inactive instances queued for one kind
    pub fn available_count(&self, kind: &KindId) -> usize {
        self.available_by_kind.get(kind).map_or(0, VecDeque::len)
    }

    /// Inactive instances across all kinds
    pub fn total_available(&self) -> usize {
        self.available_by_kind.values().map(VecDeque::len).sum()
    }

    /// Instances constructed for one kind
    pub fn constructed_of(&self, kind: &KindId) -> usize {
        self.constructed_by_kind.get(kind).copied().unwrap_or_default()
    }

    /// Instances currently owned by the pool
    pub fn total_constructed(&self) -> usize {
        self.instances.len()
    }

    /// Registered kinds in weighted walk order
    pub fn kinds(&self) -> impl Iterator<Item = &KindId> {
        self.selector.kinds()
    }

    /// Whether `kind` was registered by prewarm
    pub fn has_kind(&self, kind: &KindId) -> bool {
        self.available_by_kind.contains_key(kind)
    }

    /// Current draw weights
    pub fn selector(&self) -> &WeightedSelector {
        &self.selector
    }

    /// Usage statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::error::{ConstructionError, PoolError};

    #[derive(Debug)]
    struct Orb {
        serial: usize,
        active: bool,
        toggles: usize,
    }

    impl Poolable for Orb {
        fn set_active(&mut self, active: bool) {
            self.active = active;
            self.toggles += 1;
        }
    }

    type OrbFactory = Box<dyn FnMut(&KindId) -> Result<Orb, ConstructionError>>;

    fn orb_factory() -> OrbFactory {
        let mut serial = 0;
        Box::new(move |_kind: &KindId| {
            serial += 1;
            Ok(Orb {
                serial,
                active: true,
                toggles: 0,
            })
        })
    }

    fn orb_pool(entries: &[PoolEntry]) -> Pool<Orb, OrbFactory> {
        let mut pool = Pool::with_seed("orbs", orb_factory(), 9);
        pool.prewarm(entries).expect("prewarm");
        pool
    }

    fn kind(id: &str) -> KindId {
        KindId::new(id)
    }

    #[test]
    fn test_prewarm_builds_inactive_instances() {
        let pool = orb_pool(&[PoolEntry::new("red", 3), PoolEntry::new("blue", 2)]);
        assert_eq!(pool.total_constructed(), 5);
        assert_eq!(pool.available_count(&kind("red")), 3);
        assert_eq!(pool.available_count(&kind("blue")), 2);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.stats().prewarmed, 5);
        assert!(pool.instances.values().all(|slot| !slot.item.active));
    }

    #[test]
    fn test_prewarm_rejects_before_building() {
        let mut pool = Pool::with_seed("orbs", orb_factory(), 1);
        let result = pool.prewarm(&[PoolEntry::new("red", 3), PoolEntry::new("blue", -2)]);
        assert!(matches!(
            result,
            Err(PoolError::Configuration(ConfigurationError::NegativeInitialCount { .. }))
        ));
        assert_eq!(pool.total_constructed(), 0);
        assert!(!pool.has_kind(&kind("red")));
    }

    #[test]
    fn test_prewarm_rejects_kind_already_registered() {
        let mut pool = orb_pool(&[PoolEntry::new("red", 1)]);
        let result = pool.prewarm(&[PoolEntry::new("red", 1)]);
        assert_eq!(
            result,
            Err(PoolError::Configuration(ConfigurationError::DuplicateKind(kind("red"))))
        );
    }

    #[test]
    fn test_acquire_activates_and_release_deactivates() {
        let mut pool = orb_pool(&[PoolEntry::new("red", 1)]);
        let handle = pool.acquire(&kind("red")).unwrap();
        assert!(pool.get(handle).unwrap().active);
        assert!(pool.is_active(handle));
        assert_eq!(pool.kind_of(handle), Some(&kind("red")));

        assert_eq!(pool.release(handle), ReleaseOutcome::Reclaimed);
        assert!(!pool.is_active(handle));
        assert!(pool.get(handle).is_none());
        assert_eq!(pool.available_count(&kind("red")), 1);
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let mut pool = orb_pool(&[PoolEntry::new("red", 1)]);
        assert_eq!(
            pool.acquire(&kind("green")),
            Err(PoolError::Configuration(ConfigurationError::UnknownKind(kind("green"))))
        );
    }

    #[test]
    fn test_stale_handle_does_not_release_new_activation() {
        let mut pool = orb_pool(&[PoolEntry::new("red", 1)]);
        let first = pool.acquire(&kind("red")).unwrap();
        pool.release(first);
        let second = pool.acquire(&kind("red")).unwrap();
        assert!(first.same_instance(&second));
        assert_ne!(first, second);

        assert_eq!(pool.release(first), ReleaseOutcome::AlreadyInactive);
        assert!(pool.is_active(second));
        assert_eq!(pool.stats().redundant_releases, 1);
    }

    #[test]
    fn test_foreign_handle_is_orphaned() {
        let mut reds = orb_pool(&[PoolEntry::new("red", 1)]);
        let mut blues = orb_pool(&[PoolEntry::new("red", 1)]);
        let foreign = blues.acquire(&kind("red")).unwrap();

        assert_eq!(reds.release(foreign), ReleaseOutcome::Orphaned);
        assert_eq!(reds.stats().orphan_releases, 1);
        assert_eq!(reds.total_available(), 1);
        assert!(blues.is_active(foreign));
    }

    #[test]
    fn test_construction_failure_surfaces() {
        let factory = |kind: &KindId| -> Result<Orb, ConstructionError> {
            Err(ConstructionError::new(kind.clone(), "no prefab"))
        };
        let mut pool: Pool<Orb, _> = Pool::with_seed("broken", factory, 3);
        pool.prewarm(&[PoolEntry::new("red", 0)]).unwrap();
        let result = pool.acquire(&kind("red"));
        assert!(matches!(result, Err(PoolError::Construction(_))));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.total_constructed(), 0);
    }

    #[test]
    fn test_failed_prewarm_registers_nothing() {
        let budget = std::rc::Rc::new(std::cell::Cell::new(2usize));
        let remaining = budget.clone();
        let factory = move |kind: &KindId| -> Result<Orb, ConstructionError> {
            if remaining.get() == 0 {
                return Err(ConstructionError::new(kind.clone(), "out of prefabs"));
            }
            remaining.set(remaining.get() - 1);
            Ok(Orb {
                serial: 0,
                active: true,
                toggles: 0,
            })
        };
        let mut pool: Pool<Orb, _> = Pool::with_seed("budgeted", factory, 3);
        let entries = [PoolEntry::new("red", 3)];

        let result = pool.prewarm(&entries);
        assert!(matches!(result, Err(PoolError::Construction(_))));
        assert!(!pool.has_kind(&kind("red")));
        assert_eq!(pool.total_constructed(), 0);
        assert_eq!(pool.stats().constructed(), 0);
        assert_eq!(pool.selector().len(), 0);

        budget.set(3);
        pool.prewarm(&entries).unwrap();
        assert_eq!(pool.available_count(&kind("red")), 3);
        assert_eq!(pool.constructed_of(&kind("red")), 3);
    }

    #[test]
    fn test_iter_active_and_counts() {
        let mut pool = orb_pool(&[PoolEntry::new("red", 2), PoolEntry::new("blue", 1)]);
        let a = pool.acquire(&kind("red")).unwrap();
        let _b = pool.acquire(&kind("blue")).unwrap();
        assert_eq!(pool.iter_active().count(), 2);
        assert_eq!(pool.active_count_of(&kind("red")), 1);

        for (_, orb) in pool.iter_active_mut() {
            orb.serial += 100;
        }
        assert!(pool.get(a).unwrap().serial > 100);
        assert_eq!(pool.active_handles().len(), 2);
    }

    #[test]
    fn test_teardown_destroys_everything() {
        let mut pool = orb_pool(&[PoolEntry::new("red", 2)]);
        let handle = pool.acquire(&kind("red")).unwrap();
        assert_eq!(pool.teardown(), 2);
        assert_eq!(pool.total_constructed(), 0);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.release(handle), ReleaseOutcome::Orphaned);

        let regrown = pool.acquire(&kind("red")).unwrap();
        assert!(pool.is_active(regrown));
        assert_eq!(pool.constructed_of(&kind("red")), 1);
    }

    #[test]
    fn test_set_weight_on_unknown_kind_fails() {
        let mut pool = orb_pool(&[PoolEntry::new("red", 0)]);
        assert!(pool.set_weight(&kind("red"), 4).is_ok());
        assert_eq!(pool.selector().total_weight(), 4);
        assert!(pool.set_weight(&kind("blue"), 1).is_err());
    }

    #[test]
    fn test_from_config_prewarms() {
        let config = PoolConfig::new("orbs")
            .with_seed(5)
            .with_entry(PoolEntry::new("red", 2));
        let pool: Pool<Orb, OrbFactory> = Pool::from_config(&config, orb_factory()).unwrap();
        assert_eq!(pool.name(), "orbs");
        assert_eq!(pool.total_constructed(), 2);
    }
}
