//! Pooled instances, their identities, and the collaborator traits
//!
//! A pool never hands out the instance itself. Callers get an
//! [`InstanceHandle`]: the instance identity plus the activation it refers
//! to. Once the instance is reclaimed and handed out again, old handles stop
//! resolving, the same way generation counters guard the slots of a render
//! object pool.

use super::entry::KindId;
use super::error::ConstructionError;
use crate::foundation::collections::InstanceKey;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identity of one pool, carried by every handle it issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u32);

impl PoolId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id, for logging
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Stable identity of a constructed instance (the provenance key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    pool: PoolId,
    key: InstanceKey,
}

impl InstanceId {
    pub(crate) fn new(pool: PoolId, key: InstanceKey) -> Self {
        Self { pool, key }
    }

    /// Pool that constructed the instance
    pub fn pool(&self) -> PoolId {
        self.pool
    }

    pub(crate) fn key(&self) -> InstanceKey {
        self.key
    }
}

/// One activation of a pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    id: InstanceId,
    activation: u32,
}

impl InstanceHandle {
    pub(crate) fn new(id: InstanceId, activation: u32) -> Self {
        Self { id, activation }
    }

    /// The instance this handle refers to, independent of activation
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Pool that issued the handle
    pub fn pool(&self) -> PoolId {
        self.id.pool
    }

    /// Activation counter at the time the handle was issued
    pub fn activation(&self) -> u32 {
        self.activation
    }

    /// Whether two handles point at the same instance, possibly in different activations
    pub fn same_instance(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Where an instance currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// In use by the world
    Active,
    /// Reclaimed and queued for reuse
    Available,
}

/// A constructed item together with its provenance
#[derive(Debug)]
pub struct PooledInstance<T> {
    pub(crate) owning_kind: KindId,
    pub(crate) state: InstanceState,
    pub(crate) activation: u32,
    pub(crate) item: T,
}

impl<T> PooledInstance<T> {
    pub(crate) fn new(owning_kind: KindId, item: T) -> Self {
        Self {
            owning_kind,
            state: InstanceState::Available,
            activation: 0,
            item,
        }
    }

    /// Kind this instance was constructed from
    pub fn owning_kind_id(&self) -> &KindId {
        &self.owning_kind
    }

    /// Whether the instance is in use by the world
    pub fn is_active(&self) -> bool {
        self.state == InstanceState::Active
    }

    /// Current state
    pub fn state(&self) -> InstanceState {
        self.state
    }
}

/// Activation collaborator: toggles world visibility and processing.
///
/// Must be idempotent; the pool may deactivate an already inactive item
/// during teardown.
pub trait Poolable {
    /// Enable or disable the item in the world
    fn set_active(&mut self, active: bool);
}

/// Construction collaborator: builds a new inert instance of a kind
pub trait InstanceFactory<T> {
    /// Build one instance. The result must be deactivated.
    fn construct(&mut self, kind: &KindId) -> Result<T, ConstructionError>;
}

impl<T, F> InstanceFactory<T> for F
where
    F: FnMut(&KindId) -> Result<T, ConstructionError>,
{
    fn construct(&mut self, kind: &KindId) -> Result<T, ConstructionError> {
        self(kind)
    }
}

/// What a release call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Deactivated and queued for reuse
    Reclaimed,
    /// The activation had already ended; nothing changed
    AlreadyInactive,
    /// The pool has no provenance for the handle; dropped from circulation
    Orphaned,
}

impl ReleaseOutcome {
    /// Whether the instance went back into its kind queue
    pub fn is_reclaimed(self) -> bool {
        self == Self::Reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_ids_are_unique() {
        let a = PoolId::next();
        let b = PoolId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_closure_factory() {
        let mut built = 0;
        let mut factory = |kind: &KindId| -> Result<String, ConstructionError> {
            built += 1;
            Ok(format!("{kind}-{built}"))
        };
        let item = factory.construct(&KindId::new("orb")).unwrap();
        assert_eq!(item, "orb-1");
    }

    #[test]
    fn test_new_instance_starts_available() {
        let instance = PooledInstance::new(KindId::new("orb"), ());
        assert!(!instance.is_active());
        assert_eq!(instance.state(), InstanceState::Available);
        assert_eq!(instance.owning_kind_id().as_str(), "orb");
    }
}
