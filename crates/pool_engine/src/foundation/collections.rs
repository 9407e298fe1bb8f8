//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational key of a slot in one pool's instance storage
    pub struct InstanceKey;
}

/// Handle-based map using slot map for stable instance references
pub type InstanceMap<T> = SlotMap<InstanceKey, T>;
