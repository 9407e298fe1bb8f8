//! Object pooling core
//!
//! Pre-constructed instances of one or more kinds are handed out on request
//! and reclaimed on return, bounding allocation churn to prewarm and growth.
//!
//! # Architecture
//!
//! ```text
//! Pool
//!   ├── available_by_kind   (FIFO queue of inactive instances per kind)
//!   ├── provenance          (instance identity → owning kind)
//!   └── WeightedSelector    (kind draw for acquire_weighted)
//!               ↓
//!      InstanceHandle (pool id + slot key + activation)
//! ```

pub mod entry;
pub mod error;
pub mod instance;
pub mod object_pool;
pub mod stats;
pub mod weighted;

pub use entry::{validate_entries, KindId, PoolEntry};
pub use error::{ConfigurationError, ConstructionError, PoolError, PoolResult};
pub use instance::{
    InstanceFactory, InstanceHandle, InstanceId, InstanceState, Poolable, PoolId, PooledInstance,
    ReleaseOutcome,
};
pub use object_pool::Pool;
pub use stats::PoolStats;
pub use weighted::WeightedSelector;
