//! Pool error taxonomy

use super::entry::KindId;

/// Setup-time misconfiguration. Fatal for the operation that raised it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// An entry asks for a negative number of pre-built instances
    #[error("pool entry `{kind}` has negative initial count {count}")]
    NegativeInitialCount {
        /// Offending kind
        kind: KindId,
        /// The configured count
        count: i32,
    },

    /// The same kind appears twice
    #[error("pool entry `{0}` is declared more than once")]
    DuplicateKind(KindId),

    /// A weighted draw was requested but no kind carries weight
    #[error("weighted draw requested but total weight is zero")]
    ZeroTotalWeight,

    /// The pool was never configured for this kind
    #[error("pool has no entry for kind `{0}`")]
    UnknownKind(KindId),

    /// Any other rejected configuration value
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The construction collaborator failed to build an instance
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to construct instance of kind `{kind}`: {reason}")]
pub struct ConstructionError {
    /// Kind that was being built
    pub kind: KindId,
    /// Collaborator-supplied reason
    pub reason: String,
}

impl ConstructionError {
    /// Create a construction error for a kind
    pub fn new(kind: KindId, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by pool operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Misconfigured pool
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Growth or prewarm could not build an instance
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// Result alias for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
