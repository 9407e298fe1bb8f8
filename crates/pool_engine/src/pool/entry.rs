//! Pool entries: the kinds a pool can produce

use super::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of a constructible item template (one prefab)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindId(String);

impl KindId {
    /// Create a kind id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KindId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for KindId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

fn default_initial_count() -> i32 {
    10
}

fn default_weight() -> u32 {
    1
}

/// One item kind managed by a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Template to construct
    pub kind_id: KindId,
    /// Instances built during prewarm. Signed so bad config can be rejected.
    #[serde(default = "default_initial_count")]
    pub initial_count: i32,
    /// Weight in random draws; zero keeps the kind out of draws only
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl PoolEntry {
    /// Entry with weight 1
    pub fn new(kind_id: impl Into<KindId>, initial_count: i32) -> Self {
        Self {
            kind_id: kind_id.into(),
            initial_count,
            weight: default_weight(),
        }
    }

    /// Set the draw weight
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

/// Reject negative counts and duplicated kinds before anything is built
pub fn validate_entries(entries: &[PoolEntry]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.initial_count < 0 {
            return Err(ConfigurationError::NegativeInitialCount {
                kind: entry.kind_id.clone(),
                count: entry.initial_count,
            });
        }
        if !seen.insert(&entry.kind_id) {
            return Err(ConfigurationError::DuplicateKind(entry.kind_id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults_from_toml() {
        let entry: PoolEntry = toml::from_str(r#"kind_id = "tab""#).unwrap();
        assert_eq!(entry.kind_id, KindId::new("tab"));
        assert_eq!(entry.initial_count, 10);
        assert_eq!(entry.weight, 1);
    }

    #[test]
    fn test_validate_rejects_negative_count() {
        let entries = vec![PoolEntry::new("a", 2), PoolEntry::new("b", -1)];
        assert_eq!(
            validate_entries(&entries),
            Err(ConfigurationError::NegativeInitialCount {
                kind: KindId::new("b"),
                count: -1,
            })
        );
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let entries = vec![PoolEntry::new("a", 2), PoolEntry::new("a", 4)];
        assert_eq!(
            validate_entries(&entries),
            Err(ConfigurationError::DuplicateKind(KindId::new("a")))
        );
    }

    #[test]
    fn test_validate_accepts_zero_count_and_weight() {
        let entries = vec![PoolEntry::new("a", 0).with_weight(0)];
        assert!(validate_entries(&entries).is_ok());
    }
}
