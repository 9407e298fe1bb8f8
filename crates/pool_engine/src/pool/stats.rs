//! Pool usage counters

/// Statistics for pool usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances built during prewarm
    pub prewarmed: usize,
    /// Instances built on demand because a kind queue was empty
    pub grown: usize,
    /// Successful acquire calls
    pub acquired: u64,
    /// Releases that returned an instance to its queue
    pub released: u64,
    /// Releases of handles this pool never issued
    pub orphan_releases: u64,
    /// Releases of activations that had already ended
    pub redundant_releases: u64,
    /// Maximum number of instances active at once
    pub peak_active: usize,
}

impl PoolStats {
    /// Total instances ever constructed
    pub fn constructed(&self) -> usize {
        self.prewarmed + self.grown
    }

    /// Releases that did not reclaim anything
    pub fn warnings(&self) -> u64 {
        self.orphan_releases + self.redundant_releases
    }
}
