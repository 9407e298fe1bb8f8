//! Weighted kind selection
//!
//! Draws a uniform integer in `1..=total_weight` and walks the kinds in
//! insertion order, accumulating weights until the draw falls inside the
//! accumulated range. Over many draws kind `i` is chosen with probability
//! `w_i / sum(w)`.

use super::entry::{KindId, PoolEntry};
use super::error::ConfigurationError;
use rand::Rng;

/// Insertion-ordered list of kinds with integer weights
#[derive(Debug, Clone, Default)]
pub struct WeightedSelector {
    entries: Vec<(KindId, u32)>,
    total_weight: u64,
}

impl WeightedSelector {
    /// Create an empty selector
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pool entries, keeping their order
    pub fn from_entries(entries: &[PoolEntry]) -> Self {
        let mut selector = Self::new();
        for entry in entries {
            selector.push(entry.kind_id.clone(), entry.weight);
        }
        selector
    }

    /// Append a kind at the end of the walk order
    pub fn push(&mut self, kind: KindId, weight: u32) {
        self.total_weight += u64::from(weight);
        self.entries.push((kind, weight));
    }

    /// Change the weight of a kind in place; returns false for unknown kinds
    pub fn set_weight(&mut self, kind: &KindId, weight: u32) -> bool {
        match self.entries.iter_mut().find(|(k, _)| k == kind) {
            Some(entry) => {
                self.total_weight = self.total_weight - u64::from(entry.1) + u64::from(weight);
                entry.1 = weight;
                true
            }
            None => false,
        }
    }

    /// Weight of a kind, if present
    pub fn weight_of(&self, kind: &KindId) -> Option<u32> {
        self.entries.iter().find(|(k, _)| k == kind).map(|(_, w)| *w)
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Number of kinds, including zero-weight ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no kinds are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kinds in walk order
    pub fn kinds(&self) -> impl Iterator<Item = &KindId> {
        self.entries.iter().map(|(kind, _)| kind)
    }

    /// Map a draw in `1..=total_weight` onto a kind
    pub fn pick(&self, draw: u64) -> Option<&KindId> {
        if draw == 0 || draw > self.total_weight {
            return None;
        }
        let mut cumulative = 0u64;
        for (kind, weight) in &self.entries {
            cumulative += u64::from(*weight);
            if draw <= cumulative {
                return Some(kind);
            }
        }
        None
    }

    /// Draw a kind using the supplied generator
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&KindId, ConfigurationError> {
        if self.total_weight == 0 {
            return Err(ConfigurationError::ZeroTotalWeight);
        }
        let draw = rng.gen_range(1..=self.total_weight);
        self.pick(draw).ok_or(ConfigurationError::ZeroTotalWeight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn selector(weights: &[(&str, u32)]) -> WeightedSelector {
        let mut selector = WeightedSelector::new();
        for (kind, weight) in weights {
            selector.push(KindId::new(*kind), *weight);
        }
        selector
    }

    #[test]
    fn test_pick_walks_in_insertion_order() {
        let selector = selector(&[("basic", 1), ("explosive", 3)]);
        assert_eq!(selector.total_weight(), 4);
        assert_eq!(selector.pick(1).map(KindId::as_str), Some("basic"));
        for draw in 2..=4 {
            assert_eq!(selector.pick(draw).map(KindId::as_str), Some("explosive"));
        }
        assert!(selector.pick(0).is_none());
        assert!(selector.pick(5).is_none());
    }

    #[test]
    fn test_zero_weight_is_never_picked() {
        let selector = selector(&[("ghost", 0), ("basic", 2), ("rare", 0)]);
        for draw in 1..=selector.total_weight() {
            assert_eq!(selector.pick(draw).map(KindId::as_str), Some("basic"));
        }
    }

    #[test]
    fn test_sample_rejects_zero_total() {
        let selector = selector(&[("ghost", 0)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.sample(&mut rng), Err(ConfigurationError::ZeroTotalWeight));
        assert_eq!(WeightedSelector::new().sample(&mut rng), Err(ConfigurationError::ZeroTotalWeight));
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let selector = selector(&[("a", 2), ("b", 5), ("c", 1)]);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..64)
                .map(|_| selector.sample(&mut rng).unwrap().clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_set_weight_updates_total() {
        let mut selector = selector(&[("a", 2), ("b", 5)]);
        assert!(selector.set_weight(&KindId::new("b"), 1));
        assert_eq!(selector.total_weight(), 3);
        assert_eq!(selector.weight_of(&KindId::new("b")), Some(1));
        assert!(!selector.set_weight(&KindId::new("missing"), 9));
    }
}
