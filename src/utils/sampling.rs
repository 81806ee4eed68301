//! Cumulative weight sampling
//!
//! [`CdfMap`] is the resampling primitive of the journey filter: candidates
//! are inserted with a non-negative weight and one is drawn with probability
//! proportional to that weight.

use rand::Rng;
use tracing::{trace, warn};

use crate::{Result, TrackphaseError};

/// A cumulative distribution over weighted candidates.
///
/// Entries with zero, negative or non-finite weight are skipped at insertion
/// and can never be drawn. The cumulative table is strictly increasing.
#[derive(Debug, Clone)]
pub struct CdfMap<T> {
    cumulative: Vec<f64>,
    items: Vec<T>,
    total: f64,
    offered: usize,
}

impl<T> CdfMap<T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty map with room for `capacity` candidates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cumulative: Vec::with_capacity(capacity),
            items: Vec::with_capacity(capacity),
            total: 0.0,
            offered: 0,
        }
    }

    /// Inserts a candidate with the given weight.
    ///
    /// Returns true if the candidate is selectable (positive, finite weight).
    pub fn put(&mut self, weight: f64, item: T) -> bool {
        self.offered += 1;
        if !weight.is_finite() {
            warn!(weight, "skipping candidate with non-finite weight");
            return false;
        }
        if weight <= 0.0 {
            return false;
        }
        let next = self.total + weight;
        if next <= self.total {
            trace!(weight, total = self.total, "skipping candidate too light to move the cumulative sum");
            return false;
        }
        self.total = next;
        self.cumulative.push(next);
        self.items.push(item);
        true
    }

    /// Number of selectable candidates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing can be drawn.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of candidates offered, including skipped ones.
    pub fn offered(&self) -> usize {
        self.offered
    }

    /// Sum of all selectable weights.
    pub fn total_weight(&self) -> f64 {
        self.total
    }

    /// Probability of drawing the `index`-th selectable candidate.
    pub fn probability(&self, index: usize) -> Option<f64> {
        let upper = *self.cumulative.get(index)?;
        let lower = if index == 0 { 0.0 } else { self.cumulative[index - 1] };
        Some((upper - lower) / self.total)
    }

    /// Selectable candidates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    fn index_for(&self, draw: f64) -> usize {
        // First boundary at or above the draw
        let idx = self.cumulative.partition_point(|&c| c < draw);
        idx.min(self.items.len() - 1)
    }

    /// Draws one candidate by reference, using a single uniform draw from `rng`.
    pub fn sample_ref<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&T> {
        if self.items.is_empty() {
            return Err(TrackphaseError::EmptyDistribution {
                offered: self.offered,
            });
        }
        let draw = rng.random::<f64>() * self.total;
        Ok(&self.items[self.index_for(draw)])
    }

    /// Consumes the map and returns one candidate, using a single uniform draw from `rng`.
    pub fn sample<R: Rng + ?Sized>(mut self, rng: &mut R) -> Result<T> {
        if self.items.is_empty() {
            return Err(TrackphaseError::EmptyDistribution {
                offered: self.offered,
            });
        }
        let draw = rng.random::<f64>() * self.total;
        let idx = self.index_for(draw);
        Ok(self.items.swap_remove(idx))
    }
}

impl<T> Default for CdfMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(f64, T)> for CdfMap<T> {
    fn from_iter<I: IntoIterator<Item = (f64, T)>>(iter: I) -> Self {
        let mut map = CdfMap::new();
        for (weight, item) in iter {
            map.put(weight, item);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_empty_map_fails() {
        let map: CdfMap<&str> = CdfMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        let err = map.sample(&mut rng).unwrap_err();
        assert!(matches!(err, TrackphaseError::EmptyDistribution { offered: 0 }));
    }

    #[test]
    fn test_all_zero_weights_fail() {
        let map: CdfMap<_> = [(0.0, "a"), (0.0, "b"), (-1.0, "c")].into_iter().collect();
        assert!(map.is_empty());
        assert_eq!(map.offered(), 3);
        let mut rng = StdRng::seed_from_u64(2);
        let err = map.sample(&mut rng).unwrap_err();
        assert!(matches!(err, TrackphaseError::EmptyDistribution { offered: 3 }));
    }

    #[test]
    fn test_single_positive_weight_always_wins() {
        let map: CdfMap<_> = [(0.0, "a"), (0.0, "b"), (3.5, "c"), (0.0, "d")]
            .into_iter()
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            assert_eq!(*map.sample_ref(&mut rng).unwrap(), "c");
        }
    }

    #[test]
    fn test_non_finite_weights_are_skipped() {
        let mut map = CdfMap::new();
        assert!(!map.put(f64::NAN, 1));
        assert!(!map.put(f64::INFINITY, 2));
        assert!(map.put(1.0, 3));
        assert_eq!(map.len(), 1);
        assert_eq!(map.total_weight(), 1.0);
    }

    #[test]
    fn test_negligible_weight_is_not_selectable() {
        let mut map = CdfMap::new();
        assert!(map.put(1.0, 'a'));
        assert!(!map.put(1e-20, 'b'));
        assert_eq!(map.len(), 1);
        assert_eq!(map.offered(), 2);
        assert_eq!(map.total_weight(), 1.0);
    }

    #[test]
    fn test_probabilities() {
        let map: CdfMap<_> = [(1.0, 'a'), (3.0, 'b')].into_iter().collect();
        assert!((map.probability(0).unwrap() - 0.25).abs() < 1e-12);
        assert!((map.probability(1).unwrap() - 0.75).abs() < 1e-12);
        assert!(map.probability(2).is_none());
    }

    #[test]
    fn test_same_seed_same_draw() {
        let map: CdfMap<_> = (0..10).map(|i| (f64::from(i) + 1.0, i)).collect();
        let a = map.sample_ref(&mut StdRng::seed_from_u64(99)).copied().unwrap();
        let b = map.sample_ref(&mut StdRng::seed_from_u64(99)).copied().unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn zero_weight_entries_are_never_drawn(
            weights in prop::collection::vec(prop_oneof![Just(0.0), 0.001f64..10.0], 1..20),
            seed in any::<u64>(),
        ) {
            let map: CdfMap<usize> = weights.iter().copied().zip(0..).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            match map.sample_ref(&mut rng) {
                Ok(&idx) => prop_assert!(weights[idx] > 0.0),
                Err(_) => prop_assert!(weights.iter().all(|&w| w == 0.0)),
            }
        }
    }
}
