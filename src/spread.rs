//! Label-agnostic spread selection for chunk pools without atlas labels.
//!
//! Picks `count` indices spread evenly over the sorted pool, then shuffles the
//! picks with a seeded RNG so the emitted rank prefix does not follow pool
//! order.

use rand::seq::SliceRandom;

use crate::rng::DeterministicRng;

/// Result of a spread selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadSelection {
    /// Selected pool indices in shuffled (emission) order.
    pub ranked: Vec<usize>,
    /// True when more files were requested than the pool holds.
    pub clamped: bool,
}

/// Indices `floor(i * pool_len / count)` for `i in 0..count`, with `count`
/// clamped to the pool size.
pub fn evenly_spread(pool_len: usize, count: usize) -> Vec<usize> {
    let count = count.min(pool_len);
    if count == 0 {
        return Vec::new();
    }
    (0..count).map(|i| i * pool_len / count).collect()
}

/// Evenly spread picks in a seeded shuffled order.
pub fn shuffled_spread(pool_len: usize, count: usize, seed: u64) -> SpreadSelection {
    let mut ranked = evenly_spread(pool_len, count);
    let mut rng = DeterministicRng::new(seed);
    ranked.shuffle(&mut rng);
    SpreadSelection {
        ranked,
        clamped: count > pool_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evenly_spread_uses_floor_spacing() {
        assert_eq!(evenly_spread(10, 4), vec![0, 2, 5, 7]);
        assert_eq!(evenly_spread(10, 10), (0..10).collect::<Vec<_>>());
        assert_eq!(evenly_spread(3, 10), vec![0, 1, 2]);
        assert!(evenly_spread(0, 5).is_empty());
        assert!(evenly_spread(5, 0).is_empty());
    }

    #[test]
    fn shuffled_spread_is_a_seeded_permutation_of_the_spread() {
        let a = shuffled_spread(100, 20, 12345);
        let b = shuffled_spread(100, 20, 12345);
        assert_eq!(a, b);
        assert!(!a.clamped);
        let mut sorted = a.ranked.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, evenly_spread(100, 20));
    }

    #[test]
    fn shuffled_spread_flags_clamped_requests() {
        let selection = shuffled_spread(4, 9, 1);
        assert!(selection.clamped);
        assert_eq!(selection.ranked.len(), 4);
    }
}
