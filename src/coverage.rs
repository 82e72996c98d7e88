//! Region-coverage chunk selection.
//!
//! Greedy weighted set cover over atlas region ids: repeatedly take the chunk
//! that adds the most not-yet-covered regions (lowest pool index wins ties),
//! until the budget is spent or every region in the pool is covered. Leftover
//! budget is filled with label-agnostic picks from a constant-seeded RNG.
//!
//! Marginal gain only shrinks as coverage grows, so the lazy strategy (a max
//! heap of stale gains re-validated on pop) selects exactly the same chunks in
//! the same order as the full rescan.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::coverage::{BACKGROUND_REGION, FILL_SEED};
use crate::rng::DeterministicRng;
use crate::types::{ChunkIndex, RegionId};

/// Distinct region ids present in one atlas chunk.
pub type RegionSet = BTreeSet<RegionId>;

/// Build a region set from raw label values.
pub fn region_set<I>(labels: I) -> RegionSet
where
    I: IntoIterator<Item = RegionId>,
{
    labels.into_iter().collect()
}

/// Remove the background id from a region set.
pub fn without_background(mut regions: RegionSet) -> RegionSet {
    regions.remove(&BACKGROUND_REGION);
    regions
}

/// Maps every region id to the chunks that contain it, in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct RegionIndex {
    chunks_by_region: IndexMap<RegionId, BTreeSet<ChunkIndex>>,
}

impl RegionIndex {
    /// Index the region sets of a chunk pool.
    pub fn build(chunks: &[RegionSet]) -> Self {
        let mut chunks_by_region: IndexMap<RegionId, BTreeSet<ChunkIndex>> = IndexMap::new();
        for (idx, regions) in chunks.iter().enumerate() {
            for region in regions {
                chunks_by_region.entry(*region).or_default().insert(idx);
            }
        }
        Self { chunks_by_region }
    }

    /// Number of distinct region ids across the pool.
    pub fn distinct_regions(&self) -> usize {
        self.chunks_by_region.len()
    }

    /// Chunks containing `region`, if any.
    pub fn chunks_for(&self, region: RegionId) -> Option<&BTreeSet<ChunkIndex>> {
        self.chunks_by_region.get(&region)
    }

    /// Iterate `(region, chunks)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &BTreeSet<ChunkIndex>)> {
        self.chunks_by_region.iter()
    }
}

/// How phase 1 finds the chunk with the largest marginal gain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreedyStrategy {
    /// Rescan every unselected chunk per pick.
    #[default]
    Rescan,
    /// Lazy max-heap of stale gains, re-validated on pop.
    Lazy,
}

/// Why the greedy phase stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GreedyStop {
    /// The budget was spent on coverage picks.
    BudgetReached,
    /// Every region id in the pool is covered.
    FullCoverage,
    /// No remaining chunk adds a new region id.
    Saturated,
}

/// Outcome of one coverage selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageSelection {
    /// All selected chunk indices.
    pub selected: BTreeSet<ChunkIndex>,
    /// Coverage picks, in pick order.
    pub greedy: Vec<ChunkIndex>,
    /// Random fill picks, in draw order.
    pub filled: Vec<ChunkIndex>,
    /// Region ids covered by the selection.
    pub covered: RegionSet,
    /// Distinct region ids across the whole pool.
    pub distinct_regions: usize,
    /// Why the greedy phase ended.
    pub stop: GreedyStop,
}

impl CoverageSelection {
    /// Selected chunk indices in pool order.
    pub fn indices(&self) -> Vec<ChunkIndex> {
        self.selected.iter().copied().collect()
    }

    /// Fraction of pool regions covered (1.0 for a region-less pool).
    pub fn coverage_fraction(&self) -> f64 {
        if self.distinct_regions == 0 {
            return 1.0;
        }
        self.covered.len() as f64 / self.distinct_regions as f64
    }
}

/// Coverage-maximizing selector for a fixed budget.
#[derive(Clone, Copy, Debug)]
pub struct CoverageSelector {
    budget: usize,
    strategy: GreedyStrategy,
    fill_seed: u64,
}

impl CoverageSelector {
    /// Create a selector picking at most `budget` chunks.
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            strategy: GreedyStrategy::default(),
            fill_seed: FILL_SEED,
        }
    }

    /// Choose how phase 1 finds the best chunk.
    pub fn with_strategy(mut self, strategy: GreedyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Override the constant seed used by the fill phase.
    pub fn with_fill_seed(mut self, fill_seed: u64) -> Self {
        self.fill_seed = fill_seed;
        self
    }

    /// Select `min(budget, chunks.len())` chunk indices.
    pub fn select(&self, chunks: &[RegionSet]) -> CoverageSelection {
        let distinct_regions = RegionIndex::build(chunks).distinct_regions();
        let mut state = CoverageState::default();
        let stop = match self.strategy {
            GreedyStrategy::Rescan => self.greedy_rescan(chunks, distinct_regions, &mut state),
            GreedyStrategy::Lazy => self.greedy_lazy(chunks, distinct_regions, &mut state),
        };
        let filled = self.random_fill(chunks.len(), &mut state.selected);

        CoverageSelection {
            selected: state.selected,
            greedy: state.order,
            filled,
            covered: state.covered,
            distinct_regions,
            stop,
        }
    }

    fn greedy_rescan(
        &self,
        chunks: &[RegionSet],
        distinct_regions: usize,
        state: &mut CoverageState,
    ) -> GreedyStop {
        loop {
            if let Some(stop) = state.should_stop(self.budget, distinct_regions) {
                return stop;
            }
            let mut best = None;
            let mut best_gain = 0;
            for (idx, regions) in chunks.iter().enumerate() {
                if state.selected.contains(&idx) {
                    continue;
                }
                let gain = state.gain(regions);
                if gain > best_gain {
                    best_gain = gain;
                    best = Some(idx);
                }
            }
            let Some(idx) = best else {
                return GreedyStop::Saturated;
            };
            state.take(idx, &chunks[idx]);
        }
    }

    fn greedy_lazy(
        &self,
        chunks: &[RegionSet],
        distinct_regions: usize,
        state: &mut CoverageState,
    ) -> GreedyStop {
        let mut heap: BinaryHeap<(usize, Reverse<ChunkIndex>)> = chunks
            .iter()
            .enumerate()
            .filter(|(_, regions)| !regions.is_empty())
            .map(|(idx, regions)| (regions.len(), Reverse(idx)))
            .collect();

        loop {
            if let Some(stop) = state.should_stop(self.budget, distinct_regions) {
                return stop;
            }
            let Some((_, Reverse(idx))) = heap.pop() else {
                return GreedyStop::Saturated;
            };
            let gain = state.gain(&chunks[idx]);
            if gain == 0 {
                continue;
            }
            let candidate = (gain, Reverse(idx));
            // Heap entries are upper bounds; a fresh gain that still beats the
            // best stale bound is the true maximum.
            if heap.peek().is_some_and(|top| *top > candidate) {
                heap.push(candidate);
                continue;
            }
            state.take(idx, &chunks[idx]);
        }
    }

    fn random_fill(&self, pool_len: usize, selected: &mut BTreeSet<ChunkIndex>) -> Vec<ChunkIndex> {
        let mut available: Vec<ChunkIndex> =
            (0..pool_len).filter(|idx| !selected.contains(idx)).collect();
        let mut rng = DeterministicRng::new(self.fill_seed);
        let mut filled = Vec::new();
        while selected.len() < self.budget && !available.is_empty() {
            let pick = rng.random_range(0..available.len());
            let idx = available.remove(pick);
            selected.insert(idx);
            filled.push(idx);
        }
        filled
    }
}

/// Mutable selection state owned by a single `select` call.
#[derive(Default)]
struct CoverageState {
    selected: BTreeSet<ChunkIndex>,
    order: Vec<ChunkIndex>,
    covered: RegionSet,
}

impl CoverageState {
    fn should_stop(&self, budget: usize, distinct_regions: usize) -> Option<GreedyStop> {
        if self.selected.len() >= budget {
            Some(GreedyStop::BudgetReached)
        } else if self.covered.len() >= distinct_regions {
            Some(GreedyStop::FullCoverage)
        } else {
            None
        }
    }

    fn gain(&self, regions: &RegionSet) -> usize {
        regions.difference(&self.covered).count()
    }

    fn take(&mut self, idx: ChunkIndex, regions: &RegionSet) {
        self.selected.insert(idx);
        self.order.push(idx);
        self.covered.extend(regions.iter().copied());
    }
}

/// Select chunks with the default (rescan) strategy and fill seed.
pub fn select_coverage(chunks: &[RegionSet], budget: usize) -> CoverageSelection {
    CoverageSelector::new(budget).select(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[RegionId]) -> RegionSet {
        region_set(ids.iter().copied())
    }

    #[test]
    fn region_index_maps_regions_to_chunk_sets() {
        let chunks = vec![set(&[0, 5]), set(&[5, 7]), set(&[0])];
        let index = RegionIndex::build(&chunks);
        assert_eq!(index.distinct_regions(), 3);
        assert_eq!(index.chunks_for(5), Some(&BTreeSet::from([0, 1])));
        assert_eq!(index.chunks_for(0), Some(&BTreeSet::from([0, 2])));
        assert!(index.chunks_for(99).is_none());
        let order: Vec<RegionId> = index.iter().map(|(region, _)| *region).collect();
        assert_eq!(order, vec![0, 5, 7]);
    }

    #[test]
    fn without_background_drops_only_zero() {
        assert_eq!(without_background(set(&[0, 3, 4])), set(&[3, 4]));
    }

    #[test]
    fn greedy_prefers_largest_marginal_gain() {
        let chunks = vec![set(&[1]), set(&[1, 2, 3]), set(&[4]), set(&[3, 4])];
        let selection = select_coverage(&chunks, 2);
        assert_eq!(selection.greedy, vec![1, 2]);
        assert_eq!(selection.covered, set(&[1, 2, 3, 4]));
        assert_eq!(selection.stop, GreedyStop::BudgetReached);
        assert!(selection.filled.is_empty());
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let selection = select_coverage(&[], 10);
        assert!(selection.selected.is_empty());
        assert_eq!(selection.distinct_regions, 0);
        assert!((selection.coverage_fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_budget_selects_nothing() {
        let chunks = vec![set(&[1]), set(&[2])];
        let selection = select_coverage(&chunks, 0);
        assert!(selection.selected.is_empty());
        assert_eq!(selection.stop, GreedyStop::BudgetReached);
    }

    #[test]
    fn fill_is_seed_stable_and_disjoint_from_greedy() {
        let chunks: Vec<RegionSet> = (0..30).map(|i| set(&[i % 3])).collect();
        let a = select_coverage(&chunks, 12);
        let b = select_coverage(&chunks, 12);
        assert_eq!(a, b);
        assert_eq!(a.greedy, vec![0, 1, 2]);
        assert_eq!(a.stop, GreedyStop::FullCoverage);
        assert_eq!(a.filled.len(), 9);
        assert!(a.filled.iter().all(|idx| !a.greedy.contains(idx)));
        assert_eq!(a.selected.len(), 12);
    }

    #[test]
    fn fill_seed_changes_fill_but_not_greedy() {
        let chunks: Vec<RegionSet> = (0..40).map(|i| set(&[i % 2])).collect();
        let base = CoverageSelector::new(10).select(&chunks);
        let reseeded = CoverageSelector::new(10).with_fill_seed(7).select(&chunks);
        assert_eq!(base.greedy, reseeded.greedy);
        assert_eq!(base.selected.len(), reseeded.selected.len());
    }

    #[test]
    fn lazy_strategy_matches_rescan() {
        let chunks: Vec<RegionSet> = (0..60u32)
            .map(|i| set(&[i % 7, (i * 3) % 11 + 10, (i * 5) % 13 + 30, i / 4 + 50]))
            .collect();
        for budget in [0, 1, 5, 17, 40, 60, 80] {
            let rescan = CoverageSelector::new(budget)
                .with_strategy(GreedyStrategy::Rescan)
                .select(&chunks);
            let lazy = CoverageSelector::new(budget)
                .with_strategy(GreedyStrategy::Lazy)
                .select(&chunks);
            assert_eq!(rescan, lazy, "budget {budget}");
        }
    }

    #[test]
    fn lazy_strategy_skips_empty_chunks() {
        let chunks = vec![RegionSet::new(), set(&[1]), RegionSet::new(), set(&[2])];
        let selection = CoverageSelector::new(2)
            .with_strategy(GreedyStrategy::Lazy)
            .select(&chunks);
        assert_eq!(selection.greedy, vec![1, 3]);
    }

    #[test]
    fn greedy_strategy_deserializes_from_lowercase() {
        let strategy: GreedyStrategy = serde_json::from_str("\"lazy\"").unwrap();
        assert_eq!(strategy, GreedyStrategy::Lazy);
    }
}
