use serde::Serialize;

use crate::coverage::{CoverageSelection, RegionIndex, RegionSet};
use crate::types::RegionId;

/// Aggregate region-representation metrics for a chunk selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionCoverage {
    /// Chunks in the pool.
    pub pool_chunks: usize,
    /// Chunks selected in total.
    pub selected_chunks: usize,
    /// Chunks picked for coverage.
    pub greedy_chunks: usize,
    /// Chunks picked by the random fill.
    pub filled_chunks: usize,
    /// Region ids present anywhere in the pool.
    pub distinct_regions: usize,
    /// Region ids present in at least one selected chunk.
    pub covered_regions: usize,
    /// `covered_regions / distinct_regions`.
    pub fraction: f64,
    /// Fewest selected chunks holding any one region.
    pub min_per_region: usize,
    /// Most selected chunks holding any one region.
    pub max_per_region: usize,
    /// Per-region breakdown, most represented first.
    pub per_region: Vec<RegionShare>,
}

/// How often one region occurs in the pool and in the selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionShare {
    /// Region id.
    pub region: RegionId,
    /// Pool chunks containing the region.
    pub pool_chunks: usize,
    /// Selected chunks containing the region.
    pub selected_chunks: usize,
}

/// Compute per-region representation of `selection` within `chunks`.
///
/// Regions are listed most-represented first, ties broken by region id.
pub fn region_coverage(chunks: &[RegionSet], selection: &CoverageSelection) -> RegionCoverage {
    let index = RegionIndex::build(chunks);
    let mut per_region: Vec<RegionShare> = index
        .iter()
        .map(|(region, members)| RegionShare {
            region: *region,
            pool_chunks: members.len(),
            selected_chunks: members
                .iter()
                .filter(|idx| selection.selected.contains(*idx))
                .count(),
        })
        .collect();
    per_region.sort_by(|a, b| {
        b.selected_chunks
            .cmp(&a.selected_chunks)
            .then_with(|| a.region.cmp(&b.region))
    });
    let covered_regions = per_region
        .iter()
        .filter(|share| share.selected_chunks > 0)
        .count();
    let min_per_region = per_region
        .iter()
        .map(|share| share.selected_chunks)
        .min()
        .unwrap_or(0);
    let max_per_region = per_region
        .iter()
        .map(|share| share.selected_chunks)
        .max()
        .unwrap_or(0);
    let distinct_regions = index.distinct_regions();
    RegionCoverage {
        pool_chunks: chunks.len(),
        selected_chunks: selection.selected.len(),
        greedy_chunks: selection.greedy.len(),
        filled_chunks: selection.filled.len(),
        distinct_regions,
        covered_regions,
        fraction: if distinct_regions == 0 {
            1.0
        } else {
            covered_regions as f64 / distinct_regions as f64
        },
        min_per_region,
        max_per_region,
        per_region,
    }
}
