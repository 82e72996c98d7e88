use std::collections::BTreeSet;

use rand::Rng;

use lsfm_curate::coverage::region_set;
use lsfm_curate::{
    CoverageSelector, DeterministicRng, GreedyStop, GreedyStrategy, RegionSet, SampleOutcome,
    SpacedSampler, select_coverage, stack_window,
};

fn sections(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("MIP_{i:04}.tif")).collect()
}

fn random_pool(seed: u64, chunks: usize, max_region: u32) -> Vec<RegionSet> {
    let mut rng = DeterministicRng::new(seed);
    (0..chunks)
        .map(|_| {
            let len = rng.random_range(0..6);
            region_set((0..len).map(|_| rng.random_range(1..=max_region)))
        })
        .collect()
}

#[test]
fn same_key_and_pool_select_the_same_sections() {
    let pool = sections(120);
    let sampler = SpacedSampler::new(10).unwrap();
    let (first, outcome) = sampler.sample(&pool, "240117").unwrap();
    assert_eq!(outcome, SampleOutcome::Sampled);
    for _ in 0..5 {
        assert_eq!(sampler.sample(&pool, "240117").unwrap().0, first);
    }
}

#[test]
fn different_keys_pick_different_sections_from_the_same_schedule() {
    // k=5 over 11 sections gives step 1 and offset 0, so every key lays out
    // the same schedule positions; only the permutation differs.
    let sampler = SpacedSampler::new(5).unwrap();
    let keys = ["240117", "240118", "240201", "231130", "sampleA"];
    let draws: Vec<_> = keys
        .iter()
        .map(|key| sampler.sample_indices(11, key).unwrap())
        .collect();

    for draw in &draws {
        assert_eq!(draw.positions, (0..7).collect::<Vec<_>>());
        assert_eq!(draw.indices.len(), 5);
    }
    let distinct: BTreeSet<Vec<usize>> = draws.iter().map(|d| d.indices.clone()).collect();
    assert!(distinct.len() > 1, "every key selected the same sections");
}

#[test]
fn selection_is_sorted_unique_and_exactly_k_whenever_the_pool_is_large_enough() {
    for k in 1..12 {
        let sampler = SpacedSampler::new(k).unwrap();
        for n in sampler.inflated()..sampler.inflated() + 60 {
            let draw = sampler.sample_indices(n, &format!("key{n}")).unwrap();
            assert_eq!(draw.outcome, SampleOutcome::Sampled);
            assert_eq!(draw.indices.len(), k, "k={k} n={n}");
            assert!(draw.indices.windows(2).all(|w| w[0] < w[1]));
            assert!(draw.indices.iter().all(|&idx| idx < n));
        }
    }
}

#[test]
fn full_schedule_trims_both_edges() {
    let pool = sections(7);
    let sampler = SpacedSampler::new(5).unwrap();
    let draw = sampler.sample_indices(pool.len(), "240117").unwrap();
    assert_eq!(draw.positions.len(), 7);
    assert_eq!(draw.indices, vec![1, 2, 3, 4, 5]);
}

#[test]
fn one_short_pool_trims_only_the_head() {
    let sampler = SpacedSampler::new(5).unwrap();
    let draw = sampler.sample_indices(6, "240117").unwrap();
    assert!(draw.is_insufficient());
    assert_eq!(draw.indices, vec![1, 2, 3, 4, 5]);
}

#[test]
fn small_pool_passes_through_unchanged() {
    let pool = sections(3);
    let sampler = SpacedSampler::new(10).unwrap();
    let (picked, outcome) = sampler.sample(&pool, "240117").unwrap();
    assert_eq!(picked, pool.iter().collect::<Vec<_>>());
    assert_eq!(outcome, SampleOutcome::NotEnoughSections);

    let empty: Vec<String> = Vec::new();
    assert!(sampler.sample(&empty, "240117").unwrap().0.is_empty());
}

#[test]
fn stack_windows_shrink_at_the_pool_ends() {
    assert_eq!(stack_window(0, 20, 5), 0..3);
    assert_eq!(stack_window(10, 20, 5), 8..13);
    assert_eq!(stack_window(19, 20, 5), 17..20);
    assert_eq!(stack_window(4, 20, 1), 4..5);
}

#[test]
fn unique_regions_are_all_covered_when_the_budget_allows() {
    let chunks: Vec<RegionSet> = (1..=4).map(|id| region_set([id])).collect();
    let selection = select_coverage(&chunks, 4);
    assert_eq!(selection.indices(), vec![0, 1, 2, 3]);
    assert_eq!(selection.covered, region_set([1, 2, 3, 4]));
    assert!(selection.filled.is_empty());
}

#[test]
fn identical_chunks_resolve_ties_to_the_lowest_index() {
    let chunks = vec![region_set([5, 6, 7]); 4];
    let selection = select_coverage(&chunks, 1);
    assert_eq!(selection.greedy, vec![0]);
    assert_eq!(selection.indices(), vec![0]);
    assert_eq!(selection.stop, GreedyStop::BudgetReached);

    let again = select_coverage(&chunks, 3);
    assert_eq!(again.greedy, vec![0]);
    assert_eq!(again.stop, GreedyStop::FullCoverage);
    assert_eq!(again, select_coverage(&chunks, 3));
}

#[test]
fn fill_tops_the_selection_up_to_the_budget() {
    let chunks = random_pool(7, 40, 12);
    for budget in [0, 1, 5, 20, 40, 55] {
        let selection = select_coverage(&chunks, budget);
        assert_eq!(selection.selected.len(), budget.min(chunks.len()));
        assert_eq!(
            selection.greedy.len() + selection.filled.len(),
            selection.selected.len()
        );
    }
}

#[test]
fn empty_pool_selects_nothing() {
    let selection = select_coverage(&[], 10);
    assert!(selection.selected.is_empty());
    assert_eq!(selection.coverage_fraction(), 1.0);
}

#[test]
fn lazy_and_rescan_strategies_agree_on_random_pools() {
    for seed in 0..20 {
        let chunks = random_pool(seed, 60, 40);
        for budget in [3, 10, 25] {
            let rescan = CoverageSelector::new(budget)
                .with_strategy(GreedyStrategy::Rescan)
                .select(&chunks);
            let lazy = CoverageSelector::new(budget)
                .with_strategy(GreedyStrategy::Lazy)
                .select(&chunks);
            assert_eq!(rescan, lazy, "seed={seed} budget={budget}");
        }
    }
}
