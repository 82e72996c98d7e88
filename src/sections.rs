//! Spaced section sampling with key-seeded shuffling.
//!
//! A sample's sections are sorted by depth. The sampler lays an evenly spaced
//! schedule over the pool with a bounded random offset, then maps every
//! schedule position through a full key-seeded permutation of the pool. The
//! permutation decorrelates "slot in the schedule" from "physical depth", so
//! different samples do not all contribute the same relative depths (and with
//! them the same anatomy) to the training set. Two extra slots are sampled and
//! trimmed from the depth-ordered result to drop edge sections.
//!
//! Selection is a pure function of `(pool length, sample key, requested count)`.

use std::ops::Range;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::constants::sections::TRIM_RESERVE;
use crate::errors::CurateError;
use crate::hash::stable_seed;
use crate::rng::DeterministicRng;
use crate::types::{KeySeed, SampleKey, SectionIndex};

/// How a section selection was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The pool was large enough for a seeded spaced draw.
    Sampled,
    /// The pool was smaller than the inflated count; no random draw happened.
    ///
    /// This is informational. The selection is the whole pool, trimmed by one
    /// head section when the pool is exactly one short of the inflated count.
    NotEnoughSections,
}

/// Result of one spaced-sampling call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSample {
    /// Key the draw was seeded from.
    pub sample_key: SampleKey,
    /// Seed derived from `sample_key` (`None` when no draw was needed).
    pub seed: Option<KeySeed>,
    /// Number of sections in the pool.
    pub pool_len: usize,
    /// Whether the pool supported a real draw.
    pub outcome: SampleOutcome,
    /// Schedule positions that survived the bounds filter, before the permutation.
    pub positions: Vec<usize>,
    /// Selected pool indices in depth order, after trimming.
    pub indices: Vec<SectionIndex>,
}

impl SectionSample {
    /// True when no random draw was made.
    pub fn is_insufficient(&self) -> bool {
        self.outcome == SampleOutcome::NotEnoughSections
    }

    /// Resolve the selected indices against the pool they were drawn from.
    pub fn items<'a, T>(&self, pool: &'a [T]) -> Vec<&'a T> {
        self.indices.iter().filter_map(|&idx| pool.get(idx)).collect()
    }

    /// Expand every selected index into its clipped stack window.
    pub fn stacks(&self, depth: usize) -> Vec<Range<SectionIndex>> {
        self.indices
            .iter()
            .map(|&idx| stack_window(idx, self.pool_len, depth))
            .collect()
    }
}

/// Deterministic spaced sampler for one requested output count.
#[derive(Clone, Copy, Debug)]
pub struct SpacedSampler {
    requested: usize,
}

impl SpacedSampler {
    /// Create a sampler emitting `requested_count` sections per sample.
    pub fn new(requested_count: usize) -> Result<Self, CurateError> {
        if requested_count == 0 {
            return Err(CurateError::Configuration(
                "sample size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            requested: requested_count,
        })
    }

    /// Requested output count.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Requested count plus the trim reserve.
    pub fn inflated(&self) -> usize {
        self.requested + TRIM_RESERVE
    }

    /// Select section indices from a depth-ordered pool of `pool_len` sections.
    ///
    /// Fails with `SamplingAnomaly` when the number of surviving schedule
    /// positions is neither the inflated count nor one less; callers curating
    /// many samples skip that sample and continue.
    pub fn sample_indices(
        &self,
        pool_len: usize,
        sample_key: &str,
    ) -> Result<SectionSample, CurateError> {
        if sample_key.is_empty() {
            return Err(CurateError::MalformedKey {
                folder: String::new(),
                reason: "sample key is empty".to_string(),
            });
        }
        let inflated = self.inflated();

        if pool_len < inflated {
            let positions: Vec<usize> = (0..pool_len).collect();
            let indices = if pool_len + 1 == inflated {
                trim_edges(positions.clone(), positions.len(), inflated, sample_key)?
            } else {
                positions.clone()
            };
            return Ok(SectionSample {
                sample_key: sample_key.to_string(),
                seed: None,
                pool_len,
                outcome: SampleOutcome::NotEnoughSections,
                positions,
                indices,
            });
        }

        let seed = stable_seed(sample_key);
        let mut rng = DeterministicRng::from_key_seed(seed);

        let step = schedule_step(pool_len, inflated);
        let offset = rng.random_range(0..step);
        let positions = spaced_positions(pool_len, inflated, offset, step);

        let mut permutation: Vec<SectionIndex> = (0..pool_len).collect();
        permutation.shuffle(&mut rng);

        let mut selected: Vec<SectionIndex> = positions.iter().map(|&p| permutation[p]).collect();
        selected.sort_unstable();
        let indices = trim_edges(selected, positions.len(), inflated, sample_key)?;

        Ok(SectionSample {
            sample_key: sample_key.to_string(),
            seed: Some(seed),
            pool_len,
            outcome: SampleOutcome::Sampled,
            positions,
            indices,
        })
    }

    /// Select items from a depth-ordered pool, returning them in pool order
    /// along with whether a real draw was possible.
    ///
    /// [`SampleOutcome::NotEnoughSections`] is informational: the items are
    /// still valid. Use [`Self::sample_indices`] for the full draw record.
    pub fn sample<'a, T>(
        &self,
        pool: &'a [T],
        sample_key: &str,
    ) -> Result<(Vec<&'a T>, SampleOutcome), CurateError> {
        let selection = self.sample_indices(pool.len(), sample_key)?;
        Ok((selection.items(pool), selection.outcome))
    }
}

/// Spacing between schedule slots: `n / (count - 1)`, or `n` for a single slot.
pub fn schedule_step(pool_len: usize, count: usize) -> usize {
    if count > 1 {
        pool_len / (count - 1)
    } else {
        pool_len
    }
}

/// `count` evenly spaced positions starting at `offset`, dropping any `>= pool_len`.
pub fn spaced_positions(pool_len: usize, count: usize, offset: usize, step: usize) -> Vec<usize> {
    (0..count)
        .map(|i| offset + i * step)
        .filter(|&pos| pos < pool_len)
        .collect()
}

/// Window of `depth` sections centred on `index`, clipped to `0..pool_len`.
///
/// Near the pool ends the window shrinks instead of wrapping or padding.
pub fn stack_window(index: SectionIndex, pool_len: usize, depth: usize) -> Range<SectionIndex> {
    let half = depth / 2;
    let start = index.saturating_sub(half);
    let end = (index + half + 1).min(pool_len);
    start..end
}

fn trim_edges(
    mut selected: Vec<SectionIndex>,
    surviving: usize,
    inflated: usize,
    sample_key: &str,
) -> Result<Vec<SectionIndex>, CurateError> {
    if surviving == inflated {
        selected.remove(0);
        selected.pop();
    } else if surviving + 1 == inflated {
        selected.remove(0);
    } else {
        return Err(CurateError::SamplingAnomaly {
            sample_key: sample_key.to_string(),
            surviving,
            expected: inflated,
        });
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_requested_count_is_rejected() {
        assert!(matches!(
            SpacedSampler::new(0),
            Err(CurateError::Configuration(_))
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        let sampler = SpacedSampler::new(3).unwrap();
        assert!(matches!(
            sampler.sample_indices(20, ""),
            Err(CurateError::MalformedKey { .. })
        ));
    }

    #[test]
    fn schedule_step_handles_single_slot() {
        assert_eq!(schedule_step(20, 1), 20);
        assert_eq!(schedule_step(20, 7), 3);
        assert_eq!(schedule_step(7, 7), 1);
    }

    #[test]
    fn spaced_positions_drop_out_of_range_slots() {
        assert_eq!(spaced_positions(10, 4, 2, 3), vec![2, 5, 8]);
        assert_eq!(spaced_positions(10, 4, 0, 3), vec![0, 3, 6, 9]);
    }

    #[test]
    fn surviving_positions_never_fall_below_inflated_minus_one() {
        let sampler = SpacedSampler::new(4).unwrap();
        for pool_len in sampler.inflated()..200 {
            let sample = sampler.sample_indices(pool_len, "240117").unwrap();
            let surviving = sample.positions.len();
            assert!(surviving == sampler.inflated() || surviving + 1 == sampler.inflated());
            assert_eq!(sample.indices.len(), 4);
        }
    }

    #[test]
    fn selected_indices_are_sorted_and_unique() {
        let sampler = SpacedSampler::new(6).unwrap();
        let sample = sampler.sample_indices(150, "acc_0042").unwrap();
        assert!(sample.indices.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(sample.indices.iter().all(|&idx| idx < 150));
        assert_eq!(sample.outcome, SampleOutcome::Sampled);
        assert_eq!(sample.seed, Some(stable_seed("acc_0042")));
    }

    #[test]
    fn trim_edges_reports_anomaly_for_unexpected_counts() {
        let err = trim_edges(vec![1, 2, 3], 3, 7, "k").unwrap_err();
        assert!(matches!(
            err,
            CurateError::SamplingAnomaly {
                surviving: 3,
                expected: 7,
                ..
            }
        ));
        assert!(err.is_per_sample());
    }

    #[test]
    fn sample_reports_outcome_with_items() {
        let sampler = SpacedSampler::new(5).unwrap();
        let small: Vec<u32> = (0..4).collect();
        let (items, outcome) = sampler.sample(&small, "240117").unwrap();
        assert_eq!(outcome, SampleOutcome::NotEnoughSections);
        assert_eq!(items, vec![&0, &1, &2, &3]);

        let large: Vec<u32> = (0..30).collect();
        let (items, outcome) = sampler.sample(&large, "240117").unwrap();
        assert_eq!(outcome, SampleOutcome::Sampled);
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn stack_window_clips_both_ends() {
        assert_eq!(stack_window(0, 20, 5), 0..3);
        assert_eq!(stack_window(10, 20, 5), 8..13);
        assert_eq!(stack_window(19, 20, 5), 17..20);
        assert_eq!(stack_window(3, 20, 0), 3..4);
    }

    #[test]
    fn stacks_follow_selected_indices() {
        let sampler = SpacedSampler::new(3).unwrap();
        let sample = sampler.sample_indices(40, "stacked").unwrap();
        let stacks = sample.stacks(4);
        assert_eq!(stacks.len(), sample.indices.len());
        for (window, &idx) in stacks.iter().zip(&sample.indices) {
            assert!(window.contains(&idx));
            assert!(window.len() <= 5);
        }
    }
}
