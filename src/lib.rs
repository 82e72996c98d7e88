#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runners shared by the binaries.
pub mod apps;
/// Config file types and resolution.
pub mod config;
/// Centralized constants used across selectors, file discovery, and configs.
pub mod constants;
/// Region-coverage chunk selection.
pub mod coverage;
/// Stable key hashing.
pub mod hash;
/// Run manifests written next to curated outputs.
pub mod manifest;
/// Aggregate coverage metrics.
pub mod metrics;
/// File-level curation runs.
pub mod pipeline;
/// Seedable deterministic random source.
pub mod rng;
/// Spaced section sampling and stack windows.
pub mod sections;
/// Evenly spread index selection.
pub mod spread;
/// Filesystem and TIFF transports used by the pipelines.
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{ChunkSelectionConfig, ConfigMode, RandomChunkConfig, SectionSelectionConfig};
pub use coverage::{
    CoverageSelection, CoverageSelector, GreedyStop, GreedyStrategy, RegionSet, select_coverage,
};
pub use errors::CurateError;
pub use hash::stable_seed;
pub use manifest::SelectionManifest;
pub use metrics::RegionCoverage;
pub use pipeline::{curate_chunks, curate_random_chunks, curate_sections};
pub use rng::DeterministicRng;
pub use sections::{SampleOutcome, SectionSample, SpacedSampler, stack_window};
pub use types::{ChunkIndex, KeySeed, RegionId, SampleKey, SectionIndex};
