//! File-level curation runs built on the pure selectors.
//!
//! Every run discovers its inputs, calls a selector, copies or writes the
//! selected files, and records what it emitted in a manifest. Selection never
//! touches the filesystem; all reads and writes happen here.

use std::ops::Range;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ChunkSelectionConfig, RandomChunkConfig, SectionSelectionConfig};
use crate::constants::files::{SELECTED_ATLAS_DIR, SELECTED_IMAGE_DIR};
use crate::constants::pipelines::{SELECT_CHUNKS, SELECT_RANDOM_CHUNKS, SELECT_SECTIONS};
use crate::constants::sections::STACK_MARKER;
use crate::coverage::{CoverageSelection, CoverageSelector, RegionSet, without_background};
use crate::errors::CurateError;
use crate::manifest::SelectionManifest;
use crate::metrics::{RegionCoverage, region_coverage};
use crate::sections::{SampleOutcome, SpacedSampler};
use crate::spread::shuffled_spread;
use crate::transport::fs::{
    copy_as, file_name_of, paired_image_path, require_tiffs, sample_key_from_folder,
};
use crate::transport::tiff_io::{read_region_ids, write_stack};
use crate::types::{FileName, SampleKey};

/// What happened to one sample folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    /// Seeded spaced draw.
    Sampled,
    /// Pool too small to draw from; every available section was used.
    NotEnoughSections,
    /// The sample was skipped after a sampling anomaly.
    Skipped {
        /// Error that caused the skip.
        reason: String,
    },
}

/// Per-sample result of a section run.
#[derive(Clone, Debug, Serialize)]
pub struct SampleReport {
    /// Key extracted from the folder name.
    pub sample_key: SampleKey,
    /// Section folder that was sampled.
    pub folder: PathBuf,
    /// Sections found in the folder.
    pub pool_len: usize,
    /// How the selection was made.
    pub status: SampleStatus,
    /// Selected section file names, in depth order.
    pub selected: Vec<FileName>,
    /// Copied sections or written stacks.
    pub written: Vec<PathBuf>,
}

/// Result of a section run.
#[derive(Clone, Debug, Serialize)]
pub struct SectionRunReport {
    /// One report per configured folder, in config order.
    pub samples: Vec<SampleReport>,
    /// Written manifest.
    pub manifest: PathBuf,
}

impl SectionRunReport {
    /// Number of files (sections or stacks) written across all samples.
    pub fn written_count(&self) -> usize {
        self.samples.iter().map(|sample| sample.written.len()).sum()
    }
}

/// Select representative sections for every configured sample folder.
///
/// Malformed folder names and empty folders abort the run; a sampling anomaly
/// only skips its sample.
pub fn curate_sections(config: &SectionSelectionConfig) -> Result<SectionRunReport, CurateError> {
    let sampler = SpacedSampler::new(config.sample_size)?;
    std::fs::create_dir_all(&config.out_path)?;
    let mut manifest = SelectionManifest::new(SELECT_SECTIONS);
    let mut samples = Vec::with_capacity(config.folder_paths.len());

    for folder in &config.folder_paths {
        let sample_key = sample_key_from_folder(folder, config.sample_id_token)?;
        let files = require_tiffs(folder)?;
        info!(sample_key = %sample_key, sections = files.len(), "selecting sections");

        let selection = match sampler.sample_indices(files.len(), &sample_key) {
            Ok(selection) => selection,
            Err(err) if err.is_per_sample() => {
                warn!(sample_key = %sample_key, error = %err, "skipping sample");
                samples.push(SampleReport {
                    sample_key,
                    folder: folder.clone(),
                    pool_len: files.len(),
                    status: SampleStatus::Skipped {
                        reason: err.to_string(),
                    },
                    selected: Vec::new(),
                    written: Vec::new(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        let status = match selection.outcome {
            SampleOutcome::Sampled => SampleStatus::Sampled,
            SampleOutcome::NotEnoughSections => {
                warn!(
                    sample_key = %sample_key,
                    sections = files.len(),
                    requested = config.sample_size,
                    "not enough sections to sample, selecting all"
                );
                SampleStatus::NotEnoughSections
            }
        };

        let selected: Vec<FileName> = selection
            .items(&files)
            .into_iter()
            .map(|path| file_name_of(path))
            .collect();

        let mut written = Vec::new();
        if config.make_zstacks {
            for window in selection.stacks(config.z_stack_number) {
                let (dest, members) =
                    write_sample_stack(&files, window, &sample_key, &config.out_path)?;
                manifest.push(sample_key.clone(), members, dest.clone());
                written.push(dest);
            }
            info!(sample_key = %sample_key, stacks = written.len(), "stacks written");
        } else {
            for path in selection.items(&files) {
                let name = format!("{sample_key}_{}", file_name_of(path));
                let dest = copy_as(path, &config.out_path, &name)?;
                debug!(from = %path.display(), to = %dest.display(), "copied section");
                manifest.push(sample_key.clone(), vec![path.clone()], dest.clone());
                written.push(dest);
            }
            info!(sample_key = %sample_key, copied = written.len(), "sections copied");
        }

        samples.push(SampleReport {
            sample_key,
            folder: folder.clone(),
            pool_len: files.len(),
            status,
            selected,
            written,
        });
    }

    let manifest = manifest.write_to(&config.out_path)?;
    Ok(SectionRunReport { samples, manifest })
}

fn write_sample_stack(
    files: &[PathBuf],
    window: Range<usize>,
    sample_key: &str,
    out_dir: &Path,
) -> Result<(PathBuf, Vec<PathBuf>), CurateError> {
    let members = files[window].to_vec();
    let (Some(first), Some(last)) = (members.first(), members.last()) else {
        return Err(CurateError::Configuration("empty stack window".to_string()));
    };
    let name = format!(
        "{sample_key}_{STACK_MARKER}_{}_to_{}.tif",
        stem_of(first),
        stem_of(last)
    );
    let dest = out_dir.join(name);
    let pages = write_stack(&members, &dest)?;
    debug!(stack = %dest.display(), pages, "stack written");
    Ok((dest, members))
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Result of a coverage chunk run.
#[derive(Clone, Debug, Serialize)]
pub struct ChunkRunReport {
    /// Copied atlas chunks, in pool order.
    pub selected_atlas: Vec<PathBuf>,
    /// Copied image chunks, paired with `selected_atlas`.
    pub selected_images: Vec<PathBuf>,
    /// Region representation of the selection.
    pub coverage: RegionCoverage,
    /// Written manifest.
    pub manifest: PathBuf,
}

/// Distinct region ids of every atlas chunk, read in parallel, in pool order.
pub fn load_region_sets(
    atlas_chunks: &[PathBuf],
    ignore_background: bool,
) -> Result<Vec<RegionSet>, CurateError> {
    atlas_chunks
        .par_iter()
        .map(|path| -> Result<RegionSet, CurateError> {
            let regions = read_region_ids(path)?;
            Ok(if ignore_background {
                without_background(regions)
            } else {
                regions
            })
        })
        .collect()
}

/// Select atlas/image chunk pairs that maximize region coverage and copy them
/// to `selected_image_chunks/` and `selected_atlas_chunks/` beside `chunk_dir`.
///
/// Every selected pair is resolved before anything is copied, so a missing
/// image chunk leaves the output folders untouched.
pub fn curate_chunks(config: &ChunkSelectionConfig) -> Result<ChunkRunReport, CurateError> {
    let atlas_chunks = require_tiffs(&config.atlas_chunk_dir)?;
    info!(atlas_chunks = atlas_chunks.len(), "found atlas chunks");

    let region_sets = load_region_sets(&atlas_chunks, config.ignore_background)?;
    let selection: CoverageSelection = CoverageSelector::new(config.number_of_chunks)
        .with_strategy(config.strategy)
        .select(&region_sets);
    let coverage = region_coverage(&region_sets, &selection);
    info!(
        distinct_regions = coverage.distinct_regions,
        covered_regions = coverage.covered_regions,
        greedy = selection.greedy.len(),
        filled = selection.filled.len(),
        stop = ?selection.stop,
        "chunk selection complete"
    );

    let pairs = selection
        .indices()
        .into_iter()
        .map(|idx| {
            let atlas = atlas_chunks[idx].clone();
            paired_image_path(&config.chunk_dir, &atlas).map(|image| (atlas, image))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let out_root = config
        .chunk_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.chunk_dir.clone());
    let image_out = out_root.join(SELECTED_IMAGE_DIR);
    let atlas_out = out_root.join(SELECTED_ATLAS_DIR);

    let mut manifest = SelectionManifest::new(SELECT_CHUNKS);
    let mut selected_atlas = Vec::with_capacity(pairs.len());
    let mut selected_images = Vec::with_capacity(pairs.len());
    for (atlas, image) in pairs {
        let image_dest = copy_as(&image, &image_out, &file_name_of(&image))?;
        let atlas_dest = copy_as(&atlas, &atlas_out, &file_name_of(&atlas))?;
        debug!(image = %image_dest.display(), atlas = %atlas_dest.display(), "copied pair");
        let group = file_name_of(&image);
        manifest.push(group.clone(), vec![image], image_dest.clone());
        manifest.push(group, vec![atlas], atlas_dest.clone());
        selected_images.push(image_dest);
        selected_atlas.push(atlas_dest);
    }
    info!(pairs = selected_images.len(), "representative chunk pairs copied");

    let manifest = manifest.write_to(&out_root)?;
    Ok(ChunkRunReport {
        selected_atlas,
        selected_images,
        coverage,
        manifest,
    })
}

/// Result of a random spread chunk run.
#[derive(Clone, Debug, Serialize)]
pub struct RandomChunkRunReport {
    /// Copied chunks, in rank order.
    pub copied: Vec<PathBuf>,
    /// True when the request exceeded the pool.
    pub clamped: bool,
    /// Written manifest.
    pub manifest: PathBuf,
}

/// Copy an evenly spread, shuffled subset of chunks as `<rank>_<name>`.
pub fn curate_random_chunks(config: &RandomChunkConfig) -> Result<RandomChunkRunReport, CurateError> {
    let files = require_tiffs(&config.chunk_dir)?;
    let spread = shuffled_spread(files.len(), config.num_files_to_select, config.seed);
    if spread.clamped {
        warn!(
            requested = config.num_files_to_select,
            available = files.len(),
            "more chunks requested than available, selecting all"
        );
    }

    let mut manifest = SelectionManifest::new(SELECT_RANDOM_CHUNKS);
    let mut copied = Vec::with_capacity(spread.ranked.len());
    for (rank, idx) in spread.ranked.iter().enumerate() {
        let src = &files[*idx];
        let name = format!("{rank}_{}", file_name_of(src));
        let dest = copy_as(src, &config.out_dir, &name)?;
        debug!(from = %src.display(), to = %dest.display(), "copied chunk");
        manifest.push(rank.to_string(), vec![src.clone()], dest.clone());
        copied.push(dest);
    }
    info!(copied = copied.len(), "random chunk selection copied");

    let manifest = manifest.write_to(&config.out_dir)?;
    Ok(RandomChunkRunReport {
        copied,
        clamped: spread.clamped,
        manifest,
    })
}
