use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::SampleKey;

/// Error type for selection, configuration, and file-collaborator failures.
#[derive(Debug, Error)]
pub enum CurateError {
    /// Invalid or missing settings, from a config file, a flag or a library call.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Filesystem failure while listing, reading, copying or writing.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A TIFF file could not be decoded or encoded.
    #[error("tiff error in '{}': {source}", .path.display())]
    Tiff {
        /// File being read or written.
        path: PathBuf,
        /// Underlying codec error.
        #[source]
        source: tiff::TiffError,
    },
    /// A TIFF decoded fine but holds pixels the pipeline cannot use.
    #[error("unsupported pixel layout in '{}': {details}", .path.display())]
    UnsupportedImage {
        /// Offending file.
        path: PathBuf,
        /// What was expected and what was found.
        details: String,
    },
    /// No usable sample key could be taken from a folder name.
    #[error("cannot extract sample key from folder '{folder}': {reason}")]
    MalformedKey {
        /// Folder name (or path) the key was read from.
        folder: String,
        /// Why extraction failed.
        reason: String,
    },
    /// A folder that must hold TIFF files holds none.
    #[error("no input files found in '{}'", .0.display())]
    EmptyInput(PathBuf),
    /// A selected atlas chunk has no image chunk beside it.
    #[error(
        "missing paired image chunk '{}' for atlas chunk '{}'",
        .expected.display(),
        .atlas.display()
    )]
    MissingPair {
        /// Selected atlas chunk.
        atlas: PathBuf,
        /// Image chunk path that was looked for.
        expected: PathBuf,
    },
    /// The spaced schedule kept neither the inflated count nor one fewer.
    #[error(
        "sampling anomaly for sample '{sample_key}': {surviving} positions survived, expected {expected} or one fewer"
    )]
    SamplingAnomaly {
        /// Sample being drawn.
        sample_key: SampleKey,
        /// Schedule positions inside the pool.
        surviving: usize,
        /// Inflated count (requested plus trim reserve).
        expected: usize,
    },
}

impl CurateError {
    pub(crate) fn tiff(path: impl Into<PathBuf>, source: tiff::TiffError) -> Self {
        Self::Tiff {
            path: path.into(),
            source,
        }
    }

    /// True when the error only invalidates the current sample, so batch
    /// curation can log it and move on to the next one.
    pub fn is_per_sample(&self) -> bool {
        matches!(self, Self::SamplingAnomaly { .. })
    }
}
