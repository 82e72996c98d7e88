use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::files::MANIFEST_FILENAME;
use crate::errors::CurateError;
use crate::types::PipelineName;

/// One emitted output and where it came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManifestEntry {
    /// Sample key or chunk identifier the output belongs to.
    pub group: String,
    /// Source files that produced the output (several for a stack).
    pub sources: Vec<PathBuf>,
    /// Written file.
    pub destination: PathBuf,
}

/// Write-only record of a curation run, stored next to its outputs.
#[derive(Clone, Debug, Serialize)]
pub struct SelectionManifest {
    /// Pipeline that produced the outputs.
    pub pipeline: PipelineName,
    /// Run start time.
    pub created_at: DateTime<Utc>,
    /// Outputs in emission order.
    pub entries: Vec<ManifestEntry>,
}

impl SelectionManifest {
    /// Start an empty manifest for `pipeline`, stamped now.
    pub fn new(pipeline: impl Into<PipelineName>) -> Self {
        Self {
            pipeline: pipeline.into(),
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Record an output.
    pub fn push(&mut self, group: impl Into<String>, sources: Vec<PathBuf>, destination: PathBuf) {
        self.entries.push(ManifestEntry {
            group: group.into(),
            sources,
            destination,
        });
    }

    /// Serialize to `dir/selection_manifest.json`, returning the path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, CurateError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| CurateError::Configuration(format!("manifest encoding failed: {err}")))?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
