use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::constants::config::{LOCAL_SUFFIX, TEMPLATE_SUFFIX, TEST_SUFFIX};
use crate::constants::coverage::{DEFAULT_NUMBER_OF_CHUNKS, FILL_SEED};
use crate::constants::sections::{
    DEFAULT_SAMPLE_ID_TOKEN, DEFAULT_SAMPLE_SIZE, DEFAULT_STACK_DEPTH,
};
use crate::coverage::GreedyStrategy;
use crate::errors::CurateError;

/// Settings for representative-section selection.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SectionSelectionConfig {
    /// Section (MIP) folders, one per sample.
    pub folder_paths: Vec<PathBuf>,
    /// Destination folder for copied sections or written stacks.
    pub out_path: PathBuf,
    /// Sections emitted per sample once edge sections are trimmed.
    pub sample_size: usize,
    /// Write a stack around each selected section instead of copying it.
    pub make_zstacks: bool,
    /// Stack depth in sections (windows shrink at the pool ends).
    pub z_stack_number: usize,
    /// Underscore-token index of the sample key in the parent folder name.
    pub sample_id_token: usize,
}

impl Default for SectionSelectionConfig {
    fn default() -> Self {
        Self {
            folder_paths: Vec::new(),
            out_path: PathBuf::new(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            make_zstacks: false,
            z_stack_number: DEFAULT_STACK_DEPTH,
            sample_id_token: DEFAULT_SAMPLE_ID_TOKEN,
        }
    }
}

impl SectionSelectionConfig {
    /// Normalize paths and check required fields.
    pub fn validated(mut self) -> Result<Self, CurateError> {
        if self.folder_paths.is_empty() {
            return Err(CurateError::Configuration(
                "folder_paths must list at least one section folder".to_string(),
            ));
        }
        if self.out_path.as_os_str().is_empty() {
            return Err(CurateError::Configuration("out_path is required".to_string()));
        }
        if self.sample_size == 0 {
            return Err(CurateError::Configuration(
                "sample_size must be at least 1".to_string(),
            ));
        }
        if self.make_zstacks && self.z_stack_number == 0 {
            return Err(CurateError::Configuration(
                "z_stack_number must be at least 1 when make_zstacks is set".to_string(),
            ));
        }
        self.folder_paths = self
            .folder_paths
            .iter()
            .map(|path| normalize_user_path(path))
            .collect();
        self.out_path = normalize_user_path(&self.out_path);
        Ok(self)
    }
}

/// Settings for coverage-based chunk selection.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChunkSelectionConfig {
    /// Folder of filtered image chunks.
    pub chunk_dir: PathBuf,
    /// Folder of filtered atlas chunks paired with `chunk_dir`.
    pub atlas_chunk_dir: PathBuf,
    /// Selection budget.
    pub number_of_chunks: usize,
    /// Greedy search strategy.
    pub strategy: GreedyStrategy,
    /// Drop region id 0 before selection.
    pub ignore_background: bool,
}

impl Default for ChunkSelectionConfig {
    fn default() -> Self {
        Self {
            chunk_dir: PathBuf::new(),
            atlas_chunk_dir: PathBuf::new(),
            number_of_chunks: DEFAULT_NUMBER_OF_CHUNKS,
            strategy: GreedyStrategy::default(),
            ignore_background: false,
        }
    }
}

impl ChunkSelectionConfig {
    /// Normalize paths and check required fields.
    pub fn validated(mut self) -> Result<Self, CurateError> {
        if self.chunk_dir.as_os_str().is_empty() || self.atlas_chunk_dir.as_os_str().is_empty() {
            return Err(CurateError::Configuration(
                "chunk_dir and atlas_chunk_dir are required".to_string(),
            ));
        }
        self.chunk_dir = normalize_user_path(&self.chunk_dir);
        self.atlas_chunk_dir = normalize_user_path(&self.atlas_chunk_dir);
        Ok(self)
    }
}

/// Settings for random spread chunk selection (no atlas chunks available).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RandomChunkConfig {
    /// Folder of filtered image chunks.
    pub chunk_dir: PathBuf,
    /// Destination folder.
    pub out_dir: PathBuf,
    /// Number of chunks to select.
    pub num_files_to_select: usize,
    /// Seed for the emission-order shuffle.
    pub seed: u64,
}

impl Default for RandomChunkConfig {
    fn default() -> Self {
        Self {
            chunk_dir: PathBuf::new(),
            out_dir: PathBuf::new(),
            num_files_to_select: DEFAULT_NUMBER_OF_CHUNKS,
            seed: FILL_SEED,
        }
    }
}

impl RandomChunkConfig {
    /// Normalize paths and check required fields.
    pub fn validated(mut self) -> Result<Self, CurateError> {
        if self.chunk_dir.as_os_str().is_empty() || self.out_dir.as_os_str().is_empty() {
            return Err(CurateError::Configuration(
                "chunk_dir and out_dir are required".to_string(),
            ));
        }
        self.chunk_dir = normalize_user_path(&self.chunk_dir);
        self.out_dir = normalize_user_path(&self.out_dir);
        Ok(self)
    }
}

/// Which config file a run reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigMode {
    /// `<name>_local.json` if present, else `<name>_template.json`.
    #[default]
    Standard,
    /// `<name>_test.json`, which must exist.
    Test,
}

/// Resolve the config file for `basename` inside `config_dir`.
pub fn resolve_config_path(
    config_dir: &Path,
    basename: &str,
    mode: ConfigMode,
) -> Result<PathBuf, CurateError> {
    let test_path = config_dir.join(format!("{basename}{TEST_SUFFIX}"));
    let local_path = config_dir.join(format!("{basename}{LOCAL_SUFFIX}"));
    let template_path = config_dir.join(format!("{basename}{TEMPLATE_SUFFIX}"));

    match mode {
        ConfigMode::Test if test_path.is_file() => Ok(test_path),
        ConfigMode::Test => Err(CurateError::Configuration(format!(
            "test mode is enabled but no test config was found; expected {}",
            test_path.display()
        ))),
        ConfigMode::Standard if local_path.is_file() => Ok(local_path),
        ConfigMode::Standard if template_path.is_file() => Ok(template_path),
        ConfigMode::Standard => Err(CurateError::Configuration(format!(
            "no config file found; expected {} or {}",
            local_path.display(),
            template_path.display()
        ))),
    }
}

/// Load and deserialize the config for `basename`.
pub fn load_config<T: DeserializeOwned>(
    config_dir: &Path,
    basename: &str,
    mode: ConfigMode,
) -> Result<T, CurateError> {
    let path = resolve_config_path(config_dir, basename, mode)?;
    let raw = fs::read_to_string(&path)?;
    let config = serde_json::from_str(&raw).map_err(|err| {
        CurateError::Configuration(format!("invalid config {}: {err}", path.display()))
    })?;
    info!(config = %path.display(), "using config");
    Ok(config)
}

/// Convert backslashes to forward slashes so Windows-style paths from shared
/// configs resolve on every platform.
pub fn normalize_user_path(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_config_takes_precedence_over_template() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("sections_template.json"),
            r#"{"sample_size": 3}"#,
        )
        .unwrap();
        let path = resolve_config_path(dir.path(), "sections", ConfigMode::Standard).unwrap();
        assert!(path.ends_with("sections_template.json"));

        fs::write(dir.path().join("sections_local.json"), r#"{"sample_size": 8}"#).unwrap();
        let config: SectionSelectionConfig =
            load_config(dir.path(), "sections", ConfigMode::Standard).unwrap();
        assert_eq!(config.sample_size, 8);
        assert_eq!(config.sample_id_token, DEFAULT_SAMPLE_ID_TOKEN);
    }

    #[test]
    fn test_mode_requires_test_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("chunks_local.json"), "{}").unwrap();
        assert!(matches!(
            resolve_config_path(dir.path(), "chunks", ConfigMode::Test),
            Err(CurateError::Configuration(_))
        ));
        fs::write(
            dir.path().join("chunks_test.json"),
            r#"{"number_of_chunks": 4, "strategy": "lazy"}"#,
        )
        .unwrap();
        let config: ChunkSelectionConfig =
            load_config(dir.path(), "chunks", ConfigMode::Test).unwrap();
        assert_eq!(config.number_of_chunks, 4);
        assert_eq!(config.strategy, GreedyStrategy::Lazy);
    }

    #[test]
    fn missing_config_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let result: Result<RandomChunkConfig, _> =
            load_config(dir.path(), "random", ConfigMode::Standard);
        assert!(matches!(result, Err(CurateError::Configuration(_))));
    }

    #[test]
    fn normalize_user_path_converts_backslashes() {
        let path = normalize_user_path(Path::new(r"Z:\lab\chunks"));
        assert_eq!(path, PathBuf::from("Z:/lab/chunks"));
    }

    #[test]
    fn section_config_validation_rejects_missing_fields() {
        assert!(SectionSelectionConfig::default().validated().is_err());
        let config = SectionSelectionConfig {
            folder_paths: vec![PathBuf::from(r"a\b")],
            out_path: PathBuf::from("out"),
            ..SectionSelectionConfig::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.folder_paths, vec![PathBuf::from("a/b")]);
    }
}
