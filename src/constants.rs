/// Constants used by the spaced section sampler.
pub mod sections {
    /// Extra slots reserved on top of the requested count so the head and tail
    /// sections (usually near-empty background) can be trimmed.
    pub const TRIM_RESERVE: usize = 2;
    /// Default underscore-token index of the sample key inside a folder name.
    pub const DEFAULT_SAMPLE_ID_TOKEN: usize = 5;
    /// Default number of representative sections per sample.
    pub const DEFAULT_SAMPLE_SIZE: usize = 10;
    /// Default stack depth for stack mode.
    pub const DEFAULT_STACK_DEPTH: usize = 5;
    /// Marker between the sample key and the member range in stack file names.
    pub const STACK_MARKER: &str = "zstack";
}

/// Constants used by the region-coverage chunk selector.
pub mod coverage {
    /// Fixed seed for the label-agnostic fill phase.
    pub const FILL_SEED: u64 = 12345;
    /// Default number of chunks to select.
    pub const DEFAULT_NUMBER_OF_CHUNKS: usize = 100;
    /// Region id used for background pixels in atlas label chunks.
    pub const BACKGROUND_REGION: u32 = 0;
}

/// Constants used by file discovery and paired-chunk naming.
pub mod files {
    /// Accepted TIFF extensions (compared case-insensitively).
    pub const TIFF_EXTENSIONS: [&str; 2] = ["tif", "tiff"];
    /// Marker separating the chunk base name from the atlas suffix.
    pub const ATLAS_MARKER: &str = "_atlas";
    /// Marker preceding the chunk number in chunk file stems.
    pub const CHUNK_MARKER: &str = "chunk_";
    /// Output folder (sibling of the chunk folder) for selected image chunks.
    pub const SELECTED_IMAGE_DIR: &str = "selected_image_chunks";
    /// Output folder (sibling of the chunk folder) for selected atlas chunks.
    pub const SELECTED_ATLAS_DIR: &str = "selected_atlas_chunks";
    /// File name of the JSON manifest written next to curated outputs.
    pub const MANIFEST_FILENAME: &str = "selection_manifest.json";
}

/// Constants used by config-file resolution.
pub mod config {
    /// Directory (relative to the working directory by default) holding config files.
    pub const DEFAULT_CONFIG_DIR: &str = "configs";
    /// Suffix of the config used when test mode is enabled.
    pub const TEST_SUFFIX: &str = "_test.json";
    /// Suffix of the user-local (uncommitted) config.
    pub const LOCAL_SUFFIX: &str = "_local.json";
    /// Suffix of the committed template config.
    pub const TEMPLATE_SUFFIX: &str = "_template.json";
    /// Config basename for section selection.
    pub const SECTIONS_BASENAME: &str = "select_representative_sections";
    /// Config basename for coverage-based chunk selection.
    pub const CHUNKS_BASENAME: &str = "select_representative_chunks";
    /// Config basename for random spaced chunk selection.
    pub const RANDOM_CHUNKS_BASENAME: &str = "select_random_chunks";
}

/// Pipeline names recorded in manifests and logs.
pub mod pipelines {
    /// Section selection pipeline.
    pub const SELECT_SECTIONS: &str = "select_sections";
    /// Coverage-based chunk selection pipeline.
    pub const SELECT_CHUNKS: &str = "select_chunks";
    /// Random spaced chunk selection pipeline.
    pub const SELECT_RANDOM_CHUNKS: &str = "select_random_chunks";
}
