/// Opaque per-sample reproducibility handle, usually an accession id.
/// Example: `240117` from `LSFM_2024_brain_left_stitched_240117_488nm`
pub type SampleKey = String;
/// Integer label identifying an atlas region in a label chunk.
/// Examples: `0` (background), `315`, `1089`
pub type RegionId = u32;
/// Position of a chunk in the sorted chunk pool.
pub type ChunkIndex = usize;
/// Position of a section in the sorted section pool (depth order).
pub type SectionIndex = usize;
/// Seed derived from a sample key digest.
pub type KeySeed = u32;
/// File name strings carried in reports and manifests.
/// Example: `240117_MIP_0042.tif`
pub type FileName = String;
/// Name of a curation pipeline recorded in manifests.
/// Examples: `select_sections`, `select_chunks`
pub type PipelineName = String;
