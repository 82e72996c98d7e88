use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::constants::files::{ATLAS_MARKER, CHUNK_MARKER, TIFF_EXTENSIONS};
use crate::errors::CurateError;
use crate::types::SampleKey;

/// True if the path has a `.tif`/`.tiff` extension (case-insensitive).
pub fn is_tiff_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TIFF_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
        .unwrap_or(false)
}

/// TIFF files directly inside `dir`, sorted by file name.
///
/// Sort order is the pool order the selectors index into; for section folders
/// it is the physical depth order.
pub fn list_tiffs(dir: &Path) -> Result<Vec<PathBuf>, CurateError> {
    if !dir.is_dir() {
        return Err(CurateError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("directory does not exist: {}", dir.display()),
        )));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| CurateError::Io(err.into()))?;
        if entry.file_type().is_file() && is_tiff_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Like [`list_tiffs`], but an empty folder is an error.
pub fn require_tiffs(dir: &Path) -> Result<Vec<PathBuf>, CurateError> {
    let files = list_tiffs(dir)?;
    if files.is_empty() {
        return Err(CurateError::EmptyInput(dir.to_path_buf()));
    }
    Ok(files)
}

/// Sample key taken from the parent folder name of a section folder.
///
/// The parent name is split on `_` and the token at `token_index` is the key.
pub fn sample_key_from_folder(section_dir: &Path, token_index: usize) -> Result<SampleKey, CurateError> {
    let folder = section_dir
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .ok_or_else(|| CurateError::MalformedKey {
            folder: section_dir.display().to_string(),
            reason: "section folder has no named parent".to_string(),
        })?;
    sample_key_from_name(folder, token_index)
}

/// Token `token_index` of an underscore-delimited folder name.
pub fn sample_key_from_name(folder: &str, token_index: usize) -> Result<SampleKey, CurateError> {
    let parts: Vec<&str> = folder.split('_').collect();
    match parts.get(token_index) {
        Some(token) if !token.is_empty() => Ok((*token).to_string()),
        Some(_) => Err(CurateError::MalformedKey {
            folder: folder.to_string(),
            reason: format!("token {token_index} is empty"),
        }),
        None => Err(CurateError::MalformedKey {
            folder: folder.to_string(),
            reason: format!(
                "expected at least {} underscore-separated parts, found {}",
                token_index + 1,
                parts.len()
            ),
        }),
    }
}

/// File name of the image chunk paired with an atlas chunk.
///
/// `brainA_MIP_0042_atlas_chunk_7.tif` pairs with `brainA_MIP_0042_chunk_7.tif`.
pub fn paired_image_name(atlas_chunk: &Path) -> Option<String> {
    let stem = atlas_chunk.file_stem()?.to_str()?;
    let base = stem.split(ATLAS_MARKER).next()?;
    let number = stem.rsplit(CHUNK_MARKER).next()?;
    Some(format!("{base}_{CHUNK_MARKER}{number}.tif"))
}

/// Path of the image chunk paired with `atlas_chunk` inside `chunk_dir`.
pub fn paired_image_path(chunk_dir: &Path, atlas_chunk: &Path) -> Result<PathBuf, CurateError> {
    let name = paired_image_name(atlas_chunk).ok_or_else(|| CurateError::MissingPair {
        atlas: atlas_chunk.to_path_buf(),
        expected: chunk_dir.to_path_buf(),
    })?;
    let path = chunk_dir.join(name);
    if !path.is_file() {
        return Err(CurateError::MissingPair {
            atlas: atlas_chunk.to_path_buf(),
            expected: path,
        });
    }
    Ok(path)
}

/// Copy `src` into `dest_dir` as `name`, creating the folder as needed.
pub fn copy_as(src: &Path, dest_dir: &Path, name: &str) -> Result<PathBuf, CurateError> {
    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(name);
    fs::copy(src, &dest)?;
    Ok(dest)
}

/// File name of `path` as an owned string (lossy).
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
