/// Folder listing, sample-key extraction, chunk pairing, and file copies.
pub mod fs;
/// TIFF label reading and stack writing.
pub mod tiff_io;
