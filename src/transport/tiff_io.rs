//! Minimal TIFF access for the curation pipelines: region-id extraction from
//! atlas label chunks and multi-page stack writing from section files.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype};

use crate::coverage::RegionSet;
use crate::errors::CurateError;

/// Pixel buffer of one grayscale page.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaneData {
    /// 8-bit samples.
    U8(Vec<u8>),
    /// 16-bit samples.
    U16(Vec<u16>),
}

/// One grayscale TIFF page.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major samples.
    pub data: PlaneData,
}

impl Plane {
    fn same_layout(&self, other: &Plane) -> bool {
        self.width == other.width
            && self.height == other.height
            && matches!(
                (&self.data, &other.data),
                (PlaneData::U8(_), PlaneData::U8(_)) | (PlaneData::U16(_), PlaneData::U16(_))
            )
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, CurateError> {
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file)).map_err(|err| CurateError::tiff(path, err))
}

/// Distinct label values of the first page of a label TIFF.
pub fn read_region_ids(path: &Path) -> Result<RegionSet, CurateError> {
    let mut decoder = open_decoder(path)?;
    let image = decoder
        .read_image()
        .map_err(|err| CurateError::tiff(path, err))?;
    let regions = match image {
        DecodingResult::U8(values) => values.into_iter().map(u32::from).collect(),
        DecodingResult::U16(values) => values.into_iter().map(u32::from).collect(),
        DecodingResult::U32(values) => values.into_iter().collect(),
        _ => {
            return Err(CurateError::UnsupportedImage {
                path: path.to_path_buf(),
                details: "label chunks must hold u8, u16 or u32 region ids".to_string(),
            });
        }
    };
    Ok(regions)
}

/// Read the first page of a grayscale 8- or 16-bit TIFF.
pub fn read_plane(path: &Path) -> Result<Plane, CurateError> {
    let mut decoder = open_decoder(path)?;
    let colortype = decoder
        .colortype()
        .map_err(|err| CurateError::tiff(path, err))?;
    if !matches!(colortype, ColorType::Gray(8) | ColorType::Gray(16)) {
        return Err(CurateError::UnsupportedImage {
            path: path.to_path_buf(),
            details: format!("expected 8- or 16-bit grayscale, found {colortype:?}"),
        });
    }
    let (width, height) = decoder
        .dimensions()
        .map_err(|err| CurateError::tiff(path, err))?;
    let data = match decoder
        .read_image()
        .map_err(|err| CurateError::tiff(path, err))?
    {
        DecodingResult::U8(values) => PlaneData::U8(values),
        DecodingResult::U16(values) => PlaneData::U16(values),
        _ => {
            return Err(CurateError::UnsupportedImage {
                path: path.to_path_buf(),
                details: "unexpected sample format".to_string(),
            });
        }
    };
    Ok(Plane {
        width,
        height,
        data,
    })
}

/// Write `planes` to `dest` as one multi-page TIFF, in order.
pub fn write_planes(dest: &Path, planes: &[Plane]) -> Result<(), CurateError> {
    let file = File::create(dest)?;
    let mut encoder =
        TiffEncoder::new(BufWriter::new(file)).map_err(|err| CurateError::tiff(dest, err))?;
    for plane in planes {
        let written = match &plane.data {
            PlaneData::U8(values) => {
                encoder.write_image::<colortype::Gray8>(plane.width, plane.height, values)
            }
            PlaneData::U16(values) => {
                encoder.write_image::<colortype::Gray16>(plane.width, plane.height, values)
            }
        };
        written.map_err(|err| CurateError::tiff(dest, err))?;
    }
    Ok(())
}

/// Stack the first pages of `sections` (depth order) into `dest`.
///
/// All sections must share dimensions and bit depth. Returns the page count.
pub fn write_stack<P: AsRef<Path>>(sections: &[P], dest: &Path) -> Result<usize, CurateError> {
    let mut planes: Vec<Plane> = Vec::with_capacity(sections.len());
    for section in sections {
        let section = section.as_ref();
        let plane = read_plane(section)?;
        if let Some(first) = planes.first()
            && !first.same_layout(&plane)
        {
            return Err(CurateError::UnsupportedImage {
                path: section.to_path_buf(),
                details: format!(
                    "stack members must share size and bit depth; member is {}x{}, stack is {}x{}",
                    plane.width, plane.height, first.width, first.height
                ),
            });
        }
        planes.push(plane);
    }
    write_planes(dest, &planes)?;
    Ok(planes.len())
}

/// Number of pages in a TIFF file.
pub fn page_count(path: &Path) -> Result<usize, CurateError> {
    let mut decoder = open_decoder(path)?;
    let mut pages = 1;
    while decoder.more_images() {
        decoder
            .next_image()
            .map_err(|err| CurateError::tiff(path, err))?;
        pages += 1;
    }
    Ok(pages)
}
