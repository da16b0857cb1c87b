//! Loading and saving rasters via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Channels, RasterBuffer};
use crate::util::{StitchError, StitchResult};
use image::{ColorType, DynamicImage, GrayImage, RgbImage};
use std::path::{Path, PathBuf};

/// Converts a decoded image into a raster.
///
/// Luma images (with or without alpha) become [`Channels::Gray`]; everything
/// else is flattened to [`Channels::Rgb`], dropping alpha.
pub fn raster_from_dynamic_image(img: &DynamicImage) -> StitchResult<RasterBuffer> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    match img.color() {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            RasterBuffer::gray(img.to_luma8().into_raw(), width, height)
        }
        _ => RasterBuffer::rgb(img.to_rgb8().into_raw(), width, height),
    }
}

/// Converts a raster into an `image` crate buffer for encoding.
pub fn dynamic_image_from_raster(raster: &RasterBuffer) -> StitchResult<DynamicImage> {
    let width = u32::try_from(raster.width()).map_err(|_| StitchError::InvalidDimensions {
        width: raster.width(),
        height: raster.height(),
    })?;
    let height = u32::try_from(raster.height()).map_err(|_| StitchError::InvalidDimensions {
        width: raster.width(),
        height: raster.height(),
    })?;
    let data = raster.data().to_vec();
    let needed = raster.data().len();
    let img = match raster.channels() {
        Channels::Gray => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        Channels::Rgb => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
    };
    img.ok_or(StitchError::BufferTooSmall { needed, got: needed })
}

/// Loads an image from disk.
///
/// A missing path yields [`StitchError::InputNotFound`]; anything the codec
/// rejects yields [`StitchError::Decode`].
pub fn load_raster<P: AsRef<Path>>(path: P) -> StitchResult<RasterBuffer> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StitchError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let img = image::open(path).map_err(|err| StitchError::Decode {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    raster_from_dynamic_image(&img)
}

/// Encodes a raster to disk; the format follows the file extension.
pub fn save_raster<P: AsRef<Path>>(raster: &RasterBuffer, path: P) -> StitchResult<()> {
    let path = path.as_ref();
    let img = dynamic_image_from_raster(raster)?;
    img.save(path).map_err(|err| StitchError::Write {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Checks that every path exists and is a regular file.
///
/// Stops at the first bad path so nothing is stitched from a partial list.
pub fn validate_inputs<P: AsRef<Path>>(paths: &[P]) -> StitchResult<Vec<PathBuf>> {
    let mut validated = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StitchError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(StitchError::InputNotAFile {
                path: path.to_path_buf(),
            });
        }
        validated.push(path.to_path_buf());
    }
    Ok(validated)
}
