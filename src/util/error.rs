//! Error types for scrollstitch.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for scrollstitch operations.
pub type StitchResult<T> = std::result::Result<T, StitchError>;

/// Errors that can occur while loading, stitching, or reading images.
///
/// Missing overlap is not an error; the locator reports it as
/// [`OverlapResult::NotFound`](crate::OverlapResult::NotFound).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StitchError {
    /// Width or height is zero, or the element count overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The backing buffer does not hold enough elements.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The row stride is smaller than the row width.
    #[error("invalid stride: width {width}, stride {stride}")]
    InvalidStride { width: usize, stride: usize },
    /// A row range falls outside the image.
    #[error("rows {start}..{start}+{count} out of bounds for height {height}")]
    RowsOutOfBounds {
        start: usize,
        count: usize,
        height: usize,
    },
    /// Buffers that must agree in width or channel count do not.
    #[error("shape mismatch: {context}")]
    ShapeMismatch { context: &'static str },
    /// The template carries no signal to correlate against.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The pipeline received no inputs.
    #[error("no images provided")]
    EmptyInput,
    /// An input path does not exist.
    #[error("image file not found: {}", path.display())]
    InputNotFound { path: PathBuf },
    /// An input path exists but is not a regular file.
    #[error("not a file: {}", path.display())]
    InputNotAFile { path: PathBuf },
    /// An input could not be decoded.
    #[error("could not read image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    /// An output could not be written.
    #[error("could not write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
    /// The OCR engine failed.
    #[error("ocr failed: {reason}")]
    Ocr { reason: String },
    /// OCR ran but produced no text.
    #[error("no text was extracted from the image")]
    NoTextExtracted,
}
