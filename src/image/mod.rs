//! Raster buffers and borrowed views.
//!
//! [`RasterBuffer`] owns decoded pixels (gray or RGB, interleaved, row-major).
//! [`ImageView`] is a borrowed 2D view into a 1D buffer with an explicit
//! stride; the correlation kernels operate on single-channel views. Row strips
//! taken with [`ImageView::rows`] are zero-copy and retain the original stride.

use crate::util::{StitchError, StitchResult};

#[cfg(feature = "image-io")]
pub mod io;
mod raster;

pub use raster::{Channels, RasterBuffer};

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> StitchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> StitchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(StitchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the view width in elements.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the view height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy view of `count` full-width rows starting at `y`.
    pub fn rows(&self, y: usize, count: usize) -> StitchResult<ImageView<'a, T>> {
        let out_of_bounds = StitchError::RowsOutOfBounds {
            start: y,
            count,
            height: self.height,
        };
        if count == 0 {
            return Err(out_of_bounds);
        }
        let end = y.checked_add(count).ok_or(out_of_bounds.clone())?;
        if end > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .ok_or(StitchError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(StitchError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        ImageView::new(data, self.width, count, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> StitchResult<usize> {
    if width == 0 || height == 0 {
        return Err(StitchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(StitchError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(StitchError::InvalidDimensions { width, height })?;
    Ok(needed)
}
