//! Owned raster buffers and the row/width/channel operations stitching needs.
//!
//! Every operation returns a new buffer; nothing is mutated in place.

use crate::image::ImageView;
use crate::util::{StitchError, StitchResult};

/// Channel layout of a [`RasterBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    /// Single intensity channel.
    Gray,
    /// Interleaved red, green, blue.
    Rgb,
}

impl Channels {
    /// Returns the number of samples per pixel.
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }
}

/// Owned row-major raster with interleaved `u8` samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: Channels,
}

impl RasterBuffer {
    /// Wraps `data` as a `width x height` raster.
    ///
    /// `data.len()` must equal `width * height * channels.count()`.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: Channels,
    ) -> StitchResult<Self> {
        if width == 0 || height == 0 {
            return Err(StitchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels.count()))
            .ok_or(StitchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(StitchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(StitchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Wraps a single-channel buffer.
    pub fn gray(data: Vec<u8>, width: usize, height: usize) -> StitchResult<Self> {
        Self::new(data, width, height, Channels::Gray)
    }

    /// Wraps an interleaved RGB buffer.
    pub fn rgb(data: Vec<u8>, width: usize, height: usize) -> StitchResult<Self> {
        Self::new(data, width, height, Channels::Rgb)
    }

    /// Creates a raster with every sample set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        channels: Channels,
        value: u8,
    ) -> StitchResult<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels.count()))
            .ok_or(StitchError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height, channels)
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the channel layout.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Returns the raw interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the raster and returns its samples.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn row_len(&self) -> usize {
        self.width * self.channels.count()
    }

    /// Returns the samples of row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.row_len();
        self.data.get(start..start + self.row_len())
    }

    /// Returns the samples of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width {
            return None;
        }
        let n = self.channels.count();
        self.row(y).map(|row| &row[x * n..x * n + n])
    }

    /// Returns a sample view; its width is `width * channels` elements.
    pub fn view(&self) -> ImageView<'_, u8> {
        let row_len = self.row_len();
        ImageView {
            data: &self.data,
            width: row_len,
            height: self.height,
            stride: row_len,
        }
    }

    /// Converts to single-channel intensity using BT.601 luma weights.
    pub fn to_gray(&self) -> RasterBuffer {
        match self.channels {
            Channels::Gray => self.clone(),
            Channels::Rgb => {
                let data = self
                    .data
                    .chunks_exact(3)
                    .map(|px| {
                        let luma = 299 * u32::from(px[0])
                            + 587 * u32::from(px[1])
                            + 114 * u32::from(px[2]);
                        ((luma + 500) / 1000) as u8
                    })
                    .collect();
                RasterBuffer {
                    data,
                    width: self.width,
                    height: self.height,
                    channels: Channels::Gray,
                }
            }
        }
    }

    /// Converts to the requested channel layout.
    ///
    /// Gray to RGB replicates the intensity; RGB to gray uses [`Self::to_gray`].
    pub fn with_channels(&self, channels: Channels) -> RasterBuffer {
        match (self.channels, channels) {
            (Channels::Gray, Channels::Rgb) => RasterBuffer {
                data: self.data.iter().flat_map(|&v| [v, v, v]).collect(),
                width: self.width,
                height: self.height,
                channels: Channels::Rgb,
            },
            (Channels::Rgb, Channels::Gray) => self.to_gray(),
            _ => self.clone(),
        }
    }

    /// Stretches or shrinks the raster horizontally to `width`, keeping height.
    ///
    /// Sampling is bilinear with pixel-center alignment, so each output row
    /// depends only on the matching input row.
    pub fn resize_width(&self, width: usize) -> StitchResult<RasterBuffer> {
        if width == 0 {
            return Err(StitchError::InvalidDimensions {
                width,
                height: self.height,
            });
        }
        if width == self.width {
            return Ok(self.clone());
        }

        let taps = horizontal_taps(self.width, width);
        let n = self.channels.count();
        let mut data = Vec::with_capacity(width * self.height * n);
        for y in 0..self.height {
            let row = &self.data[y * self.row_len()..(y + 1) * self.row_len()];
            for &(x0, x1, t) in &taps {
                for c in 0..n {
                    let a = f32::from(row[x0 * n + c]);
                    let b = f32::from(row[x1 * n + c]);
                    let value = a + (b - a) * t;
                    data.push(value.round().clamp(0.0, 255.0) as u8);
                }
            }
        }
        RasterBuffer::new(data, width, self.height, self.channels)
    }

    /// Copies `count` rows starting at `y` into a new raster.
    pub fn crop_rows(&self, y: usize, count: usize) -> StitchResult<RasterBuffer> {
        let end = y.checked_add(count);
        if count == 0 || end.map_or(true, |end| end > self.height) {
            return Err(StitchError::RowsOutOfBounds {
                start: y,
                count,
                height: self.height,
            });
        }
        let row_len = self.row_len();
        let data = self.data[y * row_len..(y + count) * row_len].to_vec();
        RasterBuffer::new(data, self.width, count, self.channels)
    }

    /// Concatenates rasters top to bottom.
    ///
    /// All parts must share width and channel layout.
    pub fn vstack(parts: &[&RasterBuffer]) -> StitchResult<RasterBuffer> {
        let first = parts.first().ok_or(StitchError::EmptyInput)?;
        let mut height = 0usize;
        for part in parts {
            if part.width != first.width {
                return Err(StitchError::ShapeMismatch {
                    context: "vstack parts differ in width",
                });
            }
            if part.channels != first.channels {
                return Err(StitchError::ShapeMismatch {
                    context: "vstack parts differ in channels",
                });
            }
            height += part.height;
        }

        let mut data = Vec::with_capacity(height * first.row_len());
        for part in parts {
            data.extend_from_slice(&part.data);
        }
        RasterBuffer::new(data, first.width, height, first.channels)
    }
}

/// Per output column: left source column, right source column, blend weight.
fn horizontal_taps(src_width: usize, dst_width: usize) -> Vec<(usize, usize, f32)> {
    let scale = src_width as f32 / dst_width as f32;
    let last = src_width - 1;
    (0..dst_width)
        .map(|dx| {
            let fx = (dx as f32 + 0.5) * scale - 0.5;
            if fx <= 0.0 {
                return (0, 0, 0.0);
            }
            let x0 = fx.floor() as usize;
            if x0 >= last {
                return (last, last, 0.0);
            }
            (x0, x0 + 1, fx - x0 as f32)
        })
        .collect()
}
