//! Binarization ahead of text recognition.
//!
//! The pipeline is grayscale, a 3x3 Gaussian blur, then an adaptive Gaussian
//! threshold. The blur mirrors the image at its borders without repeating the
//! edge pixel; the threshold's local mean replicates the edge pixel.

use crate::image::RasterBuffer;
use crate::util::StitchResult;

/// Neighbourhood size of the adaptive threshold.
pub const THRESHOLD_BLOCK: usize = 11;
/// Constant subtracted from the local mean.
pub const THRESHOLD_C: i32 = 2;

/// Returns a normalized 1D Gaussian kernel.
///
/// With a non-positive `sigma`, sizes up to 7 use the fixed binomial taps and
/// larger sizes derive sigma as `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let size = size.max(1) | 1;
    if sigma <= 0.0 {
        match size {
            1 => return vec![1.0],
            3 => return vec![0.25, 0.5, 0.25],
            5 => return vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
            7 => {
                return vec![
                    0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
                ]
            }
            _ => {}
        }
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let half = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// How samples outside the image are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Border {
    /// `dcb|abcd|cba`
    Reflect101,
    /// `aaa|abcd|ddd`
    Replicate,
}

impl Border {
    fn index(self, i: isize, len: usize) -> usize {
        let last = len as isize - 1;
        match self {
            Border::Replicate => i.clamp(0, last) as usize,
            Border::Reflect101 if last == 0 => 0,
            Border::Reflect101 => {
                let period = 2 * last;
                let i = i.rem_euclid(period);
                (if i > last { period - i } else { i }) as usize
            }
        }
    }
}

/// Separable convolution of a single-channel buffer, returning `f32` samples.
fn convolve(
    data: &[u8],
    width: usize,
    height: usize,
    kernel: &[f32],
    border: Border,
) -> Vec<f32> {
    let half = (kernel.len() / 2) as isize;
    let at = |v: isize, len: usize| border.index(v, len);

    let mut horizontal = vec![0.0f32; width * height];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = at(x as isize + k as isize - half, width);
                acc += w * f32::from(row[sx]);
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut out = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = at(y as isize + k as isize - half, height);
                acc += w * horizontal[sy * width + x];
            }
            out[y * width + x] = acc;
        }
    }
    out
}

fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Blurs a raster with a Gaussian kernel of odd `size`, after converting it to
/// intensity.
pub fn gaussian_blur(
    image: &RasterBuffer,
    size: usize,
    sigma: f32,
) -> StitchResult<RasterBuffer> {
    let gray = image.to_gray();
    let kernel = gaussian_kernel(size, sigma);
    let data = convolve(
        gray.data(),
        gray.width(),
        gray.height(),
        &kernel,
        Border::Reflect101,
    )
        .into_iter()
        .map(to_u8)
        .collect();
    RasterBuffer::gray(data, gray.width(), gray.height())
}

/// Binarizes against a Gaussian-weighted local mean.
///
/// A pixel becomes 255 when it is brighter than `mean - c`, else 0.
pub fn adaptive_threshold(
    image: &RasterBuffer,
    block: usize,
    c: i32,
) -> StitchResult<RasterBuffer> {
    let gray = image.to_gray();
    let kernel = gaussian_kernel(block, 0.0);
    let means = convolve(
        gray.data(),
        gray.width(),
        gray.height(),
        &kernel,
        Border::Replicate,
    );
    let data = gray
        .data()
        .iter()
        .zip(means)
        .map(|(&v, mean)| {
            if i32::from(v) - i32::from(to_u8(mean)) > -c {
                255
            } else {
                0
            }
        })
        .collect();
    RasterBuffer::gray(data, gray.width(), gray.height())
}

/// Full OCR preprocessing: 3x3 blur then adaptive threshold.
pub fn binarize(image: &RasterBuffer) -> StitchResult<RasterBuffer> {
    let blurred = gaussian_blur(image, 3, 0.0)?;
    adaptive_threshold(&blurred, THRESHOLD_BLOCK, THRESHOLD_C)
}

#[cfg(test)]
mod tests {
    use super::{binarize, gaussian_blur, gaussian_kernel, Border};
    use crate::image::{Channels, RasterBuffer};

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(3, 0.0);
        assert_eq!(kernel.len(), 3);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!((kernel[0] - kernel[2]).abs() < 1e-6);
        assert_eq!(kernel[0], 0.25);

        let wide = gaussian_kernel(11, 0.0);
        assert_eq!(wide.len(), 11);
        assert!(wide[5] > wide[4] && wide[4] > wide[0]);
    }

    #[test]
    fn border_modes_map_outside_indices() {
        let reflect: Vec<usize> = (-3..7).map(|i| Border::Reflect101.index(i, 4)).collect();
        assert_eq!(reflect, [3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);
        let replicate: Vec<usize> = (-2..6).map(|i| Border::Replicate.index(i, 4)).collect();
        assert_eq!(replicate, [0, 0, 0, 1, 2, 3, 3, 3]);
        assert_eq!(Border::Reflect101.index(-5, 1), 0);
    }

    #[test]
    fn blur_mirrors_edges_without_repeating_them() {
        let strip = RasterBuffer::gray(vec![0, 100, 100, 100], 4, 1).unwrap();
        let blurred = gaussian_blur(&strip, 3, 0.0).unwrap();
        assert_eq!(blurred.data(), &[50, 75, 100, 100]);
    }

    #[test]
    fn flat_page_turns_white() {
        let page = RasterBuffer::filled(20, 20, Channels::Rgb, 230).unwrap();
        let out = binarize(&page).unwrap();
        assert_eq!(out.channels(), Channels::Gray);
        assert!(out.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn dark_stroke_on_light_page_turns_black() {
        let mut data = vec![240u8; 21 * 21];
        for y in 8..13 {
            for x in 8..13 {
                data[y * 21 + x] = 20;
            }
        }
        let page = RasterBuffer::gray(data, 21, 21).unwrap();
        let out = binarize(&page).unwrap();
        assert_eq!(out.pixel(10, 10), Some(&[0u8][..]));
        assert_eq!(out.pixel(0, 0), Some(&[255u8][..]));
    }
}
