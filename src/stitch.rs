//! Pairwise stitching of two consecutive captures.

use crate::config::StitchConfig;
use crate::image::{Channels, RasterBuffer};
use crate::overlap::{locate, OverlapResult};
use crate::trace::{trace_event, trace_span};
use crate::util::StitchResult;

/// Composite of two captures together with the overlap that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct PairStitch {
    /// Merged raster.
    pub image: RasterBuffer,
    /// Overlap used for the merge.
    pub overlap: OverlapResult,
}

/// Locates the overlap between `upper` and `lower` and merges them.
pub fn stitch_pair(
    upper: &RasterBuffer,
    lower: &RasterBuffer,
    cfg: &StitchConfig,
) -> StitchResult<PairStitch> {
    let _span = trace_span!("stitch_pair").entered();
    let overlap = locate(upper, lower, cfg)?;
    let image = merge(upper, lower, overlap)?;
    trace_event!(
        "pair_stitched",
        width = image.width(),
        height = image.height()
    );
    Ok(PairStitch { image, overlap })
}

/// Merges two captures given a known overlap.
///
/// Both sides are first brought to the wider width and the richer channel
/// layout. With an overlap, the upper rows from `offset` on are dropped and the
/// lower image is kept whole; otherwise the two are concatenated.
pub fn merge(
    upper: &RasterBuffer,
    lower: &RasterBuffer,
    overlap: OverlapResult,
) -> StitchResult<RasterBuffer> {
    let (upper, lower) = normalize_pair(upper, lower)?;
    match overlap.offset() {
        Some(0) => Ok(lower),
        Some(offset) => {
            let kept = upper.crop_rows(0, offset.min(upper.height()))?;
            RasterBuffer::vstack(&[&kept, &lower])
        }
        None => RasterBuffer::vstack(&[&upper, &lower]),
    }
}

/// Stretches the narrower image to the wider width and promotes gray to RGB
/// when the other side is RGB.
pub fn normalize_pair(
    upper: &RasterBuffer,
    lower: &RasterBuffer,
) -> StitchResult<(RasterBuffer, RasterBuffer)> {
    let channels = if upper.channels() == Channels::Rgb || lower.channels() == Channels::Rgb {
        Channels::Rgb
    } else {
        Channels::Gray
    };
    let width = upper.width().max(lower.width());
    let upper = upper.with_channels(channels).resize_width(width)?;
    let lower = lower.with_channels(channels).resize_width(width)?;
    Ok((upper, lower))
}
