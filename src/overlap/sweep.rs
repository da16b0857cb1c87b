//! Candidate generation and per-candidate scoring.

use crate::config::{SearchRegion, StitchConfig};
use crate::image::RasterBuffer;
use crate::kernel::scan_vertical;
use crate::overlap::CandidateScore;
use crate::template::TemplatePlan;
use crate::util::{StitchError, StitchResult};
use crate::ImageView;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Returns the `(exclusive min, inclusive max)` candidate overlap sizes.
///
/// Both bounds are fractions of the shorter image, floored. A bottom-fraction
/// search region additionally caps the maximum by the upper image height.
pub fn overlap_bounds(
    upper_height: usize,
    lower_height: usize,
    cfg: &StitchConfig,
) -> (usize, usize) {
    let shorter = upper_height.min(lower_height) as f64;
    let min_overlap = (shorter * cfg.min_overlap_ratio).floor() as usize;
    let mut max_overlap = (shorter * cfg.max_overlap_ratio).floor() as usize;
    if let SearchRegion::BottomFraction(fraction) = cfg.search_region {
        let cap = (upper_height as f64 * fraction).floor() as usize;
        max_overlap = max_overlap.min(cap);
    }
    (min_overlap, max_overlap)
}

/// Lists candidate sizes from `max_overlap` down, stopping above `min_overlap`.
pub fn candidate_sizes(min_overlap: usize, max_overlap: usize, step: usize) -> Vec<usize> {
    if min_overlap >= max_overlap {
        return Vec::new();
    }
    (min_overlap + 1..=max_overlap)
        .rev()
        .step_by(step.max(1))
        .collect()
}

/// Converts both images to intensity at a common width.
///
/// The narrower image is stretched to the wider width. The stretch is purely
/// horizontal, so resampling whole images once is equivalent to resampling
/// each template and window strip separately.
pub(crate) fn normalized_intensity(
    upper: &RasterBuffer,
    lower: &RasterBuffer,
) -> StitchResult<(RasterBuffer, RasterBuffer)> {
    let width = upper.width().max(lower.width());
    let upper_gray = upper.to_gray().resize_width(width)?;
    let lower_gray = lower.to_gray().resize_width(width)?;
    Ok((upper_gray, lower_gray))
}

fn score_candidate(
    upper: ImageView<'_, u8>,
    lower: ImageView<'_, u8>,
    overlap: usize,
    cfg: &StitchConfig,
) -> StitchResult<Option<CandidateScore>> {
    let window_rows = overlap.saturating_add(cfg.search_margin).min(lower.height());
    if overlap == 0 || overlap > upper.height() || overlap > window_rows {
        return Ok(None);
    }

    let template = upper.rows(upper.height() - overlap, overlap)?;
    let window = lower.rows(0, window_rows)?;
    let plan = match TemplatePlan::from_view(template) {
        Ok(plan) => plan,
        Err(StitchError::DegenerateTemplate { .. }) => return Ok(None),
        Err(err) => return Err(err),
    };

    let peak = scan_vertical(window, &plan, cfg.min_var_i)?;
    Ok(peak.map(|peak| CandidateScore {
        overlap,
        score: peak.score.min(1.0),
        y: peak.y,
    }))
}

/// Scores every candidate size, preserving sweep order.
pub(crate) fn score_candidates(
    upper: &RasterBuffer,
    lower: &RasterBuffer,
    sizes: &[usize],
    cfg: &StitchConfig,
) -> StitchResult<Vec<CandidateScore>> {
    let upper_view = upper.view();
    let lower_view = lower.view();

    #[cfg(feature = "rayon")]
    if cfg.parallel {
        // Collecting an indexed parallel iterator keeps sweep order, so the
        // sequential tie-break in `select_best` sees the same sequence.
        let scored: Vec<_> = sizes
            .par_iter()
            .map(|&overlap| score_candidate(upper_view, lower_view, overlap, cfg))
            .collect();
        let mut out = Vec::with_capacity(scored.len());
        for result in scored {
            out.extend(result?);
        }
        return Ok(out);
    }

    let mut out = Vec::with_capacity(sizes.len());
    for &overlap in sizes {
        out.extend(score_candidate(upper_view, lower_view, overlap, cfg)?);
    }
    Ok(out)
}
