//! Overlap location between consecutive captures.
//!
//! The locator sweeps candidate overlap sizes from large to small. For each
//! size `s` the bottom `s` rows of the upper image become a template that is
//! correlated (ZNCC) against the top `s + search_margin` rows of the lower
//! image. The best qualifying size `s`, matched at lower row `y`, gives the
//! offset `height(upper) - s - y`, so overlaps between sweep sizes are still
//! resolved to the exact row.

mod sweep;

use crate::config::StitchConfig;
use crate::image::RasterBuffer;
use crate::trace::{trace_event, trace_span};
use crate::util::StitchResult;

pub use sweep::{candidate_sizes, overlap_bounds};

/// Scores closer than this are treated as ties during best-candidate selection.
pub const SCORE_TIE_TOLERANCE: f64 = 1e-9;

/// Outcome of locating the overlap between two images.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlapResult {
    /// No candidate reached the threshold; the images are concatenated.
    NotFound,
    /// Rows `offset..` of the upper image repeat at the top of the lower one.
    Found {
        /// First duplicated row of the upper image.
        offset: usize,
        /// ZNCC score of the winning candidate, in `[0, 1]`.
        confidence: f64,
    },
}

impl OverlapResult {
    /// Returns the offset when an overlap was found.
    pub fn offset(&self) -> Option<usize> {
        match *self {
            OverlapResult::Found { offset, .. } => Some(offset),
            OverlapResult::NotFound => None,
        }
    }

    /// Returns the confidence when an overlap was found.
    pub fn confidence(&self) -> Option<f64> {
        match *self {
            OverlapResult::Found { confidence, .. } => Some(confidence),
            OverlapResult::NotFound => None,
        }
    }

    /// Returns `true` for [`OverlapResult::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, OverlapResult::Found { .. })
    }
}

/// Best placement for one candidate overlap size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateScore {
    /// Candidate overlap size in rows.
    pub overlap: usize,
    /// Best ZNCC score, clamped to at most 1.
    pub score: f64,
    /// Row of the lower image where the template matched best.
    pub y: usize,
}

/// Full record of one overlap sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlapSweep {
    /// Exclusive lower bound on candidate sizes.
    pub min_overlap: usize,
    /// Inclusive upper bound on candidate sizes.
    pub max_overlap: usize,
    /// Scored candidates in sweep order (largest size first).
    pub candidates: Vec<CandidateScore>,
    /// Selected result.
    pub result: OverlapResult,
}

/// Locates the overlap between `upper` and `lower`.
///
/// Images too short to produce any candidate yield
/// [`OverlapResult::NotFound`] rather than an error.
pub fn locate(
    upper: &RasterBuffer,
    lower: &RasterBuffer,
    cfg: &StitchConfig,
) -> StitchResult<OverlapResult> {
    Ok(sweep(upper, lower, cfg)?.result)
}

/// Runs the candidate sweep and returns every candidate score.
pub fn sweep(
    upper: &RasterBuffer,
    lower: &RasterBuffer,
    cfg: &StitchConfig,
) -> StitchResult<OverlapSweep> {
    let _span = trace_span!(
        "locate_overlap",
        upper_height = upper.height(),
        lower_height = lower.height()
    )
    .entered();

    let (min_overlap, max_overlap) = overlap_bounds(upper.height(), lower.height(), cfg);
    if min_overlap >= max_overlap {
        trace_event!("overlap_degenerate", min = min_overlap, max = max_overlap);
        return Ok(OverlapSweep {
            min_overlap,
            max_overlap,
            candidates: Vec::new(),
            result: OverlapResult::NotFound,
        });
    }

    let (upper_gray, lower_gray) = sweep::normalized_intensity(upper, lower)?;
    let sizes = candidate_sizes(min_overlap, max_overlap, cfg.sweep_step);
    let candidates = sweep::score_candidates(&upper_gray, &lower_gray, &sizes, cfg)?;

    let result = match select_best(&candidates, cfg.overlap_threshold) {
        Some(best) => OverlapResult::Found {
            offset: overlap_offset(upper.height(), &best),
            confidence: best.score.clamp(0.0, 1.0),
        },
        None => OverlapResult::NotFound,
    };

    match result {
        OverlapResult::Found { offset, confidence } => {
            trace_event!("overlap_found", offset = offset, confidence = confidence);
        }
        OverlapResult::NotFound => {
            trace_event!("overlap_not_found", candidates = candidates.len());
        }
    }

    Ok(OverlapSweep {
        min_overlap,
        max_overlap,
        candidates,
        result,
    })
}

/// First upper row duplicated in the lower image for a winning candidate.
///
/// The template's first row sits at lower row `y`, so lower row 0 lines up
/// with upper row `h_upper - overlap - y`. This resolves overlaps that fall
/// between sweep sizes to the exact row.
pub fn overlap_offset(upper_height: usize, best: &CandidateScore) -> usize {
    upper_height.saturating_sub(best.overlap.saturating_add(best.y))
}

/// Picks the winning candidate in sweep order.
///
/// Only scores at or above `threshold` qualify. A later candidate replaces the
/// current best only when it scores higher by more than
/// [`SCORE_TIE_TOLERANCE`], so the earliest (largest) size wins ties. This is
/// deliberately looser than a plain `>`: a later score that is higher by at
/// most the tolerance is treated as rounding noise and does not replace the
/// best.
pub fn select_best(candidates: &[CandidateScore], threshold: f64) -> Option<CandidateScore> {
    let mut best: Option<CandidateScore> = None;
    for candidate in candidates {
        if candidate.score < threshold {
            continue;
        }
        if best.map_or(true, |b| candidate.score > b.score + SCORE_TIE_TOLERANCE) {
            best = Some(*candidate);
        }
    }
    best
}
