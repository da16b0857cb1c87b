//! Stitching configuration.

use crate::util::{StitchError, StitchResult};

/// Which part of the upper image may supply overlap templates.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum SearchRegion {
    /// Every candidate size between the overlap ratios is tried.
    #[default]
    Unbounded,
    /// Candidate sizes are capped at this fraction of the upper image height.
    BottomFraction(f64),
}

/// Immutable parameters for overlap location and stitching.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StitchConfig {
    /// Minimum ZNCC confidence, in `[0, 1]`, to accept an overlap.
    pub overlap_threshold: f64,
    /// Smallest overlap as a fraction of the shorter image (exclusive bound).
    pub min_overlap_ratio: f64,
    /// Largest overlap as a fraction of the shorter image.
    pub max_overlap_ratio: f64,
    /// Row stride between candidate overlap sizes.
    pub sweep_step: usize,
    /// Extra rows of the lower image searched beyond the candidate size.
    pub search_margin: usize,
    /// Optional cap on how deep into the upper image templates reach.
    pub search_region: SearchRegion,
    /// Per-sample variance floor below which a placement is ignored.
    pub min_var_i: f64,
    /// Score candidate sizes in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.80,
            min_overlap_ratio: 0.1,
            max_overlap_ratio: 0.9,
            sweep_step: 10,
            search_margin: 100,
            search_region: SearchRegion::Unbounded,
            min_var_i: 1e-8,
            parallel: false,
        }
    }
}

impl StitchConfig {
    /// Returns a copy with a different overlap threshold.
    pub fn with_threshold(self, overlap_threshold: f64) -> Self {
        Self {
            overlap_threshold,
            ..self
        }
    }

    /// Checks every field against its valid range.
    pub fn validate(&self) -> StitchResult<()> {
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(StitchError::InvalidConfig(
                "overlap_threshold must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_overlap_ratio)
            || !(0.0..=1.0).contains(&self.max_overlap_ratio)
        {
            return Err(StitchError::InvalidConfig(
                "overlap ratios must be within [0, 1]",
            ));
        }
        if self.min_overlap_ratio > self.max_overlap_ratio {
            return Err(StitchError::InvalidConfig(
                "min_overlap_ratio must not exceed max_overlap_ratio",
            ));
        }
        if self.sweep_step == 0 {
            return Err(StitchError::InvalidConfig("sweep_step must be at least 1"));
        }
        if let SearchRegion::BottomFraction(fraction) = self.search_region {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(StitchError::InvalidConfig(
                    "search region fraction must be within (0, 1]",
                ));
            }
        }
        if !self.min_var_i.is_finite() || self.min_var_i < 0.0 {
            return Err(StitchError::InvalidConfig(
                "min_var_i must be finite and non-negative",
            ));
        }
        Ok(())
    }
}
