//! Correlation kernels for full-width vertical template placement.
//!
//! Overlap templates always span the whole search window horizontally, so the
//! only free coordinate is the row offset `y`.

pub mod scalar;

pub use scalar::{scan_vertical, score_at};

/// Best-scoring placement of a template inside a search window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Row of the window aligned with the template's first row.
    pub y: usize,
    /// ZNCC score in `[-1, 1]`.
    pub score: f64,
}
