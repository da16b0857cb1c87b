//! Sequential stitch pipeline.
//!
//! [`Stitcher`] folds pairwise stitching over an ordered list of captures:
//! the first input seeds the composite and every later input is merged onto
//! it. Inputs after the first that fail to load are skipped and reported.

use crate::config::StitchConfig;
use crate::image::RasterBuffer;
use crate::overlap::{locate, OverlapResult};
use crate::stitch::{stitch_pair, PairStitch};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{StitchError, StitchResult};
#[cfg(feature = "image-io")]
use std::path::Path;

/// An input that could not be loaded and was left out of the composite.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedInput {
    /// Position of the input in the original sequence.
    pub index: usize,
    /// Why loading failed.
    pub error: StitchError,
}

/// One successful merge onto the running composite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeRecord {
    /// Position of the merged input in the original sequence.
    pub index: usize,
    /// Overlap found between the composite and this input.
    pub overlap: OverlapResult,
    /// Composite height after the merge.
    pub height: usize,
}

/// Bookkeeping for a full pipeline run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StitchReport {
    /// Number of inputs supplied.
    pub inputs: usize,
    /// Merges in input order.
    pub merges: Vec<MergeRecord>,
    /// Inputs skipped because they failed to load.
    pub skipped: Vec<SkippedInput>,
}

/// Final composite plus its run report.
#[derive(Clone, Debug, PartialEq)]
pub struct Composite {
    /// Stitched image.
    pub image: RasterBuffer,
    /// What happened to each input.
    pub report: StitchReport,
}

/// Stitching engine bound to one immutable configuration.
#[derive(Clone, Debug, Default)]
pub struct Stitcher {
    config: StitchConfig,
}

impl Stitcher {
    /// Creates a stitcher after validating `config`.
    pub fn new(config: StitchConfig) -> StitchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Locates the overlap between two captures.
    pub fn locate(
        &self,
        upper: &RasterBuffer,
        lower: &RasterBuffer,
    ) -> StitchResult<OverlapResult> {
        locate(upper, lower, &self.config)
    }

    /// Merges two captures.
    pub fn stitch_pair(
        &self,
        upper: &RasterBuffer,
        lower: &RasterBuffer,
    ) -> StitchResult<PairStitch> {
        stitch_pair(upper, lower, &self.config)
    }

    /// Stitches `inputs` in order, loading each one with `load`.
    ///
    /// A single input is returned as loaded. A failure to load the first input
    /// is fatal; later failures are recorded in the report and skipped.
    pub fn stitch_sequence<T, F>(&self, inputs: &[T], mut load: F) -> StitchResult<Composite>
    where
        F: FnMut(&T) -> StitchResult<RasterBuffer>,
    {
        let _span = trace_span!("stitch_sequence", inputs = inputs.len()).entered();

        let (first, rest) = inputs.split_first().ok_or(StitchError::EmptyInput)?;
        let mut composite = load(first)?;
        let mut report = StitchReport {
            inputs: inputs.len(),
            ..StitchReport::default()
        };
        trace_event!(
            "input_loaded",
            index = 0usize,
            width = composite.width(),
            height = composite.height()
        );

        for (offset, input) in rest.iter().enumerate() {
            let index = offset + 1;
            let next = match load(input) {
                Ok(next) => next,
                Err(error) => {
                    let reason = error.to_string();
                    trace_warn!("input_skipped", index = index, reason = reason.as_str());
                    report.skipped.push(SkippedInput { index, error });
                    continue;
                }
            };

            let PairStitch { image, overlap } = stitch_pair(&composite, &next, &self.config)?;
            composite = image;
            report.merges.push(MergeRecord {
                index,
                overlap,
                height: composite.height(),
            });
        }

        trace_event!(
            "composite_done",
            width = composite.width(),
            height = composite.height(),
            skipped = report.skipped.len()
        );
        Ok(Composite {
            image: composite,
            report,
        })
    }

    /// Loads and stitches image files in order.
    #[cfg(feature = "image-io")]
    pub fn stitch_all<P: AsRef<Path>>(&self, paths: &[P]) -> StitchResult<Composite> {
        self.stitch_sequence(paths, |path| crate::image::io::load_raster(path))
    }
}
