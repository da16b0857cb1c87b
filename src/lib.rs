//! Scrollstitch joins consecutive scrolling screenshots into one tall image.
//!
//! Overlap between neighbouring captures is located with a vertical ZNCC
//! sweep over candidate overlap sizes; duplicated rows are dropped and the
//! remainder stacked. Optional collaborators recognize text on the composite
//! and reformat chat transcripts. Parallel candidate scoring is available via
//! the `rayon` feature, file I/O via `image-io`.

pub mod chat;
pub mod config;
pub mod image;
pub mod kernel;
pub mod ocr;
pub mod overlap;
pub mod pipeline;
pub mod stitch;
pub mod template;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use crate::image::io;
pub use crate::image::{Channels, ImageView, RasterBuffer};

pub use chat::{ChatDetector, ChatMessage, ChatOutcome, ConversationSummary};
pub use config::{SearchRegion, StitchConfig};
pub use kernel::Peak;
pub use ocr::{OcrOptions, TextExtractor, TextLayout, WordBox};
pub use overlap::{locate, overlap_offset, CandidateScore, OverlapResult, OverlapSweep};
pub use pipeline::{Composite, MergeRecord, SkippedInput, StitchReport, Stitcher};
pub use stitch::{merge, stitch_pair, PairStitch};
pub use template::TemplatePlan;
pub use util::{StitchError, StitchResult};
