//! Template planning for zero-mean correlation.

mod plan;

pub use plan::TemplatePlan;
