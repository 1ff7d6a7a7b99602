//! variant-stack: absolute per-variant counts from proportion and total series.
//!
//! Two independently published weekly series are joined on exact dates and
//! rescaled into absolute counts, then ordered and colored for stacked display.

pub mod api;
pub mod core;
pub mod error;
pub mod telemetry;

pub use api::{EngineConfig, VariantStackEngine};
pub use error::{StackError, StackResult};
