mod engine;
mod engine_config;
mod source;

pub use engine::{DisplaySeries, StackLayer, VariantStackEngine};
pub use engine_config::{DisplayMode, EngineConfig};
pub use source::{LoadReport, SeriesSource, SourceLoad, SourceOrigin, StaticSeriesSource};
