use serde::{Deserialize, Serialize};

use crate::core::{RawRow, rows_from_json_str};
use crate::error::{StackError, StackResult};

/// Where a series was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Freshly fetched upstream data.
    Live,
    /// Data bundled with the host application, used when fetching failed.
    Bundled,
}

/// Rows of one series plus their origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLoad {
    pub rows: Vec<RawRow>,
    pub origin: SourceOrigin,
}

impl SourceLoad {
    #[must_use]
    pub fn new(rows: Vec<RawRow>, origin: SourceOrigin) -> Self {
        Self { rows, origin }
    }
}

/// Origins of the last successful load, for partial-load notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub proportions: SourceOrigin,
    pub totals: SourceOrigin,
}

impl LoadReport {
    /// True when either series fell back to bundled data.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.proportions == SourceOrigin::Bundled || self.totals == SourceOrigin::Bundled
    }
}

/// Contract implemented by the data-loading collaborator.
///
/// Fetching, retries and fallback to bundled files live behind this trait; the
/// engine only sees raw rows tagged with their origin.
pub trait SeriesSource {
    fn load_proportions(&mut self) -> StackResult<SourceLoad>;
    fn load_totals(&mut self) -> StackResult<SourceLoad>;
}

/// In-memory source used by tests and hosts that already hold the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSeriesSource {
    proportions: SourceLoad,
    totals: SourceLoad,
}

impl StaticSeriesSource {
    #[must_use]
    pub fn new(proportions: Vec<RawRow>, totals: Vec<RawRow>) -> Self {
        Self {
            proportions: SourceLoad::new(proportions, SourceOrigin::Live),
            totals: SourceLoad::new(totals, SourceOrigin::Live),
        }
    }

    /// Parses both series from JSON arrays of flat objects.
    pub fn from_json(proportions: &str, totals: &str) -> StackResult<Self> {
        Ok(Self::new(
            rows_from_json_str(proportions)
                .map_err(|e| source_error("proportion", &e))?,
            rows_from_json_str(totals).map_err(|e| source_error("total", &e))?,
        ))
    }

    /// Marks the series origins, e.g. to mimic a fallback.
    #[must_use]
    pub fn with_origins(mut self, proportions: SourceOrigin, totals: SourceOrigin) -> Self {
        self.proportions.origin = proportions;
        self.totals.origin = totals;
        self
    }
}

impl SeriesSource for StaticSeriesSource {
    fn load_proportions(&mut self) -> StackResult<SourceLoad> {
        Ok(self.proportions.clone())
    }

    fn load_totals(&mut self) -> StackResult<SourceLoad> {
        Ok(self.totals.clone())
    }
}

fn source_error(series: &'static str, err: &StackError) -> StackError {
    StackError::Source {
        series,
        reason: err.to_string(),
    }
}
