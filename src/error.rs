use thiserror::Error;

pub type StackResult<T> = Result<T, StackError>;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("{series} series has no rows")]
    EmptySeries { series: &'static str },

    #[error("row {row}: field `{field}` is not numeric: {value}")]
    InvalidValue {
        row: usize,
        field: String,
        value: String,
    },

    #[error("row {row}: field `{field}` is not a date: {value}")]
    InvalidDate {
        row: usize,
        field: String,
        value: String,
    },

    #[error("row {row}: key set differs from schema (missing: {missing:?}, unexpected: {unexpected:?})")]
    SchemaMismatch {
        row: usize,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("{} proportion date(s) have no matching total, first: {}", .dates.len(), first_or_dash(.dates))]
    MissingJoinPartner { dates: Vec<String> },

    #[error("palette has {colors} color(s) for {variants} variant(s)")]
    InsufficientPalette { colors: usize, variants: usize },

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{series} source failed: {reason}")]
    Source { series: &'static str, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn first_or_dash(dates: &[String]) -> &str {
    dates.first().map_or("-", String::as_str)
}
