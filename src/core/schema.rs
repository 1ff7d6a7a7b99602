use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::normalize::RawRow;
use crate::core::types::VariantSchema;
use crate::error::{StackError, StackResult};

/// How a proportion row lacking one of the schema fields is handled.
///
/// Fields outside the schema are always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    #[default]
    Reject,
    Zero,
}

/// Derives the variant set from the first proportion row: every field except `date_field`.
pub fn extract_schema(rows: &[RawRow], date_field: &str) -> StackResult<VariantSchema> {
    let first = rows.first().ok_or(StackError::EmptySeries {
        series: "proportion",
    })?;
    let schema = VariantSchema::new(
        first
            .keys()
            .filter(|key| key.as_str() != date_field)
            .map(String::as_str),
    );
    debug!(variants = schema.len(), date_field, "extracted variant schema");
    Ok(schema)
}

/// Verifies that `row` carries exactly the schema fields plus the date field.
pub fn check_row_keys(
    schema: &VariantSchema,
    row: &RawRow,
    row_index: usize,
    date_field: &str,
    policy: MissingFieldPolicy,
) -> StackResult<()> {
    let unexpected: Vec<String> = row
        .keys()
        .filter(|key| key.as_str() != date_field && !schema.contains(key))
        .cloned()
        .collect();
    let missing: Vec<String> = match policy {
        MissingFieldPolicy::Zero => Vec::new(),
        MissingFieldPolicy::Reject => schema
            .iter()
            .filter(|id| !row.contains_key(id.as_str()))
            .map(ToString::to_string)
            .collect(),
    };

    if unexpected.is_empty() && missing.is_empty() {
        return Ok(());
    }
    Err(StackError::SchemaMismatch {
        row: row_index,
        missing,
        unexpected,
    })
}
