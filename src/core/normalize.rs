use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::primitives::{coerce_number, describe_value, parse_date};
use crate::core::schema::{MissingFieldPolicy, check_row_keys};
use crate::core::types::{ProportionSample, TotalSample, VariantSchema};
use crate::error::{StackError, StackResult};

/// One flat upstream record, keyed by field name.
pub type RawRow = serde_json::Map<String, Value>;

/// Parses a JSON array of flat objects into raw rows.
pub fn rows_from_json_str(json: &str) -> StackResult<Vec<RawRow>> {
    Ok(serde_json::from_str(json)?)
}

/// Named sub-fields summed into one regional total.
///
/// The set changed between data-source releases, so it is selected explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalFieldSet {
    /// Four census regions plus the national aggregate.
    #[default]
    V1,
    /// Four census regions only.
    V2,
    Custom(Vec<String>),
}

const V1_FIELDS: [&str; 5] = ["Midwest", "National", "Northeast", "South", "West"];
const V2_FIELDS: [&str; 4] = ["Midwest", "Northeast", "South", "West"];

impl TotalFieldSet {
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::V1 => V1_FIELDS.to_vec(),
            Self::V2 => V2_FIELDS.to_vec(),
            Self::Custom(fields) => fields.iter().map(String::as_str).collect(),
        }
    }

    pub fn validate(&self) -> StackResult<()> {
        if let Self::Custom(fields) = self {
            if fields.is_empty() {
                return Err(StackError::InvalidConfig(
                    "custom total field set must name at least one field".to_owned(),
                ));
            }
            if fields.iter().any(|field| field.trim().is_empty()) {
                return Err(StackError::InvalidConfig(
                    "custom total field names must be non-empty".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

fn row_date(row: &RawRow, row_index: usize, field: &str) -> StackResult<DateTime<Utc>> {
    let invalid = |value: String| StackError::InvalidDate {
        row: row_index,
        field: field.to_owned(),
        value,
    };
    match row.get(field) {
        Some(Value::String(text)) => parse_date(text).ok_or_else(|| invalid(format!("{text:?}"))),
        Some(other) => Err(invalid(describe_value(other))),
        None => Err(invalid("<absent>".to_owned())),
    }
}

fn row_number(value: &Value, row_index: usize, field: &str) -> StackResult<f64> {
    coerce_number(value).ok_or_else(|| StackError::InvalidValue {
        row: row_index,
        field: field.to_owned(),
        value: describe_value(value),
    })
}

/// Converts raw proportion rows into typed samples, preserving input order.
///
/// Every row must match `schema` (see [`MissingFieldPolicy`]). `null` cells
/// become `0`; a cell that cannot be coerced fails the whole pass.
pub fn normalize_proportions(
    rows: &[RawRow],
    schema: &VariantSchema,
    date_field: &str,
    missing: MissingFieldPolicy,
) -> StackResult<Vec<ProportionSample>> {
    let mut samples = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        check_row_keys(schema, row, row_index, date_field, missing)?;
        let date = row_date(row, row_index, date_field)?;

        let mut values = IndexMap::with_capacity(schema.len());
        for id in schema.iter() {
            let value = match row.get(id.as_str()) {
                Some(cell) => row_number(cell, row_index, id.as_str())?,
                None => 0.0,
            };
            values.insert(id.clone(), value);
        }
        samples.push(ProportionSample { date, values });
    }
    debug!(rows = samples.len(), variants = schema.len(), "normalized proportion rows");
    Ok(samples)
}

/// Converts raw total rows into typed samples by summing the configured sub-fields.
pub fn normalize_totals(
    rows: &[RawRow],
    date_field: &str,
    fields: &TotalFieldSet,
) -> StackResult<Vec<TotalSample>> {
    fields.validate()?;
    let names = fields.fields();

    let mut samples = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        let date = row_date(row, row_index, date_field)?;

        let mut total = 0.0;
        for name in &names {
            let cell = row.get(*name).ok_or_else(|| StackError::InvalidValue {
                row: row_index,
                field: (*name).to_owned(),
                value: "<absent>".to_owned(),
            })?;
            total += row_number(cell, row_index, name)?;
        }
        if total < 0.0 {
            return Err(StackError::InvalidValue {
                row: row_index,
                field: names.join("+"),
                value: total.to_string(),
            });
        }
        samples.push(TotalSample::new(date, total));
    }
    debug!(rows = samples.len(), fields = names.len(), "normalized total rows");
    Ok(samples)
}
