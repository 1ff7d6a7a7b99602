use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{StackError, StackResult};

/// Opaque identifier of one tracked variant (for example a lineage name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for VariantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VariantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Closed set of variant identifiers fixed once per loaded dataset.
///
/// Iteration follows discovery order. Use [`VariantSchema::sorted`] wherever a
/// deterministic order independent of the source layout is required.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantSchema {
    ids: IndexSet<VariantId>,
}

impl VariantSchema {
    /// Builds a schema from identifiers, dropping duplicates.
    #[must_use]
    pub fn new<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariantId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantId> {
        self.ids.iter()
    }

    /// Identifiers in ascending lexicographic order.
    #[must_use]
    pub fn sorted(&self) -> Vec<VariantId> {
        let mut ids: Vec<VariantId> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

/// Percentage share per variant for one reporting week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionSample {
    pub date: DateTime<Utc>,
    pub values: IndexMap<VariantId, f64>,
}

/// Aggregate count for one reporting date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalSample {
    pub date: DateTime<Utc>,
    pub total: f64,
}

impl TotalSample {
    #[must_use]
    pub fn new(date: DateTime<Utc>, total: f64) -> Self {
        Self { date, total }
    }
}

/// Absolute magnitude per variant for one reporting week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledSample {
    pub date: DateTime<Utc>,
    pub values: IndexMap<VariantId, f64>,
}

impl ProportionSample {
    #[must_use]
    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }
}

impl ScaledSample {
    #[must_use]
    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }
}

/// Display order of variants: always a full permutation of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantOrder(Vec<VariantId>);

impl VariantOrder {
    /// Validates that `ids` is a permutation of `schema`.
    pub fn new(ids: Vec<VariantId>, schema: &VariantSchema) -> StackResult<Self> {
        let order = Self(ids);
        if !order.is_permutation_of(schema) {
            return Err(StackError::InvalidConfig(format!(
                "order of {} id(s) is not a permutation of the {} schema variant(s)",
                order.len(),
                schema.len()
            )));
        }
        Ok(order)
    }

    /// Wraps ids already known to be a permutation of the schema.
    pub(crate) fn from_permutation(ids: Vec<VariantId>) -> Self {
        Self(ids)
    }

    /// Schema iteration order.
    #[must_use]
    pub fn from_schema(schema: &VariantSchema) -> Self {
        Self(schema.iter().cloned().collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[VariantId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantId> {
        self.0.iter()
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|candidate| candidate.as_str() == id)
    }

    #[must_use]
    pub fn is_permutation_of(&self, schema: &VariantSchema) -> bool {
        if self.0.len() != schema.len() {
            return false;
        }
        let unique: IndexSet<&str> = self.0.iter().map(VariantId::as_str).collect();
        unique.len() == self.0.len() && unique.iter().all(|id| schema.contains(id))
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<VariantId> {
        self.0
    }
}
