use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::core::types::{ScaledSample, VariantId, VariantOrder, VariantSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Scoring policy used to derive a [`VariantOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderingStrategy {
    /// Score is `max - min` across all samples.
    Range { direction: SortDirection },
    /// Score is the maximum across all samples, highest first.
    AllTimeMax,
    /// Score is the value in the most recent sample, highest first.
    CurrentMax,
}

impl Default for OrderingStrategy {
    fn default() -> Self {
        Self::Range {
            direction: SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinPosition {
    Start,
    #[default]
    End,
}

/// Variants held at a fixed end of every order, excluded from scoring.
///
/// Pinned ids keep their listed order. Ids outside the schema are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinPolicy {
    #[serde(default)]
    pub pinned: Vec<VariantId>,
    #[serde(default)]
    pub position: PinPosition,
}

impl PinPolicy {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Pins a single catch-all category at the end.
    #[must_use]
    pub fn catch_all(id: impl Into<VariantId>) -> Self {
        Self {
            pinned: vec![id.into()],
            position: PinPosition::End,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: PinPosition) -> Self {
        self.position = position;
        self
    }

    fn split<'a>(
        &self,
        ids: impl Iterator<Item = &'a VariantId>,
    ) -> (Vec<VariantId>, Vec<VariantId>) {
        let ids: IndexSet<&VariantId> = ids.collect();
        let pinned: Vec<VariantId> = self
            .pinned
            .iter()
            .filter(|id| ids.contains(id))
            .collect::<IndexSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        let free = ids
            .into_iter()
            .filter(|id| !pinned.contains(id))
            .cloned()
            .collect();
        (pinned, free)
    }

    fn assemble(&self, pinned: Vec<VariantId>, mut free: Vec<VariantId>) -> VariantOrder {
        let ids = match self.position {
            PinPosition::Start => {
                let mut ids = pinned;
                ids.append(&mut free);
                ids
            }
            PinPosition::End => {
                free.extend(pinned);
                free
            }
        };
        VariantOrder::from_permutation(ids)
    }
}

/// Computes the order for `strategy`, then applies `pins`.
#[must_use]
pub fn order_variants(
    samples: &[ScaledSample],
    schema: &VariantSchema,
    strategy: OrderingStrategy,
    pins: &PinPolicy,
) -> VariantOrder {
    match strategy {
        OrderingStrategy::Range { direction } => order_by_range(samples, schema, direction, pins),
        OrderingStrategy::AllTimeMax => order_by_all_time_max(samples, schema, pins),
        OrderingStrategy::CurrentMax => order_by_current_max(samples, schema, pins),
    }
}

#[must_use]
pub fn order_by_range(
    samples: &[ScaledSample],
    schema: &VariantSchema,
    direction: SortDirection,
    pins: &PinPolicy,
) -> VariantOrder {
    sorted_by_score(&range_scores(samples, schema), direction, pins)
}

#[must_use]
pub fn order_by_all_time_max(
    samples: &[ScaledSample],
    schema: &VariantSchema,
    pins: &PinPolicy,
) -> VariantOrder {
    sorted_by_score(&max_scores(samples, schema), SortDirection::Descending, pins)
}

#[must_use]
pub fn order_by_current_max(
    samples: &[ScaledSample],
    schema: &VariantSchema,
    pins: &PinPolicy,
) -> VariantOrder {
    let latest = samples.iter().max_by_key(|sample| sample.date);
    let scores: IndexMap<VariantId, f64> = schema
        .iter()
        .map(|id| {
            let score = latest.and_then(|sample| sample.value(id.as_str()));
            (id.clone(), score.unwrap_or(0.0))
        })
        .collect();
    sorted_by_score(&scores, SortDirection::Descending, pins)
}

/// `max - min` per variant across all samples; `0` for an empty series.
#[must_use]
pub fn range_scores(samples: &[ScaledSample], schema: &VariantSchema) -> IndexMap<VariantId, f64> {
    schema
        .iter()
        .map(|id| {
            let mut values = samples
                .iter()
                .map(|sample| sample.value(id.as_str()).unwrap_or(0.0));
            let score = match values.next() {
                None => 0.0,
                Some(first) => {
                    let (min, max) = values.fold((first, first), |(min, max), value| {
                        (min.min(value), max.max(value))
                    });
                    max - min
                }
            };
            (id.clone(), score)
        })
        .collect()
}

/// Maximum per variant across all samples; `0` for an empty series.
#[must_use]
pub fn max_scores(samples: &[ScaledSample], schema: &VariantSchema) -> IndexMap<VariantId, f64> {
    schema
        .iter()
        .map(|id| {
            let score = samples
                .iter()
                .map(|sample| sample.value(id.as_str()).unwrap_or(0.0))
                .max_by_key(|value| OrderedFloat(*value))
                .unwrap_or(0.0);
            (id.clone(), score)
        })
        .collect()
}

/// Ties resolve to ascending lexicographic id order in either direction.
fn sorted_by_score(
    scores: &IndexMap<VariantId, f64>,
    direction: SortDirection,
    pins: &PinPolicy,
) -> VariantOrder {
    let (pinned, mut free) = pins.split(scores.keys());
    free.sort();
    free.sort_by(|a, b| {
        let a = OrderedFloat(scores.get(a).copied().unwrap_or(0.0));
        let b = OrderedFloat(scores.get(b).copied().unwrap_or(0.0));
        match direction {
            SortDirection::Ascending => a.cmp(&b),
            SortDirection::Descending => b.cmp(&a),
        }
    });
    pins.assemble(pinned, free)
}

/// Uniform Fisher-Yates permutation of `current`, holding pinned ids at their end.
#[must_use]
pub fn shuffle<R: Rng + ?Sized>(
    current: &VariantOrder,
    pins: &PinPolicy,
    rng: &mut R,
) -> VariantOrder {
    let (pinned, mut free) = pins.split(current.iter());
    free.shuffle(rng);
    pins.assemble(pinned, free)
}
