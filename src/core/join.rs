use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::primitives::{date_key, format_date};
use crate::core::types::{ProportionSample, ScaledSample, TotalSample};
use crate::error::{StackError, StackResult};

/// Handling of a proportion sample whose date has no total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Fail with [`StackError::MissingJoinPartner`] naming every unmatched date.
    #[default]
    Reject,
    /// Drop the sample and record its date in [`JoinReport::unmatched`].
    Skip,
    /// Scale by a total of zero and record its date in [`JoinReport::unmatched`].
    ZeroFill,
}

/// Result of a join: scaled samples plus the dates that had no total.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoinReport {
    pub samples: Vec<ScaledSample>,
    pub unmatched: Vec<DateTime<Utc>>,
}

/// Joins under [`JoinPolicy::Reject`]: one output per input, in input order.
pub fn join(
    proportions: &[ProportionSample],
    totals: &[TotalSample],
) -> StackResult<Vec<ScaledSample>> {
    join_with_policy(proportions, totals, JoinPolicy::Reject).map(|report| report.samples)
}

/// Scales every proportion sample by the total sharing its exact instant.
///
/// `scaled[v] = percentage[v] * total / 100`. Dates match at millisecond
/// resolution; when several totals share a date the first one wins.
pub fn join_with_policy(
    proportions: &[ProportionSample],
    totals: &[TotalSample],
    policy: JoinPolicy,
) -> StackResult<JoinReport> {
    let mut totals_by_date: HashMap<i64, f64> = HashMap::with_capacity(totals.len());
    for sample in totals {
        totals_by_date
            .entry(date_key(sample.date))
            .or_insert(sample.total);
    }

    let mut samples = Vec::with_capacity(proportions.len());
    let mut unmatched = Vec::new();
    for proportion in proportions {
        let total = match totals_by_date.get(&date_key(proportion.date)) {
            Some(total) => *total,
            None => {
                unmatched.push(proportion.date);
                match policy {
                    JoinPolicy::Reject | JoinPolicy::Skip => continue,
                    JoinPolicy::ZeroFill => 0.0,
                }
            }
        };
        samples.push(scale_sample(proportion, total));
    }

    if !unmatched.is_empty() {
        if policy == JoinPolicy::Reject {
            return Err(StackError::MissingJoinPartner {
                dates: unmatched.iter().copied().map(format_date).collect(),
            });
        }
        warn!(
            unmatched = unmatched.len(),
            ?policy,
            "proportion dates without a matching total"
        );
    }
    debug!(
        proportions = proportions.len(),
        totals = totals.len(),
        scaled = samples.len(),
        "joined series"
    );
    Ok(JoinReport { samples, unmatched })
}

fn scale_sample(proportion: &ProportionSample, total: f64) -> ScaledSample {
    ScaledSample {
        date: proportion.date,
        values: proportion
            .values
            .iter()
            .map(|(id, percentage)| (id.clone(), percentage * total / 100.0))
            .collect(),
    }
}
