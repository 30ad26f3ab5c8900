pub mod metrics;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::analysis::features::{round_to, FeatureSet};

pub use metrics::{MetricConfig, METRICS};

/// Slack for the weighted mean of all-perfect scores landing just under 100.
const PERFECT_TOLERANCE: f64 = 1e-9;

/// Similarity bucket of a score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Identical,
    VeryClose,
    Close,
    Medium,
    Distant,
    VeryDistant,
}

impl Status {
    /// Bucket of a per-metric score. Never [`Status::Identical`].
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Status::VeryClose
        } else if score >= 60.0 {
            Status::Close
        } else if score >= 40.0 {
            Status::Medium
        } else if score >= 20.0 {
            Status::Distant
        } else {
            Status::VeryDistant
        }
    }

    /// Bucket of an unrounded global score; only a perfect score is
    /// [`Status::Identical`].
    pub fn from_global_score(score: f64) -> Self {
        if score >= 100.0 - PERFECT_TOLERANCE {
            Status::Identical
        } else {
            Self::from_score(score)
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Status::Identical => "identical",
            Status::VeryClose => "very_close",
            Status::Close => "close",
            Status::Medium => "medium",
            Status::Distant => "distant",
            Status::VeryDistant => "very_distant",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Identical => "Identical",
            Status::VeryClose => "Very close",
            Status::Close => "Close",
            Status::Medium => "Medium",
            Status::Distant => "Distant",
            Status::VeryDistant => "Very distant",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricComparison {
    pub name: &'static str,
    pub original_value: f64,
    pub reference_value: f64,
    pub difference_pct: f64,
    pub score: f64,
    pub status: Status,
    pub status_label: &'static str,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub global_score: f64,
    pub global_status: Status,
    pub global_status_label: &'static str,
    pub comparisons: BTreeMap<&'static str, MetricComparison>,
    pub original_key: String,
    pub reference_key: String,
}

/// Score `original` against `reference` with the built-in [`METRICS`] table.
pub fn compare(original: &FeatureSet, reference: &FeatureSet) -> ComparisonResult {
    compare_with(&METRICS, original, reference)
}

/// Score two feature sets against a custom metric table. Metrics missing
/// from either set are skipped.
pub fn compare_with(table: &[MetricConfig], original: &FeatureSet, reference: &FeatureSet) -> ComparisonResult {
    let mut comparisons = BTreeMap::new();
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for config in table {
        let (Some(o), Some(r)) = (original.number(config.key), reference.number(config.key)) else {
            log::debug!("Metric {} missing, skipped", config.key);
            continue;
        };
        let diff = metrics::difference_pct(o, r);
        let score = metrics::score(diff, config.tolerance_pct);
        let status = Status::from_score(score);

        weighted += score * config.weight;
        total_weight += config.weight;
        comparisons.insert(
            config.key,
            MetricComparison {
                name: config.name,
                original_value: round_to(o, 2),
                reference_value: round_to(r, 2),
                difference_pct: round_to(diff, 2),
                score: round_to(score, 1),
                status,
                status_label: status.label(),
                weight: config.weight,
            },
        );
    }

    let global = if total_weight > 0.0 {
        (weighted / total_weight).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let global_status = Status::from_global_score(global);
    let global_score = round_to(global, 1);
    log::debug!(
        "Compared {} metric(s), global score {:.1} ({})",
        comparisons.len(),
        global_score,
        global_status.code()
    );

    let key_of = |set: &FeatureSet| set.text("key").unwrap_or("N/A").to_string();
    ComparisonResult {
        global_score,
        global_status,
        global_status_label: global_status.label(),
        comparisons,
        original_key: key_of(original),
        reference_key: key_of(reference),
    }
}
