//! Snapshot - owned, deterministic read model of an experiment
//!
//! Snapshots are copied out of the store under the experiment's lock and
//! are what every store operation hands back to callers. Variants are
//! ranked by descending conversion rate; ties keep declaration order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExperimentStatus, VariantMetrics};

/// One variant row of an [`ExperimentSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    /// Variant label.
    pub variant: String,
    /// Number of impressions.
    pub impressions: u64,
    /// Number of conversions.
    pub conversions: u64,
    /// Sum of conversion values.
    pub conversion_value_sum: f64,
    /// Derived `conversions / impressions` (0.0 without impressions).
    pub conversion_rate: f64,
}

impl VariantSnapshot {
    pub(crate) fn from_metrics(variant: &str, metrics: &VariantMetrics) -> Self {
        Self {
            variant: variant.to_string(),
            impressions: metrics.impressions(),
            conversions: metrics.conversions(),
            conversion_value_sum: metrics.conversion_value_sum(),
            conversion_rate: metrics.conversion_rate(),
        }
    }
}

/// Point-in-time copy of an experiment, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSnapshot {
    /// Experiment identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Metric used to rank variants and declare a winner.
    pub primary_metric: String,
    /// Who created the experiment.
    pub owner: String,
    /// Lifecycle state.
    pub status: ExperimentStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Finalization time, once finalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    /// Declared winner, once finalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_variant: Option<String>,
    /// Outcome summary, once finalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Variants, highest conversion rate first.
    pub variants: Vec<VariantSnapshot>,
}

impl ExperimentSnapshot {
    /// Look up a variant row by label.
    #[must_use]
    pub fn variant(&self, label: &str) -> Option<&VariantSnapshot> {
        self.variants.iter().find(|v| v.variant == label)
    }

    /// Variant labels in ranked order.
    #[must_use]
    pub fn ranking(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.variant.as_str()).collect()
    }

    /// Whether the experiment was finalized when the snapshot was taken.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status == ExperimentStatus::Finalized
    }
}

/// Stable sort, highest conversion rate first.
pub(crate) fn rank_variants(variants: &mut [VariantSnapshot]) {
    variants.sort_by(|a, b| b.conversion_rate.total_cmp(&a.conversion_rate));
}
