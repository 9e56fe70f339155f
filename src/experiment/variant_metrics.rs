//! Variant Metrics - per-arm counters and the fixed variant set

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Counters tracked for a single variant of an experiment.
///
/// Counters only grow. The conversion rate is derived on read and never
/// stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantMetrics {
    impressions: u64,
    conversions: u64,
    conversion_value_sum: f64,
}

impl VariantMetrics {
    /// Create zeroed metrics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            impressions: 0,
            conversions: 0,
            conversion_value_sum: 0.0,
        }
    }

    /// Number of recorded impressions.
    #[must_use]
    pub const fn impressions(&self) -> u64 {
        self.impressions
    }

    /// Number of recorded conversions.
    #[must_use]
    pub const fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Sum of the values carried by conversion events.
    #[must_use]
    pub const fn conversion_value_sum(&self) -> f64 {
        self.conversion_value_sum
    }

    /// `conversions / impressions`, or `0.0` when nothing was shown yet.
    ///
    /// Conversions may exceed impressions (events are not correlated), so
    /// the rate is not clamped to `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn conversion_rate(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            self.conversions as f64 / self.impressions as f64
        }
    }

    pub(crate) fn record_impression(&mut self) {
        self.impressions = self.impressions.saturating_add(1);
    }

    /// `value` must already be validated as finite and non-negative.
    pub(crate) fn record_conversion(&mut self, value: f64) {
        self.conversions = self.conversions.saturating_add(1);
        self.conversion_value_sum += value;
    }
}

/// Ordered, fixed set of variants belonging to one experiment.
///
/// The label set is decided at construction and there is no
/// insert or remove: only the metrics behind existing labels can change.
#[derive(Debug, Clone)]
pub struct VariantSet {
    slots: Vec<(String, VariantMetrics)>,
    index: FxHashMap<String, usize>,
}

impl VariantSet {
    /// Build a variant set from labels in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `labels` is empty, contains an
    /// empty label, or repeats a label.
    pub fn try_new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots = Vec::new();
        let mut index = FxHashMap::default();

        for label in labels {
            let label = label.into();
            if label.trim().is_empty() {
                return Err(Error::invalid("variant labels must not be empty"));
            }
            if index.contains_key(&label) {
                return Err(Error::invalid(format!("duplicate variant label '{label}'")));
            }
            index.insert(label.clone(), slots.len());
            slots.push((label, VariantMetrics::new()));
        }

        if slots.is_empty() {
            return Err(Error::invalid("an experiment needs at least one variant"));
        }

        Ok(Self { slots, index })
    }

    /// Number of variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the set has no variants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `label` is one of the declared variants.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Metrics for `label`, if declared.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&VariantMetrics> {
        self.index.get(label).map(|&i| &self.slots[i].1)
    }

    pub(crate) fn get_mut(&mut self, label: &str) -> Option<&mut VariantMetrics> {
        let i = *self.index.get(label)?;
        Some(&mut self.slots[i].1)
    }

    /// Labels and metrics in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariantMetrics)> {
        self.slots.iter().map(|(label, metrics)| (label.as_str(), metrics))
    }
}
