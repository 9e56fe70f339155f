//! Experiment Record - the A/B test entity and its lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::{rank_variants, ExperimentSnapshot, VariantSnapshot};
use super::{EventType, VariantMetrics, VariantSet};
use crate::{Error, Result};

/// Default ranking metric when none is given.
pub const DEFAULT_PRIMARY_METRIC: &str = "conversion_rate";

/// Lifecycle state of an experiment.
///
/// `Running` is initial, `Finalized` is terminal. The only transition is
/// [`Experiment::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// Accepting events.
    Running,
    /// Outcome recorded, metrics frozen.
    Finalized,
}

/// What happened to an event handed to [`Experiment::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Counters were updated.
    Applied,
    /// The experiment is finalized; counters were left untouched.
    Ignored,
}

/// A single A/B test with a fixed set of variants.
#[derive(Debug, Clone)]
pub struct Experiment {
    id: String,
    name: String,
    primary_metric: String,
    owner: String,
    status: ExperimentStatus,
    created_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
    winning_variant: Option<String>,
    summary: Option<String>,
    variants: VariantSet,
}

impl Experiment {
    /// Create a running experiment from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the draft's name is blank or its
    /// variant list is empty or has empty/duplicate labels.
    pub fn try_new(
        id: impl Into<String>,
        draft: ExperimentDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if draft.name.trim().is_empty() {
            return Err(Error::invalid("experiment name must not be empty"));
        }
        let variants = VariantSet::try_new(draft.variants)?;

        Ok(Self {
            id: id.into(),
            name: draft.name,
            primary_metric: draft.primary_metric,
            owner: draft.owner,
            status: ExperimentStatus::Running,
            created_at,
            finalized_at: None,
            winning_variant: None,
            summary: None,
            variants,
        })
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the primary metric label.
    #[must_use]
    pub fn primary_metric(&self) -> &str {
        &self.primary_metric
    }

    /// Get the owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the finalization timestamp, if finalized.
    #[must_use]
    pub const fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    /// Get the declared winner, if finalized.
    #[must_use]
    pub fn winning_variant(&self) -> Option<&str> {
        self.winning_variant.as_deref()
    }

    /// Get the outcome summary, if finalized.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Get the variant set.
    #[must_use]
    pub const fn variants(&self) -> &VariantSet {
        &self.variants
    }

    /// Metrics of one variant, if declared.
    #[must_use]
    pub fn metrics(&self, variant: &str) -> Option<&VariantMetrics> {
        self.variants.get(variant)
    }

    /// Record one event against `variant`.
    ///
    /// Input is validated even when finalized; a valid event on a finalized
    /// experiment is accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `variant` is not declared, if a
    /// conversion carries a negative or non-finite `value`, or if adding it
    /// would overflow the variant's value sum. Nothing changes on error.
    pub fn record(
        &mut self,
        variant: &str,
        event_type: EventType,
        value: Option<f64>,
    ) -> Result<EventOutcome> {
        let value = match event_type {
            EventType::Conversion => validate_value(value)?,
            // Value is meaningless on an impression.
            EventType::Impression => 0.0,
        };

        let running = self.status == ExperimentStatus::Running;
        let Some(metrics) = self.variants.get_mut(variant) else {
            return Err(Error::invalid(format!(
                "variant '{variant}' is not declared by experiment {}",
                self.id
            )));
        };

        if !running {
            return Ok(EventOutcome::Ignored);
        }
        if !(metrics.conversion_value_sum() + value).is_finite() {
            return Err(Error::invalid(format!(
                "conversion value {value} would overflow the value sum of variant '{variant}'"
            )));
        }

        match event_type {
            EventType::Impression => metrics.record_impression(),
            EventType::Conversion => metrics.record_conversion(value),
        }
        Ok(EventOutcome::Applied)
    }

    /// Finalize the experiment, declaring `winning_variant`.
    ///
    /// `finalized_at` never precedes `created_at`, even if the clock steps
    /// backwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if already finalized or if
    /// `winning_variant` is not declared. The first outcome is kept.
    pub fn finalize(
        &mut self,
        winning_variant: &str,
        summary: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if self.status == ExperimentStatus::Finalized {
            return Err(Error::invalid(format!(
                "experiment {} is already finalized",
                self.id
            )));
        }
        if !self.variants.contains(winning_variant) {
            return Err(Error::invalid(format!(
                "winning variant '{winning_variant}' is not declared by experiment {}",
                self.id
            )));
        }

        self.status = ExperimentStatus::Finalized;
        self.finalized_at = Some(at.max(self.created_at));
        self.winning_variant = Some(winning_variant.to_string());
        self.summary = Some(summary.into());
        Ok(())
    }

    /// Copy the experiment into its ranked read model.
    #[must_use]
    pub fn snapshot(&self) -> ExperimentSnapshot {
        let mut variants: Vec<VariantSnapshot> = self
            .variants
            .iter()
            .map(|(label, metrics)| VariantSnapshot::from_metrics(label, metrics))
            .collect();
        rank_variants(&mut variants);

        ExperimentSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            primary_metric: self.primary_metric.clone(),
            owner: self.owner.clone(),
            status: self.status,
            created_at: self.created_at,
            finalized_at: self.finalized_at,
            winning_variant: self.winning_variant.clone(),
            summary: self.summary.clone(),
            variants,
        }
    }
}

fn validate_value(value: Option<f64>) -> Result<f64> {
    let value = value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(Error::invalid(format!(
            "conversion value must be a finite non-negative number, got {value}"
        )));
    }
    Ok(value)
}

/// Builder for the creation parameters of an [`Experiment`].
#[derive(Debug, Clone)]
pub struct ExperimentDraft {
    name: String,
    variants: Vec<String>,
    primary_metric: String,
    owner: String,
}

impl ExperimentDraft {
    /// Create a draft with required fields.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
            primary_metric: DEFAULT_PRIMARY_METRIC.to_string(),
            owner: String::new(),
        }
    }

    /// Set the primary metric label.
    #[must_use]
    pub fn primary_metric(mut self, primary_metric: impl Into<String>) -> Self {
        self.primary_metric = primary_metric.into();
        self
    }

    /// Set the owner.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment(variants: &[&str]) -> Experiment {
        let draft = ExperimentDraft::new("cta-test", variants.iter().copied()).owner("growth");
        Experiment::try_new("exp-1", draft, Utc::now()).unwrap()
    }

    #[test]
    fn test_new_experiment_is_running_and_zeroed() {
        let exp = experiment(&["A", "B", "C"]);
        assert_eq!(exp.status(), ExperimentStatus::Running);
        assert_eq!(exp.primary_metric(), DEFAULT_PRIMARY_METRIC);
        assert_eq!(exp.owner(), "growth");
        assert!(exp.finalized_at().is_none());
        assert!(exp.winning_variant().is_none());
        assert!(exp.summary().is_none());
        for (_, metrics) in exp.variants().iter() {
            assert_eq!(*metrics, VariantMetrics::new());
        }
    }

    #[test]
    fn test_blank_name_rejected() {
        let draft = ExperimentDraft::new("  ", ["A", "B"]);
        let err = Experiment::try_new("exp-1", draft, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_record_events() {
        let mut exp = experiment(&["A", "B"]);
        assert_eq!(
            exp.record("A", EventType::Impression, None).unwrap(),
            EventOutcome::Applied
        );
        exp.record("B", EventType::Conversion, Some(12.5)).unwrap();
        exp.record("B", EventType::Conversion, None).unwrap();

        assert_eq!(exp.metrics("A").unwrap().impressions(), 1);
        let b = exp.metrics("B").unwrap();
        assert_eq!(b.conversions(), 2);
        assert!((b.conversion_value_sum() - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_impression_value_ignored() {
        let mut exp = experiment(&["A"]);
        exp.record("A", EventType::Impression, Some(-3.0)).unwrap();
        let a = exp.metrics("A").unwrap();
        assert_eq!(a.impressions(), 1);
        assert!(a.conversion_value_sum().abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_conversion_values_rejected() {
        let mut exp = experiment(&["A"]);
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = exp.record("A", EventType::Conversion, Some(bad)).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
        assert_eq!(exp.metrics("A").unwrap().conversions(), 0);
    }

    #[test]
    fn test_value_sum_overflow_rejected() {
        let mut exp = experiment(&["A"]);
        exp.record("A", EventType::Conversion, Some(f64::MAX)).unwrap();
        let err = exp
            .record("A", EventType::Conversion, Some(f64::MAX))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        let a = exp.metrics("A").unwrap();
        assert_eq!(a.conversions(), 1);
        assert!(a.conversion_value_sum().is_finite());
    }

    #[test]
    fn test_finalize_freezes_metrics() {
        let mut exp = experiment(&["A", "B"]);
        exp.record("A", EventType::Impression, None).unwrap();
        exp.finalize("A", "A wins", Utc::now()).unwrap();

        assert_eq!(
            exp.record("A", EventType::Impression, None).unwrap(),
            EventOutcome::Ignored
        );
        assert_eq!(exp.metrics("A").unwrap().impressions(), 1);
        assert!(exp.record("Z", EventType::Impression, None).is_err());
    }

    #[test]
    fn test_finalize_twice_keeps_first_outcome() {
        let mut exp = experiment(&["A", "B"]);
        exp.finalize("B", "first", Utc::now()).unwrap();
        let err = exp.finalize("A", "second", Utc::now()).unwrap_err();

        assert!(err.to_string().contains("already finalized"));
        assert_eq!(exp.winning_variant(), Some("B"));
        assert_eq!(exp.summary(), Some("first"));
    }

    #[test]
    fn test_finalize_unknown_winner_leaves_running() {
        let mut exp = experiment(&["A", "B"]);
        assert!(exp.finalize("Z", "", Utc::now()).is_err());
        assert_eq!(exp.status(), ExperimentStatus::Running);
    }

    #[test]
    fn test_finalized_at_not_before_created_at() {
        let mut exp = experiment(&["A"]);
        let earlier = exp.created_at() - chrono::Duration::seconds(30);
        exp.finalize("A", "", earlier).unwrap();
        assert_eq!(exp.finalized_at(), Some(exp.created_at()));
    }
}
