//! Experiment Store - concurrent in-memory registry of A/B experiments
//!
//! This is the default (and only) backend: data is lost on process restart.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use super::{EventOutcome, EventType, Experiment, ExperimentDraft, ExperimentSnapshot};
use crate::config::{Clock, IdGenerator, IdStrategy, StoreConfig, SystemClock};
use crate::{Error, Result};

/// In-memory, thread-safe store for A/B experiments.
///
/// ## Design
///
/// Experiments live in a `DashMap` keyed by id. Every mutation holds the
/// experiment's entry lock for the whole validate-then-mutate sequence, so
/// concurrent events on one experiment serialize and none are lost. Reads
/// copy a snapshot under the entry's read lock and never observe a
/// half-applied event.
///
/// Construct one store at startup and share it (`Arc<AbTestStore>`); there
/// is no global state.
///
/// ## Example
///
/// ```rust
/// use abtest_store::experiment::{EventType, ExperimentDraft};
/// use abtest_store::AbTestStore;
///
/// let store = AbTestStore::new();
/// let exp = store.create_experiment(ExperimentDraft::new("cta-test", ["A", "B"]))?;
///
/// store.record_event(&exp.id, "B", EventType::Impression, None)?;
/// store.record_event(&exp.id, "B", EventType::Conversion, Some(12.5))?;
///
/// let snapshot = store.get_experiment(&exp.id)?;
/// assert_eq!(snapshot.ranking(), vec!["B", "A"]);
/// # Ok::<(), abtest_store::Error>(())
/// ```
pub struct AbTestStore {
    experiments: DashMap<String, Experiment>,
    ids: IdGenerator,
    clock: Arc<dyn Clock>,
}

impl AbTestStore {
    /// Create a store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(&StoreConfig::default(), Arc::new(SystemClock))
    }

    /// Create a builder for a configured store.
    #[must_use]
    pub fn builder() -> AbTestStoreBuilder {
        AbTestStoreBuilder::default()
    }

    /// Create a store from a configuration, using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    fn from_parts(config: &StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            experiments: DashMap::with_capacity(config.initial_capacity),
            ids: IdGenerator::new(&config.id_strategy),
            clock,
        }
    }

    /// Number of experiments held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Whether the store holds no experiments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Whether an experiment with `experiment_id` exists.
    #[must_use]
    pub fn contains(&self, experiment_id: &str) -> bool {
        self.experiments.contains_key(experiment_id)
    }

    /// Create a running experiment with zeroed metrics for every variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the name is blank or the variant
    /// list is empty or contains empty/duplicate labels.
    pub fn create_experiment(&self, draft: ExperimentDraft) -> Result<ExperimentSnapshot> {
        let created_at = self.clock.now();

        loop {
            let id = self.ids.next_id();
            match self.experiments.entry(id) {
                // Only reachable on a UUID collision; draw again.
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let experiment = Experiment::try_new(slot.key().clone(), draft, created_at)
                        .map_err(|err| {
                            debug!(error = %err, "rejected experiment");
                            err
                        })?;
                    info!(
                        experiment_id = experiment.id(),
                        experiment_name = experiment.name(),
                        variants = experiment.variants().len(),
                        "created experiment"
                    );
                    let snapshot = experiment.snapshot();
                    slot.insert(experiment);
                    return Ok(snapshot);
                }
            }
        }
    }

    /// Record an impression or conversion against one variant.
    ///
    /// On a finalized experiment a valid event is accepted and ignored; the
    /// returned snapshot is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::InvalidArgument`] for an undeclared variant or an invalid
    /// conversion value.
    pub fn record_event(
        &self,
        experiment_id: &str,
        variant: &str,
        event_type: EventType,
        value: Option<f64>,
    ) -> Result<ExperimentSnapshot> {
        let mut experiment = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| not_found(experiment_id))?;

        let outcome = experiment
            .record(variant, event_type, value)
            .map_err(|err| {
                debug!(experiment_id, error = %err, "rejected event");
                err
            })?;

        match outcome {
            EventOutcome::Applied => {
                debug!(experiment_id, variant, %event_type, "recorded event");
            }
            EventOutcome::Ignored => {
                debug!(experiment_id, variant, %event_type, "ignored event on finalized experiment");
            }
        }
        Ok(experiment.snapshot())
    }

    /// Finalize an experiment, declaring its winner and freezing metrics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::InvalidArgument`] if the winner is undeclared or the
    /// experiment is already finalized.
    pub fn finalize_experiment(
        &self,
        experiment_id: &str,
        winning_variant: &str,
        summary: impl Into<String>,
    ) -> Result<ExperimentSnapshot> {
        let mut experiment = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| not_found(experiment_id))?;

        experiment
            .finalize(winning_variant, summary, self.clock.now())
            .map_err(|err| {
                debug!(experiment_id, error = %err, "rejected finalize");
                err
            })?;

        info!(experiment_id, winning_variant, "finalized experiment");
        Ok(experiment.snapshot())
    }

    /// Snapshot of one experiment, variants ranked by conversion rate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn get_experiment(&self, experiment_id: &str) -> Result<ExperimentSnapshot> {
        self.experiments
            .get(experiment_id)
            .map(|experiment| experiment.snapshot())
            .ok_or_else(|| not_found(experiment_id))
    }

    /// Snapshots of every experiment, oldest first (ties by id).
    #[must_use]
    pub fn list_experiments(&self) -> Vec<ExperimentSnapshot> {
        let mut snapshots: Vec<ExperimentSnapshot> = self
            .experiments
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();

        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        snapshots
    }
}

impl Default for AbTestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AbTestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbTestStore")
            .field("experiments", &self.experiments.len())
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

fn not_found(experiment_id: &str) -> Error {
    debug!(experiment_id, "experiment not found");
    Error::NotFound(experiment_id.to_string())
}

/// Builder for [`AbTestStore`].
#[derive(Default)]
pub struct AbTestStoreBuilder {
    config: StoreConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl AbTestStoreBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the identifier allocation strategy.
    #[must_use]
    pub fn id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.config.id_strategy = id_strategy;
        self
    }

    /// Pre-allocate registry capacity.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Inject a clock (tests use a fixed one).
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn build(self) -> Result<AbTestStore> {
        self.config.validate()?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(AbTestStore::from_parts(&self.config, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ExperimentStatus;
    use chrono::{DateTime, TimeZone, Utc};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn sequential_store() -> AbTestStore {
        AbTestStore::builder()
            .id_strategy(IdStrategy::Sequential {
                prefix: "exp-".to_string(),
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_store_default() {
        let store = AbTestStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.list_experiments().is_empty());
    }

    #[test]
    fn test_create_and_get() {
        let store = sequential_store();
        let created = store
            .create_experiment(ExperimentDraft::new("cta-test", ["A", "B"]))
            .unwrap();

        assert_eq!(created.id, "exp-1");
        assert!(store.contains("exp-1"));
        assert_eq!(store.get_experiment("exp-1").unwrap(), created);
    }

    #[test]
    fn test_rejected_create_does_not_insert() {
        let store = sequential_store();
        assert!(store
            .create_experiment(ExperimentDraft::new("dup", ["A", "A"]))
            .is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_id_not_found() {
        let store = AbTestStore::new();
        assert!(matches!(
            store.get_experiment("missing"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.record_event("missing", "A", EventType::Impression, None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.finalize_experiment("missing", "A", ""),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_injected_clock_stamps_lifecycle() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let store = AbTestStore::builder()
            .clock(Arc::new(FixedClock(at)))
            .build()
            .unwrap();

        let exp = store
            .create_experiment(ExperimentDraft::new("clocked", ["A"]))
            .unwrap();
        let finalized = store.finalize_experiment(&exp.id, "A", "done").unwrap();

        assert_eq!(exp.created_at, at);
        assert_eq!(finalized.finalized_at, Some(at));
        assert_eq!(finalized.status, ExperimentStatus::Finalized);
    }

    #[test]
    fn test_list_is_ordered_by_creation() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let store = AbTestStore::builder()
            .id_strategy(IdStrategy::Sequential {
                prefix: "exp-".to_string(),
            })
            .clock(Arc::new(FixedClock(at)))
            .build()
            .unwrap();
        for name in ["first", "second", "third"] {
            store
                .create_experiment(ExperimentDraft::new(name, ["A"]))
                .unwrap();
        }

        let names: Vec<String> = store
            .list_experiments()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = AbTestStore::builder()
            .id_strategy(IdStrategy::Sequential {
                prefix: String::new(),
            })
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
