//! A/B Experiments
//!
//! Data model and lifecycle for in-process A/B tests.
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Variant (N, fixed at creation)
//!                       └── VariantMetrics { impressions, conversions, conversion_value_sum }
//!
//! status: running ──finalize──> finalized   (terminal, metrics frozen)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use abtest_store::experiment::{EventType, ExperimentDraft, ExperimentStatus};
//! use abtest_store::AbTestStore;
//!
//! let store = AbTestStore::new();
//!
//! // Create an experiment
//! let draft = ExperimentDraft::new("cta-test", ["A", "B"])
//!     .primary_metric("conversion_rate")
//!     .owner("growth");
//! let exp = store.create_experiment(draft)?;
//!
//! // Record events
//! store.record_event(&exp.id, "A", EventType::Impression, None)?;
//! store.record_event(&exp.id, "B", EventType::Conversion, Some(12.5))?;
//!
//! // Declare the winner
//! let done = store.finalize_experiment(&exp.id, "B", "Variant B outperformed A by 15%")?;
//! assert_eq!(done.status, ExperimentStatus::Finalized);
//! # Ok::<(), abtest_store::Error>(())
//! ```

mod event;
mod experiment_record;
mod snapshot;
mod store;
mod variant_metrics;

pub use event::EventType;
pub use experiment_record::{
    EventOutcome, Experiment, ExperimentDraft, ExperimentStatus, DEFAULT_PRIMARY_METRIC,
};
pub use snapshot::{ExperimentSnapshot, VariantSnapshot};
pub use store::{AbTestStore, AbTestStoreBuilder};
pub use variant_metrics::{VariantMetrics, VariantSet};
