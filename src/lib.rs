//! # abtest-store: In-Process A/B Testing Experiment Store
//!
//! **Version**: 0.1.0
//!
//! abtest-store keeps A/B experiments in memory for the lifetime of the
//! process. Each experiment declares a fixed set of variants, counts
//! impressions and conversions per variant while running, and is finalized
//! exactly once with a declared winner, after which its metrics are frozen.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: The variant set is fixed by construction; inputs
//!   are validated before any mutation
//! - **Jidoka**: Per-experiment locking makes concurrent events linearizable
//! - **Genchi Genbutsu**: Reads return owned snapshots, ranked by conversion
//!   rate, so callers see exactly what was measured
//!
//! ## Example Usage
//!
//! ```rust
//! use abtest_store::experiment::{EventType, ExperimentDraft};
//! use abtest_store::AbTestStore;
//!
//! let store = AbTestStore::new();
//! let exp = store.create_experiment(ExperimentDraft::new("cta-test", ["A", "B"]).owner("growth"))?;
//!
//! store.record_event(&exp.id, "A", EventType::Impression, None)?;
//! store.record_event(&exp.id, "B", EventType::Conversion, Some(12.5))?;
//! store.finalize_experiment(&exp.id, "B", "Variant B outperformed A by 15%")?;
//!
//! let snapshot = store.get_experiment(&exp.id)?;
//! assert_eq!(snapshot.winning_variant.as_deref(), Some("B"));
//! # Ok::<(), abtest_store::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod api;
pub mod config;
pub mod error;
pub mod experiment;

pub use error::{Error, Result};
pub use experiment::{AbTestStore, AbTestStoreBuilder};
