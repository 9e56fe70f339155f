//! Request bodies and the store facade used by an HTTP layer
//!
//! Route registration is not part of this crate. A host wires these into
//! its router:
//!
//! | Method | Path                          | Body                          |
//! |--------|-------------------------------|-------------------------------|
//! | POST   | `/experiments`                | [`CreateExperimentRequest`]   |
//! | POST   | `/experiments/{id}/events`    | [`RecordEventRequest`]        |
//! | POST   | `/experiments/{id}/finalize`  | [`FinalizeExperimentRequest`] |
//! | GET    | `/experiments/{id}`           | -                             |
//!
//! Every call answers with an [`ExperimentSnapshot`]; errors carry a status
//! hint via [`Error::status_code`](crate::Error::status_code).

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::experiment::{
    AbTestStore, EventType, ExperimentDraft, ExperimentSnapshot, DEFAULT_PRIMARY_METRIC,
};
use crate::Result;

fn default_primary_metric() -> String {
    DEFAULT_PRIMARY_METRIC.to_string()
}

/// Body of `POST /experiments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExperimentRequest {
    /// Display name.
    pub name: String,
    /// Variant labels in declaration order.
    pub variants: Vec<String>,
    /// Ranking metric, `"conversion_rate"` if omitted.
    #[serde(default = "default_primary_metric")]
    pub primary_metric: String,
    /// Creator.
    #[serde(default)]
    pub owner: String,
}

impl From<CreateExperimentRequest> for ExperimentDraft {
    fn from(req: CreateExperimentRequest) -> Self {
        Self::new(req.name, req.variants)
            .primary_metric(req.primary_metric)
            .owner(req.owner)
    }
}

/// Body of `POST /experiments/{id}/events`.
///
/// `event_type` stays a string so an unknown type surfaces as
/// `InvalidArgument` from the store rather than as a body parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEventRequest {
    /// Target variant label.
    pub variant: String,
    /// `"impression"` or `"conversion"`.
    pub event_type: String,
    /// Conversion value; ignored for impressions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Body of `POST /experiments/{id}/finalize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeExperimentRequest {
    /// Declared winner.
    pub winning_variant: String,
    /// Free-text outcome.
    #[serde(default)]
    pub summary: String,
}

/// Thin facade translating request bodies into store calls.
#[derive(Debug, Clone)]
pub struct ExperimentApi {
    store: Arc<AbTestStore>,
}

impl ExperimentApi {
    /// Wrap a shared store.
    #[must_use]
    pub const fn new(store: Arc<AbTestStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<AbTestStore> {
        &self.store
    }

    /// `POST /experiments`
    ///
    /// # Errors
    ///
    /// Propagates [`AbTestStore::create_experiment`] errors.
    pub fn create(&self, req: CreateExperimentRequest) -> Result<ExperimentSnapshot> {
        self.store.create_experiment(req.into())
    }

    /// `POST /experiments/{id}/events`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown event type, otherwise propagates
    /// [`AbTestStore::record_event`] errors.
    pub fn record_event(
        &self,
        experiment_id: &str,
        req: RecordEventRequest,
    ) -> Result<ExperimentSnapshot> {
        let event_type: EventType = req.event_type.parse()?;
        self.store
            .record_event(experiment_id, &req.variant, event_type, req.value)
    }

    /// `POST /experiments/{id}/finalize`
    ///
    /// # Errors
    ///
    /// Propagates [`AbTestStore::finalize_experiment`] errors.
    pub fn finalize(
        &self,
        experiment_id: &str,
        req: FinalizeExperimentRequest,
    ) -> Result<ExperimentSnapshot> {
        self.store
            .finalize_experiment(experiment_id, &req.winning_variant, req.summary)
    }

    /// `GET /experiments/{id}`
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub fn get(&self, experiment_id: &str) -> Result<ExperimentSnapshot> {
        self.store.get_experiment(experiment_id)
    }

    /// `POST /experiments` with a raw JSON body.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Json`] for an unparsable body, otherwise as [`Self::create`].
    pub fn create_json(&self, body: &str) -> Result<ExperimentSnapshot> {
        self.create(parse_body(body)?)
    }

    /// `POST /experiments/{id}/events` with a raw JSON body.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Json`] for an unparsable body, otherwise as
    /// [`Self::record_event`].
    pub fn record_event_json(&self, experiment_id: &str, body: &str) -> Result<ExperimentSnapshot> {
        self.record_event(experiment_id, parse_body(body)?)
    }

    /// `POST /experiments/{id}/finalize` with a raw JSON body.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Json`] for an unparsable body, otherwise as [`Self::finalize`].
    pub fn finalize_json(&self, experiment_id: &str, body: &str) -> Result<ExperimentSnapshot> {
        self.finalize(experiment_id, parse_body(body)?)
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}
