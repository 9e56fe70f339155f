//! Store configuration
//!
//! Configuration is plain data (`serde`-deserializable) so it can be loaded
//! from a JSON document alongside whatever hosts the store. The clock is not
//! data and is injected through [`crate::AbTestStoreBuilder::clock`].

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Source of timestamps for `created_at` / `finalized_at`.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock (`Utc::now`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// How experiment identifiers are allocated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random v4 UUID, hyphenated.
    #[default]
    Uuid,
    /// `"{prefix}{n}"` with `n` counting up from 1.
    Sequential {
        /// Non-empty prefix, e.g. `"exp-"`.
        prefix: String,
    },
}

/// Configuration for [`crate::AbTestStore`].
///
/// ```rust
/// use abtest_store::config::{IdStrategy, StoreConfig};
///
/// let config = StoreConfig::from_json(
///     r#"{"id_strategy": {"kind": "sequential", "prefix": "exp-"}, "initial_capacity": 64}"#,
/// )?;
/// assert_eq!(config.initial_capacity, 64);
/// assert_eq!(config.id_strategy, IdStrategy::Sequential { prefix: "exp-".into() });
/// # Ok::<(), abtest_store::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Identifier allocation strategy.
    pub id_strategy: IdStrategy,
    /// Pre-allocated registry capacity.
    pub initial_capacity: usize,
}

impl StoreConfig {
    /// Parse a configuration from JSON; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed JSON and [`Error::Config`] if the
    /// parsed values are invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for invalid values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a sequential id prefix is empty.
    pub fn validate(&self) -> Result<()> {
        if let IdStrategy::Sequential { prefix } = &self.id_strategy {
            if prefix.is_empty() {
                return Err(Error::Config(
                    "sequential id strategy requires a non-empty prefix".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Allocates identifiers according to an [`IdStrategy`].
#[derive(Debug)]
pub(crate) enum IdGenerator {
    Uuid,
    Sequential { prefix: String, next: AtomicU64 },
}

impl IdGenerator {
    pub(crate) fn new(strategy: &IdStrategy) -> Self {
        match strategy {
            IdStrategy::Uuid => Self::Uuid,
            IdStrategy::Sequential { prefix } => Self::Sequential {
                prefix: prefix.clone(),
                next: AtomicU64::new(1),
            },
        }
    }

    pub(crate) fn next_id(&self) -> String {
        match self {
            Self::Uuid => Uuid::new_v4().to_string(),
            Self::Sequential { prefix, next } => {
                let n = next.fetch_add(1, Ordering::Relaxed);
                format!("{prefix}{n}")
            }
        }
    }
}
