use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::log_entry::LogEntry;

#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("Batch {batch_id}: {available} available exceeds the {limit} usable plants")]
    AvailableExceedsLimit {
        batch_id: String,
        available: u32,
        limit: u32,
    },

    #[error("Batch {batch_id}: {rooted} rooted exceeds the {initial} initial plants")]
    RootedExceedsInitial {
        batch_id: String,
        rooted: u32,
        initial: u32,
    },

    #[error("Batch {batch_id}: requested {requested} plants but only {available} available")]
    InsufficientPlants {
        batch_id: String,
        requested: u32,
        available: u32,
    },

    #[error("Batch not found: {0}")]
    NotFound(String),
}

/// Operator-set status of a batch. Unlike a cycle's stage it is stored,
/// not derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStatus {
    #[default]
    Rooting,
    PreVegetation,
    InUse,
    Depleted,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Rooting => write!(f, "rooting"),
            BatchStatus::PreVegetation => write!(f, "pre-vegetation"),
            BatchStatus::InUse => write!(f, "in-use"),
            BatchStatus::Depleted => write!(f, "depleted"),
        }
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "rooting" | "germinating" => Ok(BatchStatus::Rooting),
            "pre-vegetation" => Ok(BatchStatus::PreVegetation),
            "in-use" => Ok(BatchStatus::InUse),
            "depleted" => Ok(BatchStatus::Depleted),
            _ => Err(format!(
                "Invalid batch status '{}'. Valid options: rooting, pre-vegetation, in-use, depleted",
                s
            )),
        }
    }
}

/// A group of clones or seedlings started together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantBatch {
    pub id: String,
    pub name: String,
    pub genetics_id: String,
    pub created_at: DateTime<Utc>,
    initial_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rooted_count: Option<u32>,
    available_count: u32,
    #[serde(default)]
    pub status: BatchStatus,
    pub source_location_id: String,
    #[serde(default)]
    pub log_entries: Vec<LogEntry>,
}

impl PlantBatch {
    /// Creates a batch with every plant available.
    pub fn new(
        name: impl Into<String>,
        genetics_id: impl Into<String>,
        initial_count: u32,
        source_location_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            genetics_id: genetics_id.into(),
            created_at,
            initial_count,
            rooted_count: None,
            available_count: initial_count,
            status: BatchStatus::Rooting,
            source_location_id: source_location_id.into(),
            log_entries: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn initial_count(&self) -> u32 {
        self.initial_count
    }

    pub fn rooted_count(&self) -> Option<u32> {
        self.rooted_count
    }

    pub fn available_count(&self) -> u32 {
        self.available_count
    }

    /// Upper bound for `available_count`: rooted plants once counted,
    /// otherwise the initial count.
    pub fn usable_limit(&self) -> u32 {
        self.rooted_count.unwrap_or(self.initial_count)
    }

    /// Records how many plants rooted. Available plants are capped to the
    /// new limit.
    pub fn set_rooted(&mut self, rooted: u32) -> Result<(), BatchError> {
        if rooted > self.initial_count {
            return Err(BatchError::RootedExceedsInitial {
                batch_id: self.id.clone(),
                rooted,
                initial: self.initial_count,
            });
        }
        self.rooted_count = Some(rooted);
        self.available_count = self.available_count.min(rooted);
        Ok(())
    }

    pub fn set_available(&mut self, available: u32) -> Result<(), BatchError> {
        let limit = self.usable_limit();
        if available > limit {
            return Err(BatchError::AvailableExceedsLimit {
                batch_id: self.id.clone(),
                available,
                limit,
            });
        }
        self.available_count = available;
        Ok(())
    }

    /// Takes `count` plants out of the batch for a cycle and updates the
    /// status to in-use or depleted.
    pub fn draw(&mut self, count: u32) -> Result<(), BatchError> {
        if count > self.available_count {
            return Err(BatchError::InsufficientPlants {
                batch_id: self.id.clone(),
                requested: count,
                available: self.available_count,
            });
        }
        self.available_count -= count;
        self.status = if self.available_count == 0 {
            BatchStatus::Depleted
        } else {
            BatchStatus::InUse
        };
        Ok(())
    }

    /// Checks the count invariant on data that did not go through the
    /// setters (e.g. a merged or restored document).
    pub fn validate(&self) -> Result<(), BatchError> {
        if let Some(rooted) = self.rooted_count {
            if rooted > self.initial_count {
                return Err(BatchError::RootedExceedsInitial {
                    batch_id: self.id.clone(),
                    rooted,
                    initial: self.initial_count,
                });
            }
        }
        let limit = self.usable_limit();
        if self.available_count > limit {
            return Err(BatchError::AvailableExceedsLimit {
                batch_id: self.id.clone(),
                available: self.available_count,
                limit,
            });
        }
        Ok(())
    }
}

impl fmt::Display for PlantBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}/{} available ({})",
            self.name,
            self.id,
            self.available_count,
            self.usable_limit(),
            self.status
        )
    }
}
