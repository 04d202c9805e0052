use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::log_entry::LogEntry;
use super::stage::Stage;
use super::timestamp::lenient_optional;

/// Errors raised when advancing a cycle through its stages.
#[derive(Debug, Error, PartialEq)]
pub enum CycleError {
    #[error("The cloning date is the anchor of a cycle and cannot be changed")]
    AnchorImmutable,

    #[error("Cycle already reached {0}; stages are never rolled back")]
    AlreadyReached(Stage),

    #[error("Cannot set {stage}: later stage {later} is already set")]
    LaterStageSet { stage: Stage, later: Stage },

    #[error("Cannot set {stage} at {at}: earlier stage started at {floor}")]
    OutOfOrder {
        stage: Stage,
        at: DateTime<Utc>,
        floor: DateTime<Utc>,
    },
}

/// How many plants a cycle drew from one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantCount {
    pub batch_id: String,
    pub plant_count: u32,
}

impl PlantCount {
    pub fn new(batch_id: impl Into<String>, plant_count: u32) -> Self {
        Self {
            batch_id: batch_id.into(),
            plant_count,
        }
    }
}

/// One group of plants tracked from cloning through harvest in one room.
///
/// The current stage is never stored. It is derived from the transition
/// timestamps (see [`crate::stage::derive_stage`]), which can only be set
/// through [`CultivationCycle::advance_to`] so they stay in stage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CultivationCycle {
    pub id: String,
    pub genetics_id: String,
    /// Room the cycle grows in
    pub location_id: String,
    pub cloned_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pre_vegetation_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    vegetation_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    flowering_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    drying_curing_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    harvested_at: Option<DateTime<Utc>>,
    /// Provenance; fixed when the cycle is configured
    #[serde(default)]
    pub plant_counts: Vec<PlantCount>,
    /// Append-only
    #[serde(default)]
    pub log_entries: Vec<LogEntry>,
    #[serde(default)]
    pub archived: bool,
}

impl CultivationCycle {
    pub fn new(
        genetics_id: impl Into<String>,
        location_id: impl Into<String>,
        cloned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            genetics_id: genetics_id.into(),
            location_id: location_id.into(),
            cloned_at,
            pre_vegetation_at: None,
            vegetation_at: None,
            flowering_at: None,
            drying_curing_at: None,
            harvested_at: None,
            plant_counts: Vec::new(),
            log_entries: Vec::new(),
            archived: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_plant_counts(mut self, plant_counts: Vec<PlantCount>) -> Self {
        self.plant_counts = plant_counts;
        self
    }

    /// Timestamp at which `stage` began, if it has been reached.
    ///
    /// Cloning always has a start: the anchor timestamp.
    pub fn transition_at(&self, stage: Stage) -> Option<DateTime<Utc>> {
        match stage {
            Stage::Cloning => Some(self.cloned_at),
            Stage::PreVegetation => self.pre_vegetation_at,
            Stage::Vegetation => self.vegetation_at,
            Stage::Flowering => self.flowering_at,
            Stage::DryingCuring => self.drying_curing_at,
            Stage::Harvested => self.harvested_at,
        }
    }

    fn slot_mut(&mut self, stage: Stage) -> Option<&mut Option<DateTime<Utc>>> {
        match stage {
            Stage::Cloning => None,
            Stage::PreVegetation => Some(&mut self.pre_vegetation_at),
            Stage::Vegetation => Some(&mut self.vegetation_at),
            Stage::Flowering => Some(&mut self.flowering_at),
            Stage::DryingCuring => Some(&mut self.drying_curing_at),
            Stage::Harvested => Some(&mut self.harvested_at),
        }
    }

    /// Records that the cycle entered `stage` at `at`.
    ///
    /// Stages may be skipped, but timestamps must be non-decreasing in
    /// stage order and each stage is set at most once.
    pub fn advance_to(&mut self, stage: Stage, at: DateTime<Utc>) -> Result<(), CycleError> {
        if stage == Stage::Cloning {
            return Err(CycleError::AnchorImmutable);
        }
        if self.transition_at(stage).is_some() {
            return Err(CycleError::AlreadyReached(stage));
        }
        if let Some(later) = Stage::ALL
            .iter()
            .copied()
            .filter(|s| *s > stage)
            .find(|s| self.transition_at(*s).is_some())
        {
            return Err(CycleError::LaterStageSet { stage, later });
        }

        let floor = Stage::ALL
            .iter()
            .copied()
            .filter(|s| *s < stage)
            .filter_map(|s| self.transition_at(s))
            .max()
            .unwrap_or(self.cloned_at);
        if at < floor {
            return Err(CycleError::OutOfOrder { stage, at, floor });
        }

        if let Some(slot) = self.slot_mut(stage) {
            *slot = Some(at);
        }
        Ok(())
    }

    /// Stages that have a start timestamp, earliest first.
    pub fn transitions(&self) -> Vec<(Stage, DateTime<Utc>)> {
        Stage::ALL
            .iter()
            .filter_map(|s| self.transition_at(*s).map(|at| (*s, at)))
            .collect()
    }

    pub fn has_log_entry(&self, id: &str) -> bool {
        self.log_entries.iter().any(|e| e.id == id)
    }

    pub fn total_plants(&self) -> u32 {
        self.plant_counts.iter().map(|pc| pc.plant_count).sum()
    }

    /// Soft-deletes the cycle.
    pub fn archive(&mut self) {
        self.archived = true;
    }

    pub fn restore(&mut self) {
        self.archived = false;
    }
}

impl fmt::Display for CultivationCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cycle {} ({})", self.id, self.location_id)?;
        writeln!(f, "Genetics: {}", self.genetics_id)?;
        for (stage, at) in self.transitions() {
            writeln!(f, "  {:<15} {}", stage.to_string(), at.format("%Y-%m-%d"))?;
        }
        if !self.plant_counts.is_empty() {
            writeln!(f, "Plants: {}", self.total_plants())?;
        }
        if self.archived {
            writeln!(f, "(archived)")?;
        }
        Ok(())
    }
}
