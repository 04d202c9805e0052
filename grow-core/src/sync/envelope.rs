//! The incremental export document exchanged between collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::SyncError;
use crate::models::{Expense, LogEntry, MaintenanceLog, PlantBatch};

/// Tag of the only envelope format this version reads and writes.
pub const ENVELOPE_KIND: &str = "incremental-export-v1";

/// Sections every envelope's `data` object must carry.
const SECTIONS: [&str; 4] = [
    "newLogEntriesByCycle",
    "newExpenses",
    "newPlantBatches",
    "newMaintenanceLogs",
];

/// New log entries for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleLogDelta {
    pub cycle_id: String,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeData {
    pub new_log_entries_by_cycle: Vec<CycleLogDelta>,
    pub new_expenses: Vec<Expense>,
    pub new_plant_batches: Vec<PlantBatch>,
    pub new_maintenance_logs: Vec<MaintenanceLog>,
}

impl EnvelopeData {
    pub fn is_empty(&self) -> bool {
        self.new_log_entries_by_cycle.is_empty()
            && self.new_expenses.is_empty()
            && self.new_plant_batches.is_empty()
            && self.new_maintenance_logs.is_empty()
    }

    /// Number of records carried, counting each log entry.
    pub fn record_count(&self) -> usize {
        self.new_log_entries_by_cycle
            .iter()
            .map(|d| d.entries.len())
            .sum::<usize>()
            + self.new_expenses.len()
            + self.new_plant_batches.len()
            + self.new_maintenance_logs.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEnvelope {
    pub kind: String,
    pub exported_by: String,
    pub exported_at: DateTime<Utc>,
    pub data: EnvelopeData,
}

impl SyncEnvelope {
    pub fn new(
        exported_by: impl Into<String>,
        exported_at: DateTime<Utc>,
        data: EnvelopeData,
    ) -> Self {
        Self {
            kind: ENVELOPE_KIND.to_string(),
            exported_by: exported_by.into(),
            exported_at,
            data,
        }
    }

    /// Parses and validates an envelope.
    ///
    /// The tag and all four sections are checked before any record is
    /// decoded, so a rejected document never yields a partial envelope.
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        let value: Value = serde_json::from_str(text)?;

        match value.get("kind").and_then(Value::as_str) {
            Some(ENVELOPE_KIND) => {}
            other => return Err(SyncError::WrongKind(other.map(str::to_string))),
        }

        let data = value
            .get("data")
            .filter(|d| d.is_object())
            .ok_or(SyncError::MissingSection("data"))?;
        for section in SECTIONS {
            if !data.get(section).is_some_and(Value::is_array) {
                return Err(SyncError::MissingSection(section));
            }
        }

        serde_json::from_value(value).map_err(|e| SyncError::MalformedRecords(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
