//! Incremental export of records newer than a high-water mark.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::envelope::{CycleLogDelta, EnvelopeData, SyncEnvelope};
use super::Stamped;
use crate::dataset::Dataset;

fn newer_than<T: Stamped + Clone>(records: &[T], mark: Option<DateTime<Utc>>) -> Vec<T> {
    records
        .iter()
        .filter(|r| mark.map_or(true, |mark| r.stamp() > mark))
        .cloned()
        .collect()
}

/// Builds an envelope of every record stamped strictly after
/// `high_water_mark` (all records when there is none).
///
/// Log entries travel per cycle, never as whole cycles. Returns `None`
/// when nothing is new.
pub fn export_delta(
    dataset: &Dataset,
    high_water_mark: Option<DateTime<Utc>>,
    exported_by: &str,
    now: DateTime<Utc>,
) -> Option<SyncEnvelope> {
    let data = EnvelopeData {
        new_log_entries_by_cycle: dataset
            .cycles
            .iter()
            .filter_map(|cycle| {
                let entries = newer_than(&cycle.log_entries, high_water_mark);
                (!entries.is_empty()).then(|| CycleLogDelta {
                    cycle_id: cycle.id.clone(),
                    entries,
                })
            })
            .collect(),
        new_expenses: newer_than(&dataset.expenses, high_water_mark),
        new_plant_batches: newer_than(&dataset.batches, high_water_mark),
        new_maintenance_logs: newer_than(&dataset.maintenance_logs, high_water_mark),
    };

    if data.is_empty() {
        tracing::debug!(since = ?high_water_mark, "Nothing new to export");
        return None;
    }
    tracing::info!(
        records = data.record_count(),
        by = exported_by,
        "Exported incremental delta"
    );
    Some(SyncEnvelope::new(exported_by, now, data))
}

/// A collaborator's export bookkeeping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Time of the previous export that produced an envelope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_export_at: Option<DateTime<Utc>>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exports everything newer than the previous export and, if an
    /// envelope was produced, moves the high-water mark to `now`.
    pub fn export(
        &mut self,
        dataset: &Dataset,
        exported_by: &str,
        now: DateTime<Utc>,
    ) -> Option<SyncEnvelope> {
        let envelope = export_delta(dataset, self.last_export_at, exported_by, now)?;
        self.last_export_at = Some(now);
        Some(envelope)
    }
}
