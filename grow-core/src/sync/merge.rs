//! Additive merge of an incoming envelope.
//!
//! Records are matched by id only. Anything already present is skipped,
//! and collections that gained records are re-sorted by (timestamp, id).
//! Merging is therefore idempotent, and envelopes can be applied in any
//! order with the same result as long as record ids are unique.

use std::collections::HashSet;
use std::fmt;

use super::envelope::{SyncEnvelope, ENVELOPE_KIND};
use super::error::SyncError;
use super::Stamped;
use crate::dataset::Dataset;

/// What a merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub added: usize,
    /// Already present locally
    pub skipped: usize,
    /// Log entries for cycles this dataset does not have
    pub orphaned: usize,
}

impl MergeSummary {
    fn tally(&mut self, (added, skipped): (usize, usize)) {
        self.added += added;
        self.skipped += skipped;
    }
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merged {}, skipped {} already present",
            self.added, self.skipped
        )?;
        if self.orphaned > 0 {
            write!(f, ", dropped {} for unknown cycles", self.orphaned)?;
        }
        Ok(())
    }
}

/// Appends incoming records whose id is not yet in `local`, then restores
/// canonical order if anything was added. Returns (added, skipped).
fn merge_by_id<T: Stamped + Clone>(local: &mut Vec<T>, incoming: &[T]) -> (usize, usize) {
    let mut seen: HashSet<String> = local.iter().map(|r| r.id().to_string()).collect();
    let before = local.len();
    for record in incoming {
        if seen.insert(record.id().to_string()) {
            local.push(record.clone());
        }
    }
    let added = local.len() - before;
    if added > 0 {
        local.sort_by(|a, b| a.stamp().cmp(&b.stamp()).then_with(|| a.id().cmp(b.id())));
    }
    (added, incoming.len() - added)
}

/// Merges `envelope` into a copy of `dataset`.
///
/// The input is left untouched; callers replace their dataset with the
/// returned one, so a merge either applies completely or not at all. An
/// envelope not tagged as an incremental export is rejected outright.
pub fn merge_delta(
    dataset: &Dataset,
    envelope: &SyncEnvelope,
) -> Result<(Dataset, MergeSummary), SyncError> {
    if envelope.kind != ENVELOPE_KIND {
        return Err(SyncError::WrongKind(Some(envelope.kind.clone())));
    }

    let mut merged = dataset.clone();
    let mut summary = MergeSummary::default();

    for delta in &envelope.data.new_log_entries_by_cycle {
        match merged.find_cycle_mut(&delta.cycle_id) {
            Some(cycle) => summary.tally(merge_by_id(&mut cycle.log_entries, &delta.entries)),
            None => {
                tracing::warn!(
                    cycle = %delta.cycle_id,
                    entries = delta.entries.len(),
                    "Dropping log entries for unknown cycle"
                );
                summary.orphaned += delta.entries.len();
            }
        }
    }
    summary.tally(merge_by_id(&mut merged.expenses, &envelope.data.new_expenses));
    summary.tally(merge_by_id(
        &mut merged.batches,
        &envelope.data.new_plant_batches,
    ));
    summary.tally(merge_by_id(
        &mut merged.maintenance_logs,
        &envelope.data.new_maintenance_logs,
    ));

    tracing::info!(
        from = %envelope.exported_by,
        added = summary.added,
        skipped = summary.skipped,
        orphaned = summary.orphaned,
        "Merged incremental delta"
    );
    Ok((merged, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CultivationCycle, Expense, LogEntry, MaintenanceLog, PlantBatch};
    use crate::sync::envelope::{CycleLogDelta, EnvelopeData};
    use crate::sync::export::export_delta;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn entry(id: &str, hour: i64) -> LogEntry {
        LogEntry::new(at(hour)).with_id(id)
    }

    fn local() -> Dataset {
        let mut x = CultivationCycle::new("gen-1", "room-1", at(-500)).with_id("X");
        x.log_entries = vec![entry("x0", 0)];
        let y = CultivationCycle::new("gen-2", "room-2", at(-500)).with_id("Y");
        Dataset {
            cycles: vec![x, y],
            expenses: vec![Expense::new("loc-1", 5.0, at(1)).with_id("exp-0")],
            ..Dataset::default()
        }
    }

    fn envelope(
        by: &str,
        cycle_entries: Vec<(&str, Vec<LogEntry>)>,
        data: EnvelopeData,
    ) -> SyncEnvelope {
        let mut data = data;
        data.new_log_entries_by_cycle = cycle_entries
            .into_iter()
            .map(|(cycle_id, entries)| CycleLogDelta {
                cycle_id: cycle_id.to_string(),
                entries,
            })
            .collect();
        SyncEnvelope::new(by, at(100), data)
    }

    fn e1() -> SyncEnvelope {
        envelope(
            "ana",
            vec![("X", vec![entry("a1", 5), entry("a2", 6)])],
            EnvelopeData {
                new_expenses: vec![Expense::new("loc-1", 7.0, at(4)).with_id("exp-a")],
                new_plant_batches: vec![PlantBatch::new("B", "gen-1", 8, "room-c", at(3))
                    .with_id("batch-a")],
                ..EnvelopeData::default()
            },
        )
    }

    fn e2() -> SyncEnvelope {
        envelope(
            "luis",
            vec![
                ("X", vec![entry("a2", 6), entry("b1", 2)]),
                ("Y", vec![entry("b2", 3)]),
            ],
            EnvelopeData {
                new_maintenance_logs: vec![MaintenanceLog::new("t", "Clean", "u", "loc-1", at(7))
                    .with_id("mlog-b")],
                ..EnvelopeData::default()
            },
        )
    }

    #[test]
    fn test_merge_appends_new_records() {
        let (merged, summary) = merge_delta(&local(), &e1()).unwrap();
        assert_eq!(summary.added, 4);
        assert_eq!(summary.skipped, 0);
        let x = merged.find_cycle("X").unwrap();
        assert_eq!(x.log_entries.len(), 3);
        assert_eq!(merged.expenses.len(), 2);
        assert_eq!(merged.batches.len(), 1);
    }

    #[test]
    fn test_merge_does_not_touch_input() {
        let before = local();
        let _ = merge_delta(&before, &e1()).unwrap();
        assert_eq!(before, local());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (once, _) = merge_delta(&local(), &e1()).unwrap();
        let (twice, summary) = merge_delta(&once, &e1()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.skipped, 4);
    }

    #[test]
    fn test_merge_is_commutative() {
        let (ab, _) = merge_delta(&local(), &e1()).unwrap();
        let (ab, _) = merge_delta(&ab, &e2()).unwrap();
        let (ba, _) = merge_delta(&local(), &e2()).unwrap();
        let (ba, _) = merge_delta(&ba, &e1()).unwrap();
        assert_eq!(ab, ba);

        let ids: Vec<&str> = ab
            .find_cycle("X")
            .unwrap()
            .log_entries
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["x0", "b1", "a1", "a2"]);
    }

    #[test]
    fn test_merge_rejects_other_document_kinds() {
        let mut full_backup = e1();
        full_backup.kind = "full-backup".to_string();

        let err = merge_delta(&local(), &full_backup).unwrap_err();
        assert!(matches!(err, SyncError::WrongKind(Some(ref kind)) if kind == "full-backup"));
        assert!(err.to_string().starts_with("Not a valid export"));
    }

    #[test]
    fn test_unknown_cycle_is_dropped() {
        let env = envelope(
            "ana",
            vec![("Z", vec![entry("z1", 1), entry("z2", 2)])],
            EnvelopeData::default(),
        );
        let (merged, summary) = merge_delta(&local(), &env).unwrap();
        assert_eq!(summary.orphaned, 2);
        assert_eq!(summary.added, 0);
        assert!(merged.find_cycle("Z").is_none());
        assert_eq!(merged, local());
    }

    #[test]
    fn test_collaborator_overlap_scenario() {
        // A logged three entries for X after T1; B already has one of them
        let t1 = at(10);
        let mut a = local();
        a.find_cycle_mut("X")
            .unwrap()
            .log_entries
            .extend([entry("n1", 11), entry("n2", 12), entry("n3", 13)]);
        let envelope = export_delta(&a, Some(t1), "ana", at(20)).unwrap();
        assert_eq!(envelope.data.new_log_entries_by_cycle[0].entries.len(), 3);

        let mut b = local();
        b.find_cycle_mut("X").unwrap().log_entries.push(entry("n2", 12));

        let (merged, summary) = merge_delta(&b, &envelope).unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.skipped, 1);
        let new_ids: Vec<&str> = merged
            .find_cycle("X")
            .unwrap()
            .log_entries
            .iter()
            .filter(|e| e.date > t1)
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(new_ids, vec!["n1", "n2", "n3"]);
    }

    #[test]
    fn test_summary_display() {
        let summary = MergeSummary {
            added: 3,
            skipped: 1,
            orphaned: 0,
        };
        assert_eq!(summary.to_string(), "merged 3, skipped 1 already present");
        let with_orphans = MergeSummary { orphaned: 2, ..summary };
        assert!(with_orphans.to_string().ends_with("dropped 2 for unknown cycles"));
    }
}
