//! Incremental exchange of records with other collaborators.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use grow_core::{merge_delta, MergeSummary, SyncEnvelope};

use crate::config::Config;
use crate::storage::DataStore;

/// Exchange new records with collaborators
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: SyncSubcommand,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Export records added since the last export
    Export {
        /// Output file, defaults to grow-records-<collaborator>-<date>.json
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Merge a collaborator's export into the local records
    Import { path: PathBuf },

    /// Show when records were last exported
    Status,
}

/// What `sync export` did.
#[derive(Debug, PartialEq)]
pub(crate) enum ExportOutcome {
    /// No record is newer than the previous export
    NothingNew { since: Option<DateTime<Utc>> },
    Written { path: PathBuf, records: usize },
}

/// Writes an envelope of the records added since the previous export.
///
/// The high-water mark is saved only once the file has been written.
pub(crate) fn export_records(
    store: &DataStore,
    collaborator: &str,
    out: Option<PathBuf>,
    now: DateTime<Utc>,
) -> Result<ExportOutcome, Box<dyn std::error::Error>> {
    let data = store.load()?;
    let mut state = store.load_sync_state()?;
    let since = state.last_export_at;

    let Some(envelope) = state.export(&data, collaborator, now) else {
        return Ok(ExportOutcome::NothingNew { since });
    };

    let path = out.unwrap_or_else(|| {
        PathBuf::from(format!(
            "grow-records-{}-{}.json",
            collaborator,
            now.format("%Y-%m-%d")
        ))
    });
    fs::write(&path, envelope.to_json()?)?;
    store.save_sync_state(&state)?;

    Ok(ExportOutcome::Written {
        path,
        records: envelope.data.record_count(),
    })
}

/// Merges the export at `path` into the stored records.
///
/// A rejected document leaves the store untouched. Returns who exported
/// the records and what the merge did.
pub(crate) fn import_records(
    store: &DataStore,
    path: &Path,
) -> Result<(String, MergeSummary), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let envelope = SyncEnvelope::from_json(&text)?;

    let data = store.load()?;
    let (merged, summary) = merge_delta(&data, &envelope)?;
    if merged != data {
        store.save(&merged)?;
    }
    Ok((envelope.exported_by, summary))
}

impl SyncCommand {
    pub fn run(
        &self,
        store: &DataStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SyncSubcommand::Export { out } => {
                let collaborator = &config.collaborator.value;
                match export_records(store, collaborator, out.clone(), Utc::now())? {
                    ExportOutcome::NothingNew { since: Some(at) } => {
                        println!("No new records to export since {}.", at.to_rfc3339());
                    }
                    ExportOutcome::NothingNew { since: None } => {
                        println!("No records to export.");
                    }
                    ExportOutcome::Written { path, records } => {
                        println!("Exported {} record(s) to {}", records, path.display());
                    }
                }
                Ok(())
            }

            SyncSubcommand::Import { path } => {
                let (exported_by, summary) = import_records(store, path)?;
                println!("Records from '{}': {}", exported_by, summary);
                Ok(())
            }

            SyncSubcommand::Status => {
                let state = store.load_sync_state()?;
                println!("Collaborator: {}", config.collaborator.value);
                match state.last_export_at {
                    Some(at) => println!("Last export:  {}", at.to_rfc3339()),
                    None => println!("Last export:  never"),
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use grow_core::{CultivationCycle, Dataset, LogEntry};
    use tempfile::TempDir;

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn cycle_with(entries: &[(&str, i64)]) -> Dataset {
        let mut cycle = CultivationCycle::new("gen-1", "room-1", at(-100)).with_id("c1");
        for (id, hour) in entries {
            cycle.log_entries.push(LogEntry::new(at(*hour)).with_id(*id));
        }
        Dataset {
            cycles: vec![cycle],
            ..Dataset::default()
        }
    }

    fn test_store(dir: &TempDir, name: &str, data: &Dataset) -> DataStore {
        let store = DataStore::new(dir.path().join(name));
        store.save(data).unwrap();
        store
    }

    #[test]
    fn test_second_export_has_nothing_new() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "ana", &cycle_with(&[("e1", 1), ("e2", 2)]));
        let out = dir.path().join("out.json");

        let first = export_records(&store, "ana", Some(out.clone()), at(10)).unwrap();
        assert_eq!(
            first,
            ExportOutcome::Written {
                path: out.clone(),
                records: 2
            }
        );
        let envelope = SyncEnvelope::from_json(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(envelope.exported_by, "ana");

        let second = export_records(&store, "ana", Some(out), at(11)).unwrap();
        assert_eq!(
            second,
            ExportOutcome::NothingNew {
                since: Some(at(10))
            }
        );
    }

    #[test]
    fn test_failed_write_keeps_export_mark() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "ana", &cycle_with(&[("e1", 1)]));
        let unwritable = dir.path().join("missing").join("out.json");

        assert!(export_records(&store, "ana", Some(unwritable), at(10)).is_err());
        assert_eq!(store.load_sync_state().unwrap().last_export_at, None);
    }

    #[test]
    fn test_import_reports_merge_summary() {
        let dir = TempDir::new().unwrap();
        let ana = test_store(&dir, "ana", &cycle_with(&[("e1", 1), ("e2", 2)]));
        let luis = test_store(&dir, "luis", &cycle_with(&[("e1", 1)]));
        let out = dir.path().join("ana.json");
        export_records(&ana, "ana", Some(out.clone()), at(10)).unwrap();

        let (by, summary) = import_records(&luis, &out).unwrap();
        assert_eq!(by, "ana");
        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(luis.load().unwrap(), ana.load().unwrap());
    }

    #[test]
    fn test_rejected_import_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir, "luis", &cycle_with(&[("e1", 1)]));
        let before = fs::read(store.dataset_path()).unwrap();

        let wrong_kind = dir.path().join("backup.json");
        fs::write(
            &wrong_kind,
            r#"{"kind": "full-backup", "exportedBy": "ana", "exportedAt": "2025-09-01T00:00:00Z",
                "data": {"newLogEntriesByCycle": [], "newExpenses": [],
                         "newPlantBatches": [], "newMaintenanceLogs": []}}"#,
        )
        .unwrap();

        let err = import_records(&store, &wrong_kind).unwrap_err();
        assert!(err.to_string().starts_with("Not a valid export"));
        assert_eq!(fs::read(store.dataset_path()).unwrap(), before);
        assert_eq!(store.load_sync_state().unwrap().last_export_at, None);
    }
}
