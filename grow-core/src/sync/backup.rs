//! Full backup and restore.
//!
//! A backup is the whole [`Dataset`] as one flat JSON object. Restoring it
//! builds a new dataset value; the caller swaps it in whole.

use serde_json::Value;

use super::error::SyncError;
use crate::dataset::Dataset;

/// Collections a document must have to be taken for a backup.
const REQUIRED: [&str; 2] = ["users", "cycles"];

impl Dataset {
    pub fn to_backup_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reads a full backup.
///
/// Collections other than users and cycles may be missing and default to
/// empty. Inventory stock and average cost are recomputed from each
/// item's purchase history rather than trusted.
pub fn restore_backup(text: &str) -> Result<Dataset, SyncError> {
    let value: Value = serde_json::from_str(text)?;
    let Some(object) = value.as_object() else {
        return Err(SyncError::NotABackup("top level is not an object".into()));
    };
    for key in REQUIRED {
        if !object.get(key).is_some_and(Value::is_array) {
            return Err(SyncError::NotABackup(format!("missing '{}' list", key)));
        }
    }

    let mut dataset: Dataset =
        serde_json::from_value(value).map_err(|e| SyncError::NotABackup(e.to_string()))?;
    dataset.recompute_inventory();

    for batch in &dataset.batches {
        if let Err(e) = batch.validate() {
            tracing::warn!("Restored batch violates its counts: {}", e);
        }
    }
    tracing::info!(
        cycles = dataset.cycles.len(),
        items = dataset.inventory.len(),
        "Restored backup"
    );
    Ok(dataset)
}
