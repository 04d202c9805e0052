//! On-disk persistence for the CLI.
//!
//! The whole dataset lives in one JSON document in the full-backup format,
//! next to a small file with the collaborator's export state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use grow_core::{restore_backup, Dataset, SyncState};

const DATASET_FILE: &str = "grow.json";
const SYNC_STATE_FILE: &str = "sync-state.json";

/// Storage rooted at the configured data directory.
#[derive(Clone, Debug)]
pub struct DataStore {
    data_dir: PathBuf,
}

impl DataStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILE)
    }

    pub fn sync_state_path(&self) -> PathBuf {
        self.data_dir.join(SYNC_STATE_FILE)
    }

    /// Loads the dataset; an empty one if nothing was saved yet.
    pub fn load(&self) -> Result<Dataset, StorageError> {
        let path = self.dataset_path();
        match fs::read_to_string(&path) {
            Ok(text) => {
                restore_backup(&text).map_err(|e| StorageError::LoadError(path, e.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Dataset::new()),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    /// Replaces the stored dataset.
    ///
    /// The document is written to a sibling file and renamed over the old
    /// one, so readers see either the old or the new dataset in full.
    pub fn save(&self, dataset: &Dataset) -> Result<(), StorageError> {
        let text = dataset
            .to_backup_json()
            .map_err(|e| StorageError::SaveError(self.dataset_path(), e.to_string()))?;
        self.write_atomic(&self.dataset_path(), &text)
    }

    pub fn load_sync_state(&self) -> Result<SyncState, StorageError> {
        let path = self.sync_state_path();
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| StorageError::LoadError(path, e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SyncState::new()),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    pub fn save_sync_state(&self, state: &SyncState) -> Result<(), StorageError> {
        let path = self.sync_state_path();
        let text = serde_json::to_string_pretty(state)
            .map_err(|e| StorageError::SaveError(path.clone(), e.to_string()))?;
        self.write_atomic(&path, &text)
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|e| StorageError::IoError(tmp.clone(), e))?;
        fs::rename(&tmp, path).map_err(|e| StorageError::IoError(path.to_path_buf(), e))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Errors that can occur reading or writing the data directory.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Stored document could not be read back.
    LoadError(PathBuf, String),
    /// Document could not be serialized.
    SaveError(PathBuf, String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::LoadError(path, e) => {
                write!(f, "Failed to load {}: {}", path.display(), e)
            }
            StorageError::SaveError(path, e) => {
                write!(f, "Failed to save {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::LoadError(_, _) | StorageError::SaveError(_, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use grow_core::CultivationCycle;
    use tempfile::TempDir;

    fn test_store() -> (DataStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DataStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    fn sample() -> Dataset {
        let cloned = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        Dataset {
            cycles: vec![CultivationCycle::new("gen-1", "room-1", cloned).with_id("c1")],
            ..Dataset::default()
        }
    }

    #[test]
    fn test_load_missing_is_empty() {
        let (store, _temp) = test_store();
        assert_eq!(store.load().unwrap(), Dataset::default());
        assert_eq!(store.load_sync_state().unwrap(), SyncState::new());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (store, _temp) = test_store();
        let data = sample();
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), data);
    }

    #[test]
    fn test_save_creates_directory_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let store = DataStore::new(nested.clone());

        store.save(&sample()).unwrap();

        assert!(store.dataset_path().exists());
        let names: Vec<String> = fs::read_dir(&nested)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![DATASET_FILE.to_string()]);
    }

    #[test]
    fn test_overwrite_replaces_dataset() {
        let (store, _temp) = test_store();
        store.save(&sample()).unwrap();
        store.save(&Dataset::default()).unwrap();
        assert!(store.load().unwrap().cycles.is_empty());
    }

    #[test]
    fn test_corrupt_dataset_is_an_error() {
        let (store, _temp) = test_store();
        fs::write(store.dataset_path(), "{\"cycles\": 3}").unwrap();
        let err = store.load().unwrap_err();
        assert!(err.to_string().starts_with("Failed to load"));
    }

    #[test]
    fn test_sync_state_roundtrip() {
        let (store, _temp) = test_store();
        let state = SyncState {
            last_export_at: Some(Utc.with_ymd_and_hms(2025, 3, 2, 18, 0, 0).unwrap()),
        };
        store.save_sync_state(&state).unwrap();
        assert_eq!(store.load_sync_state().unwrap(), state);
    }
}
