use chrono::Utc;
use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use grow_core::{restore_backup, Dataset};

use crate::storage::DataStore;

#[derive(Args)]
pub struct BackupCommand {
    #[command(subcommand)]
    pub command: BackupSubcommand,
}

#[derive(Subcommand)]
pub enum BackupSubcommand {
    /// Write every collection to one backup file
    Export {
        /// Output file, defaults to grow-backup-<date>.json
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Replace all local records with a backup
    Restore { path: PathBuf },
}

/// Replaces the stored dataset with the backup at `path`.
///
/// Rejected documents never reach the store.
pub(crate) fn restore_from(
    store: &DataStore,
    path: &Path,
) -> Result<Dataset, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let restored = restore_backup(&text)?;
    store.save(&restored)?;
    Ok(restored)
}

impl BackupCommand {
    pub fn run(&self, store: &DataStore) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            BackupSubcommand::Export { out } => {
                let data = store.load()?;
                let path = out.clone().unwrap_or_else(|| {
                    PathBuf::from(format!("grow-backup-{}.json", Utc::now().format("%Y-%m-%d")))
                });
                fs::write(&path, data.to_backup_json()?)?;
                println!("Backup written to {}", path.display());
                Ok(())
            }

            BackupSubcommand::Restore { path } => {
                let restored = restore_from(store, path)?;
                println!(
                    "Restored {} cycle(s), {} batch(es), {} inventory item(s) from {}",
                    restored.cycles.len(),
                    restored.batches.len(),
                    restored.inventory.len(),
                    path.display()
                );
                Ok(())
            }
        }
    }
}
