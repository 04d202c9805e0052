//! Offline-first synchronization between collaborators.
//!
//! There is no server. Each collaborator keeps a full [`Dataset`] and a
//! high-water mark, and exchanges records through JSON documents carried
//! by any external means:
//!
//! 1. `export_delta` packs every log entry, expense, plant batch and
//!    maintenance log stamped after the mark into a [`SyncEnvelope`]
//! 2. The receiver validates it with [`SyncEnvelope::from_json`]
//! 3. `merge_delta` adds the records it does not have yet, by id
//!
//! A full backup replaces the whole dataset instead and is never merged.
//!
//! [`Dataset`]: crate::dataset::Dataset

mod backup;
mod envelope;
mod error;
mod export;
mod merge;

pub use backup::restore_backup;
pub use envelope::{CycleLogDelta, EnvelopeData, SyncEnvelope, ENVELOPE_KIND};
pub use error::SyncError;
pub use export::{export_delta, SyncState};
pub use merge::{merge_delta, MergeSummary};

use chrono::{DateTime, Utc};

use crate::models::{Expense, LogEntry, MaintenanceLog, PlantBatch};

/// A record that travels in envelopes: identified by id, ordered by its
/// own timestamp.
pub(crate) trait Stamped {
    fn id(&self) -> &str;
    fn stamp(&self) -> DateTime<Utc>;
}

impl Stamped for LogEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.date
    }
}

impl Stamped for Expense {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.date
    }
}

impl Stamped for PlantBatch {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Stamped for MaintenanceLog {
    fn id(&self) -> &str {
        &self.id
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
