//! Sync error types.

/// Reasons an incoming document is rejected as a whole.
#[derive(Debug)]
pub enum SyncError {
    /// Not parseable as JSON at all
    InvalidJson(String),
    /// Export tag missing or not the one this version understands
    WrongKind(Option<String>),
    /// A required envelope section is absent or not a list
    MissingSection(&'static str),
    /// Sections present but records malformed
    MalformedRecords(String),
    /// Top-level shape of a full backup not recognized
    NotABackup(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::InvalidJson(e) => write!(f, "Not a valid JSON document: {}", e),
            SyncError::WrongKind(Some(kind)) => {
                write!(f, "Not a valid export: unsupported kind '{}'", kind)
            }
            SyncError::WrongKind(None) => write!(f, "Not a valid export: missing kind tag"),
            SyncError::MissingSection(section) => {
                write!(f, "Not a valid export: missing section '{}'", section)
            }
            SyncError::MalformedRecords(e) => write!(f, "Not a valid export: {}", e),
            SyncError::NotABackup(reason) => write!(f, "Not a valid backup: {}", reason),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::InvalidJson(e.to_string())
    }
}
