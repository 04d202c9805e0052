mod backup;
mod config_cmd;
mod cycle;
mod formula;
mod inventory;
mod maintenance;
mod sync_cmd;

pub use backup::BackupCommand;
pub use config_cmd::ConfigCommand;
pub use cycle::CycleCommand;
pub use formula::FormulaCommand;
pub use inventory::InventoryCommand;
pub use maintenance::MaintenanceCommand;
pub use sync_cmd::SyncCommand;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use grow_core::models::parse_timestamp;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses an optional `--at` argument (RFC 3339 or YYYY-MM-DD), defaulting
/// to now.
pub(crate) fn parse_at(at: &Option<String>) -> Result<DateTime<Utc>, String> {
    match at {
        Some(text) => parse_timestamp(text).ok_or_else(|| {
            format!("Invalid timestamp: {} (expected RFC 3339 or YYYY-MM-DD)", text)
        }),
        None => Ok(Utc::now()),
    }
}

/// clap value parser for readings and amounts; rejects NaN and infinities.
pub(crate) fn parse_finite(text: &str) -> Result<f64, String> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", text))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{}' is not a finite number", text))
    }
}

/// Parses `KEY=NUMBER` arguments such as `inv-filter=2`.
pub(crate) fn parse_pair<T: std::str::FromStr>(text: &str) -> Result<(String, T), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{}'", text))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number in '{}'", text))?;
    Ok((key.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_at() {
        assert_eq!(
            parse_at(&Some("2025-06-01".into())).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_at(&Some("yesterday".into())).is_err());
        assert!(parse_at(&None).is_ok());
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair::<f64>("inv-filter=2").unwrap(),
            ("inv-filter".to_string(), 2.0)
        );
        assert_eq!(
            parse_pair::<u32>("batch-a = 12").unwrap(),
            ("batch-a".to_string(), 12)
        );
        assert!(parse_pair::<f64>("inv-filter").is_err());
        assert!(parse_pair::<u32>("batch-a=many").is_err());
    }

    #[test]
    fn test_parse_finite() {
        assert_eq!(parse_finite("6.2"), Ok(6.2));
        assert_eq!(parse_finite("-20"), Ok(-20.0));
        assert!(parse_finite("NaN").is_err());
        assert!(parse_finite("inf").is_err());
        assert!(parse_finite("-infinity").is_err());
        assert!(parse_finite("six").is_err());
    }
}
