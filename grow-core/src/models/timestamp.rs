//! Timestamp helpers shared by the models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

/// Parses an ISO-8601 timestamp, accepting a bare `YYYY-MM-DD` date as
/// midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Deserializes an optional timestamp, reading anything unparsable as
/// `None` instead of failing the whole document.
pub fn lenient_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_timestamp("2025-07-14T06:00:00.000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 7, 14, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_offset_is_normalized() {
        let parsed = parse_timestamp("2025-07-14T00:00:00-06:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 7, 14, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_bare_date() {
        let parsed = parse_timestamp("2025-07-14").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 7, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
