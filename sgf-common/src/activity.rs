//! Activity record line format
//!
//! One line per completed search. Lines are written by the bot and scanned
//! later by the active-user aggregator, so each line must parse on its own:
//!
//! ```text
//! 2025-03-01T10:15:00+00:00 INFO Search activity: {"timestamp":...,"user_id":42,...}
//! ```
//!
//! Readers locate the `Search activity: ` marker anywhere in the line, so
//! records embedded in ordinary log output are found as well.

use crate::{Result, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker preceding the JSON payload of an activity line
pub const ACTIVITY_MARKER: &str = "Search activity: ";

/// Kind of result a search produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Nearest,
    None,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Nearest => "nearest",
            MatchKind::None => "none",
        }
    }
}

/// One completed search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    /// Display name at the time of the search (may be empty)
    pub username: String,
    #[serde(default)]
    pub composition: BTreeMap<String, f64>,
    pub match_kind: MatchKind,
    #[serde(default)]
    pub grades: Vec<String>,
}

impl ActivityEvent {
    /// Render as a single log line (no trailing newline)
    pub fn to_log_line(&self) -> Result<String> {
        let payload = serde_json::to_string(self)?;
        Ok(format!(
            "{} INFO {}{}",
            self.timestamp.to_rfc3339(),
            ACTIVITY_MARKER,
            payload
        ))
    }
}

/// Parse one log line
///
/// Returns `None` for lines without the activity marker and `Some(Err(_))`
/// for marked lines whose payload is malformed.
pub fn parse_log_line(line: &str) -> Option<Result<ActivityEvent>> {
    let (_, payload) = line.split_once(ACTIVITY_MARKER)?;
    Some(serde_json::from_str(payload.trim()).map_err(Into::into))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> ActivityEvent {
        ActivityEvent {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 0).unwrap(),
            user_id: 42,
            username: "metallurgist".to_string(),
            composition: BTreeMap::from([("C".to_string(), 0.2), ("Mn".to_string(), 0.5)]),
            match_kind: MatchKind::Exact,
            grades: vec!["A36".to_string()],
        }
    }

    #[test]
    fn test_log_line_contains_marker_and_parses_back() {
        let line = event().to_log_line().unwrap();
        assert!(line.starts_with("2025-03-01T10:15:00+00:00 INFO Search activity: {"));
        assert!(!line.contains('\n'));

        let parsed = parse_log_line(&line).unwrap().unwrap();
        assert_eq!(parsed, event());
    }

    #[test]
    fn test_unmarked_line_is_skipped() {
        assert!(parse_log_line("2025-03-01 INFO Starting bot").is_none());
    }

    #[test]
    fn test_marker_inside_foreign_log_format() {
        let line = format!(
            "2025-03-01 10:15:00,123 - INFO - Search activity: {}",
            r#"{"timestamp":"2025-03-01T10:15:00Z","user_id":7,"username":"x","match_kind":"none"}"#
        );
        let parsed = parse_log_line(&line).unwrap().unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.match_kind, MatchKind::None);
        assert!(parsed.grades.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_error() {
        let result = parse_log_line("INFO Search activity: {not json").unwrap();
        assert!(result.is_err());

        let missing_user = parse_log_line(
            r#"Search activity: {"timestamp":"2025-03-01T10:15:00Z","username":"x","match_kind":"exact"}"#,
        )
        .unwrap();
        assert!(missing_user.is_err());
    }
}
