//! Activity log aggregation tests

use chrono::{Duration, TimeZone, Utc};
use sgf_common::activity::{ActivityEvent, MatchKind};
use sgf_tools::active_users::{load_active_users, save_active_users, scan_activity_logs};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn event(user_id: i64, username: &str, minutes: i64) -> ActivityEvent {
    ActivityEvent {
        timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes),
        user_id,
        username: username.to_string(),
        composition: BTreeMap::from([("C".to_string(), 0.2)]),
        match_kind: MatchKind::Exact,
        grades: vec!["A36".to_string()],
    }
}

fn write_log(dir: &Path, name: &str, lines: &[String]) {
    fs::write(dir.join(name), lines.join("\n") + "\n").unwrap();
}

fn line(event: &ActivityEvent) -> String {
    event.to_log_line().unwrap()
}

#[test]
fn test_threshold_separates_active_users() {
    let temp = TempDir::new().unwrap();

    // User 1: 5 searches over two days, renamed on the last one
    write_log(
        temp.path(),
        "steel_bot_20250301.log",
        &[
            line(&event(1, "ana", 0)),
            line(&event(2, "bo", 1)),
            line(&event(1, "ana", 2)),
            "2025-03-01T09:03:00+00:00 INFO Bot started".to_string(),
            line(&event(2, "bo", 3)),
            line(&event(1, "ana", 4)),
        ],
    );
    write_log(
        temp.path(),
        "steel_bot_20250302.log",
        &[
            line(&event(2, "bo", 1440)),
            line(&event(1, "ana", 1441)),
            line(&event(2, "bo", 1442)),
            line(&event(1, "ana_k", 1443)),
        ],
    );

    let users = scan_activity_logs(temp.path(), "steel_bot_", 5).unwrap();

    assert_eq!(users.len(), 1);
    let ana = &users[&1];
    assert_eq!(ana.search_count, 5);
    assert_eq!(ana.username, "ana_k");
    assert_eq!(ana.last_active, event(1, "", 1443).timestamp);
    assert!(!users.contains_key(&2), "user with 4 searches is not active");

    let everyone = scan_activity_logs(temp.path(), "steel_bot_", 4).unwrap();
    assert_eq!(everyone[&2].search_count, 4);
}

#[test]
fn test_malformed_records_are_skipped() {
    let temp = TempDir::new().unwrap();
    write_log(
        temp.path(),
        "steel_bot_20250301.log",
        &[
            line(&event(7, "cy", 0)),
            "2025-03-01T09:01:00+00:00 INFO Search activity: {not json".to_string(),
            "2025-03-01T09:02:00+00:00 INFO Search activity: {\"user_id\":7}".to_string(),
            line(&event(7, "cy", 3)),
        ],
    );

    let users = scan_activity_logs(temp.path(), "steel_bot_", 1).unwrap();
    assert_eq!(users[&7].search_count, 2);
}

#[test]
fn test_export_round_trip() {
    let temp = TempDir::new().unwrap();
    write_log(
        temp.path(),
        "steel_bot_20250301.log",
        &[line(&event(3, "dee", 0)), line(&event(3, "dee", 5))],
    );

    let users = scan_activity_logs(temp.path(), "steel_bot_", 2).unwrap();
    let export = temp.path().join("out").join("active_users.json");
    save_active_users(&export, &users).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(json["3"]["search_count"], 2);
    assert_eq!(json["3"]["username"], "dee");

    assert_eq!(load_active_users(&export).unwrap(), users);
}
