//! Active-user aggregation over activity logs
//!
//! **Algorithm:**
//! 1. List `<prefix>*.log` files in the log directory (name order)
//! 2. Parse every line carrying the activity marker; skip malformed ones
//! 3. Per user: count searches, keep the latest timestamp and the display
//!    name seen with it
//! 4. Keep users whose count reaches `min_uses`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sgf_common::activity::parse_log_line;
use sgf_common::{Error, Result, UserId};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Export entry for one active user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub username: String,
    pub search_count: usize,
    pub last_active: DateTime<Utc>,
}

/// Count searches per user and keep those with at least `min_uses`
pub fn scan_activity_logs(
    dir: &Path,
    prefix: &str,
    min_uses: usize,
) -> Result<BTreeMap<UserId, ActiveUser>> {
    let files = log_files(dir, prefix)?;
    if files.is_empty() {
        warn!("No {}*.log files in {}", prefix, dir.display());
    }

    let mut users: BTreeMap<UserId, ActiveUser> = BTreeMap::new();
    let mut records = 0usize;
    let mut skipped = 0usize;

    for path in &files {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping unreadable log {}: {}", path.display(), e);
                continue;
            }
        };
        debug!("Scanning {}", path.display());

        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("{}:{}: unreadable line: {}", path.display(), number + 1, e);
                    skipped += 1;
                    continue;
                }
            };

            let event = match parse_log_line(&line) {
                None => continue,
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    warn!("{}:{}: malformed activity record: {}", path.display(), number + 1, e);
                    skipped += 1;
                    continue;
                }
            };

            records += 1;
            users
                .entry(event.user_id)
                .and_modify(|user| {
                    user.search_count += 1;
                    if event.timestamp >= user.last_active {
                        user.last_active = event.timestamp;
                        if !event.username.is_empty() {
                            user.username = event.username.clone();
                        }
                    }
                })
                .or_insert_with(|| ActiveUser {
                    username: event.username.clone(),
                    search_count: 1,
                    last_active: event.timestamp,
                });
        }
    }

    let total_users = users.len();
    users.retain(|_, user| user.search_count >= min_uses);

    info!(
        files = files.len(),
        records,
        skipped,
        users = total_users,
        active = users.len(),
        min_uses,
        "Activity logs scanned"
    );

    Ok(users)
}

fn log_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::NotFound(format!("Activity log directory {}: {}", dir.display(), e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map_or(false, |name| name.starts_with(prefix) && name.ends_with(".log"))
        })
        .collect();
    files.sort();

    Ok(files)
}

/// Write the export as pretty JSON
pub fn save_active_users(path: &Path, users: &BTreeMap<UserId, ActiveUser>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(users)?;
    std::fs::write(path, json)?;
    info!("Saved {} active users to {}", users.len(), path.display());

    Ok(())
}

/// Read an export written by [`save_active_users`]
pub fn load_active_users(path: &Path) -> Result<BTreeMap<UserId, ActiveUser>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::NotFound(format!("Active user export {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}
