//! Offline tools for the steel grade finder
//!
//! - `sgf-import`: replace the stored grade catalog from a CSV export
//! - `sgf-active-users`: aggregate activity logs into an active-user export
//! - `sgf-notify`: broadcast an announcement to exported users via the bot

pub mod active_users;
pub mod notify;
