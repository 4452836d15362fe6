//! sgf-active-users - export users with enough searches
//!
//! Scans the bot's activity logs and writes `{user_id: {username,
//! search_count, last_active}}` for users at or above the threshold.

use anyhow::{Context, Result};
use clap::Parser;
use sgf_common::config::TomlConfig;
use sgf_common::logging::init_tracing;
use sgf_tools::active_users::{save_active_users, scan_activity_logs};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sgf-active-users", version, about = "Aggregate activity logs into an active-user export")]
struct Args {
    /// Minimum searches to count as active (overrides [activity].min_uses)
    #[arg(short, long)]
    min_uses: Option<usize>,

    /// Export file (overrides [activity].export_file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "SGF_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the activity logs
    #[arg(long, env = "SGF_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;
    info!("sgf-active-users v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = config.resolve_root_folder(args.root_folder.as_deref());
    let log_dir = config.activity_dir(&root_folder);
    let min_uses = args.min_uses.unwrap_or(config.activity.min_uses);
    let output = args
        .output
        .unwrap_or_else(|| root_folder.join(&config.activity.export_file));

    let users = scan_activity_logs(&log_dir, &config.activity.file_prefix, min_uses)
        .with_context(|| format!("Failed to scan {}", log_dir.display()))?;
    save_active_users(&output, &users)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{} active users (at least {} searches):", users.len(), min_uses);
    for (user_id, user) in &users {
        println!(
            "  {:>12}  {:<24} {:>5} searches, last {}",
            user_id,
            user.username,
            user.search_count,
            user.last_active.format("%Y-%m-%d %H:%M")
        );
    }
    println!("Export written to {}", output.display());

    Ok(())
}
