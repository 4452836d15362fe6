//! sgf-notify - broadcast an announcement to exported active users
//!
//! Reads the active-user export and asks the running bot to deliver the
//! message through its `/api/broadcast` endpoint.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use sgf_common::config::TomlConfig;
use sgf_common::logging::init_tracing;
use sgf_common::UserId;
use sgf_tools::active_users::load_active_users;
use sgf_tools::notify::broadcast_timeout;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sgf-notify", version, about = "Send a message to exported active users")]
struct Args {
    /// File holding the message text
    #[arg(short, long, conflicts_with = "message")]
    message_file: Option<PathBuf>,

    /// Message text
    #[arg(long)]
    message: Option<String>,

    /// Active-user export (defaults to [activity].export_file under the root folder)
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Bot base URL
    #[arg(long, env = "SGF_BOT_URL", default_value = "http://127.0.0.1:5790")]
    bot_url: String,

    /// TOML config file
    #[arg(short, long, env = "SGF_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the export
    #[arg(long, env = "SGF_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    user_ids: Vec<UserId>,
    message: &'a str,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    results: BTreeMap<UserId, bool>,
    successful: usize,
    failed: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;
    info!("sgf-notify v{}", env!("CARGO_PKG_VERSION"));

    let message = match (&args.message, &args.message_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Provide --message or --message-file"),
    };
    let message = message.trim();
    if message.is_empty() {
        bail!("Message is empty");
    }

    let export = match &args.export {
        Some(path) => path.clone(),
        None => config
            .resolve_root_folder(args.root_folder.as_deref())
            .join(&config.activity.export_file),
    };
    let users = load_active_users(&export)?;
    if users.is_empty() {
        warn!("No users in {}, nothing to send", export.display());
        return Ok(());
    }

    let user_ids: Vec<UserId> = users.keys().copied().collect();
    info!(recipients = user_ids.len(), "Sending broadcast via {}", args.bot_url);

    let pacing = Duration::from_millis(config.bot.broadcast_pacing_ms);
    let timeout = broadcast_timeout(user_ids.len(), pacing);
    info!("Waiting up to {:?} for the bot ({:?} between sends)", timeout, pacing);
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let url = format!("{}/api/broadcast", args.bot_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(&BroadcastRequest { user_ids, message })
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Bot answered {}: {}", status, body);
    }

    let summary: BroadcastResponse = response
        .json()
        .await
        .context("Unexpected broadcast response")?;

    println!(
        "Delivered to {} of {} users ({} failed)",
        summary.successful,
        summary.results.len(),
        summary.failed
    );
    for (user_id, _) in summary.results.iter().filter(|(_, ok)| !**ok) {
        let name = users.get(user_id).map(|u| u.username.as_str()).unwrap_or("");
        println!("  not delivered: {} {}", user_id, name);
    }

    Ok(())
}
