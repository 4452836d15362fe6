//! Inbound events and command decoding
//!
//! The chat transport delivers two event kinds: free text typed by the user
//! and option tokens attached to reply buttons. Both are decoded here, once,
//! into a [`Command`]; nothing past this module looks at raw tokens.
//!
//! Option tokens:
//!
//! | Token          | Command              |
//! |----------------|----------------------|
//! | `edit:<El>`    | `Edit(index of El)`  |
//! | `confirm:<El>` | `Confirm(index of El)` |
//! | `search`       | `Search`             |
//! | `reset`        | `Reset`              |
//! | `cancel`       | `Cancel`             |
//! | `begin:grid`   | `Begin(Grid)`        |
//! | `begin:guided` | `Begin(Guided)`      |

use crate::collector::CollectorEvent;
use crate::error::BotError;
use serde::{Deserialize, Serialize};
use sgf_common::config::InputMode;
use sgf_common::{ElementSet, UserId};

/// Sender of an inbound event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserRef {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: Some(display_name.into()),
        }
    }

    /// Display name, empty when the transport did not supply one
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("")
    }
}

/// Event delivered by the chat transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Free text typed by the user
    ValueSubmitted { user: UserRef, text: String },
    /// A reply option was selected
    OptionSelected { user: UserRef, token: String },
}

impl InboundEvent {
    pub fn user(&self) -> &UserRef {
        match self {
            InboundEvent::ValueSubmitted { user, .. } => user,
            InboundEvent::OptionSelected { user, .. } => user,
        }
    }
}

/// Decoded user intent
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the welcome message and mode choice
    Welcome,
    /// Start a new dialogue in the given mode
    Begin(InputMode),
    /// Value text for the element currently asked for
    Value(String),
    Edit(usize),
    Confirm(usize),
    Search,
    Reset,
    Cancel,
}

impl Command {
    /// Collector event for commands that act on an existing dialogue
    pub fn collector_event(&self) -> Option<CollectorEvent> {
        match self {
            Command::Value(text) => Some(CollectorEvent::SetValue(text.clone())),
            Command::Edit(index) => Some(CollectorEvent::Edit(*index)),
            Command::Confirm(index) => Some(CollectorEvent::Confirm(*index)),
            Command::Search => Some(CollectorEvent::Search),
            Command::Reset => Some(CollectorEvent::Reset),
            Command::Cancel => Some(CollectorEvent::Cancel),
            Command::Welcome | Command::Begin(_) => None,
        }
    }
}

/// Decode an inbound event
///
/// # Arguments
/// * `elements` - Element set used to resolve `edit:`/`confirm:` tokens
/// * `default_mode` - Mode started by `/find`
pub fn decode(
    event: &InboundEvent,
    elements: &ElementSet,
    default_mode: InputMode,
) -> Result<Command, BotError> {
    match event {
        InboundEvent::ValueSubmitted { text, .. } => decode_text(text, default_mode),
        InboundEvent::OptionSelected { token, .. } => decode_option(token, elements),
    }
}

fn decode_text(text: &str, default_mode: InputMode) -> Result<Command, BotError> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return Ok(Command::Value(text.to_string()));
    }

    // "/find@SteelBot extra" -> "/find"
    let word = trimmed.split_whitespace().next().unwrap_or(trimmed);
    let name = word.split('@').next().unwrap_or(word);

    match name {
        "/start" | "/help" => Ok(Command::Welcome),
        "/find" => Ok(Command::Begin(default_mode)),
        "/grid" => Ok(Command::Begin(InputMode::Grid)),
        "/guided" => Ok(Command::Begin(InputMode::Guided)),
        "/cancel" => Ok(Command::Cancel),
        _ => Err(BotError::UnknownCommand(name.to_string())),
    }
}

fn decode_option(token: &str, elements: &ElementSet) -> Result<Command, BotError> {
    let unknown = || BotError::UnknownOption(token.to_string());

    let element_index = |symbol: &str| elements.position(symbol).ok_or_else(unknown);

    match token.split_once(':') {
        Some(("edit", symbol)) => Ok(Command::Edit(element_index(symbol)?)),
        Some(("confirm", symbol)) => Ok(Command::Confirm(element_index(symbol)?)),
        Some(("begin", "grid")) => Ok(Command::Begin(InputMode::Grid)),
        Some(("begin", "guided")) => Ok(Command::Begin(InputMode::Guided)),
        Some(_) => Err(unknown()),
        None => match token {
            "search" => Ok(Command::Search),
            "reset" => Ok(Command::Reset),
            "cancel" => Ok(Command::Cancel),
            _ => Err(unknown()),
        },
    }
}

/// Option token that decodes back to `command`
///
/// Returns `None` for commands that are not offered as options (`Welcome`,
/// `Value`) and for element indices outside `elements`.
pub fn option_token(command: &Command, elements: &ElementSet) -> Option<String> {
    match command {
        Command::Edit(index) => elements.get(*index).map(|e| format!("edit:{}", e)),
        Command::Confirm(index) => elements.get(*index).map(|e| format!("confirm:{}", e)),
        Command::Begin(InputMode::Grid) => Some("begin:grid".to_string()),
        Command::Begin(InputMode::Guided) => Some("begin:guided".to_string()),
        Command::Search => Some("search".to_string()),
        Command::Reset => Some("reset".to_string()),
        Command::Cancel => Some("cancel".to_string()),
        Command::Welcome | Command::Value(_) => None,
    }
}
