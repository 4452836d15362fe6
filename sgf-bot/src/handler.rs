//! Conversation event handler
//!
//! **Flow:**
//! 1. Decode the inbound event into a [`Command`] (unknown input → hint reply)
//! 2. Enter the user's session critical section
//! 3. Start a dialogue, or apply the command to the stored collector
//! 4. On finalization: search, record the activity, clear the session
//! 5. Release the session, dropping its slot when no dialogue is left

use crate::collector::{CollectorEvent, Outcome, Transition};
use crate::command::{decode, Command, InboundEvent, UserRef};
use crate::error::BotError;
use crate::matcher::search;
use crate::reply::{self, SessionReply};
use crate::session::SessionGuard;
use crate::{AppState, Collector};
use std::sync::Arc;
use tracing::debug;

/// Process one inbound event to completion
///
/// Events for the same user are serialized by the session store; events for
/// different users may be handled concurrently.
pub async fn handle_event(state: &AppState, event: InboundEvent) -> Result<SessionReply, BotError> {
    let elements = state.catalog.elements();
    let user = event.user().clone();

    let command = match decode(&event, elements, state.input_mode) {
        Ok(command) => command,
        Err(e) if e.is_user_error() => {
            debug!(user_id = user.id, error = %e, "Unrecognized input");
            return Ok(reply::unrecognized(&e.to_string(), elements));
        }
        Err(e) => return Err(e),
    };

    let mut session = state.sessions.lock(user.id).await;
    let reply = apply_command(state, &user, command, &mut session).await;
    state.sessions.release(session).await;
    reply
}

async fn apply_command(
    state: &AppState,
    user: &UserRef,
    command: Command,
    session: &mut SessionGuard,
) -> Result<SessionReply, BotError> {
    let elements = state.catalog.elements();

    match command {
        Command::Welcome => return Ok(reply::welcome(elements)),
        Command::Begin(mode) => {
            let collector = Collector::new(mode, Arc::clone(elements));
            let reply = reply::started(&collector);
            session.put(collector);
            debug!(user_id = user.id, ?mode, "Dialogue started");
            return Ok(reply);
        }
        _ => {}
    }

    let Some(collector_event) = command.collector_event() else {
        return Ok(reply::welcome(elements));
    };

    let Some(collector) = session.take() else {
        return Ok(match collector_event {
            CollectorEvent::Cancel => reply::cancelled(state.input_mode, elements),
            _ => reply::no_session(elements),
        });
    };

    let transition = collector.apply(collector_event);
    let ends_session = transition.ends_session();
    let Transition { collector, outcome } = transition;

    let reply = match outcome {
        Outcome::Prompt { index } => reply::value_prompt(&collector, index),
        Outcome::InvalidValue { index, text } => {
            debug!(user_id = user.id, index, "Value did not parse");
            reply::invalid_value(&collector, index, &text)
        }
        Outcome::AwaitingConfirmation { index, value } => {
            reply::confirm_prompt(&collector, index, value)
        }
        Outcome::Updated { .. } => reply::current_view(&collector),
        Outcome::Ignored { reason } => {
            debug!(user_id = user.id, reason, "Event ignored");
            reply::ignored(&collector, reason)
        }
        Outcome::Cancelled => reply::cancelled(collector.mode(), elements),
        Outcome::Finalized(composition) => {
            let result = search(&state.catalog, &composition, state.policy)?;
            state.recorder.record(user, &composition, &result).await;
            reply::search_result(&result, collector.mode(), elements)
        }
    };

    if !ends_session {
        session.put(collector);
    }

    Ok(reply)
}
