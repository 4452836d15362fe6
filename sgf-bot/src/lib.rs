//! sgf-bot library - steel grade finder conversation service
//!
//! Collects a chemical composition from a chat user, matches it against the
//! grade catalog and reports exact or nearest grades. The chat transport
//! talks to this service over HTTP:
//!
//! - `POST /api/events` - inbound conversation event → reply
//! - `POST /api/broadcast` - send one message to many users
//! - `GET /health` - liveness and catalog summary

use axum::Router;
use sgf_common::config::InputMode;
use sgf_common::{GradeCatalog, NullBoundPolicy};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod broadcast;
pub mod collector;
pub mod command;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod recorder;
pub mod reply;
pub mod session;

pub use broadcast::Broadcaster;
pub use collector::Collector;
pub use error::{ApiError, BotError};
pub use handler::handle_event;
pub use recorder::ActivityRecorder;
pub use session::SessionStore;

/// Application context shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Grade catalog, read-only for the process lifetime
    pub catalog: Arc<GradeCatalog>,
    /// Per-user collectors
    pub sessions: SessionStore,
    /// Completed-search sink
    pub recorder: ActivityRecorder,
    /// How absent range bounds are read
    pub policy: NullBoundPolicy,
    /// Mode started by `/find`
    pub input_mode: InputMode,
    /// Outbound fan-out (None when no outbound transport is configured)
    pub broadcaster: Option<Arc<Broadcaster>>,
}

impl AppState {
    /// Create application state with default policy and input mode
    pub fn new(catalog: Arc<GradeCatalog>, recorder: ActivityRecorder) -> Self {
        Self {
            catalog,
            sessions: SessionStore::new(),
            recorder,
            policy: NullBoundPolicy::default(),
            input_mode: InputMode::default(),
            broadcaster: None,
        }
    }

    pub fn with_policy(mut self, policy: NullBoundPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_input_mode(mut self, input_mode: InputMode) -> Self {
        self.input_mode = input_mode;
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: Broadcaster) -> Self {
        self.broadcaster = Some(Arc::new(broadcaster));
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::event_routes())
        .merge(api::broadcast_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
