//! HTTP API handlers for sgf-bot

pub mod broadcast;
pub mod events;
pub mod health;

pub use broadcast::broadcast_routes;
pub use events::event_routes;
pub use health::health_routes;
