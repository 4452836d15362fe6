//! # Steel Grade Finder Common Library
//!
//! Shared code for the bot service and the offline tools:
//! - Tracked element set and composition value object
//! - Grade catalog model and null-bound policy
//! - SQLite catalog storage and spreadsheet (CSV) import
//! - Activity record line format
//! - Configuration loading and logging bootstrap

pub mod activity;
pub mod catalog;
pub mod composition;
pub mod config;
pub mod db;
pub mod elements;
pub mod error;
pub mod logging;

pub use catalog::{ElementRange, GradeCatalog, GradeRecord, NullBoundPolicy};
pub use composition::Composition;
pub use elements::{Element, ElementSet};
pub use error::{Error, Result};

/// Chat user identity as delivered by the transport
pub type UserId = i64;
