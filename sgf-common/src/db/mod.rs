//! Catalog storage
//!
//! The catalog lives in SQLite. It is written only by the import tool (one
//! transaction per import) and read once by the bot at startup.

pub mod catalog;
pub mod import;
pub mod init;

pub use catalog::*;
pub use import::*;
pub use init::*;
