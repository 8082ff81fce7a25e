//! mega-sync-one-way library
//!
//! One-way mirroring of a local directory onto a remote directory driven
//! through the megacmd command-line tools.

pub mod cli;
pub mod config;
pub mod delete;
pub mod error;
pub mod fs_enum;
pub mod listing;
pub mod logger;
pub mod remote;
pub mod remote_path;
pub mod sync;
pub mod upload;

pub use cli::Args;
pub use error::{Result, SyncError};
