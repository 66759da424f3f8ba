//! # mirrorwatch - live mirroring of directory trees
//!
//! mirrorwatch watches one or more root directories, recursively, and on every
//! relevant change mirrors the changed directory to a list of remote hosts with
//! `rsync -az --delete` over ssh.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mirrorwatch::{dispatch, Config, EventDispatcher, NotifyBackend, SyncPool, WatchTree};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config { servers: vec!["backup.example.com".into()], ..Default::default() };
//!     let (backend, notifications) = NotifyBackend::new()?;
//!     let mut tree = WatchTree::new(backend, config.exclude.clone());
//!     tree.discover(&config.paths).await?;
//!     let pool = Arc::new(SyncPool::from_config(&config));
//!     dispatch::run(EventDispatcher::new(tree, pool), notifications).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exclusion;
pub mod logging;
pub mod sync;
pub mod utils;
pub mod validation;
pub mod watch;

// Re-export commonly used types and functions
pub use config::{Config, ServerTarget};
pub use dispatch::{Dispatch, EventDispatcher};
pub use error::{ConfigError, MirrorError, TransferError, TransferFailure, WatchError};
pub use exclusion::{is_included, ExcludeList};
pub use sync::{RsyncTransfer, SyncJob, SyncPool, SyncReport, Transfer};
pub use watch::{NotifyBackend, WatchBackend, WatchTree};

// vim: ts=4
