//! Watch backends
//!
//! A backend turns "watch this directory" into notifications on a channel.
//! `NotifyBackend` uses the OS facility through `notify` with one
//! non-recursive watch per directory; `MemoryBackend` only records calls.

use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::debug;

use super::event::{from_notify, EventMask, WatchNotification};
use crate::error::WatchError;

/// Adds and drops watches on single directories
pub trait WatchBackend {
	/// Start delivering notifications for direct children of `path`.
	/// Backends that cannot narrow delivery treat `mask` as advisory.
	fn add_watch(&mut self, path: &Path, mask: EventMask) -> Result<(), WatchError>;

	/// Stop watching `path`. The directory may already be gone.
	fn remove_watch(&mut self, _path: &Path) {}
}

/// Backend on top of the platform watcher picked by `notify`
pub struct NotifyBackend {
	watcher: RecommendedWatcher,
}

impl NotifyBackend {
	/// Create the watcher and the channel its notifications arrive on
	pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<WatchNotification>), WatchError> {
		let (tx, rx) = mpsc::unbounded_channel();

		let watcher = RecommendedWatcher::new(
			move |res: notify::Result<notify::Event>| {
				let notifications = match res {
					Ok(event) => from_notify(event),
					Err(e) => vec![WatchNotification::Error(WatchError::from(e))],
				};
				for notification in notifications {
					// Receiver gone means we are shutting down
					let _ = tx.send(notification);
				}
			},
			NotifyConfig::default(),
		)?;

		Ok((Self { watcher }, rx))
	}
}

impl WatchBackend for NotifyBackend {
	fn add_watch(&mut self, path: &Path, _mask: EventMask) -> Result<(), WatchError> {
		self.watcher.watch(path, RecursiveMode::NonRecursive).map_err(|e| match WatchError::from(e) {
			WatchError::Backend { message, .. } => {
				WatchError::Backend { path: path.to_path_buf(), message }
			}
			other => other,
		})
	}

	fn remove_watch(&mut self, path: &Path) {
		if let Err(e) = self.watcher.unwatch(path) {
			debug!("Unwatch {}: {}", path.display(), e);
		}
	}
}

/// Backend that records watched paths, optionally with a watch limit
#[derive(Debug, Default)]
pub struct MemoryBackend {
	watched: Vec<PathBuf>,
	removed: Vec<PathBuf>,
	capacity: Option<usize>,
	failing: HashSet<PathBuf>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fail with overflow once `capacity` watches are active
	pub fn with_capacity(capacity: usize) -> Self {
		Self { capacity: Some(capacity), ..Self::default() }
	}

	/// Make `add_watch` fail for `path`
	pub fn fail_on(mut self, path: impl Into<PathBuf>) -> Self {
		self.failing.insert(path.into());
		self
	}

	/// Every `add_watch` call that succeeded, in call order
	pub fn watched(&self) -> &[PathBuf] {
		&self.watched
	}

	pub fn removed(&self) -> &[PathBuf] {
		&self.removed
	}
}

impl WatchBackend for MemoryBackend {
	fn add_watch(&mut self, path: &Path, _mask: EventMask) -> Result<(), WatchError> {
		if self.failing.contains(path) {
			return Err(WatchError::Backend {
				path: path.to_path_buf(),
				message: "No such file or directory".to_string(),
			});
		}
		let active = self.watched.len().saturating_sub(self.removed.len());
		if self.capacity.map_or(false, |cap| active >= cap) {
			return Err(WatchError::Overflow);
		}
		self.watched.push(path.to_path_buf());
		Ok(())
	}

	fn remove_watch(&mut self, path: &Path) {
		self.removed.push(path.to_path_buf());
	}
}


// vim: ts=4
