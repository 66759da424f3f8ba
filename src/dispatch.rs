//! Event dispatcher
//!
//! Classifies each notification from the watch subsystem, grows the watch tree
//! when a directory appears, and hands the changed entry's parent directory to
//! the sync pool. Syncs are spawned, never awaited here, so the dispatcher is
//! free for the next notification at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::WatchError;
use crate::sync::{SyncPool, SyncReport};
use crate::watch::{ChangeEvent, ChangeKind, WatchBackend, WatchNotification, WatchTree};

/// What the dispatcher did with a notification
#[derive(Debug)]
pub enum Dispatch {
	/// Nothing to do
	Ignored,

	/// A sync of `directory` was started
	Sync {
		directory: PathBuf,

		/// Directories that joined the watch tree because of this event
		grown: Vec<PathBuf>,

		handle: JoinHandle<SyncReport>,
	},
}

impl Dispatch {
	pub fn is_ignored(&self) -> bool {
		matches!(self, Dispatch::Ignored)
	}
}

/// Event dispatcher
pub struct EventDispatcher<B: WatchBackend> {
	tree: WatchTree<B>,
	pool: Arc<SyncPool>,
}

impl<B: WatchBackend> EventDispatcher<B> {
	pub fn new(tree: WatchTree<B>, pool: Arc<SyncPool>) -> Self {
		Self { tree, pool }
	}

	pub fn tree(&self) -> &WatchTree<B> {
		&self.tree
	}

	/// Handle one notification
	///
	/// Returns `Err` only for conditions that end the process: overflow of the
	/// watch subsystem, or running out of watches while growing the tree.
	pub async fn handle(&mut self, notification: WatchNotification) -> Result<Dispatch, WatchError> {
		let event = match notification {
			WatchNotification::Change(event) => event,
			WatchNotification::Overflow => return Err(WatchError::Overflow),
			WatchNotification::Error(e) if e.is_fatal() => return Err(e),
			WatchNotification::Error(e) => {
				warn!("Watch error: {}", e);
				return Ok(Dispatch::Ignored);
			}
		};

		let subject = match event.subject() {
			Some(subject) => subject,
			None => return Ok(Dispatch::Ignored),
		};
		if !self.tree.exclude().is_included(&subject) {
			trace!("Ignoring excluded {}", subject.display());
			return Ok(Dispatch::Ignored);
		}
		let mask = match self.tree.registration(&event.parent) {
			Some(registration) => registration.mask,
			None => {
				trace!("Ignoring event outside the watch tree: {}", subject.display());
				return Ok(Dispatch::Ignored);
			}
		};

		// Watches below a vanished directory are stale
		if matches!(event.kind, ChangeKind::Deleted | ChangeKind::MovedOut) {
			self.tree.forget(&subject);
		}

		if !mask.contains_kind(event.kind) {
			return Ok(Dispatch::Ignored);
		}

		// Grow before returning, so later events under the new directory are seen
		let mut grown = Vec::new();
		if is_new_directory(&event, &subject).await {
			grown = self.tree.grow(&subject).await?;
		}

		debug!("{}{}", subject.display(), event.kind.describe());

		let directory = event.parent;
		let pool = Arc::clone(&self.pool);
		let target = directory.clone();
		let handle = tokio::spawn(async move {
			let report = pool.sync_directory(&target).await;
			report.log();
			report
		});

		Ok(Dispatch::Sync { directory, grown, handle })
	}
}

async fn is_new_directory(event: &ChangeEvent, subject: &Path) -> bool {
	match event.kind {
		ChangeKind::Created if event.is_dir => true,
		ChangeKind::Created | ChangeKind::MovedIn => {
			fs::symlink_metadata(subject).await.map(|m| m.is_dir()).unwrap_or(false)
		}
		_ => false,
	}
}

/// Feed notifications to the dispatcher until a fatal condition
pub async fn run<B: WatchBackend>(
	mut dispatcher: EventDispatcher<B>,
	mut notifications: mpsc::UnboundedReceiver<WatchNotification>,
) -> Result<(), WatchError> {
	while let Some(notification) = notifications.recv().await {
		dispatcher.handle(notification).await?;
	}
	Err(WatchError::Closed)
}

// vim: ts=4
