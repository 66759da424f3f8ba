//! Fan-out of directory syncs to every remote target
//!
//! One `sync_directory` call runs one transfer per server. The transfers run
//! concurrently and independently: a failure on one server neither cancels
//! nor delays the others, and never escalates past the `SyncReport`.

pub mod transfer;

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::{Config, ServerTarget};
use crate::error::TransferFailure;

pub use transfer::{RsyncTransfer, Transfer, TransferOutcome};

/// One directory to mirror to one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
	pub target_directory: PathBuf,
	pub server: ServerTarget,
}

/// Aggregate outcome of one `sync_directory` call
#[derive(Debug)]
pub struct SyncReport {
	pub directory: PathBuf,
	pub succeeded: Vec<String>,
	pub failed: Vec<TransferFailure>,
}

impl SyncReport {
	pub fn is_success(&self) -> bool {
		self.failed.is_empty()
	}

	/// Some server failed while others may have succeeded
	pub fn is_partial_failure(&self) -> bool {
		!self.failed.is_empty()
	}

	/// Failures always, successes only at debug level
	pub fn log(&self) {
		for failure in &self.failed {
			warn!("{}", failure);
		}
		for message in &self.succeeded {
			debug!("{}", message);
		}
		if self.is_partial_failure() {
			warn!(
				"Sync of {} failed on {} of {} servers",
				self.directory.display(),
				self.failed.len(),
				self.failed.len() + self.succeeded.len()
			);
		}
	}
}

/// Sync pool
pub struct SyncPool {
	servers: Vec<ServerTarget>,
	transfer: Arc<dyn Transfer>,
	limit: Option<Arc<Semaphore>>,
}

impl SyncPool {
	pub fn new(servers: Vec<ServerTarget>, transfer: Arc<dyn Transfer>) -> Self {
		Self { servers, transfer, limit: None }
	}

	/// Cap the number of transfers in flight across all calls
	pub fn with_max_transfers(mut self, max: Option<usize>) -> Self {
		self.limit = max.map(|n| Arc::new(Semaphore::new(n)));
		self
	}

	/// Pool mirroring with rsync to the configured servers
	pub fn from_config(config: &Config) -> Self {
		Self::new(config.server_targets(), Arc::new(RsyncTransfer::from_config(config)))
			.with_max_transfers(config.max_transfers)
	}

	pub fn servers(&self) -> &[ServerTarget] {
		&self.servers
	}

	/// Mirror `directory` to every server and collect the outcomes
	pub async fn sync_directory(&self, directory: &Path) -> SyncReport {
		let jobs = self
			.servers
			.iter()
			.map(|server| SyncJob { target_directory: directory.to_path_buf(), server: server.clone() });

		let outcomes = join_all(jobs.map(|job| self.run_job(job))).await;

		let mut report =
			SyncReport { directory: directory.to_path_buf(), succeeded: vec![], failed: vec![] };
		for outcome in outcomes {
			match outcome {
				Ok(message) => report.succeeded.push(message),
				Err(failure) => report.failed.push(failure),
			}
		}
		report
	}

	async fn run_job(&self, job: SyncJob) -> TransferOutcome {
		// Acquire fails only on a closed semaphore and this one is never closed
		let _permit = match &self.limit {
			Some(limit) => limit.acquire().await.ok(),
			None => None,
		};
		self.transfer.transfer(&job).await
	}
}

// vim: ts=4
