//! The set of watched directories
//!
//! Discovery walks each root and registers every non-excluded directory with
//! the backend. Listings run concurrently; each outstanding listing is one
//! entry in a `FuturesUnordered`, and discovery is complete exactly when that
//! set drains. Registrations are keyed by resolved absolute path, so
//! registering a path twice is a no-op.
//!
//! Symlinks are not followed: a symlinked subdirectory is never watched,
//! which keeps link cycles out of the walk.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::backend::WatchBackend;
use super::event::EventMask;
use crate::error::WatchError;
use crate::exclusion::ExcludeList;
use crate::validation::resolve_path;

/// A live watch on one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRegistration {
	/// Resolved absolute path
	pub path: PathBuf,

	/// Change kinds the dispatcher reacts to for this directory
	pub mask: EventMask,
}

/// Result of registering a single directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registered {
	/// A new watch was added
	Added(PathBuf),

	/// The path was already watched
	AlreadyWatched(PathBuf),

	/// The path matches the exclude list
	Excluded,
}

/// Watch tree manager
pub struct WatchTree<B: WatchBackend> {
	backend: B,
	exclude: ExcludeList,
	recursive: bool,
	registrations: BTreeMap<PathBuf, WatchRegistration>,
}

impl<B: WatchBackend> WatchTree<B> {
	pub fn new(backend: B, exclude: ExcludeList) -> Self {
		Self { backend, exclude, recursive: true, registrations: BTreeMap::new() }
	}

	/// When false, discovery registers the roots only
	pub fn recursive(mut self, recursive: bool) -> Self {
		self.recursive = recursive;
		self
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	pub fn exclude(&self) -> &ExcludeList {
		&self.exclude
	}

	pub fn len(&self) -> usize {
		self.registrations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.registrations.is_empty()
	}

	pub fn is_watched(&self, path: &Path) -> bool {
		self.registrations.contains_key(path)
	}

	pub fn registration(&self, path: &Path) -> Option<&WatchRegistration> {
		self.registrations.get(path)
	}

	/// Watched directories in path order
	pub fn paths(&self) -> impl Iterator<Item = &Path> {
		self.registrations.keys().map(PathBuf::as_path)
	}

	/// Register a single directory
	///
	/// Excluded and already watched paths are not errors. Only a backend failure
	/// is, and `WatchError::Overflow` among those is fatal for the caller.
	pub fn register_one(&mut self, path: &Path) -> Result<Registered, WatchError> {
		let path = resolve_path(path)?;

		if let Some(entry) = self.exclude.matching_entry(&path) {
			debug!("Skipping {} (excluded by {:?})", path.display(), entry);
			return Ok(Registered::Excluded);
		}
		if self.registrations.contains_key(&path) {
			return Ok(Registered::AlreadyWatched(path));
		}

		let mask = EventMask::DEFAULT;
		self.backend.add_watch(&path, mask)?;
		debug!("Watching {}", path.display());
		self.registrations.insert(path.clone(), WatchRegistration { path: path.clone(), mask });
		Ok(Registered::Added(path))
	}

	/// Register every root and, in recursive mode, every directory below them
	///
	/// Returns the newly registered directories once the traversal has finished.
	/// Unreadable directories are logged and skipped; only overflow aborts.
	pub async fn discover(&mut self, roots: &[PathBuf]) -> Result<Vec<PathBuf>, WatchError> {
		let recursive = self.recursive;
		self.walk(roots, recursive).await
	}

	/// Register a directory that appeared under a watched one, with everything
	/// already inside it
	pub async fn grow(&mut self, dir: &Path) -> Result<Vec<PathBuf>, WatchError> {
		self.walk(&[dir.to_path_buf()], true).await
	}

	/// Drop `path` and everything below it after it was deleted or moved away
	pub fn forget(&mut self, path: &Path) -> Vec<PathBuf> {
		let stale: Vec<PathBuf> =
			self.registrations.keys().filter(|p| p.starts_with(path)).cloned().collect();
		for p in &stale {
			self.registrations.remove(p);
			self.backend.remove_watch(p);
			debug!("No longer watching {}", p.display());
		}
		stale
	}

	async fn walk(&mut self, roots: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, WatchError> {
		let mut added = Vec::new();
		let mut pending = FuturesUnordered::new();

		for root in roots {
			debug!("Processing path {}", root.display());
			if let Some(dir) = self.register_logged(root)? {
				added.push(dir.clone());
				if recursive {
					pending.push(list_subdirs(dir));
				}
			}
		}

		while let Some(listing) = pending.next().await {
			let children = match listing {
				Ok(children) => children,
				Err((dir, e)) => {
					warn!("Cannot read directory {}: {}", dir.display(), e);
					continue;
				}
			};
			for child in children {
				if let Some(dir) = self.register_logged(&child)? {
					added.push(dir.clone());
					pending.push(list_subdirs(dir));
				}
			}
		}

		Ok(added)
	}

	/// Newly added path, or None for excluded, known or failed ones
	fn register_logged(&mut self, path: &Path) -> Result<Option<PathBuf>, WatchError> {
		match self.register_one(path) {
			Ok(Registered::Added(dir)) => Ok(Some(dir)),
			Ok(_) => Ok(None),
			Err(e) if e.is_fatal() => Err(e),
			Err(e) => {
				warn!("{}", e);
				Ok(None)
			}
		}
	}
}

/// Direct subdirectories of `dir`. Symlinks are not followed.
async fn list_subdirs(dir: PathBuf) -> Result<Vec<PathBuf>, (PathBuf, io::Error)> {
	let mut entries = match fs::read_dir(&dir).await {
		Ok(entries) => entries,
		Err(e) => return Err((dir, e)),
	};

	let mut subdirs = Vec::new();
	loop {
		match entries.next_entry().await {
			Ok(Some(entry)) => match entry.file_type().await {
				Ok(file_type) if file_type.is_dir() => subdirs.push(entry.path()),
				Ok(_) => {}
				Err(e) => debug!("Cannot stat {}: {}", entry.path().display(), e),
			},
			Ok(None) => break,
			Err(e) => return Err((dir, e)),
		}
	}
	Ok(subdirs)
}


// vim: ts=4
