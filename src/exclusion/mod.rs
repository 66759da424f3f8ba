//! Path exclusion
//!
//! A path takes part in watching and syncing only if none of the configured
//! exclude entries occurs in it. Matching is a plain substring test on the whole
//! path string, not segment aware: excluding `log` also excludes `login/`.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered list of exclusion substrings, fixed after startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcludeList {
	entries: Vec<String>,
}

impl ExcludeList {
	/// Build an exclude list, keeping the given order
	pub fn new<I, S>(entries: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { entries: entries.into_iter().map(Into::into).collect() }
	}

	/// Parse a comma delimited list, dropping empty items
	pub fn parse(list: &str) -> Self {
		Self::new(list.split(',').filter(|s| !s.is_empty()))
	}

	pub fn entries(&self) -> &[String] {
		&self.entries
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// First entry matching `path`, if any
	pub fn matching_entry(&self, path: &Path) -> Option<&str> {
		let path = path.to_string_lossy();
		self.entries.iter().map(String::as_str).find(|entry| path.contains(entry))
	}

	/// Check whether `path` participates in watching and syncing
	pub fn is_included(&self, path: &Path) -> bool {
		self.matching_entry(path).is_none()
	}
}

/// Returns false if `path` contains any of `exclude` as a substring
pub fn is_included(path: &Path, exclude: &ExcludeList) -> bool {
	exclude.is_included(path)
}


// vim: ts=4
