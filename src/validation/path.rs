//! Path resolution helpers

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::ValidationError;

/// Resolve `path` to an absolute, lexically normalized path
///
/// Relative paths are joined to the current directory. `.` components are
/// dropped and `..` pops the previous component. Symlinks are left alone.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
	if path.is_absolute() {
		Ok(normalize(path))
	} else {
		Ok(normalize(&env::current_dir()?.join(path)))
	}
}

/// Lexical normalization without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				// Popping past the root keeps the root
				out.pop();
			}
			other => out.push(other.as_os_str()),
		}
	}
	if out.as_os_str().is_empty() {
		out.push(Component::CurDir.as_os_str());
	}
	out
}

/// Validate that a configured root is non-empty
pub fn validate_root(path: &Path) -> Result<(), ValidationError> {
	if path.as_os_str().is_empty() {
		return Err(ValidationError::PathError("Empty path in --path list".to_string()));
	}
	Ok(())
}


// vim: ts=4
