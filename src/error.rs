//! Error types for mirrorwatch operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::validation::ValidationError;

/// Top-level error type returned to the binary
#[derive(Debug)]
pub enum MirrorError {
	/// Configuration could not be assembled or is invalid
	Config(ConfigError),

	/// Watch subsystem failure
	Watch(WatchError),

	/// I/O error
	Io(io::Error),
}

impl MirrorError {
	/// Whether this error must terminate the process
	pub fn is_fatal(&self) -> bool {
		match self {
			MirrorError::Config(_) => true,
			MirrorError::Watch(e) => e.is_fatal(),
			MirrorError::Io(_) => true,
		}
	}
}

impl fmt::Display for MirrorError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MirrorError::Config(e) => write!(f, "{}", e),
			MirrorError::Watch(e) => write!(f, "{}", e),
			MirrorError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for MirrorError {}

impl From<ConfigError> for MirrorError {
	fn from(e: ConfigError) -> Self {
		MirrorError::Config(e)
	}
}

impl From<WatchError> for MirrorError {
	fn from(e: WatchError) -> Self {
		MirrorError::Watch(e)
	}
}

impl From<io::Error> for MirrorError {
	fn from(e: io::Error) -> Self {
		MirrorError::Io(e)
	}
}

/// Configuration errors. All of them are fatal.
#[derive(Debug)]
pub enum ConfigError {
	/// Option not recognized by the command line parser
	UnknownOption { option: String },

	/// Command line could not be parsed for another reason
	InvalidArguments { message: String },

	/// Config file could not be read
	FileUnreadable { path: PathBuf, source: io::Error },

	/// Config file is not valid TOML for the expected schema
	FileInvalid { path: PathBuf, message: String },

	/// Assembled configuration failed validation
	Invalid(ValidationError),
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::UnknownOption { option } => {
				write!(f, "Option \"{}\" was not recognized.", option)
			}
			ConfigError::InvalidArguments { message } => write!(f, "{}", message),
			ConfigError::FileUnreadable { path, source } => {
				write!(f, "Cannot read config file {}: {}", path.display(), source)
			}
			ConfigError::FileInvalid { path, message } => {
				write!(f, "Invalid config file {}: {}", path.display(), message)
			}
			ConfigError::Invalid(e) => write!(f, "{}", e),
		}
	}
}

impl Error for ConfigError {}

impl From<ValidationError> for ConfigError {
	fn from(e: ValidationError) -> Self {
		ConfigError::Invalid(e)
	}
}

/// Watch subsystem errors
#[derive(Debug)]
pub enum WatchError {
	/// The watch subsystem dropped events or ran out of watches
	Overflow,

	/// A single watch could not be added
	Backend { path: PathBuf, message: String },

	/// The notification stream ended
	Closed,

	/// I/O error while walking the tree
	Io(io::Error),
}

impl WatchError {
	/// Overflow and a closed notification stream leave nothing to recover
	pub fn is_fatal(&self) -> bool {
		matches!(self, WatchError::Overflow | WatchError::Closed)
	}
}

impl fmt::Display for WatchError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WatchError::Overflow => write!(
				f,
				"Ran out of watchers!  Check `sysctl -n fs.inotify.max_user_watches` for more info."
			),
			WatchError::Backend { path, message } => {
				write!(f, "Cannot watch {}: {}", path.display(), message)
			}
			WatchError::Closed => write!(f, "Watch notification stream closed"),
			WatchError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for WatchError {}

impl From<io::Error> for WatchError {
	fn from(e: io::Error) -> Self {
		WatchError::Io(e)
	}
}

impl From<notify::Error> for WatchError {
	fn from(e: notify::Error) -> Self {
		match e.kind {
			notify::ErrorKind::MaxFilesWatch => WatchError::Overflow,
			_ => WatchError::Backend {
				path: e.paths.first().cloned().unwrap_or_default(),
				message: e.to_string(),
			},
		}
	}
}

/// Why a single transfer failed
#[derive(Debug)]
pub enum TransferError {
	/// The transfer tool could not be started
	Spawn { program: String, source: io::Error },

	/// The transfer tool exited unsuccessfully
	ExitStatus { code: Option<i32>, stderr: String },
}

impl fmt::Display for TransferError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransferError::Spawn { program, source } => {
				write!(f, "Failed to spawn '{}': {}", program, source)
			}
			TransferError::ExitStatus { code: Some(code), stderr } if stderr.is_empty() => {
				write!(f, "rsync exited with code {}", code)
			}
			TransferError::ExitStatus { code: Some(code), stderr } => {
				write!(f, "rsync exited with code {}: {}", code, stderr)
			}
			TransferError::ExitStatus { code: None, stderr } => {
				write!(f, "rsync was terminated by a signal {}", stderr)
			}
		}
	}
}

impl Error for TransferError {}

/// A failed transfer to one server
#[derive(Debug)]
pub struct TransferFailure {
	/// Remote destination, `user@host:path`
	pub destination: String,

	/// Underlying error
	pub error: TransferError,

	/// Command line used, for diagnostics
	pub command: String,
}

impl fmt::Display for TransferFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"WARNING: Error with syncing {}.  {} using command {}",
			self.destination, self.error, self.command
		)
	}
}

impl Error for TransferFailure {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.error)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_overflow_is_fatal() {
		assert!(WatchError::Overflow.is_fatal());
		assert!(MirrorError::from(WatchError::Overflow).is_fatal());
		let backend = WatchError::Backend { path: PathBuf::from("/x"), message: "gone".into() };
		assert!(!backend.is_fatal());
	}

	#[test]
	fn test_max_files_watch_maps_to_overflow() {
		let err = notify::Error::new(notify::ErrorKind::MaxFilesWatch);
		assert!(matches!(WatchError::from(err), WatchError::Overflow));
	}

	#[test]
	fn test_unknown_option_message() {
		let err = ConfigError::UnknownOption { option: "--bogus".to_string() };
		assert_eq!(err.to_string(), "Option \"--bogus\" was not recognized.");
	}

	#[test]
	fn test_transfer_failure_display() {
		let failure = TransferFailure {
			destination: "alice@h1:/srv/app/".to_string(),
			error: TransferError::ExitStatus { code: Some(255), stderr: "unreachable".into() },
			command: "rsync -az --delete".to_string(),
		};
		let text = failure.to_string();
		assert!(text.contains("alice@h1:/srv/app/"));
		assert!(text.contains("255"));
		assert!(text.contains("rsync -az --delete"));
	}
}

// vim: ts=4
