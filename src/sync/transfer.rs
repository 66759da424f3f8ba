//! Transfer executor: one rsync run against one server

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::SyncJob;
use crate::config::Config;
use crate::error::{TransferError, TransferFailure};

/// Success message or structured failure; never an error past the executor
pub type TransferOutcome = Result<String, TransferFailure>;

/// Mirrors one directory to one server
#[async_trait]
pub trait Transfer: Send + Sync {
	async fn transfer(&self, job: &SyncJob) -> TransferOutcome;
}

/// Runs the rsync executable over ssh
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
	program: String,
	verbose: bool,
}

impl RsyncTransfer {
	pub fn new(program: impl Into<String>) -> Self {
		Self { program: program.into(), verbose: false }
	}

	/// Ask rsync itself for verbose output
	pub fn verbose(mut self, verbose: bool) -> Self {
		self.verbose = verbose;
		self
	}

	pub fn from_config(config: &Config) -> Self {
		Self::new(config.rsync_path.clone()).verbose(config.verbose)
	}

	/// `user@host:dir/`, for display
	pub fn destination(job: &SyncJob) -> String {
		Self::destination_arg(job).to_string_lossy().into_owned()
	}

	/// `user@host:dir/` with the directory bytes untouched
	fn destination_arg(job: &SyncJob) -> OsString {
		let mut dest = OsString::from(job.server.address());
		dest.push(":");
		dest.push(with_trailing_separator(&job.target_directory));
		dest
	}

	/// Argument vector: archive, compress, delete mirroring, ssh transport,
	/// source with a trailing separator so contents are mirrored, destination
	pub fn args(&self, job: &SyncJob) -> Vec<OsString> {
		let flags = if self.verbose { "-azv" } else { "-az" };
		let shell = match &job.server.ssh_identity {
			Some(key) => format!("ssh -i {}", shell_quote(&key.to_string_lossy())),
			None => "ssh".to_string(),
		};
		vec![
			flags.into(),
			"--delete".into(),
			"-e".into(),
			shell.into(),
			with_trailing_separator(&job.target_directory),
			Self::destination_arg(job),
		]
	}

	/// Printable command line
	pub fn command_line(&self, job: &SyncJob) -> String {
		let mut parts = vec![shell_quote(&self.program)];
		parts.extend(self.args(job).iter().map(|arg| shell_quote(&arg.to_string_lossy())));
		parts.join(" ")
	}
}

#[async_trait]
impl Transfer for RsyncTransfer {
	async fn transfer(&self, job: &SyncJob) -> TransferOutcome {
		let destination = Self::destination(job);
		let command = self.command_line(job);
		debug!("Starting sync on {}", destination);

		let output = Command::new(&self.program)
			.args(self.args(job))
			.stdin(Stdio::null())
			.output()
			.await;

		let error = match output {
			Ok(output) if output.status.success() => {
				return Ok(format!(
					"{} was successfully synced.  Using command: {}",
					destination, command
				));
			}
			Ok(output) => TransferError::ExitStatus {
				code: output.status.code(),
				stderr: last_line(&output.stderr),
			},
			Err(e) => TransferError::Spawn { program: self.program.clone(), source: e },
		};
		Err(TransferFailure { destination, error, command })
	}
}

/// Path ending in exactly one separator
pub fn with_trailing_separator(path: &Path) -> OsString {
	let mut s = path.as_os_str().to_os_string();
	if !path.as_os_str().to_string_lossy().ends_with('/') {
		s.push("/");
	}
	s
}

/// Quote for display and for rsync's `-e` splitting
fn shell_quote(s: &str) -> String {
	let safe = !s.is_empty()
		&& s.chars().all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
	if safe {
		s.to_string()
	} else {
		format!("'{}'", s.replace('\'', "'\\''"))
	}
}

/// Last non-empty line of a tool's stderr
fn last_line(stderr: &[u8]) -> String {
	String::from_utf8_lossy(stderr)
		.lines()
		.rev()
		.map(str::trim)
		.find(|line| !line.is_empty())
		.unwrap_or_default()
		.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ServerTarget;
	use std::path::PathBuf;

	fn job(dir: &str, server: ServerTarget) -> SyncJob {
		SyncJob { target_directory: PathBuf::from(dir), server }
	}

	#[test]
	fn test_args_with_identity() {
		let job = job("/srv/app", ServerTarget::new("h1", "alice").with_identity("/k"));
		let args = RsyncTransfer::new("rsync").args(&job);
		let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
		assert_eq!(args, ["-az", "--delete", "-e", "ssh -i /k", "/srv/app/", "alice@h1:/srv/app/"]);
	}

	#[test]
	fn test_args_without_identity_verbose() {
		let job = job("/srv/app/", ServerTarget::new("h2", "root"));
		let args = RsyncTransfer::new("rsync").verbose(true).args(&job);
		assert_eq!(args[0], OsString::from("-azv"));
		assert_eq!(args[3], OsString::from("ssh"));
		assert_eq!(args[4], OsString::from("/srv/app/"));
		assert_eq!(args[5], OsString::from("root@h2:/srv/app/"));
	}

	#[test]
	fn test_command_line_quotes() {
		let job = job("/srv/my app", ServerTarget::new("h1", "alice").with_identity("/k"));
		let cmd = RsyncTransfer::new("rsync").command_line(&job);
		assert_eq!(
			cmd,
			"rsync -az --delete -e 'ssh -i /k' '/srv/my app/' 'alice@h1:/srv/my app/'"
		);
	}

	#[test]
	fn test_identity_with_space_is_quoted_for_rsync() {
		let job = job("/d", ServerTarget::new("h", "u").with_identity("/keys/my key"));
		let args = RsyncTransfer::new("rsync").args(&job);
		assert_eq!(args[3], OsString::from("ssh -i '/keys/my key'"));
	}

	#[test]
	fn test_trailing_separator() {
		assert_eq!(with_trailing_separator(Path::new("/srv/app")), OsString::from("/srv/app/"));
		assert_eq!(with_trailing_separator(Path::new("/srv/app/")), OsString::from("/srv/app/"));
		assert_eq!(with_trailing_separator(Path::new("/")), OsString::from("/"));
	}

	#[cfg(unix)]
	#[test]
	fn test_args_keep_non_utf8_bytes() {
		use std::ffi::OsStr;
		use std::os::unix::ffi::OsStrExt;

		let dir = PathBuf::from(OsStr::from_bytes(b"/srv/caf\xe9"));
		let job = SyncJob { target_directory: dir, server: ServerTarget::new("h1", "alice") };
		let args = RsyncTransfer::new("rsync").args(&job);
		assert_eq!(args[4].as_bytes(), b"/srv/caf\xe9/");
		assert_eq!(args[5].as_bytes(), b"alice@h1:/srv/caf\xe9/");
		assert!(RsyncTransfer::destination(&job).starts_with("alice@h1:/srv/caf"));
	}

	#[test]
	fn test_last_line() {
		assert_eq!(last_line(b"first\nrsync error: unexplained\n\n"), "rsync error: unexplained");
		assert_eq!(last_line(b""), "");
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_transfer_success_and_failure() {
		let job = job("/srv/app", ServerTarget::new("h1", "alice"));

		let ok = RsyncTransfer::new("true").transfer(&job).await.unwrap();
		assert!(ok.starts_with("alice@h1:/srv/app/ was successfully synced."));
		assert!(ok.contains("true -az --delete"));

		let failure = RsyncTransfer::new("false").transfer(&job).await.unwrap_err();
		assert_eq!(failure.destination, "alice@h1:/srv/app/");
		assert!(matches!(failure.error, TransferError::ExitStatus { code: Some(1), .. }));
		assert!(failure.command.starts_with("false "));
	}

	#[tokio::test]
	async fn test_transfer_spawn_failure() {
		let job = job("/srv/app", ServerTarget::new("h1", "alice"));
		let failure =
			RsyncTransfer::new("/nonexistent/rsync-binary").transfer(&job).await.unwrap_err();
		assert!(matches!(failure.error, TransferError::Spawn { .. }));
	}
}

// vim: ts=4
