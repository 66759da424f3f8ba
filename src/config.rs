//! Runtime configuration for mirrorwatch
//!
//! A single immutable `Config` is assembled once at startup and shared by the
//! watch tree, the dispatcher and the sync pool. The priority chain is:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (TOML, given with `--config=`)
//! 3. CLI flags (highest priority)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::exclusion::ExcludeList;
use crate::validation::{
	validate_max_transfers, validate_root, validate_servers, validate_user, ValidationError,
	Validator,
};

/// Default remote user
pub const DEFAULT_USER: &str = "root";

/// Default transfer tool
pub const DEFAULT_RSYNC: &str = "rsync";

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Roots to watch
	pub paths: Vec<PathBuf>,

	/// Substrings that disqualify a path from watching and syncing
	pub exclude: ExcludeList,

	/// Remote hosts to mirror to
	pub servers: Vec<String>,

	/// Remote user
	pub user: String,

	/// Identity file for the ssh transport
	pub ssh_key: Option<PathBuf>,

	/// Verbose diagnostic output
	pub verbose: bool,

	/// Watch subdirectories of the roots
	pub recursive: bool,

	/// Cap on transfer processes in flight, unlimited if None
	pub max_transfers: Option<usize>,

	/// Transfer tool executable
	pub rsync_path: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			paths: vec![PathBuf::from(".")],
			exclude: ExcludeList::default(),
			servers: vec![],
			user: DEFAULT_USER.to_string(),
			ssh_key: None,
			verbose: false,
			recursive: true,
			max_transfers: None,
			rsync_path: DEFAULT_RSYNC.to_string(),
		}
	}
}

impl Config {
	/// Load a config file on top of the defaults
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let text = fs::read_to_string(path)
			.map_err(|e| ConfigError::FileUnreadable { path: path.to_path_buf(), source: e })?;
		Self::from_toml(&text)
			.map_err(|e| ConfigError::FileInvalid { path: path.to_path_buf(), message: e.to_string() })
	}

	/// Parse TOML config text
	pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}

	/// Drop blank list items left by trailing or doubled commas
	pub fn normalized(mut self) -> Self {
		self.servers.retain(|s| !s.trim().is_empty());
		self.paths.retain(|p| !p.as_os_str().is_empty());
		if self.paths.is_empty() {
			self.paths.push(PathBuf::from("."));
		}
		if self.ssh_key.as_ref().map_or(false, |k| k.as_os_str().is_empty()) {
			self.ssh_key = None;
		}
		self
	}

	/// One target per configured server, all sharing user and identity file
	pub fn server_targets(&self) -> Vec<ServerTarget> {
		self.servers
			.iter()
			.map(|host| ServerTarget {
				host: host.clone(),
				user: self.user.clone(),
				ssh_identity: self.ssh_key.clone(),
			})
			.collect()
	}
}

impl Validator for Config {
	fn validate(&self) -> Result<(), ValidationError> {
		validate_servers(&self.servers)?;
		validate_user(&self.user)?;
		validate_max_transfers(self.max_transfers)?;
		for path in &self.paths {
			validate_root(path)?;
		}
		if self.rsync_path.trim().is_empty() {
			return Err(ValidationError::ConfigError("rsync path must not be empty".to_string()));
		}
		Ok(())
	}
}

/// A remote host to mirror to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerTarget {
	pub host: String,
	pub user: String,
	pub ssh_identity: Option<PathBuf>,
}

impl ServerTarget {
	pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
		Self { host: host.into(), user: user.into(), ssh_identity: None }
	}

	pub fn with_identity(mut self, identity: impl Into<PathBuf>) -> Self {
		self.ssh_identity = Some(identity.into());
		self
	}

	/// `user@host`
	pub fn address(&self) -> String {
		format!("{}@{}", self.user, self.host)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = Config::default();
		assert_eq!(config.paths, vec![PathBuf::from(".")]);
		assert_eq!(config.user, "root");
		assert!(config.recursive);
		assert!(!config.verbose);
		assert!(config.servers.is_empty());
		assert_eq!(config.max_transfers, None);
		assert_eq!(config.rsync_path, "rsync");
	}

	#[test]
	fn test_default_config_has_no_server() {
		let err = Config::default().validate().unwrap_err();
		assert_eq!(err.to_string(), "Please specify at least one server.");
	}

	#[test]
	fn test_from_toml() {
		let config = Config::from_toml(
			r#"
			paths = ["/srv/app", "/var/www"]
			exclude = ["log", ".tmp"]
			servers = ["h1", "h2"]
			user = "alice"
			sshKey = "/k"
			maxTransfers = 8
			"#,
		)
		.unwrap();
		assert_eq!(config.paths.len(), 2);
		assert_eq!(config.exclude, ExcludeList::new(["log", ".tmp"]));
		assert_eq!(config.user, "alice");
		assert_eq!(config.ssh_key, Some(PathBuf::from("/k")));
		assert_eq!(config.max_transfers, Some(8));
		// Unset keys keep their defaults
		assert!(config.recursive);
		assert_eq!(config.rsync_path, "rsync");
	}

	#[test]
	fn test_from_toml_rejects_wrong_types() {
		assert!(Config::from_toml("servers = 3").is_err());
	}

	#[test]
	fn test_normalized_drops_blanks() {
		let config = Config {
			servers: vec!["".into(), "h1".into(), " ".into()],
			paths: vec![PathBuf::new()],
			ssh_key: Some(PathBuf::new()),
			..Default::default()
		}
		.normalized();
		assert_eq!(config.servers, vec!["h1".to_string()]);
		assert_eq!(config.paths, vec![PathBuf::from(".")]);
		assert_eq!(config.ssh_key, None);
	}

	#[test]
	fn test_server_targets() {
		let config = Config {
			servers: vec!["h1".into(), "h2".into()],
			user: "alice".into(),
			ssh_key: Some(PathBuf::from("/k")),
			..Default::default()
		};
		let targets = config.server_targets();
		assert_eq!(targets.len(), 2);
		assert_eq!(targets[0], ServerTarget::new("h1", "alice").with_identity("/k"));
		assert_eq!(targets[1].address(), "alice@h2");
	}
}

// vim: ts=4
