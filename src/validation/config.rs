//! Configuration validation functions

use super::ValidationError;

/// At least one non-blank server is needed, there is nothing to mirror to otherwise
pub fn validate_servers(servers: &[String]) -> Result<(), ValidationError> {
	if servers.iter().all(|s| s.trim().is_empty()) {
		return Err(ValidationError::ConfigError("Please specify at least one server.".to_string()));
	}
	if let Some(bad) = servers.iter().find(|s| s.contains(char::is_whitespace) || s.contains('/')) {
		return Err(ValidationError::ConfigError(format!("Invalid server name: {:?}", bad)));
	}
	Ok(())
}

/// Validate the remote user name
pub fn validate_user(user: &str) -> Result<(), ValidationError> {
	if user.is_empty() || user.contains('@') || user.contains(char::is_whitespace) {
		return Err(ValidationError::ConfigError(format!("Invalid user name: {:?}", user)));
	}
	Ok(())
}

/// Validate the transfer concurrency cap
pub fn validate_max_transfers(max: Option<usize>) -> Result<(), ValidationError> {
	if max == Some(0) {
		return Err(ValidationError::ConfigError(
			"max-transfers must be greater than 0".to_string(),
		));
	}
	Ok(())
}


// vim: ts=4
