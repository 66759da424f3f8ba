//! Process exit status and startup output of the binary

use tempfile::TempDir;
use tokio::process::Command;

/// Result type for test operations
type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Runs the binary to completion, returning exit code and stdout
async fn run_binary(args: &[&str]) -> TestResult<(Option<i32>, String)> {
	let output = Command::new(env!("CARGO_BIN_EXE_mirrorwatch"))
		.args(args)
		.stdin(std::process::Stdio::null())
		.output()
		.await?;
	Ok((output.status.code(), String::from_utf8_lossy(&output.stdout).into_owned()))
}

#[tokio::test]
async fn test_help_exits_zero() -> TestResult<()> {
	let (code, stdout) = run_binary(&["-h"]).await?;
	assert_eq!(code, Some(0));
	assert!(stdout.contains("mirrorwatch usage"));
	assert!(stdout.contains("Display this help text"));
	Ok(())
}

#[tokio::test]
async fn test_unknown_option_exits_one() -> TestResult<()> {
	let (code, stdout) = run_binary(&["--bogus"]).await?;
	assert_eq!(code, Some(1));
	assert!(stdout.contains("mirrorwatch usage"));
	assert!(stdout.contains("Option \"--bogus\" was not recognized."));
	Ok(())
}

#[tokio::test]
async fn test_missing_server_exits_one() -> TestResult<()> {
	let dir = TempDir::new()?;
	let path = format!("--path={}", dir.path().display());
	let (code, stdout) = run_binary(&[&path]).await?;
	assert_eq!(code, Some(1));
	assert!(stdout.contains("Please specify at least one server."));
	Ok(())
}

#[tokio::test]
async fn test_unreadable_config_file_exits_one() -> TestResult<()> {
	let dir = TempDir::new()?;
	let missing = dir.path().join("absent.toml");
	let arg = format!("--config={}", missing.display());
	let (code, _) = run_binary(&[&arg, "--servers=h1"]).await?;
	assert_eq!(code, Some(1));
	Ok(())
}

// vim: ts=4
