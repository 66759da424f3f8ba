//! Command line parsing
//!
//! Flags keep the historical `--name=a,b` spelling. Parsing never exits the
//! process itself; the caller decides on the exit status.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::ConfigError;
use crate::exclusion::ExcludeList;
use crate::validation::Validator;

/// Usage text printed by `-h` and on configuration errors
pub const USAGE: &str = "\
mirrorwatch usage

-h               Display this help text
-v               Verbose output
-r               Recursively watch directories (default, kept for compatibility)
--path=          Comma delimited paths: /home/foo,/var/www/html
                 Current directory implied if omitted
--exclude=       Comma delimited substrings to be excluded: temp-write,.log
--server=        Comma delimited servers: myserver.com,168.0.0.144
--user=          SSH user name (root implied if omitted)
--sshkey=        Path to SSH key
--config=        TOML config file, command line flags take precedence
--max-transfers= Limit on concurrent rsync processes (unlimited if omitted)
--rsync=         rsync executable (rsync implied if omitted)
";

/// What the command line asks for
#[derive(Debug)]
pub enum CliAction {
	/// Print usage and exit successfully
	Help,

	/// Start watching with the resolved configuration
	Run(Config),
}

/// Build the clap command
pub fn command() -> Command {
	Command::new("mirrorwatch")
		.about("Watch directory trees and mirror changes to remote hosts")
		.override_help(USAGE)
		.disable_help_flag(true)
		.disable_version_flag(true)
		.args_override_self(true)
		.arg(Arg::new("help").short('h').long("help").action(ArgAction::Help))
		.arg(Arg::new("verbose").short('v').action(ArgAction::SetTrue))
		.arg(Arg::new("recursive").short('r').action(ArgAction::SetTrue))
		.arg(list_arg("path"))
		.arg(list_arg("exclude"))
		.arg(list_arg("server"))
		.arg(Arg::new("user").long("user").value_name("NAME"))
		.arg(Arg::new("sshkey").long("sshkey").value_name("PATH"))
		.arg(Arg::new("config").long("config").value_name("FILE"))
		.arg(
			Arg::new("max-transfers")
				.long("max-transfers")
				.value_name("N")
				.value_parser(value_parser!(usize)),
		)
		.arg(Arg::new("rsync").long("rsync").value_name("PATH"))
}

fn list_arg(name: &'static str) -> Arg {
	Arg::new(name)
		.long(name)
		.value_name("LIST")
		.value_delimiter(',')
		.num_args(1)
		.action(ArgAction::Set)
}

/// Parse process arguments (the first item is the program name)
pub fn parse_args<I, T>(args: I) -> Result<CliAction, ConfigError>
where
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
{
	let matches = match command().try_get_matches_from(args) {
		Ok(matches) => matches,
		Err(err) => return map_clap_error(err),
	};
	let config = build_config(&matches)?;
	config.validate()?;
	Ok(CliAction::Run(config))
}

fn map_clap_error(err: clap::Error) -> Result<CliAction, ConfigError> {
	match err.kind() {
		ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(CliAction::Help),
		ErrorKind::UnknownArgument => {
			let option = match err.get(ContextKind::InvalidArg) {
				Some(ContextValue::String(arg)) => arg.split('=').next().unwrap_or(arg).to_string(),
				_ => String::from("?"),
			};
			Err(ConfigError::UnknownOption { option })
		}
		_ => Err(ConfigError::InvalidArguments { message: err.to_string().trim().to_string() }),
	}
}

/// Overlay command line flags onto the defaults or the config file
fn build_config(matches: &ArgMatches) -> Result<Config, ConfigError> {
	let mut config = match matches.get_one::<String>("config") {
		Some(file) => Config::from_file(&PathBuf::from(file))?,
		None => Config::default(),
	};

	if matches.get_flag("verbose") {
		config.verbose = true;
	}
	if matches.get_flag("recursive") {
		config.recursive = true;
	}
	if let Some(paths) = matches.get_many::<String>("path") {
		config.paths = paths.map(PathBuf::from).collect();
	}
	if let Some(exclude) = matches.get_many::<String>("exclude") {
		config.exclude = ExcludeList::new(exclude.filter(|s| !s.is_empty()).cloned());
	}
	if let Some(servers) = matches.get_many::<String>("server") {
		config.servers = servers.cloned().collect();
	}
	if let Some(user) = matches.get_one::<String>("user") {
		config.user = user.clone();
	}
	if let Some(key) = matches.get_one::<String>("sshkey") {
		config.ssh_key = Some(PathBuf::from(key));
	}
	if let Some(max) = matches.get_one::<usize>("max-transfers") {
		config.max_transfers = Some(*max);
	}
	if let Some(rsync) = matches.get_one::<String>("rsync") {
		config.rsync_path = rsync.clone();
	}

	Ok(config.normalized())
}


// vim: ts=4
