use std::env;
use std::process;
use std::sync::Arc;
use tracing::{debug, error, info};

use mirrorwatch::cli::{self, CliAction};
use mirrorwatch::dispatch::{self, EventDispatcher};
use mirrorwatch::{logging, utils, Config, MirrorError, NotifyBackend, SyncPool, WatchTree};

#[tokio::main]
async fn main() {
	let config = match cli::parse_args(env::args_os()) {
		Ok(CliAction::Help) => {
			print!("{}", cli::USAGE);
			process::exit(0);
		}
		Ok(CliAction::Run(config)) => config,
		Err(e) => {
			println!("{}\n{}", cli::USAGE, e);
			process::exit(1);
		}
	};

	logging::init_tracing(config.verbose);
	utils::setup_signal_handlers();

	// Only fatal conditions get here; in-flight transfers are not awaited
	if let Err(e) = run(config).await {
		error!("{}", e);
		process::exit(1);
	}
}

async fn run(config: Config) -> Result<(), MirrorError> {
	let (backend, notifications) = NotifyBackend::new()?;
	let mut tree = WatchTree::new(backend, config.exclude.clone()).recursive(config.recursive);

	debug!("Finding sub-directories.");
	let added = tree.discover(&config.paths).await?;
	info!("All sub-directories were successfully added! ({} watched)", added.len());

	let pool = Arc::new(SyncPool::from_config(&config));
	info!(
		"Mirroring to {}",
		pool.servers().iter().map(|s| s.address()).collect::<Vec<_>>().join(", ")
	);

	dispatch::run(EventDispatcher::new(tree, pool), notifications).await?;
	Ok(())
}

// vim: ts=4
