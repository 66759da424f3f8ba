//! Signal handling
//!
//! The watch tree lives only in memory, so there is nothing to flush on
//! shutdown. Running rsync children are left to finish on their own.

use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// Exit status for termination by `signo`
pub fn signal_exit_code(signo: i32) -> i32 {
	128 + signo
}

/// Exit with the conventional status on SIGINT or SIGTERM
pub fn setup_signal_handlers() {
	tokio::spawn(async {
		let mut sigterm = match signal(SignalKind::terminate()) {
			Ok(stream) => stream,
			Err(e) => {
				warn!("Failed to setup SIGTERM handler: {}", e);
				return;
			}
		};
		let mut sigint = match signal(SignalKind::interrupt()) {
			Ok(stream) => stream,
			Err(e) => {
				warn!("Failed to setup SIGINT handler: {}", e);
				return;
			}
		};

		let code = tokio::select! {
			_ = sigterm.recv() => signal_exit_code(15),
			_ = sigint.recv() => signal_exit_code(2),
		};
		info!("Stopping, no longer watching");
		std::process::exit(code);
	});
}


// vim: ts=4
