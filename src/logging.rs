//! Tracing setup
//!
//! Verbose output (per-event messages, per-server results, discovery progress)
//! is logged at debug level, so `-v` only changes the default filter:
//!
//! ```bash
//! mirrorwatch --server=h1            # info and above
//! mirrorwatch -v --server=h1         # debug and above
//! RUST_LOG=mirrorwatch=trace mirrorwatch --server=h1
//! ```

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity
pub fn default_directive(verbose: bool) -> &'static str {
	if verbose {
		"debug"
	} else {
		"info"
	}
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init_tracing(verbose: bool) {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
		)
		.with_writer(std::io::stderr)
		.init();
}


// vim: ts=4
