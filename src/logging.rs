//! Diagnostic logging setup.
//!
//! Logs go to stderr so stdout carries only results.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset.
fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "trawl=debug",
        (false, true) => "error",
        (false, false) => "warn",
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over flags.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    // a subscriber may already be installed, e.g. by a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
