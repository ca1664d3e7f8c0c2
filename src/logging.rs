//! Diagnostic logging using tracing.
//!
//! Logs go to stderr so that JSON and CSV output on stdout stays clean.
//! `RUST_LOG` wins when set; otherwise the level follows `--verbose` and
//! `--quiet`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for the given verbosity flags.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "trawl=debug",
        (false, true) => "error",
        (false, false) => "warn",
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact(),
        )
        .try_init();
}
