/// Logging setup
///
/// Console-only, human-readable, on stderr so JSON on stdout stays clean.
/// `RUST_LOG` controls the filter (default: `warn`).

use tracing_subscriber::EnvFilter;

pub fn init_cli() {
    init_with_default("warn");
}

/// Same as [`init_cli`] but with a caller-chosen default directive
pub fn init_with_default(directive: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    // A second init (tests, embedding) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
