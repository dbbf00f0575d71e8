use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Diagnostics go to stderr because stdout
/// may carry converted HTML. `RUST_LOG` takes precedence over `verbose`.
pub(crate) fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
