use tracing_subscriber::EnvFilter;

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        ::tracing::debug!(target: "kira_spro", $($arg)*);
    }};
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        ::tracing::info!(target: "kira_spro", $($arg)*);
    }};
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        ::tracing::warn!(target: "kira_spro", $($arg)*);
    }};
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        ::tracing::error!(target: "kira_spro", $($arg)*);
    }};
}

/// Installs a stderr subscriber. `RUST_LOG` wins over `verbose` when set.
/// Calling it twice is harmless; the second install is ignored.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "kira_spro=debug" } else { "kira_spro=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
