//! Tracing setup for binaries and tests embedding the crate.

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "evalsync=info";

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`
/// (default `evalsync=info`). Safe to call more than once; only the first
/// call installs anything.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing initialised twice without panicking");
    }
}
