//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Installs a human-readable `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`).
///
/// Safe to call more than once: later calls, or a subscriber installed by
/// the embedding application, win silently.
pub fn init() {
    init_with_default("info");
}

/// Like [`init`], with `directives` used when `RUST_LOG` is unset or
/// unparsable, e.g. `"quartermaster_session=debug,info"`.
pub fn init_with_default(directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init_with_default("debug");
        tracing::info!("still logging");
    }
}
