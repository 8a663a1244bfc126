use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "murmur_app=debug,murmur_api=debug,murmur_db=info";

/// Install the fmt subscriber, honoring `RUST_LOG`. A second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init();
}
