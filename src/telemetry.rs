use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, honouring `RUST_LOG`.
/// Calling it again is a no-op, so tests and the binary can both use it.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("dongne_market=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
