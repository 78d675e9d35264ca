use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber filtered by `GRIM_LOG`, then `RUST_LOG`,
/// defaulting to `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRIM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
