/// Initializes structured logging for the dispatch service.
///
/// Verbosity comes from `RUST_LOG`:
/// - `RUST_LOG=info` - workflow outcomes and worker lifecycle
/// - `RUST_LOG=debug` - every offer, claim and state push
/// - `RUST_LOG=dispatch_core=debug,dispatch_service=info` - per-crate levels
///
/// Safe to call more than once; later calls are ignored.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
