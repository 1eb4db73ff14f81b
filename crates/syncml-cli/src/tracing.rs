//! Tracing + log bridge setup.
//!
//! A thin `tracing_subscriber::fmt` layer gated by `RUST_LOG`/`EnvFilter`,
//! without an OpenTelemetry exporter pipeline since this workspace has
//! no hosted backend to send spans to. `syncml-dbapi`'s own modules log
//! through the `log` facade (see `registry.rs`, `plugin/dynamic.rs`);
//! `tracing_log::LogTracer` bridges those records into this subscriber
//! so they show up alongside the CLI's own `tracing` spans.
pub fn setup_logging() {
    use tracing_log::LogTracer;
    use tracing_subscriber::{EnvFilter, fmt};

    LogTracer::init().expect("failed to install log -> tracing bridge");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}
