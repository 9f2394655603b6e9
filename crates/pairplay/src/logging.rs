//! Tracing subscriber setup for the server binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` for every Pairplay crate.
pub fn setup_logger(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(default_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(level: &str) -> EnvFilter {
    let directives: Vec<String> = [
        "pairplay",
        "pairplay_server",
        "pairplay_transport",
        "pairplay_protocol",
        "pairplay_store",
        "pairplay_session",
        "pairplay_room",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect();
    EnvFilter::new(directives.join(","))
}
