use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. `RUST_LOG` overrides the default filter;
/// `ANSI_OUTPUT=false` disables colours.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let color = std::env::var("ANSI_OUTPUT").map_or(true, |v| v == "true");

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(color)
        .with_filter(env_filter);

    // Only fails if a subscriber is already installed.
    let _ = Registry::default().with(fmt).try_init();
}
