use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "info,dexscout_core=info,dexscout_bot=debug";

/// `LOG_LEVEL` only applies when `RUST_LOG` is unset.
fn filter(log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            log_level
                .filter(|level| !level.trim().is_empty())
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

pub fn setup(log_level: Option<&str>) {
    // Compact console output
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter(log_level))
        .with(console_layer)
        .init();
}
