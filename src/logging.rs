//! Console logging through `tracing`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_FILTER: &str = "info";

/// Filter for an optional explicit level. `RUST_LOG` wins over both.
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_FILTER)))
}

/// Install the global subscriber. Call once, from a binary.
pub fn init_logging(level: Option<&str>) {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(console_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_parses() {
        let filter = EnvFilter::new("warn,island_world::materialize=debug");
        let text = format!("{}", filter);
        assert!(text.contains("warn"));
        assert!(text.contains("island_world::materialize=debug"));
    }
}
