//! Logging setup.
//!
//! Logs go to stderr so that command output on stdout stays machine-readable.
//! `RUST_LOG` takes precedence over the configured level:
//!
//! ```bash
//! RUST_LOG=paperqa=debug paperqa ingest ./data
//! ```

use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

use crate::models::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive from config, raising the level to `info` when verbose.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose && matches!(config.level.as_str(), "error" | "warn") {
        "info".to_string()
    } else {
        config.level.clone()
    }
}

/// Install the global subscriber. Only the first call takes effect.
pub fn init(config: &LoggingConfig, verbose: bool) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directive(config, verbose))
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(CompactTime)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    });
}
