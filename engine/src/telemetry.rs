//! Logging setup
//!
//! One-shot `tracing-subscriber` initialization, called once after the
//! CLI flags and the config file have been resolved so the chosen log
//! level actually takes effect. `RUST_LOG` overrides everything;
//! otherwise the level comes from `--log` or `core.log_level`.
//!
//! Debug builds get pretty terminal output, release builds structured
//! JSON with span context.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives applied when `RUST_LOG` is absent: the level for
/// everything, repeated for this crate so it is never filtered out by
/// a stricter global default.
fn default_directives(log_level: &str) -> String {
    format!("{level},leafscan_engine={level}", level = log_level)
}

/// Install the global tracing subscriber at the given level.
///
/// `RUST_LOG` takes precedence over `log_level` when set. The global
/// subscriber can only be claimed once per process; later calls leave
/// the first one in place, which keeps repeated calls from test code
/// harmless.
pub fn init_telemetry(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let registry = tracing_subscriber::registry().with(env_filter);

    #[cfg(debug_assertions)]
    registry
        .with(fmt::layer().pretty().with_target(false))
        .try_init()
        .ok();

    #[cfg(not(debug_assertions))]
    registry
        .with(fmt::layer().json().with_current_span(true))
        .try_init()
        .ok();
}
