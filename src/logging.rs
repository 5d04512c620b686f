//! Pipeline logging setup.
//!
//! Pass progress and suppressed per-file errors go through `tracing`;
//! levels come from the `[logging]` config section unless `RUST_LOG` is
//! set, which always wins:
//!
//! ```bash
//! RUST_LOG=debug cartograph index .
//! RUST_LOG=pipeline=trace cartograph index .
//! ```
//!
//! Timestamps are elapsed-since-startup: runs are read as a timeline of
//! passes, so relative times carry more signal than wall-clock dates.

use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::uptime;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Install the global subscriber. Safe to call more than once; only the
/// first call takes effect.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = match std::env::var("RUST_LOG") {
            Ok(_) => EnvFilter::from_default_env(),
            Err(_) => EnvFilter::new(filter_directives(config)),
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_timer(uptime())
            .init();
    });
}

/// Filter string from the config: the default level first, then one
/// `module=level` directive per override, sorted so the result is stable.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = vec![config.default.clone()];
    let mut overrides: Vec<String> = config
        .modules
        .iter()
        .map(|(module, level)| format!("{module}={level}"))
        .collect();
    overrides.sort();
    directives.extend(overrides);
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_from_default_only() {
        let config = LoggingConfig {
            default: "warn".to_string(),
            modules: Default::default(),
        };
        assert_eq!(filter_directives(&config), "warn");
    }

    #[test]
    fn module_overrides_are_sorted_and_appended() {
        let mut config = LoggingConfig {
            default: "warn".to_string(),
            modules: Default::default(),
        };
        config
            .modules
            .insert("pipeline".to_string(), "debug".to_string());
        config
            .modules
            .insert("extract".to_string(), "trace".to_string());
        assert_eq!(
            filter_directives(&config),
            "warn,extract=trace,pipeline=debug"
        );
    }
}
