//! Telemetry and Observability
//!
//! Sets up `tracing-subscriber` for structured logging. The level comes from
//! `RUST_LOG` when set, otherwise from the `--log` flag or the config file.
//! Debug builds print human-readable logs, release builds emit JSON.
//!
//! Logs go to stderr so that `--json` command output on stdout stays parseable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Targets whose events follow the configured level; everything else stays at `warn`
const OWN_TARGETS: [&str; 2] = ["tutor_engine", "tutor"];

/// Filter directive used when `RUST_LOG` is unset
fn default_directive(log_level: &str) -> String {
    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{}={}", target, log_level));
    }
    directive
}

/// Initialize the tracing subscriber with the given log level.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
///
/// Calling this more than once is harmless; only the first call installs
/// a subscriber.
pub fn init_telemetry_with_level(log_level: &str) {
    let default_filter = default_directive(log_level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_binary_and_library() {
        let directive = default_directive("debug");
        assert_eq!(directive, "warn,tutor_engine=debug,tutor=debug");
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn test_default_directive_for_every_config_level() {
        for level in ["error", "warn", "info", "debug", "trace"] {
            let directive = default_directive(level);
            assert!(directive.contains(&format!(",tutor={}", level)));
            assert!(EnvFilter::try_new(&directive).is_ok());
        }
    }
}
