use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Picks the log filter: `RUST_LOG` first, then `LOG_LEVEL`, then a per-environment default.
fn build_filter(environment: &Environment) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if environment.is_production() {
                EnvFilter::new("warn")
            } else {
                EnvFilter::new("info,tower_http=debug,sea_orm=info")
            }
        })
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`): flattened JSON events, no targets.
/// - **Development** (default): pretty output.
///
/// Both install `tracing_error::ErrorLayer` so eyre reports carry span traces.
///
/// Environment variables:
/// - `APP_ENV`: "production" switches to JSON logs
/// - `RUST_LOG`: full filter directive (e.g. "rental_api=debug,sea_orm=warn")
/// - `LOG_LEVEL`: fallback directive when `RUST_LOG` is unset
///
/// Calling this more than once is a no-op after the first success.
pub fn init_tracing(environment: &Environment) {
    let filter = build_filter(environment);

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!(?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_multiple_calls() {
        let env = Environment::Development;
        init_tracing(&env);
        init_tracing(&env);
    }

    #[test]
    fn test_init_tracing_production() {
        init_tracing(&Environment::Production);
    }

    #[test]
    fn test_log_level_fallback_is_accepted() {
        temp_env::with_vars([("RUST_LOG", None::<&str>), ("LOG_LEVEL", Some("debug"))], || {
            let filter = build_filter(&Environment::Production);
            assert_eq!(filter.to_string(), "debug");
        });
    }

    #[test]
    fn test_rust_log_wins_over_log_level() {
        temp_env::with_vars([("RUST_LOG", Some("warn")), ("LOG_LEVEL", Some("debug"))], || {
            let filter = build_filter(&Environment::Development);
            assert_eq!(filter.to_string(), "warn");
        });
    }
}
