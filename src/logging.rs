//! # Structured Logging
//!
//! Subscriber setup for processes embedding the data-access layer. Production
//! writes JSON lines for the log shipper; other environments get coloured
//! console output. `RUST_LOG` always wins over the environment default.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static SUBSCRIBER_INSTALLED: OnceLock<()> = OnceLock::new();

/// Output format for the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Console,
}

impl LogFormat {
    pub fn for_environment(environment: &str) -> Self {
        if environment == "production" {
            LogFormat::Json
        } else {
            LogFormat::Console
        }
    }
}

/// Install the global subscriber once
///
/// Later calls do nothing. If the host application already installed its own
/// subscriber, that one is kept.
pub fn init_structured_logging() {
    SUBSCRIBER_INSTALLED.get_or_init(|| {
        let environment = get_environment();
        let format = LogFormat::for_environment(&environment);
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level(&environment)));

        let layer = match format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_current_span(false)
                .with_target(true)
                .with_filter(filter)
                .boxed(),
            LogFormat::Console => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter)
                .boxed(),
        };

        let installed = tracing_subscriber::registry().with(layer).try_init().is_ok();

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            format = ?format,
            installed,
            "🔧 Structured logging ready"
        );
    });
}

/// Deployment environment name, lowercased
///
/// Checks `STOREFRONT_ENV`, then `APP_ENV`, then `RACK_ENV`.
pub(crate) fn get_environment() -> String {
    ["STOREFRONT_ENV", "APP_ENV", "RACK_ENV"]
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "development".to_string())
        .to_lowercase()
}

fn default_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}

/// Record the final outcome of an operation routed through the wrapper
pub fn log_database_operation(
    operation: &str,
    outcome: &str,
    attempts: u32,
    duration_ms: Option<u64>,
    category: Option<&str>,
) {
    tracing::info!(
        operation,
        outcome,
        attempts,
        duration_ms,
        category,
        "💾 Database operation finished"
    );
}

/// Record a failure in a component that swallows the error
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(component, operation, error, context, "❌ Data-access failure");
}
