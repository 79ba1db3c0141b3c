//! # Structured Logging Module
//!
//! Environment-aware structured logging for the signature flow engine and the
//! HTTP server. Console output is human-readable by default and switches to
//! JSON lines when `logging.json` is enabled.

use crate::config::LoggingConfig;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging(environment: &str, config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let log_level = config
            .level
            .clone()
            .unwrap_or_else(|| default_log_level(environment).to_string());

        // RUST_LOG wins over configuration
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let console = if config.json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .boxed()
        };

        // A global subscriber may already be installed by an embedding process
        if tracing_subscriber::registry()
            .with(console.with_filter(filter))
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            level = %log_level,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// Default log level for an environment
pub fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for signature flow operations
pub fn log_flow_operation(
    operation: &str,
    document_id: Uuid,
    user_id: Option<Uuid>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        document_id = %document_id,
        user_id = user_id.map(|id| id.to_string()),
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "FLOW_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(default_log_level("test"), "debug");
        assert_eq!(default_log_level("development"), "debug");
        assert_eq!(default_log_level("production"), "info");
        assert_eq!(default_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init_structured_logging("test", &config);
        init_structured_logging("test", &config);
    }
}
