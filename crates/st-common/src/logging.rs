//! Structured Logging Configuration
//!
//! - JSON output for production (`LOG_FORMAT=json`, or a `prod` environment)
//! - Human-readable output for development (default)
//! - Context fields via spans (`request_id`, `subscription_id`, ...)
//!
//! # Usage
//!
//! ```rust,ignore
//! use st_common::logging::{init_logging, LogFormat};
//!
//! fn main() {
//!     init_logging("st-server", LogFormat::Text);
//!     tracing::info!(user_id = %id, "Listing subscriptions");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: "json" or "text"; overrides the format passed by the caller
//! - `RUST_LOG`: Standard log level filter (default: info)
//!   Examples: `RUST_LOG=debug`, `RUST_LOG=st_platform=debug,tower_http=info`

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// `prod` environments log JSON, everything else logs text.
    pub fn for_env(env: &str) -> Self {
        if env.eq_ignore_ascii_case("prod") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Resolve the final format, letting `LOG_FORMAT` win over the default.
    fn resolve(default: LogFormat, env_value: Option<&str>) -> Self {
        match env_value {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => Self::Text,
            _ => default,
        }
    }
}

/// Initialize logging for the given service.
///
/// Reads `RUST_LOG` for level filtering (defaults to INFO) and `LOG_FORMAT`
/// to override `default_format`.
pub fn init_logging(service_name: &str, default_format: LogFormat) {
    let log_format = std::env::var("LOG_FORMAT").ok();
    let format = LogFormat::resolve(default_format, log_format.as_deref());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    }

    tracing::debug!(service = service_name, format = ?format, "Logging initialized");
}

/// Initialize JSON logging for production.
fn init_json_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE)
        )
        .init();
}

/// Initialize human-readable text logging for development.
fn init_text_logging(env_filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true)
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_env() {
        assert_eq!(LogFormat::for_env("prod"), LogFormat::Json);
        assert_eq!(LogFormat::for_env("PROD"), LogFormat::Json);
        assert_eq!(LogFormat::for_env("local"), LogFormat::Text);
    }

    #[test]
    fn test_env_override_wins() {
        assert_eq!(LogFormat::resolve(LogFormat::Text, Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::resolve(LogFormat::Json, Some("TEXT")), LogFormat::Text);
        assert_eq!(LogFormat::resolve(LogFormat::Json, Some("xml")), LogFormat::Json);
        assert_eq!(LogFormat::resolve(LogFormat::Text, None), LogFormat::Text);
    }
}
