//! Logging configuration for idiocy
//!
//! The container logs under the `idiocy` target: registrations and container
//! creation at `DEBUG`, every resolve and activation at `TRACE`. This module
//! installs a subscriber for those events in JSON (production) or pretty
//! (development) form.
//!
//! # Features
//!
//! - `logging` - Emit tracing events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - Colorful pretty output
//!
//! Without `logging-json` or `logging-pretty` there is no subscriber to
//! install and the `init*` functions do nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use idiocy::logging;
//!
//! // Initialize with default settings (JSON if logging-json, pretty if logging-pretty)
//! logging::init();
//!
//! // Or use builder for custom configuration
//! logging::builder()
//!     .trace()
//!     .container_only()
//!     .with_thread_names()
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event the container emits
pub const TARGET: &str = "idiocy";

/// Logging format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Pretty colorful output (development)
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
    with_thread_names: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
            with_thread_names: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a new logging builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set log level to TRACE (shows every resolve)
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Set log level to DEBUG
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Set log level to INFO
    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Set log level to WARN
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Set log level to ERROR
    pub fn error(self) -> Self {
        self.with_level(Level::ERROR)
    }

    /// Filter to only show logs from a specific target
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show container logs
    pub fn container_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Include file names in log output
    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    /// Include line numbers in log output
    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Include thread IDs in log output
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    /// Include thread names in log output
    pub fn with_thread_names(mut self) -> Self {
        self.with_thread_names = true;
        self
    }

    /// Use JSON structured logging format
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty colorful logging format
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line logging format
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive for the configured level and target
    fn directive(&self) -> String {
        match self.target {
            Some(target) => format!("{}={}", target, self.level),
            None => self.level.to_string(),
        }
    }

    /// Install the configured subscriber as the global default.
    ///
    /// Does nothing if a global subscriber is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

        let base = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_thread_names(self.with_thread_names)
            .with_target(true);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => base.json().boxed(),
            // Without the json formatter, fall back to the default format
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => base.boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        };

        let filter = EnvFilter::new(self.directive());

        let _ = tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init();
    }

    /// Initialize (no-op when subscriber features not available)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
///
/// Uses JSON format if `logging-json` feature is enabled,
/// otherwise uses pretty format if `logging-pretty` is enabled.
pub fn init() {
    #[cfg(feature = "logging-json")]
    init_json();

    #[cfg(all(feature = "logging-pretty", not(feature = "logging-json")))]
    init_pretty();
}

/// Initialize JSON structured logging
///
/// # Example output
/// ```json
/// {"timestamp":"2026-01-01T00:00:00.000Z","level":"DEBUG","target":"idiocy","fields":{"message":"Creating new IoC container"}}
/// ```
pub fn init_json() {
    builder().json().debug().init();
}

/// Initialize pretty colorful logging
///
/// # Example output
/// ```text
///   2026-01-01T00:00:00.000Z DEBUG idiocy: Creating new IoC container
/// ```
pub fn init_pretty() {
    builder().pretty().debug().init();
}

/// Initialize logging for the container only (filters other crates)
pub fn init_container_only() {
    builder().container_only().debug().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert!(builder.target.is_none());
        assert_eq!(builder.directive(), "DEBUG");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .pretty()
            .with_file()
            .with_line_number()
            .container_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert_eq!(builder.target, Some("idiocy"));
        assert_eq!(builder.directive(), "idiocy=TRACE");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_container_only();
        init_container_only();

        let container = crate::Container::new();
        assert!(container.is_empty());
    }
}
