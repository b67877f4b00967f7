//! Logging utilities and configuration for componet.
//!
//! Hot paths (per-row normalization, per-pair fetches) log through the
//! [`LogConfig`]-gated macros so the cost of formatting is only paid when the
//! output is wanted. Process-wide subscriber setup lives in [`setup`].

use tracing::Level;

/// Logging configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for pipeline components
    pub base_level: Level,
    /// Whether to log per-cell normalization details (prefix, unit, affix)
    pub log_cell_details: bool,
    /// Whether to log store and fetch operations
    pub log_data_operations: bool,
    /// Maximum length for logged field values such as SQL text
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_cell_details: false,
            log_data_operations: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging unit inference.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_cell_details: true,
            log_data_operations: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_cell_details: false,
            log_data_operations: false,
            max_field_length: 128,
        }
    }
}

/// Debug logging that skips argument evaluation when debug is off.
#[macro_export]
macro_rules! perf_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level >= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Per-cell normalization logging.
#[macro_export]
macro_rules! log_cell {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_cell_details {
            tracing::trace!($($arg)*);
        }
    };
}

/// Store and fetch logging.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Process-wide subscriber setup.
pub mod setup {
    use tracing::Level;

    /// Configuration for the tracing subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside this crate
        pub level: Level,
        /// Log level for `componet` targets
        pub componet_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                componet_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                componet_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                componet_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// JSON output at info level, debug for this crate.
        pub fn structured() -> Self {
            Self {
                level: Level::INFO,
                componet_level: Level::DEBUG,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_componet_level(mut self, level: Level) -> Self {
            self.componet_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},componet={}",
                    self.level.as_str().to_lowercase(),
                    self.componet_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs the global subscriber. `RUST_LOG` overrides the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use componet::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
