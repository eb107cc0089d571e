//! Tracing subscriber setup
//!
//! Libraries in this workspace only emit `tracing` events. Binaries and test
//! harnesses call [`init_tracing`] once to print them.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed
    #[error("Tracing already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Log output configuration
///
/// `RUST_LOG` takes precedence over [`LogConfig::level`] when set.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Fallback filter directive, e.g. `info` or `storage=debug`
    pub level: String,
    /// Include the event target
    pub with_target: bool,
    /// Single-line compact output
    pub compact: bool,
    /// ANSI colors
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
            compact: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Create a configuration with a fallback filter
    pub fn new(level: impl Into<String>) -> Self {
        Self { level: level.into(), ..Default::default() }
    }

    /// Include or omit the event target
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Use compact single-line output
    pub fn compact(mut self, enabled: bool) -> Self {
        self.compact = enabled;
        self
    }

    /// Enable or disable ANSI colors
    pub fn ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    fn filter(&self) -> Result<EnvFilter, TelemetryError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
    }
}

/// Install the global tracing subscriber
///
/// Returns an error instead of panicking when a subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), TelemetryError> {
    let filter = config.filter()?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(config.with_target)
        .with_ansi(config.ansi);

    let result = if config.compact {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.compact())
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
    };
    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(level = %config.level, "tracing initialized");
    Ok(())
}
