//! Logging sink
//!
//! Emits each aggregated element as a `tracing` event. The logger identity
//! travels as a `logger` field (tracing targets are static, so the identity
//! cannot be the target itself), the level is configurable, and the message
//! is rendered from a template holding exactly one `{}` placeholder.

use std::fmt;

use gauge_protocol::MetricElement;
use tracing::Level;

use crate::error::{Result, SinkError};
use crate::MetricSink;

/// Default logger identity for [`LogSink`].
pub const DEFAULT_LOGGER: &str = "gauge::sinks";

/// Placeholder that marks where the element renders in the template.
const PLACEHOLDER: &str = "{}";

/// Level at which [`LogSink`] emits its events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace level
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    #[default]
    Info,
    /// Warn level
    Warn,
    /// Error level
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Sink that logs each element through `tracing`.
pub struct LogSink {
    logger: String,
    level: LogLevel,
    /// Template split at its single placeholder
    prefix: String,
    suffix: String,
}

impl LogSink {
    /// Create a log sink with the default identity, `Info` level, and a bare
    /// `{}` template.
    pub fn new() -> Self {
        Self {
            logger: DEFAULT_LOGGER.to_string(),
            level: LogLevel::Info,
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    /// Create a fully configured log sink.
    ///
    /// `template` must contain exactly one `{}` placeholder for the metric
    /// element; any other literal text is kept verbatim. Validation happens
    /// here, fail-fast.
    pub fn with(
        logger: impl Into<String>,
        level: LogLevel,
        template: impl Into<String>,
    ) -> Result<Self> {
        let template = template.into();
        let found = template.matches(PLACEHOLDER).count();
        if found != 1 {
            return Err(SinkError::InvalidTemplate { template, found });
        }
        // Split once at the validated placeholder.
        let (prefix, suffix) = template
            .split_once(PLACEHOLDER)
            .map(|(p, s)| (p.to_string(), s.to_string()))
            .unwrap_or_default();
        Ok(Self {
            logger: logger.into(),
            level,
            prefix,
            suffix,
        })
    }

    /// The logger identity attached to every event.
    #[inline]
    pub fn logger(&self) -> &str {
        &self.logger
    }

    /// The level events are emitted at.
    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn render(&self, element: &MetricElement) -> String {
        format!("{}{}{}", self.prefix, element, self.suffix)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for LogSink {
    fn name(&self) -> &str {
        &self.logger
    }

    fn deliver(&self, element: &MetricElement) -> Result<()> {
        let message = self.render(element);
        // The per-level macros need a const level; dispatch explicitly.
        match self.level {
            LogLevel::Trace => tracing::trace!(logger = %self.logger, "{message}"),
            LogLevel::Debug => tracing::debug!(logger = %self.logger, "{message}"),
            LogLevel::Info => tracing::info!(logger = %self.logger, "{message}"),
            LogLevel::Warn => tracing::warn!(logger = %self.logger, "{message}"),
            LogLevel::Error => tracing::error!(logger = %self.logger, "{message}"),
        }
        Ok(())
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("logger", &self.logger)
            .field("level", &self.level)
            .finish()
    }
}
