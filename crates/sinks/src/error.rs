//! Sink error types

use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors raised at sink construction or delivery
#[derive(Debug, Error)]
pub enum SinkError {
    /// Message template does not contain exactly one `{}` placeholder
    #[error(
        "message template '{template}' is invalid: must contain exactly one \
         '{{}}' placeholder for the metric element, found {found}"
    )]
    InvalidTemplate {
        /// The offending template
        template: String,
        /// How many placeholders it contained
        found: usize,
    },

    /// Writing to the output stream failed
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The TSDB client rejected the element
    #[error("tsdb client error: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}
