use std::fmt;

/// Errors surfaced by the page workflow to the presentation layer.
///
/// None of these are retried automatically. `Configuration` disables the
/// completion-backed features, `DataUnavailable` disables the wood reference
/// page only, and `Service` is reported for the single action that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// No API key (or an unusable provider setup).
    Configuration(String),
    /// Reference dataset missing, unreadable or malformed.
    DataUnavailable(String),
    /// Opaque failure from the completion service or the transport.
    Service(String),
}

impl WorkflowError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::DataUnavailable(_) => "data_unavailable",
            Self::Service(_) => "service",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Configuration(msg) | Self::DataUnavailable(msg) | Self::Service(msg) => msg,
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::DataUnavailable(msg) => write!(f, "reference data unavailable: {msg}"),
            Self::Service(msg) => write!(f, "completion service error: {msg}"),
        }
    }
}

impl std::error::Error for WorkflowError {}
