//! # Error Handling
//!
//! Error types for the encode → annotate → extract pipeline.
//!
//! ## Architecture
//!
//! - **Error Types**: one enum, one variant per failure site, each carrying an
//!   [`ErrorContext`] with timestamp, context and recovery metadata
//! - **Failure Kinds**: every variant maps onto a [`FailureKind`] so a caller can
//!   route all post-submit failures through a single channel and still tell
//!   encode, network and remote failures apart
//! - **Error Traits**: [`HasSeverity`] and [`HasRecoverySuggestion`] for
//!   presentation code that wants to decide how loudly to report a failure
//!
//! Nothing here retries. Every failure is terminal for its request.
//!
//! ## Usage
//!
//! ```rust
//! use image_detection::error::{FailureKind, VisionError};
//!
//! let error = VisionError::remote(Some(403), "API key not valid")
//!     .with_context("annotating 800x480 image")
//!     .with_recovery_suggestion("Check the configured API key");
//!
//! assert_eq!(error.kind(), FailureKind::Remote);
//! assert_eq!(error.category(), "remote");
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Errors that affect one request
    Error,
    /// Errors that make every request fail until configuration changes
    Critical,
}

/// Core error context containing metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: std::collections::HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            metadata: std::collections::HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Which stage a failure belongs to, as seen by the caller of an analyze cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Local failure before any network I/O
    Encode,
    /// Transport-level failure (DNS, TLS, timeout, connection refused)
    Network,
    /// The service answered with an error, or with something unreadable
    Remote,
    /// Misconfiguration or a closed queue; nothing was sent
    Local,
}

/// Base error type for the image detection library
#[derive(Debug)]
pub enum VisionError {
    /// Configuration validation errors
    Config {
        field: String,
        reason: String,
        context: ErrorContext,
    },
    /// Image serialization or resizing failed
    Encode {
        stage: String,
        reason: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Transport errors
    Network {
        operation: String,
        address: Option<String>,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// The service returned a non-empty `error` object or a failing status
    Remote {
        code: Option<i64>,
        status: Option<String>,
        message: String,
        context: ErrorContext,
    },
    /// The response body was not the expected JSON
    Parse {
        reason: String,
        source: Option<serde_json::Error>,
        context: ErrorContext,
    },
    /// State errors (queue closed, worker gone)
    State {
        current_state: String,
        attempted_operation: String,
        context: ErrorContext,
    },
}

impl VisionError {
    /// Create a configuration error
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create an encode error
    pub fn encode(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            stage: stage.into(),
            reason: reason.into(),
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create an encode error wrapping the underlying library error
    pub fn encode_with_source(
        stage: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Encode {
            stage: stage.into(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
            context: ErrorContext::new(),
        }
    }

    /// Create a network error
    pub fn network(operation: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            address: None,
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create a remote error
    pub fn remote(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            status: None,
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a parse error
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
            source: None,
            context: ErrorContext::new(),
        }
    }

    /// Create a state error
    pub fn state(current_state: impl Into<String>, attempted_operation: impl Into<String>) -> Self {
        Self::State {
            current_state: current_state.into(),
            attempted_operation: attempted_operation.into(),
            context: ErrorContext::new(),
        }
    }

    /// Attach the address a network error was talking to
    pub fn with_address(mut self, addr: impl Into<String>) -> Self {
        if let Self::Network { address, .. } = &mut self {
            *address = Some(addr.into());
        }
        self
    }

    /// Attach the textual status of a remote error (e.g. `PERMISSION_DENIED`)
    pub fn with_status(mut self, value: impl Into<String>) -> Self {
        if let Self::Remote { status, .. } = &mut self {
            *status = Some(value.into());
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Remote { context, .. } => context,
            Self::Parse { context, .. } => context,
            Self::State { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Remote { context, .. } => context,
            Self::Parse { context, .. } => context,
            Self::State { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Encode { .. } => "encode",
            Self::Network { .. } => "network",
            Self::Remote { .. } => "remote",
            Self::Parse { .. } => "parse",
            Self::State { .. } => "state",
        }
    }

    /// Stage this failure belongs to. Parse failures count as remote failures.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Encode { .. } => FailureKind::Encode,
            Self::Network { .. } => FailureKind::Network,
            Self::Remote { .. } | Self::Parse { .. } => FailureKind::Remote,
            Self::Config { .. } | Self::State { .. } => FailureKind::Local,
        }
    }
}

impl fmt::Display for VisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisionError::Config { field, reason, .. } => {
                write!(f, "Configuration error in '{}': {}", field, reason)
            }
            VisionError::Encode { stage, reason, .. } => {
                write!(f, "Image encoding failed during {}: {}", stage, reason)
            }
            VisionError::Network {
                operation, address, ..
            } => {
                if let Some(addr) = address {
                    write!(f, "Network error during {} ({})", operation, addr)
                } else {
                    write!(f, "Network error during {}", operation)
                }
            }
            VisionError::Remote {
                code,
                status,
                message,
                ..
            } => {
                write!(f, "Vision service error")?;
                if let Some(code) = code {
                    write!(f, " {}", code)?;
                }
                if let Some(status) = status {
                    write!(f, " [{}]", status)?;
                }
                write!(f, ": {}", message)
            }
            VisionError::Parse { reason, .. } => {
                write!(f, "Malformed vision response: {}", reason)
            }
            VisionError::State {
                current_state,
                attempted_operation,
                ..
            } => {
                write!(
                    f,
                    "Cannot {} while {}",
                    attempted_operation, current_state
                )
            }
        }?;

        let ctx = self.context();
        if let Some(context) = &ctx.context {
            write!(f, " (context: {})", context)?;
        }
        Ok(())
    }
}

impl StdError for VisionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            VisionError::Encode {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            VisionError::Network {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            VisionError::Parse {
                source: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type VisionResult<T> = Result<T, VisionError>;

/// Trait for getting error severity
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for VisionError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for getting recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get a human-readable recovery suggestion
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for VisionError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error conversion implementations
impl From<serde_json::Error> for VisionError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse {
            reason: error.to_string(),
            source: Some(error),
            context: ErrorContext::new(),
        }
    }
}

impl From<image::ImageError> for VisionError {
    fn from(error: image::ImageError) -> Self {
        Self::encode_with_source("serialize", error)
    }
}

impl From<detect_scale::cpu::ScaleError> for VisionError {
    fn from(error: detect_scale::cpu::ScaleError) -> Self {
        Self::encode_with_source("resize", error)
    }
}

impl From<reqwest::Error> for VisionError {
    fn from(error: reqwest::Error) -> Self {
        let operation = if error.is_timeout() {
            "request timeout"
        } else if error.is_connect() {
            "connect"
        } else if error.is_body() || error.is_decode() {
            "read response body"
        } else {
            "send request"
        };
        let address = error.url().map(redacted_url);
        Self::Network {
            operation: operation.to_string(),
            address,
            source: Some(Box::new(error.without_url())),
            context: ErrorContext::new(),
        }
    }
}

/// Host and path of a request URL, without the query string carrying the key.
pub(crate) fn redacted_url(url: &reqwest::Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    )
}
