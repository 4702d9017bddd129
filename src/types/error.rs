//! Unified Error Type System
//!
//! Centralized error types for the whole crate.
//!
//! ## Error Categories
//!
//! Provider failures are tagged with an [`ErrorCategory`] so logs and stored
//! error text say what kind of failure happened. The resilient client retries
//! every category; only cancellation short-circuits it.
//!
//! - **RateLimit**: API rate limiting
//! - **Auth**: Authentication failures
//! - **Network**: Connectivity issues and timeouts
//! - **Unavailable**: Provider or model not found
//! - **Transient**: 5xx responses
//! - **ParseError**: Undecodable or empty response bodies

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited by the provider
    RateLimit,
    /// Authentication or authorization failed
    Auth,
    /// Network/connectivity issues, including request timeouts
    Network,
    /// Endpoint or model not found
    Unavailable,
    /// Request rejected as malformed
    BadRequest,
    /// Response body could not be decoded or carried no text
    ParseError,
    /// Temporary server issues
    Transient,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider error with category and context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Create a new LLM error
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            status: None,
        }
    }

    /// Create error with provider context
    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            status: None,
        }
    }

    /// Attach the HTTP status that produced this error
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw provider failures onto [`LlmError`] categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a non-2xx HTTP status code
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            404 => ErrorCategory::Unavailable,
            500..=599 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider).status(status)
    }

    /// Classify a transport-level failure (no response received)
    ///
    /// The request URL is stripped from the message; it may carry credentials.
    pub fn classify_transport(err: reqwest::Error, provider: &str) -> LlmError {
        let err = err.without_url();
        let category = if err.is_timeout() || err.is_connect() {
            ErrorCategory::Network
        } else if err.is_decode() {
            ErrorCategory::ParseError
        } else {
            ErrorCategory::Unknown
        };
        LlmError::with_provider(category, format!("{} request failed: {}", provider, err), provider)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejection of generated content
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation failed: {}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Nothing but whitespace was generated
    Empty,
    /// Generated content is above the size cap
    TooLarge,
    /// The requested section heading does not exist
    SectionMissing,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum GitDocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    /// Structured LLM error with category
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Simple LLM API error
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// One failed attempt inside the resilient client
    #[error("provider {provider} attempt {attempt} failed: {source}")]
    Generation {
        provider: String,
        attempt: u32,
        source: Box<GitDocError>,
    },

    #[error("operation cancelled")]
    Cancelled,

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("target doc file not found: {0}")]
    DocNotFound(String),

    #[error("Invalid diff: {0}")]
    Diff(String),

    #[error("{0}")]
    Validation(ValidationError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not initialized: run 'git-doc init' first")]
    NotInitialized,

    #[error("another git-doc run is already active (pid {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("no documentation commit found for code commit {0}")]
    NoDocCommit(String),
}

impl From<LlmError> for GitDocError {
    fn from(err: LlmError) -> Self {
        GitDocError::Llm(err)
    }
}

impl From<ValidationError> for GitDocError {
    fn from(err: ValidationError) -> Self {
        GitDocError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, GitDocError>;

impl GitDocError {
    /// Wrap an attempt failure with provider and 1-based attempt number
    pub fn generation(provider: impl Into<String>, attempt: u32, source: GitDocError) -> Self {
        Self::Generation {
            provider: provider.into(),
            attempt,
            source: Box::new(source),
        }
    }

    /// True for cancellation, including cancellation wrapped by the retry layer
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Generation { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Category of the underlying provider failure, if any
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Llm(e) => Some(e.category),
            Self::Generation { source, .. } => source.category(),
            _ => None,
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| GitDocError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| GitDocError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
