//! # Failures
//!
//! The one error vocabulary above the repository boundary. Anything that
//! goes wrong below it (network, storage, decoding, even a panic) arrives
//! here as a `Failure` value with a classified `FailureKind`.
//!
//! Failures are data: they travel through use cases into `State::Failure`
//! and are compared structurally. The optional `cause` is opaque and never
//! takes part in equality.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Retryable condition (connectivity, timeout, overloaded upstream).
    Transient,
    NotFound,
    /// Data could not be read or decoded.
    MalformedData,
    Unauthorized,
    /// Guard configuration redirects forever.
    RedirectLoop,
    /// Unclassified. Always surfaced, never swallowed.
    Unknown,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Transient)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Transient => "transient",
            FailureKind::NotFound => "not found",
            FailureKind::MalformedData => "malformed data",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::RedirectLoop => "redirect loop",
            FailureKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A classified failure with a developer-facing message.
///
/// The message is for logs. User-facing text comes from
/// `presentation::error_mapper`, never from here.
#[derive(Clone)]
pub struct Failure {
    kind: FailureKind,
    message: String,
    cause: Option<Arc<dyn Error + Send + Sync>>,
}

/// Result alias used by use cases and repositories.
pub type Outcome<T> = Result<T, Failure>;

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedData, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unauthorized, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unknown, message)
    }

    /// Attaches the underlying error. Kept for diagnostics only.
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl Eq for Failure {}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn Error + 'static))
    }
}
