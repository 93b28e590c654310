use std::fmt;

use crate::core::failure::{Failure, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// A route pattern could not be parsed. Configuration bug.
    InvalidPattern { pattern: String, reason: String },
    /// No route matches the path.
    UnknownRoute(String),
    /// A parameter is missing, undeclared, duplicated or not a scalar.
    InvalidParameter { path: String, reason: String },
    /// Guards kept redirecting: `chain` holds every visited path, the
    /// offending target last.
    RedirectLoop { chain: Vec<String> },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern '{pattern}': {reason}")
            }
            NavigationError::UnknownRoute(path) => write!(f, "no route matches '{path}'"),
            NavigationError::InvalidParameter { path, reason } => {
                write!(f, "invalid parameter in '{path}': {reason}")
            }
            NavigationError::RedirectLoop { chain } => {
                write!(f, "redirect loop: {}", chain.join(" -> "))
            }
        }
    }
}

impl std::error::Error for NavigationError {}

impl From<NavigationError> for Failure {
    fn from(e: NavigationError) -> Self {
        let kind = match &e {
            NavigationError::RedirectLoop { .. } => FailureKind::RedirectLoop,
            NavigationError::InvalidPattern { .. } => FailureKind::Unknown,
            NavigationError::UnknownRoute(_) | NavigationError::InvalidParameter { .. } => {
                FailureKind::NotFound
            }
        };
        Failure::new(kind, e.to_string()).with_cause(e)
    }
}
