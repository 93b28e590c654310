//! Failure → user-facing message.
//!
//! Total over `FailureKind`; adding a kind without a mapping fails to
//! compile. The core never calls this: only presentation formats text.

use serde::Serialize;

use crate::core::failure::{Failure, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayMessage {
    /// Stable localization key.
    pub key: &'static str,
    /// Default English text.
    pub text: &'static str,
    /// Whether offering a retry makes sense.
    pub retryable: bool,
}

pub fn map_failure(failure: &Failure) -> DisplayMessage {
    map_kind(failure.kind())
}

pub fn map_kind(kind: FailureKind) -> DisplayMessage {
    let (key, text) = match kind {
        FailureKind::Transient => (
            "error.transient",
            "We couldn't reach the server. Check your connection and try again.",
        ),
        FailureKind::NotFound => ("error.not_found", "We couldn't find what you were looking for."),
        FailureKind::MalformedData => (
            "error.malformed_data",
            "Some saved data is damaged and couldn't be read.",
        ),
        FailureKind::Unauthorized => (
            "error.unauthorized",
            "You don't have access to this. Please sign in again.",
        ),
        FailureKind::RedirectLoop => (
            "error.redirect_loop",
            "This page keeps redirecting. Please contact support.",
        ),
        FailureKind::Unknown => ("error.unknown", "Something went wrong. Please try again."),
    };
    DisplayMessage {
        key,
        text,
        retryable: kind.is_retryable(),
    }
}
