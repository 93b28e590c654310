//! Plain-text rendering for the CLI.

use std::fmt::Display;

use log::{error, info};

use crate::core::failure::{Failure, FailureKind};
use crate::core::state::State;
use crate::navigation::Decision;

use super::error_mapper::map_failure;

/// One line describing a state.
pub fn describe<T: Display>(state: &State<T>) -> String {
    match state {
        State::Initial => "idle".to_string(),
        State::Loading => "loading...".to_string(),
        State::Success(data) => format!("ok: {data}"),
        State::Failure(failure) => {
            report(failure);
            let message = map_failure(failure);
            if message.retryable {
                format!("error: {} (retry possible)", message.text)
            } else {
                format!("error: {}", message.text)
            }
        }
    }
}

pub fn describe_decision(path: &str, decision: &Decision) -> String {
    match decision {
        Decision::Allow => format!("{path}: allowed"),
        Decision::RedirectTo(target) => format!("{path}: redirect to {target}"),
    }
}

/// Logs a failure on its way to the screen. `Unknown` is always an error log.
pub fn report(failure: &Failure) {
    match failure.kind() {
        FailureKind::Unknown | FailureKind::RedirectLoop => {
            error!("Surfacing {} failure: {}", failure.kind(), failure.message())
        }
        _ => info!("Surfacing {} failure: {}", failure.kind(), failure.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_states() {
        assert_eq!(describe::<String>(&State::Initial), "idle");
        assert_eq!(describe::<String>(&State::Loading), "loading...");
        assert_eq!(describe(&State::Success("alice")), "ok: alice");
    }

    #[test]
    fn test_describe_failure_uses_mapped_text() {
        let line = describe::<String>(&State::Failure(Failure::transient("econnreset")));
        assert!(line.starts_with("error: We couldn't reach the server"));
        assert!(line.ends_with("(retry possible)"));
        assert!(!line.contains("econnreset"));
    }

    #[test]
    fn test_describe_decision() {
        assert_eq!(
            describe_decision("/dashboard", &Decision::RedirectTo("/login".to_string())),
            "/dashboard: redirect to /login"
        );
        assert_eq!(describe_decision("/", &Decision::Allow), "/: allowed");
    }
}
