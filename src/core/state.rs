//! # Feature State
//!
//! Every container publishes one of four states:
//!
//! ```text
//! Initial ──dispatch──▶ Loading ──▶ Success(data)
//!                          │
//!                          └──────▶ Failure(reason)
//! ```
//!
//! States are replaced, never mutated. Readers compare them by value.

use crate::core::failure::{Failure, Outcome};

#[derive(Debug, Clone, PartialEq)]
pub enum State<T> {
    Initial,
    Loading,
    Success(T),
    Failure(Failure),
}

impl<T> Default for State<T> {
    fn default() -> Self {
        State::Initial
    }
}

impl<T> State<T> {
    pub fn is_settled(&self) -> bool {
        matches!(self, State::Success(_) | State::Failure(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            State::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            State::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Short tag for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            State::Initial => "initial",
            State::Loading => "loading",
            State::Success(_) => "success",
            State::Failure(_) => "failure",
        }
    }
}

impl<T> From<Outcome<T>> for State<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Ok(data) => State::Success(data),
            Err(failure) => State::Failure(failure),
        }
    }
}
