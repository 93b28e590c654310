//! # Use Cases
//!
//! The only way a container reaches business logic. A use case is a
//! stateless `input → Outcome<output>` function that talks to one or more
//! repositories. Identical input against identical repository state yields
//! an identical outcome.

use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::core::failure::{Failure, Outcome};

#[async_trait]
pub trait UseCase: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Returns the name used in log lines.
    fn name(&self) -> &str;

    /// Runs the use case. Awaiting here is a suspension point; if the owning
    /// container cancels the event, the future is dropped at the next await.
    async fn execute(&self, input: Self::Input) -> Outcome<Self::Output>;
}

/// Bounds a use case's running time.
///
/// Built on the same drop-at-await cancellation the containers use: when the
/// limit elapses the inner future is dropped and a transient failure returned.
pub struct Timeout<U> {
    inner: U,
    limit: Duration,
}

impl<U: UseCase> Timeout<U> {
    pub fn new(inner: U, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<U: UseCase> UseCase for Timeout<U> {
    type Input = U::Input;
    type Output = U::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn execute(&self, input: Self::Input) -> Outcome<Self::Output> {
        match tokio::time::timeout(self.limit, self.inner.execute(input)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Use case '{}' timed out after {}ms",
                    self.inner.name(),
                    self.limit.as_millis()
                );
                Err(Failure::transient(format!(
                    "{} timed out after {}ms",
                    self.inner.name(),
                    self.limit.as_millis()
                )))
            }
        }
    }
}
