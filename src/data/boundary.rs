//! # Repository Boundary
//!
//! The line below which faults live and above which only `Failure` values
//! exist. `Boundary<S>` wraps any `DataSource`, retries retryable faults
//! with exponential backoff, and converts everything else, panics included,
//! into a classified `Failure`. `execute` always returns; it never unwinds.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, error, warn};

use crate::core::failure::{Failure, Outcome};

use super::fault::DataFault;
use super::source::DataSource;

/// The repository contract seen by use cases.
#[async_trait]
pub trait Repository: Send + Sync {
    type Request: Send + Sync;
    type Response: Send;

    async fn execute(&self, request: Self::Request) -> Outcome<Self::Response>;
}

/// How many times a retryable fault is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after every further attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

pub struct Boundary<S> {
    source: S,
    retry: RetryPolicy,
}

impl<S: DataSource> Boundary<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One attempt, with a panic inside the source turned into a failure.
    async fn attempt(&self, request: &S::Request) -> Result<S::Response, Attempt> {
        match AssertUnwindSafe(self.source.fetch(request))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(fault)) => Err(Attempt::Fault(fault)),
            Err(panic) => Err(Attempt::Panicked(panic_message(panic.as_ref()))),
        }
    }
}

enum Attempt {
    Fault(DataFault),
    Panicked(String),
}

#[async_trait]
impl<S: DataSource> Repository for Boundary<S> {
    type Request = S::Request;
    type Response = S::Response;

    async fn execute(&self, request: S::Request) -> Outcome<S::Response> {
        let name = self.source.name();
        let mut attempt = 1;
        loop {
            let fault = match self.attempt(&request).await {
                Ok(response) => {
                    debug!("{} fetch succeeded on attempt {}", name, attempt);
                    return Ok(response);
                }
                Err(Attempt::Panicked(message)) => {
                    error!("{} panicked during fetch: {}", name, message);
                    return Err(Failure::unknown(format!("{name} panicked: {message}")));
                }
                Err(Attempt::Fault(fault)) => fault,
            };

            if fault.is_retryable() && attempt < self.retry.max_attempts {
                let delay = self.retry.delay_after(attempt);
                warn!(
                    "{} attempt {}/{} failed ({}), retrying in {}ms",
                    name,
                    attempt,
                    self.retry.max_attempts,
                    fault,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            warn!("{} failed after {} attempt(s): {}", name, attempt, fault);
            return Err(fault.into());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
