//! # Events
//!
//! Everything a feature is asked to do arrives as an `Event`.
//! User submits a login form? That's `Event::new("LoginSubmitted", credentials)`.
//!
//! Events are immutable once built: fields are private and only readable.
//! The correlation id ties an event to every log line its processing produces.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Event<P> {
    kind: String,
    payload: P,
    correlation_id: Uuid,
    created_at: DateTime<Utc>,
}

impl<P> Event<P> {
    /// Creates an event with a fresh correlation id.
    pub fn new(kind: impl Into<String>, payload: P) -> Self {
        Self::with_correlation(kind, payload, Uuid::new_v4())
    }

    /// Creates an event that continues an existing correlation chain.
    pub fn with_correlation(kind: impl Into<String>, payload: P, correlation_id: Uuid) -> Self {
        Self {
            kind: kind.into(),
            payload,
            correlation_id,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Consumes the event, handing its payload to a use case.
    pub fn into_payload(self) -> P {
        self.payload
    }
}
