use std::fmt;

use crate::core::failure::{Failure, FailureKind};

/// Low-level faults raised by data sources.
///
/// These never leave the `data` module: `Boundary` converts every one of
/// them into a `Failure` before returning.
#[derive(Debug, Clone, PartialEq)]
pub enum DataFault {
    /// Source misconfigured (bad URL, bad key). Not retryable.
    Config(String),
    /// Network-level failure (DNS, connection refused, reset). Retryable.
    Network(String),
    /// The request did not finish in time. Retryable.
    Timeout(String),
    /// Upstream answered with a non-success status.
    Status { status: u16, message: String },
    /// Payload could not be decoded. Not retryable.
    Decode(String),
    /// Local storage has no entry for the key.
    StorageMissing(String),
    /// Local storage exists but could not be read.
    StorageRead(String),
    /// A record could not be encoded or written to local storage.
    StorageWrite(String),
}

impl DataFault {
    /// Maps the fault onto the failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            DataFault::Network(_) | DataFault::Timeout(_) => FailureKind::Transient,
            DataFault::Status { status, .. } => match status {
                401 | 403 => FailureKind::Unauthorized,
                404 | 410 => FailureKind::NotFound,
                408 | 429 => FailureKind::Transient,
                s if *s >= 500 => FailureKind::Transient,
                _ => FailureKind::Unknown,
            },
            DataFault::Decode(_) | DataFault::StorageRead(_) => FailureKind::MalformedData,
            DataFault::StorageMissing(_) => FailureKind::NotFound,
            DataFault::Config(_) | DataFault::StorageWrite(_) => FailureKind::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl fmt::Display for DataFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFault::Config(msg) => write!(f, "config error: {msg}"),
            DataFault::Network(msg) => write!(f, "network error: {msg}"),
            DataFault::Timeout(msg) => write!(f, "timeout: {msg}"),
            DataFault::Status { status, message } => {
                write!(f, "upstream error (HTTP {status}): {message}")
            }
            DataFault::Decode(msg) => write!(f, "decode error: {msg}"),
            DataFault::StorageMissing(key) => write!(f, "no stored entry for '{key}'"),
            DataFault::StorageRead(msg) => write!(f, "storage read error: {msg}"),
            DataFault::StorageWrite(msg) => write!(f, "storage write error: {msg}"),
        }
    }
}

impl std::error::Error for DataFault {}

impl From<DataFault> for Failure {
    fn from(fault: DataFault) -> Self {
        Failure::new(fault.kind(), fault.to_string()).with_cause(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> DataFault {
        DataFault::Status {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(status(401).kind(), FailureKind::Unauthorized);
        assert_eq!(status(403).kind(), FailureKind::Unauthorized);
        assert_eq!(status(404).kind(), FailureKind::NotFound);
        assert_eq!(status(429).kind(), FailureKind::Transient);
        assert_eq!(status(503).kind(), FailureKind::Transient);
        assert_eq!(status(418).kind(), FailureKind::Unknown);
    }

    #[test]
    fn test_storage_read_is_malformed_data() {
        let fault = DataFault::StorageRead("permission denied".to_string());
        assert_eq!(fault.kind(), FailureKind::MalformedData);
        assert!(!fault.is_retryable());
    }

    #[test]
    fn test_storage_write_is_not_a_read_fault() {
        let fault = DataFault::StorageWrite("disk full".to_string());
        assert_eq!(fault.kind(), FailureKind::Unknown);
        assert!(!fault.is_retryable());
        assert_eq!(fault.to_string(), "storage write error: disk full");
    }

    #[test]
    fn test_network_is_retryable() {
        assert!(DataFault::Network("reset".to_string()).is_retryable());
        assert!(DataFault::Timeout("5s".to_string()).is_retryable());
        assert!(!DataFault::Decode("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_into_failure_keeps_cause() {
        let failure: Failure = DataFault::Decode("expected `}`".to_string()).into();
        assert_eq!(failure.kind(), FailureKind::MalformedData);
        assert_eq!(failure.message(), "decode error: expected `}`");
        assert!(failure.cause().is_some());
    }
}
