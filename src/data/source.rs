use async_trait::async_trait;

use super::fault::DataFault;

/// Raw data access. Implementations report problems as `DataFault` and are
/// only ever called through a `Boundary`, which turns those faults into
/// `Failure` values.
#[async_trait]
pub trait DataSource: Send + Sync {
    type Request: Send + Sync;
    type Response: Send;

    /// Returns the name of the source.
    fn name(&self) -> &str;

    /// Performs one fetch attempt. Retries are the boundary's business.
    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, DataFault>;
}

/// Checks that a key is a scalar identifier before it is used to build a
/// URL or a file name.
pub(crate) fn validate_key(key: &str) -> Result<(), DataFault> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(DataFault::Config(format!("invalid key '{key}'")))
    }
}
