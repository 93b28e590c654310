//! JSON-over-HTTP data source.
//!
//! Fetches `{base_url}/{collection}/{key}` and decodes the body as `T`.
//! The `reqwest::Client` owns the connection pool; connections are returned
//! to it on every exit path, including when the calling task is cancelled.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::data::fault::DataFault;
use crate::data::source::{DataSource, validate_key};

pub struct HttpSource<T> {
    name: String,
    base_url: String,
    collection: String,
    client: reqwest::Client,
    _record: PhantomData<fn() -> T>,
}

impl<T> HttpSource<T> {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DataFault> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataFault::Config(e.to_string()))?;
        let collection = collection.into();
        Ok(Self {
            name: format!("http:{collection}"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection,
            client,
            _record: PhantomData,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.collection, key)
    }
}

fn classify(e: reqwest::Error) -> DataFault {
    if e.is_timeout() {
        DataFault::Timeout(e.to_string())
    } else if e.is_decode() {
        DataFault::Decode(e.to_string())
    } else if e.is_builder() {
        DataFault::Config(e.to_string())
    } else {
        DataFault::Network(e.to_string())
    }
}

#[async_trait]
impl<T> DataSource for HttpSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Request = String;
    type Response = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, key: &String) -> Result<T, DataFault> {
        validate_key(key)?;
        let url = self.url_for(key);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(classify)?;
        let status = response.status();
        debug!("{} responded {}", url, status);

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("{} error: {} - {}", self.name, status, message);
            return Err(DataFault::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(classify)?;
        serde_json::from_str(&body).map_err(|e| DataFault::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let source: HttpSource<serde_json::Value> =
            HttpSource::new("http://api.local/", "users", Duration::from_secs(1)).unwrap();
        assert_eq!(source.url_for("alice"), "http://api.local/users/alice");
        assert_eq!(source.name(), "http:users");
    }

    #[tokio::test]
    async fn test_rejects_non_scalar_key() {
        let source: HttpSource<serde_json::Value> =
            HttpSource::new("http://api.local", "users", Duration::from_secs(1)).unwrap();
        let fault = source.fetch(&"../admin".to_string()).await.unwrap_err();
        assert!(matches!(fault, DataFault::Config(_)));
    }
}
