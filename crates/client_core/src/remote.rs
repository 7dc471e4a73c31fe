//! Remote medicine listing over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::Medicine, protocol::MedicineListResponse};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_MEDICINE_ENDPOINT: &str =
    "https://mocki.io/v1/6823ac1b-d61a-4a98-afd8-9419c83a5439";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    Decode,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("medicine request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("medicine response did not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network(_) => FetchErrorKind::Network,
            Self::Decode(_) => FetchErrorKind::Decode,
        }
    }
}

#[async_trait]
pub trait MedicineSource: Send + Sync {
    /// Performs one read of the remote listing. No retry.
    async fn fetch_all(&self) -> Result<Vec<Medicine>, FetchError>;
}

pub struct HttpMedicineSource {
    http: Client,
    endpoint: Url,
}

impl HttpMedicineSource {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl MedicineSource for HttpMedicineSource {
    async fn fetch_all(&self) -> Result<Vec<Medicine>, FetchError> {
        debug!(endpoint = %self.endpoint, "fetching medicine listing");
        let res = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?;
        let status = res.status();
        let body = res.bytes().await?;
        let listing: MedicineListResponse = serde_json::from_slice(&body)?;
        debug!(
            status = status.as_u16(),
            records = listing.medicines.len(),
            "medicine listing decoded"
        );
        Ok(listing.medicines)
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
