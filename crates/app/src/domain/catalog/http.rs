//! HTTP catalog client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use trolley::catalog::{CatalogSnapshot, ProductSnapshot, SnapshotKey};

use super::{CatalogError, CatalogReader};

/// Reads snapshots from the catalog service: `POST {base_url}/snapshots`.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct SnapshotsRequest<'a> {
    keys: &'a [SnapshotKey],
}

#[derive(Debug, Deserialize)]
struct SnapshotsResponse {
    snapshots: Vec<ProductSnapshot>,
}

impl HttpCatalogClient {
    /// Create a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl CatalogReader for HttpCatalogClient {
    #[tracing::instrument(name = "catalog.http.snapshots", skip(self, keys), fields(keys = keys.len()), err)]
    async fn snapshots(&self, keys: &[SnapshotKey]) -> Result<CatalogSnapshot, CatalogError> {
        if keys.is_empty() {
            return Ok(CatalogSnapshot::new());
        }

        let url = format!("{}/snapshots", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&SnapshotsRequest { keys })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(CatalogError::UnexpectedResponse(format!(
                "snapshot request failed with status {status}: {text}"
            )));
        }

        let parsed: SnapshotsResponse = response.json().await?;

        Ok(parsed.snapshots.into_iter().collect())
    }
}
