//! Catalog Snapshot Reader

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use trolley::catalog::{CatalogSnapshot, SnapshotKey};

mod fixture;
mod http;

pub use fixture::StaticCatalog;
pub use http::HttpCatalogClient;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed")]
    Http(#[from] reqwest::Error),

    #[error("unexpected catalog response: {0}")]
    UnexpectedResponse(String),
}

#[automock]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Current price, stock and unit state for the given keys. Keys the
    /// catalog does not know are absent from the result.
    async fn snapshots(&self, keys: &[SnapshotKey]) -> Result<CatalogSnapshot, CatalogError>;
}
