//! Upstream Services Config

use std::{path::PathBuf, time::Duration};

use clap::Args;

/// Catalog and order service settings.
#[derive(Debug, Args)]
pub struct UpstreamsConfig {
    /// Catalog service base URL. The fixture catalog is served when unset.
    #[arg(long, env = "CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// Order service base URL. Orders are kept in memory when unset.
    #[arg(long, env = "ORDERS_URL")]
    pub orders_url: Option<String>,

    /// Directory holding fixture sets
    #[arg(long, env = "FIXTURES_PATH", default_value = "./fixtures")]
    pub fixtures_path: PathBuf,

    /// Fixture set to load
    #[arg(long, env = "FIXTURE_SET", default_value = "default")]
    pub fixture_set: String,

    /// Timeout for each upstream request, in milliseconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = 2_000_u64)]
    pub upstream_timeout_ms: u64,
}

impl UpstreamsConfig {
    /// Per-request upstream timeout.
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}
