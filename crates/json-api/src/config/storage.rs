//! Storage Config

use clap::Args;

/// Cart, coupon and offer storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// `PostgreSQL` connection string. Carts, coupons and offers are kept in
    /// memory when unset.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}
