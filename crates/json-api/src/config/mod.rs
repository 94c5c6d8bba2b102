//! Server configuration module

use clap::Parser;
use trolley_app::context::AppSettings;

use crate::config::{
    observability::{LoggingConfig, ObservabilityConfig},
    pricing::PricingConfig,
    server::ServerRuntimeConfig,
    storage::StorageConfig,
    upstreams::UpstreamsConfig,
};

pub(crate) mod observability;
pub(crate) mod pricing;
pub(crate) mod server;
pub(crate) mod storage;
pub(crate) mod upstreams;

pub(crate) use observability::LogFormat;

/// Trolley JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "trolley-json", about = "Trolley cart pricing API", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics/profiles) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Cart, coupon and offer storage.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Catalog and order services.
    #[command(flatten)]
    pub upstreams: UpstreamsConfig,

    /// Currency, shipping and tax.
    #[command(flatten)]
    pub pricing: PricingConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings for building the application context.
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            database_url: self.storage.database_url.clone(),
            catalog_url: self.upstreams.catalog_url.clone(),
            orders_url: self.upstreams.orders_url.clone(),
            fixtures_path: self.upstreams.fixtures_path.clone(),
            fixture_set: self.upstreams.fixture_set.clone(),
            upstream_timeout: self.upstreams.upstream_timeout(),
            currency: self.pricing.default_currency.clone(),
            shipping_flat: self.pricing.shipping_flat,
            free_shipping_threshold: self.pricing.free_shipping_threshold,
            tax_rate: self.pricing.tax_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal_macros::dec;
    use testresult::TestResult;
    use trolley::money::rate;

    use super::*;

    #[test]
    fn pricing_and_upstream_flags_reach_app_settings() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "trolley-json",
            "--default-currency",
            "eur",
            "--shipping-flat",
            "395",
            "--free-shipping-threshold",
            "5000",
            "--tax-rate",
            "20%",
            "--upstream-timeout-ms",
            "750",
            "--catalog-url",
            "http://catalog.internal",
        ])?;

        let settings = config.app_settings();

        assert_eq!(settings.currency, "eur");
        assert_eq!(settings.shipping_flat, 395);
        assert_eq!(settings.free_shipping_threshold, Some(5_000));
        assert_eq!(rate(&settings.tax_rate), dec!(0.2));
        assert_eq!(settings.upstream_timeout, Duration::from_millis(750));
        assert_eq!(settings.catalog_url.as_deref(), Some("http://catalog.internal"));

        Ok(())
    }

    #[test]
    fn malformed_tax_rates_are_rejected() {
        let result = ServerConfig::try_parse_from(["trolley-json", "--tax-rate", "twenty"]);

        assert!(result.is_err(), "expected a parse error for the tax rate");
    }
}
