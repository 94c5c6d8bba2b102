//! Pricing Config

use clap::Args;
use decimal_percentage::Percentage;
use trolley::fixtures::products::parse_percentage;

/// Currency, shipping and tax settings.
#[derive(Debug, Args)]
pub struct PricingConfig {
    /// ISO 4217 code every cart is priced in
    #[arg(long, env = "DEFAULT_CURRENCY", default_value = "GBP")]
    pub default_currency: String,

    /// Flat shipping charge, in minor units
    #[arg(long, env = "SHIPPING_FLAT", default_value_t = 0_i64)]
    pub shipping_flat: i64,

    /// Discounted subtotal at or above which shipping is free, in minor units
    #[arg(long, env = "FREE_SHIPPING_THRESHOLD")]
    pub free_shipping_threshold: Option<i64>,

    /// Tax rate applied to the discounted subtotal ("20%" or "0.2")
    #[arg(long, env = "TAX_RATE", default_value = "0%", value_parser = parse_percentage)]
    pub tax_rate: Percentage,
}
