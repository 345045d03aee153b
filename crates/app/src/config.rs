//! Configuration

use std::path::PathBuf;

use clap::Args;
use larder::{
    coupons::DEFAULT_EXPIRING_SOON_DAYS, fulfilment::FeePolicy, pricing::decimal_to_minor,
};
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

/// Errors raised while resolving configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The currency code is not an ISO 4217 currency.
    #[error("unknown currency {0}")]
    UnknownCurrency(String),

    /// The default delivery fee is not a non-negative decimal amount.
    #[error("invalid default delivery fee {0}")]
    InvalidDeliveryFee(String),

    /// The expiring-soon window is negative.
    #[error("expiring soon window must not be negative, got {0}")]
    NegativeExpiryWindow(i64),
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Storefront settings.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// ISO 4217 currency for prices and totals
    #[arg(long, env = "LARDER_CURRENCY", default_value = "GBP", global = true)]
    pub currency: String,

    /// Delivery fee for zones without their own fee, e.g. 3.99
    #[arg(long, env = "LARDER_DEFAULT_DELIVERY_FEE", global = true)]
    pub default_delivery_fee: Option<String>,

    /// Days before expiry at which a coupon is flagged as expiring soon
    #[arg(
        long,
        env = "LARDER_EXPIRING_SOON_DAYS",
        default_value_t = DEFAULT_EXPIRING_SOON_DAYS,
        global = true
    )]
    pub expiring_soon_days: i64,

    /// JSON file the cart is kept in between runs; in memory when omitted
    #[arg(long, env = "LARDER_CART_PATH", global = true)]
    pub cart_path: Option<PathBuf>,

    /// Directory holding fixture sets
    #[arg(
        long,
        env = "LARDER_FIXTURES",
        default_value = "crates/core/fixtures",
        global = true
    )]
    pub fixtures: PathBuf,

    /// Fixture set to load from the fixture directory
    #[arg(long, env = "LARDER_FIXTURE_SET", default_value = "default", global = true)]
    pub fixture_set: String,
}

/// Application configuration.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Storefront settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Engine settings resolved from [`StoreConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub currency: &'static Currency,
    pub fee_policy: FeePolicy,
    pub expiring_soon_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: iso::GBP,
            fee_policy: FeePolicy::default(),
            expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS,
        }
    }
}

impl StoreConfig {
    /// Resolve the engine settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the currency, fee or expiry window is invalid.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let currency = iso::find(self.currency.trim())
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))?;

        let default_delivery_fee = self
            .default_delivery_fee
            .as_deref()
            .map(parse_fee)
            .transpose()?;

        if self.expiring_soon_days < 0 {
            return Err(ConfigError::NegativeExpiryWindow(self.expiring_soon_days));
        }

        Ok(Settings {
            currency,
            fee_policy: FeePolicy {
                default_delivery_fee,
            },
            expiring_soon_days: self.expiring_soon_days,
        })
    }
}

fn parse_fee(raw: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidDeliveryFee(raw.to_string());

    let amount = raw.trim().parse::<Decimal>().map_err(|_err| invalid())?;

    decimal_to_minor(amount).map_err(|_err| invalid())
}
