//! Price parsing

use rust_decimal::Decimal;
use rusty_money::iso::{Currency, EUR, GBP, USD};

use crate::{fixtures::FixtureError, pricing::decimal_to_minor};

/// Parse a price string (e.g. `"3.99 GBP"`) into minor units and currency.
///
/// # Errors
///
/// Returns an error if the string is not `AMOUNT CURRENCY`, the amount is not a non-negative
/// decimal, or the currency code is not recognised.
pub fn parse_price(s: &str) -> Result<(u64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units =
        decimal_to_minor(amount).map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Tracks the currency of a fixture set so every price agrees.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CurrencyGuard {
    currency: Option<&'static Currency>,
}

impl CurrencyGuard {
    pub(crate) fn new(currency: Option<&'static Currency>) -> Self {
        Self { currency }
    }

    pub(crate) fn currency(self) -> Option<&'static Currency> {
        self.currency
    }

    /// Parse `s`, checking its currency against earlier prices.
    pub(crate) fn price(&mut self, s: &str) -> Result<u64, FixtureError> {
        let (minor_units, currency) = parse_price(s)?;

        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(minor_units),
            None => {
                self.currency = Some(currency);

                Ok(minor_units)
            }
        }
    }

    pub(crate) fn optional_price(&mut self, s: Option<&str>) -> Result<Option<u64>, FixtureError> {
        s.map(|s| self.price(s)).transpose()
    }
}
