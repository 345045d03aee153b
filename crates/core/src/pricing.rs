//! Pricing

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::items::CartItem;

/// Errors that can occur during price arithmetic.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A minor unit amount does not fit the money representation.
    #[error("amount of {0} minor units overflowed")]
    Overflow(u64),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Decimal amount could not be represented in minor units.
    #[error("decimal amount {0} cannot be represented in minor units")]
    DecimalConversion(Decimal),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Converts stored minor units into money of the given currency.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the amount does not fit an `i64`.
pub fn to_money(
    minor: u64,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = i64::try_from(minor).map_err(|_err| PricingError::Overflow(minor))?;

    Ok(Money::from_minor(minor, currency))
}

/// Converts money back into stored minor units.
///
/// # Errors
///
/// Returns [`PricingError::DecimalConversion`] for negative amounts.
pub fn to_minor(money: &Money<'_, Currency>) -> Result<u64, PricingError> {
    let minor = money.to_minor_units();

    u64::try_from(minor).map_err(|_err| PricingError::DecimalConversion(Decimal::from(minor)))
}

/// Zero in the given currency.
pub fn zero(currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_minor(0, currency)
}

/// Unit price multiplied by quantity for a single cart line.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the line total does not fit in minor units.
pub fn line_total(
    item: &CartItem,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let minor = item
        .price
        .checked_mul(u64::from(item.quantity))
        .ok_or(PricingError::Overflow(item.price))?;

    to_money(minor, currency)
}

/// Calculates the subtotal of a list of cart lines.
///
/// An empty cart has a subtotal of zero in the given currency.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: a line total overflowed.
/// - [`PricingError::Money`]: wrapped money arithmetic error.
pub fn subtotal(
    items: &[CartItem],
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    items.iter().try_fold(zero(currency), |acc, item| {
        Ok(acc.add(line_total(item, currency)?)?)
    })
}

/// Subtracts `amount` from `total`, bottoming out at zero.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if the currencies differ.
pub fn saturating_sub<'a>(
    total: Money<'a, Currency>,
    amount: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, PricingError> {
    let remaining = total.sub(amount)?;

    if remaining.is_negative() {
        Ok(Money::from_minor(0, total.currency()))
    } else {
        Ok(remaining)
    }
}

/// The smaller of two amounts in the same currency.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if the currencies differ.
pub fn min_money<'a>(
    a: Money<'a, Currency>,
    b: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, PricingError> {
    if a.currency() != b.currency() {
        return Err(PricingError::Money(MoneyError::CurrencyMismatch {
            expected: a.currency().iso_alpha_code,
            actual: b.currency().iso_alpha_code,
        }));
    }

    if a.to_minor_units() <= b.to_minor_units() {
        Ok(a)
    } else {
        Ok(b)
    }
}

/// Calculate the percentage of a minor unit amount, rounded half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage does not expose the inner Decimal
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Converts a major unit decimal (e.g. `3.99`) into minor units (`399`).
///
/// # Errors
///
/// Returns [`PricingError::DecimalConversion`] for negative or out of range amounts.
pub fn decimal_to_minor(amount: Decimal) -> Result<u64, PricingError> {
    if amount.is_sign_negative() {
        return Err(PricingError::DecimalConversion(amount));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|value| value.to_u64())
        .ok_or(PricingError::DecimalConversion(amount))
}
