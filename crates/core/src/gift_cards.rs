//! Gift cards

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{PricingError, min_money, to_minor, to_money};

/// Reasons a gift card cannot be redeemed.
#[derive(Debug, Error, PartialEq)]
pub enum GiftCardError {
    /// The code does not match a usable gift card.
    #[error("gift card {0} is not valid")]
    Invalid(String),

    /// The gift card has nothing left on it.
    #[error("gift card {0} has no remaining balance")]
    Exhausted(String),

    /// The gift card service could not be reached.
    #[error("gift card could not be checked: {0}")]
    Unavailable(String),

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A gift card's remaining balance, as reported by the gift card service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCardBalance {
    /// Code customers enter
    pub code: String,

    /// Gift card id
    pub gift_card_id: String,

    /// Remaining balance in minor units
    pub balance: u64,
}

/// The provisional amount a gift card contributes to one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCardRedemption {
    /// Code customers enter
    pub code: String,

    /// Gift card id
    pub gift_card_id: String,

    /// Amount taken off the order, in minor units
    pub amount_to_apply: u64,
}

impl GiftCardRedemption {
    /// Plan a redemption against the order total after every other discount.
    ///
    /// The amount is the smaller of the balance and `payable`, so a card never takes an order
    /// below zero.
    ///
    /// # Errors
    ///
    /// Returns [`GiftCardError::Exhausted`] when the balance is zero, or a pricing error.
    pub fn plan(
        card: &GiftCardBalance,
        payable: Money<'static, Currency>,
    ) -> Result<Self, GiftCardError> {
        if card.balance == 0 {
            return Err(GiftCardError::Exhausted(card.code.clone()));
        }

        let balance = to_money(card.balance, payable.currency())?;
        let applied = min_money(balance, payable)?;

        Ok(Self {
            code: card.code.clone(),
            gift_card_id: card.gift_card_id.clone(),
            amount_to_apply: to_minor(&applied)?,
        })
    }

    /// The applied amount as money.
    ///
    /// # Errors
    ///
    /// Returns a pricing error if the amount does not fit the currency.
    pub fn amount(
        &self,
        currency: &'static Currency,
    ) -> Result<Money<'static, Currency>, PricingError> {
        to_money(self.amount_to_apply, currency)
    }
}
