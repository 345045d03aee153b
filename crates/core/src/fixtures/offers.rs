//! Coupon and gift card fixtures

use jiff::Timestamp;
use serde::Deserialize;

use crate::{
    coupons::CouponRecord,
    fixtures::{FixtureError, prices::CurrencyGuard},
    gift_cards::GiftCardBalance,
    items::MealId,
};

/// Wrapper for coupons and gift cards in YAML
#[derive(Debug, Deserialize)]
pub struct OffersFixture {
    /// Coupons
    #[serde(default)]
    pub coupons: Vec<CouponFixture>,

    /// Gift cards
    #[serde(default)]
    pub gift_cards: Vec<GiftCardFixture>,
}

/// Coupon Fixture
///
/// Mirrors the coupon service's storage, so any combination of mechanisms may be set.
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Code
    pub code: String,

    /// Percentage off, e.g. `10` for 10%
    #[serde(default)]
    pub percentage: Option<f64>,

    /// Fixed amount off (e.g., "5.00 GBP")
    #[serde(default)]
    pub amount: Option<String>,

    /// Whether delivery is free
    #[serde(default)]
    pub free_delivery: bool,

    /// Meal given away
    #[serde(default)]
    pub free_item: Option<String>,

    /// Expiry (RFC 3339)
    #[serde(default)]
    pub expires_at: Option<Timestamp>,

    /// Whether the coupon is switched on
    pub active: bool,

    /// Minimum subtotal (e.g., "20.00 GBP")
    #[serde(default)]
    pub minimum_order: Option<String>,
}

impl CouponFixture {
    pub(crate) fn into_record(
        self,
        guard: &mut CurrencyGuard,
    ) -> Result<CouponRecord, FixtureError> {
        Ok(CouponRecord {
            discount_amount: guard.optional_price(self.amount.as_deref())?,
            minimum_order: guard.optional_price(self.minimum_order.as_deref())?,
            code: self.code,
            discount_percentage: self.percentage,
            free_delivery: self.free_delivery,
            free_item_id: self.free_item.map(MealId::new),
            expires_at: self.expires_at,
            active: self.active,
        })
    }
}

/// Gift Card Fixture
#[derive(Debug, Deserialize)]
pub struct GiftCardFixture {
    /// Code
    pub code: String,

    /// Gift card id
    pub id: String,

    /// Remaining balance (e.g., "10.00 GBP")
    pub balance: String,
}

impl GiftCardFixture {
    pub(crate) fn into_balance(
        self,
        guard: &mut CurrencyGuard,
    ) -> Result<GiftCardBalance, FixtureError> {
        Ok(GiftCardBalance {
            balance: guard.price(&self.balance)?,
            code: self.code,
            gift_card_id: self.id,
        })
    }
}
