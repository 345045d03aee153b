//! Discount composition
//!
//! Stacks the fulfilment fee, at most one coupon and at most one gift card onto a cart subtotal to
//! produce the single authoritative [`Quote`] for an order.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    coupons::{Coupon, CouponKind, DEFAULT_EXPIRING_SOON_DAYS},
    fulfilment::FulfilmentMethod,
    gift_cards::{GiftCardBalance, GiftCardError, GiftCardRedemption},
    items::CartItem,
    pricing::{self, PricingError, percent_of_minor, saturating_sub, to_money},
};

/// Errors that can occur while composing a quote.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped gift card error.
    #[error(transparent)]
    GiftCard(#[from] GiftCardError),
}

/// Advisory notes that accompany a quote without blocking it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountWarning {
    /// The applied coupon expires soon.
    ExpiringSoon {
        /// Coupon code
        code: String,
        /// Expiry instant
        expires_at: Timestamp,
    },
}

/// One priced cart line in a quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteLine {
    /// Display name
    pub name: String,

    /// Units
    pub quantity: u32,

    /// Unit price
    pub unit_price: Money<'static, Currency>,

    /// Unit price multiplied by quantity
    pub total: Money<'static, Currency>,
}

/// A coupon as it affected a quote.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCoupon {
    /// Coupon code
    pub code: String,

    /// Short description, e.g. `10% off`
    pub description: String,

    /// Amount the coupon took off the total
    pub discount: Money<'static, Currency>,
}

/// The composed price of a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Priced cart lines
    pub lines: Vec<QuoteLine>,

    /// Sum of line totals
    pub subtotal: Money<'static, Currency>,

    /// Fulfilment method the fee belongs to
    pub method: FulfilmentMethod,

    /// Fee charged for the method, before any waiver
    pub fee: Money<'static, Currency>,

    /// Whether a free-delivery coupon waived the fee
    pub fee_waived: bool,

    /// Subtotal plus the fee actually charged
    pub total_before_discounts: Money<'static, Currency>,

    /// Applied coupon, if any
    pub coupon: Option<AppliedCoupon>,

    /// Total after the coupon
    pub total_after_coupon: Money<'static, Currency>,

    /// Gift card redemption, if any
    pub gift_card: Option<GiftCardRedemption>,

    /// Amount left to pay
    pub total: Money<'static, Currency>,

    /// Advisory warnings
    pub warnings: Vec<DiscountWarning>,
}

impl Quote {
    /// Whether discounts and gift cards cover the whole order.
    pub fn is_fully_covered(&self) -> bool {
        self.total.is_zero()
    }

    /// The fee actually charged.
    pub fn charged_fee(&self) -> Money<'static, Currency> {
        if self.fee_waived {
            pricing::zero(self.fee.currency())
        } else {
            self.fee
        }
    }

    /// Human readable summary of the discounts applied.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut summary = Vec::new();

        if let Some(coupon) = &self.coupon {
            summary.push(coupon.description.clone());
        }

        if let Some(redemption) = &self.gift_card {
            match redemption.amount(self.total.currency()) {
                Ok(amount) => summary.push(format!("Gift card -{amount}")),
                Err(_) => summary.push(format!("Gift card -{}", redemption.amount_to_apply)),
            }
        }

        summary
    }
}

/// Inputs to [`DiscountComposer::compose`].
#[derive(Debug, Clone, Copy)]
pub struct QuoteRequest<'a> {
    /// Cart lines, including any free item
    pub items: &'a [CartItem],

    /// Chosen fulfilment method
    pub method: FulfilmentMethod,

    /// Fee for the method
    pub fee: Money<'static, Currency>,

    /// Validated coupon
    pub coupon: Option<&'a Coupon>,

    /// Checked gift card
    pub gift_card: Option<&'a GiftCardBalance>,

    /// Current instant, for expiry warnings
    pub now: Timestamp,
}

/// Composes quotes in a single currency.
#[derive(Debug, Clone, Copy)]
pub struct DiscountComposer {
    currency: &'static Currency,
    expiring_soon_days: i64,
}

impl DiscountComposer {
    /// A composer for `currency` with the default expiring-soon window.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS,
        }
    }

    /// Override the number of days before expiry that a coupon is flagged.
    #[must_use]
    pub fn with_expiring_soon_days(mut self, days: i64) -> Self {
        self.expiring_soon_days = days;
        self
    }

    /// The composer's currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Compose the quote.
    ///
    /// The fee is added first, then the coupon applies to the subtotal plus fee, then the gift
    /// card applies to what is left. No stage takes the total below zero.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] on overflow, currency mismatch or an exhausted gift card.
    pub fn compose(&self, request: &QuoteRequest<'_>) -> Result<Quote, DiscountError> {
        let lines = request
            .items
            .iter()
            .map(|item| {
                Ok(QuoteLine {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: to_money(item.price, self.currency)?,
                    total: pricing::line_total(item, self.currency)?,
                })
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        let subtotal = pricing::subtotal(request.items, self.currency)?;

        let fee_waived = request.method == FulfilmentMethod::Delivery
            && request.coupon.is_some_and(Coupon::waives_delivery);

        let charged_fee = if fee_waived {
            pricing::zero(self.currency)
        } else {
            request.fee
        };

        let total_before_discounts = subtotal.add(charged_fee).map_err(PricingError::from)?;

        let total_after_coupon = match request.coupon.map(|coupon| &coupon.kind) {
            Some(CouponKind::Percentage(pct)) => {
                let discount = percent_of_minor(pct, total_before_discounts.to_minor_units())?;

                saturating_sub(
                    total_before_discounts,
                    Money::from_minor(discount, self.currency),
                )?
            }
            Some(CouponKind::FixedAmount(amount)) => {
                saturating_sub(total_before_discounts, to_money(*amount, self.currency)?)?
            }
            Some(CouponKind::FreeDelivery | CouponKind::FreeItem(_)) | None => {
                total_before_discounts
            }
        };

        let coupon = request.coupon.map(|coupon| -> Result<_, PricingError> {
            let discount = if fee_waived {
                request.fee
            } else {
                total_before_discounts.sub(total_after_coupon)?
            };

            Ok(AppliedCoupon {
                code: coupon.code.clone(),
                description: coupon.describe(self.currency),
                discount,
            })
        });
        let coupon = coupon.transpose()?;

        let gift_card = request
            .gift_card
            .map(|card| GiftCardRedemption::plan(card, total_after_coupon))
            .transpose()?;

        let total = match &gift_card {
            Some(redemption) => {
                saturating_sub(total_after_coupon, redemption.amount(self.currency)?)?
            }
            None => total_after_coupon,
        };

        let warnings = request
            .coupon
            .filter(|coupon| coupon.expires_within(request.now, self.expiring_soon_days))
            .and_then(|coupon| {
                coupon.expires_at.map(|expires_at| DiscountWarning::ExpiringSoon {
                    code: coupon.code.clone(),
                    expires_at,
                })
            })
            .into_iter()
            .collect();

        debug!(
            subtotal = %subtotal,
            fee = %charged_fee,
            total_after_coupon = %total_after_coupon,
            total = %total,
            "composed quote",
        );

        Ok(Quote {
            lines,
            subtotal,
            method: request.method,
            fee: request.fee,
            fee_waived,
            total_before_discounts,
            coupon,
            total_after_coupon,
            gift_card,
            total,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::items::{ItemId, MealId};

    use super::*;

    fn coupon(kind: CouponKind) -> Coupon {
        Coupon {
            code: "TEST".to_string(),
            kind,
            expires_at: None,
            active: true,
        }
    }

    fn card(balance: u64) -> GiftCardBalance {
        GiftCardBalance {
            code: "GIFT".to_string(),
            gift_card_id: "gc_1".to_string(),
            balance,
        }
    }

    fn request<'a>(items: &'a [CartItem], fee: i64) -> QuoteRequest<'a> {
        QuoteRequest {
            items,
            method: FulfilmentMethod::Delivery,
            fee: Money::from_minor(fee, GBP),
            coupon: None,
            gift_card: None,
            now: Timestamp::UNIX_EPOCH,
        }
    }

    fn items() -> Vec<CartItem> {
        vec![
            CartItem::meal(ItemId::from("lasagne"), "Lasagne", 899, 2, 4),
            CartItem::meal(ItemId::from("curry"), "Curry", 799, 1, 3),
        ]
    }

    #[test]
    fn fee_is_added_to_subtotal() -> TestResult {
        let items = items();
        let quote = DiscountComposer::new(GBP).compose(&request(&items, 399))?;

        assert_eq!(quote.subtotal, Money::from_minor(2_597, GBP));
        assert_eq!(quote.total_before_discounts, Money::from_minor(2_996, GBP));
        assert_eq!(quote.total, Money::from_minor(2_996, GBP));
        assert!(quote.summary_lines().is_empty());

        Ok(())
    }

    #[test]
    fn percentage_applies_to_subtotal_plus_fee() -> TestResult {
        let items = items();
        let coupon = coupon(CouponKind::Percentage(Percentage::from(0.1)));

        let quote = DiscountComposer::new(GBP).compose(&QuoteRequest {
            coupon: Some(&coupon),
            ..request(&items, 399)
        })?;

        // 10% of 29.96 is 2.996, rounded to 3.00
        assert_eq!(quote.total_after_coupon, Money::from_minor(2_696, GBP));
        assert_eq!(
            quote.coupon.map(|applied| applied.discount),
            Some(Money::from_minor(300, GBP))
        );

        Ok(())
    }

    #[test]
    fn fixed_amount_bottoms_out_at_zero() -> TestResult {
        let items = items();
        let coupon = coupon(CouponKind::FixedAmount(10_000));

        let quote = DiscountComposer::new(GBP).compose(&QuoteRequest {
            coupon: Some(&coupon),
            ..request(&items, 399)
        })?;

        assert_eq!(quote.total, Money::from_minor(0, GBP));
        assert!(quote.is_fully_covered());

        Ok(())
    }

    #[test]
    fn free_delivery_waives_delivery_fee_only() -> TestResult {
        let items = items();
        let coupon = coupon(CouponKind::FreeDelivery);

        let delivery = DiscountComposer::new(GBP).compose(&QuoteRequest {
            coupon: Some(&coupon),
            ..request(&items, 399)
        })?;

        assert!(delivery.fee_waived);
        assert_eq!(delivery.charged_fee(), Money::from_minor(0, GBP));
        assert_eq!(delivery.total, Money::from_minor(2_597, GBP));
        assert_eq!(delivery.summary_lines(), vec!["Free delivery".to_string()]);

        let collection = DiscountComposer::new(GBP).compose(&QuoteRequest {
            coupon: Some(&coupon),
            method: FulfilmentMethod::Collection,
            ..request(&items, 150)
        })?;

        assert!(!collection.fee_waived);
        assert_eq!(collection.total, Money::from_minor(2_747, GBP));

        Ok(())
    }

    #[test]
    fn free_item_has_no_numeric_effect_beyond_its_zero_price() -> TestResult {
        let mut items = items();
        let meal = MealId::from("brownie");
        items.push(CartItem::free_item(&meal, "Brownie", 5));
        let coupon = coupon(CouponKind::FreeItem(meal));

        let quote = DiscountComposer::new(GBP).compose(&QuoteRequest {
            coupon: Some(&coupon),
            ..request(&items, 399)
        })?;

        assert_eq!(quote.lines.len(), 3);
        assert_eq!(quote.total, Money::from_minor(2_996, GBP));

        Ok(())
    }

    #[test]
    fn gift_card_applies_last() -> TestResult {
        let items = items();
        let coupon = coupon(CouponKind::FixedAmount(500));
        let card = card(1_000);

        let quote = DiscountComposer::new(GBP).compose(&QuoteRequest {
            coupon: Some(&coupon),
            gift_card: Some(&card),
            ..request(&items, 399)
        })?;

        assert_eq!(quote.total_after_coupon, Money::from_minor(2_496, GBP));
        assert_eq!(quote.total, Money::from_minor(1_496, GBP));
        assert_eq!(
            quote.summary_lines(),
            vec!["£5.00 off".to_string(), "Gift card -£10.00".to_string()]
        );

        Ok(())
    }

    #[test]
    fn gift_card_is_capped_at_remaining_total() -> TestResult {
        let items = items();
        let card = card(50_000);

        let quote = DiscountComposer::new(GBP).compose(&QuoteRequest {
            gift_card: Some(&card),
            ..request(&items, 399)
        })?;

        assert_eq!(
            quote.gift_card.as_ref().map(|r| r.amount_to_apply),
            Some(2_996)
        );
        assert!(quote.is_fully_covered());

        Ok(())
    }

    #[test]
    fn expiring_coupon_adds_a_warning() -> TestResult {
        let items = items();
        let now: Timestamp = "2026-10-14T09:00:00Z".parse()?;
        let expires_at: Timestamp = "2026-10-16T09:00:00Z".parse()?;
        let coupon = Coupon {
            expires_at: Some(expires_at),
            ..coupon(CouponKind::FixedAmount(100))
        };

        let composer = DiscountComposer::new(GBP);
        let quote = composer.compose(&QuoteRequest {
            coupon: Some(&coupon),
            now,
            ..request(&items, 0)
        })?;

        assert_eq!(
            quote.warnings,
            vec![DiscountWarning::ExpiringSoon {
                code: "TEST".to_string(),
                expires_at,
            }]
        );

        let quote = composer.with_expiring_soon_days(1).compose(&QuoteRequest {
            coupon: Some(&coupon),
            now,
            ..request(&items, 0)
        })?;

        assert!(quote.warnings.is_empty());

        Ok(())
    }
}
