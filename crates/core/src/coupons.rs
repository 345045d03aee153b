//! Coupons

use decimal_percentage::Percentage;
use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::warn;

use crate::{items::MealId, pricing::to_money};

/// Coupons expiring within this many days carry an advisory warning.
pub const DEFAULT_EXPIRING_SOON_DAYS: i64 = 3;

/// Reasons a coupon cannot be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CouponError {
    /// The coupon service rejected the code (unknown code, minimum order not met, ...).
    #[error("coupon {code} was rejected: {reason}")]
    Rejected {
        /// Code entered
        code: String,
        /// Reason given by the coupon service
        reason: String,
    },

    /// The coupon has been switched off.
    #[error("coupon {0} is not active")]
    Inactive(String),

    /// The coupon expired.
    #[error("coupon {code} expired at {expired_at}")]
    Expired {
        /// Code entered
        code: String,
        /// Expiry instant
        expired_at: Timestamp,
    },

    /// The coupon record does not grant any discount.
    #[error("coupon {0} does not grant a discount")]
    NoDiscount(String),

    /// The free item granted by the coupon is not currently available.
    #[error("free item {0} is not available")]
    FreeItemUnavailable(MealId),

    /// The coupon service could not be reached.
    #[error("coupon could not be checked: {0}")]
    Unavailable(String),
}

/// Coupon as stored by the coupon service.
///
/// Every discount column is independent in storage, so a record may express more than one
/// mechanism.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponRecord {
    /// Code customers enter
    pub code: String,

    /// Percentage off, `0..=100`
    #[serde(default)]
    pub discount_percentage: Option<f64>,

    /// Fixed amount off, in minor units
    #[serde(default)]
    pub discount_amount: Option<u64>,

    /// Whether delivery is free
    #[serde(default)]
    pub free_delivery: bool,

    /// Meal added to the cart at no cost
    #[serde(default)]
    pub free_item_id: Option<MealId>,

    /// When the coupon stops working
    #[serde(default)]
    pub expires_at: Option<Timestamp>,

    /// Whether the coupon is switched on
    pub active: bool,

    /// Minimum cart subtotal in minor units, enforced by the coupon service
    #[serde(default)]
    pub minimum_order: Option<u64>,
}

impl CouponRecord {
    fn percentage(&self) -> Option<f64> {
        self.discount_percentage
            .filter(|pct| pct.is_finite() && *pct > 0.0)
    }

    fn amount(&self) -> Option<u64> {
        self.discount_amount.filter(|amount| *amount > 0)
    }

    fn mechanisms(&self) -> SmallVec<[&'static str; 4]> {
        let mut mechanisms = SmallVec::new();

        if self.percentage().is_some() {
            mechanisms.push("percentage");
        }

        if self.amount().is_some() {
            mechanisms.push("fixed_amount");
        }

        if self.free_delivery {
            mechanisms.push("free_delivery");
        }

        if self.free_item_id.is_some() {
            mechanisms.push("free_item");
        }

        mechanisms
    }
}

/// The single discount mechanism a coupon grants.
#[derive(Debug, Clone)]
pub enum CouponKind {
    /// Percentage off the order including fees
    Percentage(Percentage),

    /// Fixed amount off, in minor units
    FixedAmount(u64),

    /// Delivery fee waived
    FreeDelivery,

    /// A meal added to the cart at no cost
    FreeItem(MealId),
}

/// A coupon with exactly one discount mechanism.
#[derive(Debug, Clone)]
pub struct Coupon {
    /// Code customers enter
    pub code: String,

    /// Discount granted
    pub kind: CouponKind,

    /// When the coupon stops working
    pub expires_at: Option<Timestamp>,

    /// Whether the coupon is switched on
    pub active: bool,
}

impl TryFrom<CouponRecord> for Coupon {
    type Error = CouponError;

    /// Picks one mechanism: percentage, then fixed amount, then free delivery, then free item.
    fn try_from(record: CouponRecord) -> Result<Self, Self::Error> {
        let mechanisms = record.mechanisms();

        let kind = if let Some(pct) = record.percentage() {
            CouponKind::Percentage(Percentage::from(pct / 100.0))
        } else if let Some(amount) = record.amount() {
            CouponKind::FixedAmount(amount)
        } else if record.free_delivery {
            CouponKind::FreeDelivery
        } else if let Some(meal) = record.free_item_id.clone() {
            CouponKind::FreeItem(meal)
        } else {
            return Err(CouponError::NoDiscount(record.code));
        };

        if mechanisms.len() > 1 {
            warn!(
                target: "larder::data_quality",
                code = %record.code,
                mechanisms = ?mechanisms,
                applied = mechanisms.first().copied().unwrap_or_default(),
                "coupon record sets more than one discount mechanism",
            );
        }

        Ok(Self {
            code: record.code,
            kind,
            expires_at: record.expires_at,
            active: record.active,
        })
    }
}

impl Coupon {
    /// Check the coupon is switched on and unexpired at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::Inactive`] or [`CouponError::Expired`].
    pub fn ensure_usable(&self, now: Timestamp) -> Result<(), CouponError> {
        if !self.active {
            return Err(CouponError::Inactive(self.code.clone()));
        }

        match self.expires_at {
            Some(expired_at) if expired_at <= now => Err(CouponError::Expired {
                code: self.code.clone(),
                expired_at,
            }),
            _ => Ok(()),
        }
    }

    /// Whether the coupon expires within `days` of `now`, but has not yet expired.
    pub fn expires_within(&self, now: Timestamp, days: i64) -> bool {
        let window = SignedDuration::from_hours(days.saturating_mul(24));

        self.expires_at.is_some_and(|expires_at| {
            let remaining = expires_at.duration_since(now);

            remaining > SignedDuration::ZERO && remaining <= window
        })
    }

    /// Whether the coupon waives the delivery fee.
    pub fn waives_delivery(&self) -> bool {
        matches!(self.kind, CouponKind::FreeDelivery)
    }

    /// The meal the coupon gives away, if any.
    pub fn free_item(&self) -> Option<&MealId> {
        match &self.kind {
            CouponKind::FreeItem(meal) => Some(meal),
            _ => None,
        }
    }

    /// Short description of the discount, e.g. `10% off`.
    pub fn describe(&self, currency: &'static Currency) -> String {
        match &self.kind {
            CouponKind::Percentage(pct) => {
                let points = ((*pct) * Decimal::ONE_HUNDRED).normalize();

                format!("{points}% off")
            }
            CouponKind::FixedAmount(amount) => match to_money(*amount, currency) {
                Ok(money) => format!("{money} off"),
                Err(_) => format!("{amount} off"),
            },
            CouponKind::FreeDelivery => "Free delivery".to_string(),
            CouponKind::FreeItem(meal) => format!("Free {meal}"),
        }
    }
}
