//! Coupon Models

use larder::coupons::CouponRecord;

/// Result of asking the coupon service about a code.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponValidation {
    pub valid: bool,
    pub coupon: Option<CouponRecord>,
    pub error: Option<String>,
}

impl CouponValidation {
    #[must_use]
    pub fn accepted(coupon: CouponRecord) -> Self {
        Self {
            valid: true,
            coupon: Some(coupon),
            error: None,
        }
    }

    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            coupon: None,
            error: Some(reason.into()),
        }
    }
}
