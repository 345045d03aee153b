//! Coupons service.

use std::sync::Arc;

use async_trait::async_trait;
use larder::{fixtures::Fixture, pricing::to_money};
use mockall::automock;

use crate::domain::coupons::{errors::CouponsServiceError, models::CouponValidation};

/// Coupon checks against a loaded fixture set.
#[derive(Debug, Clone)]
pub struct FixtureCouponsService {
    fixture: Arc<Fixture>,
}

impl FixtureCouponsService {
    #[must_use]
    pub fn new(fixture: Arc<Fixture>) -> Self {
        Self { fixture }
    }

    fn describe_minimum(&self, minimum: u64) -> String {
        self.fixture
            .currency()
            .ok()
            .and_then(|currency| to_money(minimum, currency).ok())
            .map_or_else(|| minimum.to_string(), |money| money.to_string())
    }
}

#[async_trait]
impl CouponsService for FixtureCouponsService {
    async fn validate_coupon(
        &self,
        code: &str,
        cart_subtotal: u64,
    ) -> Result<CouponValidation, CouponsServiceError> {
        let Some(record) = self.fixture.coupon(code) else {
            return Ok(CouponValidation::rejected("Invalid coupon code"));
        };

        if let Some(minimum) = record.minimum_order
            && cart_subtotal < minimum
        {
            return Ok(CouponValidation::rejected(format!(
                "Minimum order of {} required",
                self.describe_minimum(minimum)
            )));
        }

        Ok(CouponValidation::accepted(record.clone()))
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Check `code` against a cart subtotal in minor units.
    ///
    /// Rejections are reported in the validation, not as errors.
    async fn validate_coupon(
        &self,
        code: &str,
        cart_subtotal: u64,
    ) -> Result<CouponValidation, CouponsServiceError>;
}
