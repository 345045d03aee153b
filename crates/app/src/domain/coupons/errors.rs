//! Coupons service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("coupon service is unavailable: {0}")]
    Unavailable(String),
}
