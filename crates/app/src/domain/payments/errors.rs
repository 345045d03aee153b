//! Payments service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("payment amount must be positive")]
    NothingToCharge,

    #[error("payment processor declined the request: {0}")]
    Declined(String),

    #[error("payment processor is unavailable: {0}")]
    Unavailable(String),
}
