//! Orders service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("order was rejected: {0}")]
    Rejected(String),

    #[error("order service is unavailable: {0}")]
    Unavailable(String),
}
