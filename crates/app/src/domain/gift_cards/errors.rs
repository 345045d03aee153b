//! Gift cards service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GiftCardsServiceError {
    #[error("gift card service is unavailable: {0}")]
    Unavailable(String),
}
