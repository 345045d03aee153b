//! Fulfilment service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FulfilmentServiceError {
    #[error("fulfilment reference data is unavailable: {0}")]
    Unavailable(String),
}
