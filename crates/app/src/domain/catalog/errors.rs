//! Catalog service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("catalog is unavailable: {0}")]
    Unavailable(String),

    #[error("invalid meal data")]
    InvalidData,
}
