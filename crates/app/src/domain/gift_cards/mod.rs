//! Gift cards

pub mod errors;
pub mod models;
pub mod service;

pub use errors::GiftCardsServiceError;
pub use service::*;
