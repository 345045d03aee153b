//! Fulfilment

pub mod errors;
pub mod service;

pub use errors::FulfilmentServiceError;
pub use service::*;
