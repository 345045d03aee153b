//! Storefront services around the larder engine: fulfilment lookups, coupon and gift card
//! application, checkout and reorder reconciliation, wired to fixture-backed collaborators.

pub mod checkout;
pub mod clock;
pub mod config;
pub mod context;
pub mod domain;
pub mod lookup;
pub mod observability;
pub mod offers;
pub mod reconciler;

#[cfg(test)]
mod test;
