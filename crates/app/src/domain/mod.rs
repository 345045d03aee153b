//! Larder collaborators

pub mod catalog;
pub mod coupons;
pub mod fulfilment;
pub mod gift_cards;
pub mod orders;
pub mod payments;
