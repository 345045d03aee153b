//! Larder
//!
//! Larder is the order reconstruction and fulfilment-eligibility engine behind a meal-subscription
//! storefront: cart state, delivery and collection eligibility, coupon and gift card composition,
//! production dates and reorder reconciliation.

pub mod cart;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod fulfilment;
pub mod gift_cards;
pub mod items;
pub mod prelude;
pub mod pricing;
pub mod production;
pub mod reorder;
pub mod summary;
