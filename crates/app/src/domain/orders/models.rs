//! Order Models

use jiff::civil::Date;
use larder::{fulfilment::FulfilmentMethod, gift_cards::GiftCardRedemption, items::CartItem};

/// Order ready to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub items: Vec<CartItem>,
    pub method: FulfilmentMethod,
    /// Delivery zone name or collection point id
    pub destination: String,
    pub delivery_date: Date,
    pub production_date: Date,
    pub coupon_code: Option<String>,
    pub gift_card: Option<GiftCardRedemption>,
    /// Amount charged, in minor units
    pub total: u64,
    /// Payment intent authorising the total, absent for free orders
    pub payment_intent_id: Option<String>,
}
