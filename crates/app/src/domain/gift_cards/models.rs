//! Gift Card Models

/// Balance check for a gift card code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftCardCheck {
    pub valid: bool,
    pub gift_card_id: Option<String>,
    pub balance: u64,
}
