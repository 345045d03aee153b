//! Gift cards service.

use std::sync::Arc;

use async_trait::async_trait;
use larder::fixtures::Fixture;
use mockall::automock;

use crate::domain::gift_cards::{errors::GiftCardsServiceError, models::GiftCardCheck};

/// Gift card balances from a loaded fixture set.
#[derive(Debug, Clone)]
pub struct FixtureGiftCardsService {
    fixture: Arc<Fixture>,
}

impl FixtureGiftCardsService {
    #[must_use]
    pub fn new(fixture: Arc<Fixture>) -> Self {
        Self { fixture }
    }
}

#[async_trait]
impl GiftCardsService for FixtureGiftCardsService {
    async fn check_balance(&self, code: &str) -> Result<GiftCardCheck, GiftCardsServiceError> {
        Ok(match self.fixture.gift_card(code) {
            Some(card) => GiftCardCheck {
                valid: true,
                gift_card_id: Some(card.gift_card_id.clone()),
                balance: card.balance,
            },
            None => GiftCardCheck {
                valid: false,
                gift_card_id: None,
                balance: 0,
            },
        })
    }
}

#[automock]
#[async_trait]
pub trait GiftCardsService: Send + Sync {
    /// Look up the remaining balance for `code`.
    async fn check_balance(&self, code: &str) -> Result<GiftCardCheck, GiftCardsServiceError>;
}
