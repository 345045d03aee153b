//! Payments service.

use async_trait::async_trait;
use mockall::automock;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::payments::{
    errors::PaymentsServiceError,
    models::{PaymentIntent, PaymentRequest},
};

/// Payment processor stand-in that records every intent it creates.
#[derive(Debug, Default)]
pub struct InMemoryPaymentsService {
    intents: Mutex<Vec<(PaymentIntent, PaymentRequest)>>,
}

impl InMemoryPaymentsService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.intents
            .lock()
            .await
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

#[async_trait]
impl PaymentsService for InMemoryPaymentsService {
    async fn create_intent(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentIntent, PaymentsServiceError> {
        if request.amount == 0 {
            return Err(PaymentsServiceError::NothingToCharge);
        }

        let id = format!("pi_{}", Uuid::now_v7().simple());

        let intent = PaymentIntent {
            client_secret: format!("{id}_secret_{}", Uuid::now_v7().simple()),
            id,
        };

        self.intents.lock().await.push((intent.clone(), request));

        Ok(intent)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Create a payment intent for a positive amount.
    async fn create_intent(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentIntent, PaymentsServiceError>;
}
