//! Payment Models

/// Amount to authorise with the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Minor units, always positive
    pub amount: u64,
    /// ISO 4217 code
    pub currency: String,
    pub description: String,
}

/// Intent created by the payment processor; the client confirms it with the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}
