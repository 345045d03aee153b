//! Fulfilment service.

use std::sync::Arc;

use async_trait::async_trait;
use larder::{
    fixtures::Fixture,
    fulfilment::{CollectionPoint, DeliveryZone},
};
use mockall::automock;

use crate::domain::fulfilment::errors::FulfilmentServiceError;

/// Fulfilment reference data backed by a loaded fixture set.
#[derive(Debug, Clone)]
pub struct FixtureFulfilmentService {
    fixture: Arc<Fixture>,
}

impl FixtureFulfilmentService {
    #[must_use]
    pub fn new(fixture: Arc<Fixture>) -> Self {
        Self { fixture }
    }
}

#[async_trait]
impl FulfilmentService for FixtureFulfilmentService {
    async fn list_active_delivery_zones(
        &self,
    ) -> Result<Vec<DeliveryZone>, FulfilmentServiceError> {
        Ok(self.fixture.delivery_zones().to_vec())
    }

    async fn list_active_collection_points(
        &self,
    ) -> Result<Vec<CollectionPoint>, FulfilmentServiceError> {
        Ok(self
            .fixture
            .collection_points()
            .iter()
            .filter(|point| point.is_active)
            .cloned()
            .collect())
    }
}

#[automock]
#[async_trait]
pub trait FulfilmentService: Send + Sync {
    /// Delivery zones currently taking orders, in priority order.
    async fn list_active_delivery_zones(&self)
    -> Result<Vec<DeliveryZone>, FulfilmentServiceError>;

    /// Collection points currently taking orders.
    async fn list_active_collection_points(
        &self,
    ) -> Result<Vec<CollectionPoint>, FulfilmentServiceError>;
}
