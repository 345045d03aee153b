//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use larder::{
    fixtures::Fixture,
    reorder::{HistoricalOrder, OrderId, OrderKind},
};
use mockall::automock;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::orders::{errors::OrdersServiceError, models::NewOrder};

/// Order history from a loaded fixture set; placed orders are kept in memory.
#[derive(Debug)]
pub struct FixtureOrdersService {
    fixture: Arc<Fixture>,
    placed: Mutex<Vec<(OrderId, NewOrder)>>,
}

impl FixtureOrdersService {
    #[must_use]
    pub fn new(fixture: Arc<Fixture>) -> Self {
        Self {
            fixture,
            placed: Mutex::new(Vec::new()),
        }
    }

    /// Orders placed so far, oldest first.
    pub async fn placed(&self) -> Vec<(OrderId, NewOrder)> {
        self.placed.lock().await.clone()
    }
}

#[async_trait]
impl OrdersService for FixtureOrdersService {
    async fn get_order(
        &self,
        id: &OrderId,
        kind: OrderKind,
    ) -> Result<HistoricalOrder, OrdersServiceError> {
        self.fixture
            .order(id, kind)
            .cloned()
            .map_err(|_err| OrdersServiceError::NotFound)
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::Rejected("order has no items".to_string()));
        }

        let id = OrderId::new(format!("ord_{}", Uuid::now_v7().simple()));

        self.placed.lock().await.push((id.clone(), order));

        Ok(id)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve a placed order of the given kind.
    async fn get_order(
        &self,
        id: &OrderId,
        kind: OrderKind,
    ) -> Result<HistoricalOrder, OrdersServiceError>;

    /// Place a new order.
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use larder::{
        fulfilment::FulfilmentMethod,
        items::{CartItem, ItemId},
    };
    use testresult::TestResult;

    use crate::test::fixture;

    use super::*;

    fn new_order(items: Vec<CartItem>) -> NewOrder {
        NewOrder {
            items,
            method: FulfilmentMethod::Collection,
            destination: "farm-shop".to_string(),
            delivery_date: date(2026, 10, 17),
            production_date: date(2026, 10, 14),
            coupon_code: None,
            gift_card: None,
            total: 899,
            payment_intent_id: None,
        }
    }

    #[tokio::test]
    async fn order_kind_must_match() -> TestResult {
        let service = FixtureOrdersService::new(fixture()?);

        let regular = service
            .get_order(&OrderId::from("ord_1001"), OrderKind::Regular)
            .await?;
        let as_package = service
            .get_order(&OrderId::from("ord_1001"), OrderKind::Package)
            .await;

        assert_eq!(regular.lines.len(), 2);
        assert!(
            matches!(as_package, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {as_package:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn created_orders_are_recorded() -> TestResult {
        let service = FixtureOrdersService::new(fixture()?);
        let items = vec![CartItem::meal(ItemId::from("lasagne"), "Beef Lasagne", 899, 1, 4)];

        let id = service.create_order(new_order(items)).await?;
        let placed = service.placed().await;

        assert!(id.as_str().starts_with("ord_"));
        assert_eq!(placed.len(), 1);
        assert_eq!(placed.first().map(|(placed_id, _)| placed_id), Some(&id));

        Ok(())
    }

    #[tokio::test]
    async fn empty_order_is_rejected() -> TestResult {
        let service = FixtureOrdersService::new(fixture()?);

        let result = service.create_order(new_order(Vec::new())).await;

        assert!(
            matches!(result, Err(OrdersServiceError::Rejected(_))),
            "expected Rejected, got {result:?}"
        );
        assert!(service.placed().await.is_empty());

        Ok(())
    }
}
