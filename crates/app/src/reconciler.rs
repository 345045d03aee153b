//! Reorder reconciliation
//!
//! Drives a reorder through its phases: fetch the order and the live availability of its meals,
//! plan the cart changes, apply them, then wait for replacements when some meals are retired.

use std::sync::Arc;

use larder::{
    cart::{CartStorage, CartStore},
    items::{CartItem, ItemId, MealId},
    pricing::to_minor,
    reorder::{
        self, HistoricalOrder, MealAvailability, OrderId, OrderKind, ReconciliationFetchError,
        ReorderError, ReorderEvent, ReorderPhase, UnavailableItem,
    },
};
use rusty_money::iso::Currency;
use tracing::{debug, info, warn};

use crate::domain::{
    catalog::CatalogService,
    coupons::CouponsService,
    orders::{OrdersService, OrdersServiceError},
};

/// What re-validating the original order's coupon found. Never blocks the reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponAdvisory {
    /// The coupon still applies to the rebuilt cart.
    StillValid(String),

    /// The coupon no longer applies.
    NoLongerValid { code: String, reason: String },

    /// The coupon service could not be asked.
    Unchecked { code: String, reason: String },
}

/// Result of a reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOutcome {
    /// Phase after applying
    pub phase: ReorderPhase,

    /// Lines that still need a replacement
    pub unavailable: Vec<UnavailableItem>,

    pub coupon: Option<CouponAdvisory>,
}

/// Rebuilds carts from past orders.
pub struct ReorderReconciler {
    orders: Arc<dyn OrdersService>,
    catalog: Arc<dyn CatalogService>,
    coupons: Arc<dyn CouponsService>,
    currency: &'static Currency,
    phase: ReorderPhase,
}

impl std::fmt::Debug for ReorderReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderReconciler")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl ReorderReconciler {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrdersService>,
        catalog: Arc<dyn CatalogService>,
        coupons: Arc<dyn CouponsService>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            orders,
            catalog,
            coupons,
            currency,
            phase: ReorderPhase::default(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> &ReorderPhase {
        &self.phase
    }

    fn advance(&mut self, event: ReorderEvent) -> Result<(), ReorderError> {
        let next = self.phase.on(event)?;

        debug!(from = self.phase.name(), to = next.name(), "reorder phase");

        self.phase = next;

        Ok(())
    }

    /// Rebuild the cart from order `id` of `kind`.
    ///
    /// The order and availability are fetched before anything changes; if either fetch fails the
    /// reorder ends in [`ReorderPhase::Failed`] and the cart is untouched. Available meals are
    /// added even when others are retired, and the retired ones are recorded in the cart's
    /// reorder context.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::InvalidTransition`] if a reorder is already waiting for
    /// replacements, and [`ReorderError::Fetch`] when fetching fails.
    pub async fn reorder<S: CartStorage>(
        &mut self,
        id: &OrderId,
        kind: OrderKind,
        store: &mut CartStore<S>,
    ) -> Result<ReorderOutcome, ReorderError> {
        self.advance(ReorderEvent::Start)?;

        let fetched = self.fetch(id, kind).await.and_then(|(order, availability)| {
            reorder::plan(&order, &availability)
                .map_err(|err| ReconciliationFetchError::Order(err.to_string()))
        });

        let plan = match fetched {
            Ok(plan) => plan,
            Err(err) => {
                warn!(order = %id, error = %err, "reorder failed");

                self.advance(ReorderEvent::FetchFailed(err.to_string()))?;

                return Err(err.into());
            }
        };

        self.advance(ReorderEvent::Fetched {
            fully_available: plan.is_fully_available(),
        })?;

        let coupon_code = plan.coupon_to_revalidate.clone();
        let unavailable = plan
            .context
            .as_ref()
            .map(|context| context.unavailable_items.clone())
            .unwrap_or_default();

        store.apply_plan(plan);
        self.advance(ReorderEvent::Applied)?;

        info!(
            order = %id,
            %kind,
            phase = self.phase.name(),
            unavailable = unavailable.len(),
            "reorder applied",
        );

        let coupon = match coupon_code {
            Some(code) => Some(self.revalidate_coupon(code, store).await),
            None => None,
        };

        Ok(ReorderOutcome {
            phase: self.phase.clone(),
            unavailable,
            coupon,
        })
    }

    async fn fetch(
        &self,
        id: &OrderId,
        kind: OrderKind,
    ) -> Result<(HistoricalOrder, Vec<MealAvailability>), ReconciliationFetchError> {
        let order = self
            .orders
            .get_order(id, kind)
            .await
            .map_err(|err| match err {
                OrdersServiceError::NotFound => ReconciliationFetchError::OrderNotFound(id.clone()),
                other => ReconciliationFetchError::Order(other.to_string()),
            })?;

        let mut meal_ids: Vec<MealId> = order
            .lines
            .iter()
            .map(|line| line.meal_id.clone())
            .collect();
        meal_ids.sort();
        meal_ids.dedup();

        let availability = self
            .catalog
            .get_meal_availability(&meal_ids)
            .await
            .map_err(|err| ReconciliationFetchError::Catalog(err.to_string()))?;

        Ok((order, availability))
    }

    async fn revalidate_coupon<S: CartStorage>(
        &self,
        code: String,
        store: &CartStore<S>,
    ) -> CouponAdvisory {
        let subtotal = match store
            .state()
            .subtotal(self.currency)
            .and_then(|subtotal| to_minor(&subtotal))
        {
            Ok(subtotal) => subtotal,
            Err(err) => {
                return CouponAdvisory::Unchecked {
                    code,
                    reason: err.to_string(),
                };
            }
        };

        match self.coupons.validate_coupon(&code, subtotal).await {
            Ok(validation) if validation.valid => CouponAdvisory::StillValid(code),
            Ok(validation) => CouponAdvisory::NoLongerValid {
                code,
                reason: validation
                    .error
                    .unwrap_or_else(|| "Invalid coupon code".to_string()),
            },
            Err(err) => CouponAdvisory::Unchecked {
                code,
                reason: err.to_string(),
            },
        }
    }

    /// Add `replacement` in place of the retired item `unavailable`.
    ///
    /// Once every retired item is replaced the reorder is complete.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::InvalidTransition`] unless the reorder is waiting for replacements,
    /// and [`ReorderError::UnknownUnavailableItem`] when `unavailable` is not one of the retired
    /// items still waiting. Neither changes the cart.
    pub fn replace<S: CartStorage>(
        &mut self,
        store: &mut CartStore<S>,
        unavailable: &ItemId,
        replacement: CartItem,
    ) -> Result<(), ReorderError> {
        if self.phase != ReorderPhase::AwaitingReplacement {
            return Err(ReorderError::InvalidTransition {
                from: self.phase.name(),
                event: "replace an item",
            });
        }

        store.resolve_replacement(unavailable, replacement)?;

        if store.reorder_context().is_none() {
            self.advance(ReorderEvent::ReplacementsResolved)?;
        }

        Ok(())
    }

    /// Stop waiting for replacements, keeping what is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::InvalidTransition`] unless the reorder is waiting for replacements.
    pub fn abandon<S: CartStorage>(
        &mut self,
        store: &mut CartStore<S>,
    ) -> Result<(), ReorderError> {
        self.advance(ReorderEvent::Abandoned)?;

        store.abandon_reorder();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use larder::cart::{CartAction, MemoryStorage};
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        domain::{
            catalog::{CatalogServiceError, FixtureCatalogService, MockCatalogService},
            coupons::FixtureCouponsService,
            orders::{FixtureOrdersService, MockOrdersService},
        },
        test::fixture,
    };

    use super::*;

    fn reconciler() -> TestResult<ReorderReconciler> {
        let fixture = fixture()?;

        Ok(ReorderReconciler::new(
            Arc::new(FixtureOrdersService::new(fixture.clone())),
            Arc::new(FixtureCatalogService::new(fixture.clone())),
            Arc::new(FixtureCouponsService::new(fixture)),
            GBP,
        ))
    }

    #[tokio::test]
    async fn fully_available_order_is_applied_with_coupon_advice() -> TestResult {
        let mut reconciler = reconciler()?;
        let mut store = CartStore::new(MemoryStorage::new());

        let outcome = reconciler
            .reorder(&OrderId::from("ord_1001"), OrderKind::Regular, &mut store)
            .await?;

        assert_eq!(outcome.phase, ReorderPhase::Applied);
        assert!(outcome.unavailable.is_empty());
        assert_eq!(
            outcome.coupon,
            Some(CouponAdvisory::StillValid("WELCOME10".to_string()))
        );
        assert_eq!(store.state().quantity_by_meal().values().sum::<u32>(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn retired_meal_waits_for_replacement() -> TestResult {
        let mut reconciler = reconciler()?;
        let mut store = CartStore::new(MemoryStorage::new());

        let outcome = reconciler
            .reorder(&OrderId::from("ord_1002"), OrderKind::Regular, &mut store)
            .await?;

        assert_eq!(outcome.phase, ReorderPhase::AwaitingReplacement);
        assert_eq!(outcome.unavailable.len(), 1);
        assert_eq!(outcome.coupon, None);
        assert!(store.reorder_context().is_some());

        reconciler.replace(
            &mut store,
            &ItemId::from("shepherds-pie"),
            CartItem::meal(ItemId::from("fish-pie"), "Fish Pie", 949, 2, 2),
        )?;

        assert_eq!(reconciler.phase(), &ReorderPhase::Applied);
        assert!(store.reorder_context().is_none());
        assert_eq!(store.items().len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn replacing_an_unlisted_line_is_refused() -> TestResult {
        let mut reconciler = reconciler()?;
        let mut store = CartStore::new(MemoryStorage::new());

        reconciler
            .reorder(&OrderId::from("ord_1002"), OrderKind::Regular, &mut store)
            .await?;

        let result = reconciler.replace(
            &mut store,
            &ItemId::from("not-listed"),
            CartItem::meal(ItemId::from("fish-pie"), "Fish Pie", 949, 2, 2),
        );

        assert!(
            matches!(result, Err(ReorderError::UnknownUnavailableItem(_))),
            "expected UnknownUnavailableItem, got {result:?}"
        );
        assert_eq!(reconciler.phase(), &ReorderPhase::AwaitingReplacement);
        assert_eq!(store.items().len(), 1);
        assert!(!store.state().contains(&ItemId::from("fish-pie")));
        assert!(store.reorder_context().is_some());

        Ok(())
    }

    #[tokio::test]
    async fn abandoning_keeps_available_lines() -> TestResult {
        let mut reconciler = reconciler()?;
        let mut store = CartStore::new(MemoryStorage::new());

        reconciler
            .reorder(&OrderId::from("ord_1004"), OrderKind::Package, &mut store)
            .await?;
        reconciler.abandon(&mut store)?;

        assert_eq!(reconciler.phase(), &ReorderPhase::Idle);
        assert!(store.reorder_context().is_none());
        assert_eq!(store.items().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn second_reorder_is_refused_while_awaiting_replacement() -> TestResult {
        let mut reconciler = reconciler()?;
        let mut store = CartStore::new(MemoryStorage::new());

        reconciler
            .reorder(&OrderId::from("ord_1002"), OrderKind::Regular, &mut store)
            .await?;

        let result = reconciler
            .reorder(&OrderId::from("ord_1001"), OrderKind::Regular, &mut store)
            .await;

        assert!(
            matches!(result, Err(ReorderError::InvalidTransition { .. })),
            "expected InvalidTransition, got {result:?}"
        );
        assert_eq!(store.items().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn missing_order_fails_without_touching_the_cart() -> TestResult {
        let fixture = fixture()?;
        let mut orders = MockOrdersService::new();
        let mut catalog = MockCatalogService::new();

        orders
            .expect_get_order()
            .once()
            .returning(|_, _| Err(OrdersServiceError::NotFound));
        catalog.expect_get_meal_availability().never();

        let mut reconciler = ReorderReconciler::new(
            Arc::new(orders),
            Arc::new(catalog),
            Arc::new(FixtureCouponsService::new(fixture)),
            GBP,
        );

        let mut store = CartStore::new(MemoryStorage::new());
        store.dispatch(CartAction::AddItem(CartItem::meal(
            ItemId::from("brownie"),
            "Chocolate Brownie",
            250,
            1,
            6,
        )));

        let result = reconciler
            .reorder(&OrderId::from("ord_9999"), OrderKind::Regular, &mut store)
            .await;

        assert!(
            matches!(
                result,
                Err(ReorderError::Fetch(ReconciliationFetchError::OrderNotFound(_)))
            ),
            "expected OrderNotFound, got {result:?}"
        );
        assert!(matches!(reconciler.phase(), ReorderPhase::Failed(_)));
        assert_eq!(store.items().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn catalog_outage_fails_the_reorder() -> TestResult {
        let fixture = fixture()?;
        let mut catalog = MockCatalogService::new();

        catalog
            .expect_get_meal_availability()
            .once()
            .returning(|_| Err(CatalogServiceError::Unavailable("timeout".to_string())));

        let mut reconciler = ReorderReconciler::new(
            Arc::new(FixtureOrdersService::new(fixture.clone())),
            Arc::new(catalog),
            Arc::new(FixtureCouponsService::new(fixture)),
            GBP,
        );
        let mut store = CartStore::new(MemoryStorage::new());

        let result = reconciler
            .reorder(&OrderId::from("ord_1001"), OrderKind::Regular, &mut store)
            .await;

        assert!(
            matches!(
                result,
                Err(ReorderError::Fetch(ReconciliationFetchError::Catalog(_)))
            ),
            "expected Catalog error, got {result:?}"
        );
        assert!(store.items().is_empty());

        let retried = reconciler
            .reorder(&OrderId::from("ord_1002"), OrderKind::Package, &mut store)
            .await;

        assert!(
            matches!(
                retried,
                Err(ReorderError::Fetch(ReconciliationFetchError::OrderNotFound(_)))
            ),
            "expected OrderNotFound, got {retried:?}"
        );

        Ok(())
    }
}
