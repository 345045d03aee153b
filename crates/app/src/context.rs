//! App Context

use std::sync::Arc;

use larder::fixtures::{Fixture, FixtureError};
use thiserror::Error;
use tracing::debug;

use crate::{
    checkout::CheckoutService,
    clock::{Clock, SystemClock},
    config::{ConfigError, Settings, StoreConfig},
    domain::{
        catalog::{CatalogService, FixtureCatalogService},
        coupons::{CouponsService, FixtureCouponsService},
        fulfilment::{FixtureFulfilmentService, FulfilmentService},
        gift_cards::{FixtureGiftCardsService, GiftCardsService},
        orders::{FixtureOrdersService, OrdersService},
        payments::{InMemoryPaymentsService, PaymentsService},
    },
    lookup::FulfilmentLookup,
    offers::Offers,
    reconciler::ReorderReconciler,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load fixtures")]
    Fixture(#[from] FixtureError),

    #[error("invalid configuration")]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogService>,
    pub fulfilment: Arc<dyn FulfilmentService>,
    pub coupons: Arc<dyn CouponsService>,
    pub gift_cards: Arc<dyn GiftCardsService>,
    pub payments: Arc<dyn PaymentsService>,
    pub orders: Arc<dyn OrdersService>,
    pub clock: Arc<dyn Clock>,
    pub settings: Settings,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build application context from store configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings are invalid or the fixture set cannot be loaded.
    pub fn from_config(config: &StoreConfig) -> Result<Self, AppInitError> {
        let settings = config.settings()?;
        let fixture = Fixture::from_set_in(config.fixtures.clone(), &config.fixture_set)?;

        debug!(
            fixtures = %config.fixtures.display(),
            set = %config.fixture_set,
            "loaded fixture set",
        );

        Ok(Self::from_fixture(fixture, settings))
    }

    /// Build application context backed by an already loaded fixture set.
    pub fn from_fixture(fixture: Fixture, settings: Settings) -> Self {
        let fixture = Arc::new(fixture);

        Self {
            catalog: Arc::new(FixtureCatalogService::new(fixture.clone())),
            fulfilment: Arc::new(FixtureFulfilmentService::new(fixture.clone())),
            coupons: Arc::new(FixtureCouponsService::new(fixture.clone())),
            gift_cards: Arc::new(FixtureGiftCardsService::new(fixture.clone())),
            orders: Arc::new(FixtureOrdersService::new(fixture)),
            payments: Arc::new(InMemoryPaymentsService::new()),
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    /// Replace the clock, e.g. to quote for a fixed day.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn lookup(&self) -> FulfilmentLookup {
        FulfilmentLookup::new(self.fulfilment.clone(), self.settings)
    }

    pub fn offers(&self) -> Offers {
        Offers::new(
            self.coupons.clone(),
            self.gift_cards.clone(),
            self.catalog.clone(),
            self.clock.clone(),
            self.settings.currency,
        )
    }

    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(
            self.payments.clone(),
            self.orders.clone(),
            self.clock.clone(),
            self.settings,
        )
    }

    pub fn reconciler(&self) -> ReorderReconciler {
        ReorderReconciler::new(
            self.orders.clone(),
            self.catalog.clone(),
            self.coupons.clone(),
            self.settings.currency,
        )
    }
}
