//! Fixtures
//!
//! YAML storefront data: meals and packages, delivery zones and collection points, coupons and
//! gift cards, and historical orders. Each category lives in its own directory under the base
//! path, and a set is the files sharing one name.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    coupons::CouponRecord,
    fixtures::{
        catalog::MealsFixture, fulfilment::FulfilmentFixture, offers::OffersFixture,
        orders::OrdersFixture, prices::CurrencyGuard,
    },
    fulfilment::{CollectionPoint, DeliveryZone},
    gift_cards::GiftCardBalance,
    items::MealId,
    reorder::{HistoricalOrder, HistoricalPackage, MealAvailability, OrderId, OrderKind},
};

pub mod catalog;
pub mod fulfilment;
pub mod offers;
pub mod orders;
pub mod prices;

pub use prices::parse_price;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between prices
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No prices loaded yet
    #[error("No prices loaded yet; currency unknown")]
    NoCurrency,

    /// Meal not found
    #[error("Meal not found: {0}")]
    MealNotFound(String),

    /// Package not found
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    meals: FxHashMap<String, MealAvailability>,
    packages: FxHashMap<String, HistoricalPackage>,
    delivery_zones: Vec<DeliveryZone>,
    collection_points: Vec<CollectionPoint>,
    coupons: Vec<CouponRecord>,
    gift_cards: Vec<GiftCardBalance>,
    orders: FxHashMap<String, HistoricalOrder>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            meals: FxHashMap::default(),
            packages: FxHashMap::default(),
            delivery_zones: Vec::new(),
            collection_points: Vec::new(),
            coupons: Vec::new(),
            gift_cards: Vec::new(),
            orders: FxHashMap::default(),
            currency: None,
        }
    }

    fn read(&self, category: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        Ok(fs::read_to_string(&file_path)?)
    }

    /// Load meals and packages from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if prices are invalid.
    pub fn load_meals(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: MealsFixture = serde_norway::from_str(&self.read("meals", name)?)?;
        let mut guard = CurrencyGuard::new(self.currency);

        for (key, meal) in fixture.meals {
            let meal = meal.into_availability(&key, &mut guard)?;

            self.meals.insert(key, meal);
        }

        for (key, package) in fixture.packages {
            let package = package.into_package(&key, &mut guard)?;

            self.packages.insert(key, package);
        }

        self.currency = guard.currency();

        Ok(self)
    }

    /// Load delivery zones and collection points from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if fees are invalid.
    pub fn load_fulfilment(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: FulfilmentFixture = serde_norway::from_str(&self.read("fulfilment", name)?)?;
        let mut guard = CurrencyGuard::new(self.currency);

        for zone in fixture.delivery_zones {
            self.delivery_zones.push(zone.into_zone(&mut guard)?);
        }

        for point in fixture.collection_points {
            self.collection_points.push(point.into_point(&mut guard)?);
        }

        self.currency = guard.currency();

        Ok(self)
    }

    /// Load coupons and gift cards from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if amounts are invalid.
    pub fn load_offers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: OffersFixture = serde_norway::from_str(&self.read("offers", name)?)?;
        let mut guard = CurrencyGuard::new(self.currency);

        for coupon in fixture.coupons {
            self.coupons.push(coupon.into_record(&mut guard)?);
        }

        for card in fixture.gift_cards {
            self.gift_cards.push(card.into_balance(&mut guard)?);
        }

        self.currency = guard.currency();

        Ok(self)
    }

    /// Load historical orders from a YAML fixture file
    ///
    /// Meals and packages must be loaded first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an order references an
    /// unknown meal or package.
    pub fn load_orders(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: OrdersFixture = serde_norway::from_str(&self.read("orders", name)?)?;

        for (key, order) in fixture.orders {
            let order = order.into_order(&key, &self.meals, &self.packages)?;

            self.orders.insert(key, order);
        }

        Ok(self)
    }

    /// Load a complete fixture set (every category with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// [`Fixture::from_set`] with a custom base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_meals(name)?
            .load_fulfilment(name)?
            .load_offers(name)?
            .load_orders(name)?;

        Ok(fixture)
    }

    /// Get a meal by its id
    ///
    /// # Errors
    ///
    /// Returns an error if the meal is not found.
    pub fn meal(&self, id: &str) -> Result<&MealAvailability, FixtureError> {
        self.meals
            .get(id)
            .ok_or_else(|| FixtureError::MealNotFound(id.to_string()))
    }

    /// All meals, ordered by id
    pub fn meals(&self) -> Vec<&MealAvailability> {
        let mut meals: Vec<_> = self.meals.values().collect();
        meals.sort_by(|a, b| a.id.cmp(&b.id));

        meals
    }

    /// Catalog state of the requested meals; unknown ids are left out
    pub fn meal_availability(&self, ids: &[MealId]) -> Vec<MealAvailability> {
        ids.iter()
            .filter_map(|id| self.meals.get(id.as_str()))
            .cloned()
            .collect()
    }

    /// Get a package by its id
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found.
    pub fn package(&self, id: &str) -> Result<&HistoricalPackage, FixtureError> {
        self.packages
            .get(id)
            .ok_or_else(|| FixtureError::PackageNotFound(id.to_string()))
    }

    /// Active and inactive delivery zones, in file order
    pub fn delivery_zones(&self) -> &[DeliveryZone] {
        &self.delivery_zones
    }

    /// Collection points, in file order
    pub fn collection_points(&self) -> &[CollectionPoint] {
        &self.collection_points
    }

    /// Stored coupon records
    pub fn coupons(&self) -> &[CouponRecord] {
        &self.coupons
    }

    /// Find a coupon record by code, ignoring case
    pub fn coupon(&self, code: &str) -> Option<&CouponRecord> {
        self.coupons
            .iter()
            .find(|coupon| coupon.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Find a gift card by code, ignoring case
    pub fn gift_card(&self, code: &str) -> Option<&GiftCardBalance> {
        self.gift_cards
            .iter()
            .find(|card| card.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Get an order by id and kind
    ///
    /// # Errors
    ///
    /// Returns an error if no order of that kind has the id.
    pub fn order(&self, id: &OrderId, kind: OrderKind) -> Result<&HistoricalOrder, FixtureError> {
        self.orders
            .get(id.as_str())
            .filter(|order| order.kind == kind)
            .ok_or_else(|| FixtureError::OrderNotFound(id.to_string()))
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no prices have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
