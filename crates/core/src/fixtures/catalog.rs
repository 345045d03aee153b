//! Meal and package fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, prices::CurrencyGuard},
    items::MealId,
    reorder::{HistoricalPackage, MealAvailability},
};

fn active() -> bool {
    true
}

/// Wrapper for meals and packages in YAML
#[derive(Debug, Deserialize)]
pub struct MealsFixture {
    /// Map of meal id -> meal fixture
    pub meals: FxHashMap<String, MealFixture>,

    /// Map of package id -> package fixture
    #[serde(default)]
    pub packages: FxHashMap<String, PackageFixture>,
}

/// Meal Fixture
#[derive(Debug, Deserialize)]
pub struct MealFixture {
    /// Meal name
    pub name: String,

    /// Unit price (e.g., "8.99 GBP")
    pub price: String,

    /// Days the meal stays good after production
    pub shelf_life_days: u32,

    /// Whether the meal can currently be ordered
    #[serde(default = "active")]
    pub active: bool,
}

impl MealFixture {
    pub(crate) fn into_availability(
        self,
        id: &str,
        guard: &mut CurrencyGuard,
    ) -> Result<MealAvailability, FixtureError> {
        Ok(MealAvailability {
            id: MealId::from(id),
            price: guard.price(&self.price)?,
            name: self.name,
            is_active: self.active,
            shelf_life_days: self.shelf_life_days,
        })
    }
}

/// Package Fixture
#[derive(Debug, Deserialize)]
pub struct PackageFixture {
    /// Package name
    pub name: String,

    /// Package price (e.g., "45.00 GBP")
    pub price: String,

    /// Days the package stays good after production
    pub shelf_life_days: u32,
}

impl PackageFixture {
    pub(crate) fn into_package(
        self,
        id: &str,
        guard: &mut CurrencyGuard,
    ) -> Result<HistoricalPackage, FixtureError> {
        Ok(HistoricalPackage {
            package_id: id.to_string(),
            price: guard.price(&self.price)?,
            package_name: self.name,
            shelf_life_days: self.shelf_life_days,
        })
    }
}
