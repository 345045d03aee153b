//! Historical order fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    items::MealId,
    reorder::{HistoricalOrder, HistoricalPackage, MealAvailability, OrderId, OrderKind, OrderLine},
};

/// Wrapper for orders in YAML
#[derive(Debug, Deserialize)]
pub struct OrdersFixture {
    /// Map of order id -> order fixture
    pub orders: FxHashMap<String, OrderFixture>,
}

/// Order Fixture
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Order kind
    pub kind: OrderKind,

    /// Package id, for package orders
    #[serde(default)]
    pub package: Option<String>,

    /// Meal id -> quantity ordered
    pub meals: FxHashMap<String, u32>,

    /// Coupon used on the order
    #[serde(default)]
    pub coupon: Option<String>,
}

impl OrderFixture {
    /// Build the order, taking names, prices and shelf lives from the loaded meals and packages.
    pub(crate) fn into_order(
        self,
        id: &str,
        meals: &FxHashMap<String, MealAvailability>,
        packages: &FxHashMap<String, HistoricalPackage>,
    ) -> Result<HistoricalOrder, FixtureError> {
        let mut lines = self
            .meals
            .into_iter()
            .map(|(meal_id, quantity)| {
                let meal = meals
                    .get(&meal_id)
                    .ok_or_else(|| FixtureError::MealNotFound(meal_id.clone()))?;

                Ok(OrderLine {
                    meal_id: MealId::new(meal_id),
                    meal_name: meal.name.clone(),
                    quantity,
                    unit_price: meal.price,
                    shelf_life_days: meal.shelf_life_days,
                })
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        lines.sort_by(|a, b| a.meal_id.cmp(&b.meal_id));

        let package = self
            .package
            .map(|key| {
                packages
                    .get(&key)
                    .cloned()
                    .ok_or(FixtureError::PackageNotFound(key))
            })
            .transpose()?;

        Ok(HistoricalOrder {
            id: OrderId::from(id),
            kind: self.kind,
            lines,
            package,
            coupon_code: self.coupon,
        })
    }
}
