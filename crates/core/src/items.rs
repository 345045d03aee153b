//! Items

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of cart line ids for items granted by a coupon.
pub const FREE_ITEM_PREFIX: &str = "free-";

/// Catalog identifier of a meal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealId(String);

impl MealId {
    /// Create a meal id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MealId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for MealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id of the line a free-item coupon adds for `meal`.
    pub fn free_item(meal: &MealId) -> Self {
        Self(format!("{FREE_ITEM_PREFIX}{meal}"))
    }

    /// Whether this id was derived by [`ItemId::free_item`].
    pub fn is_free_item(&self) -> bool {
        self.0.starts_with(FREE_ITEM_PREFIX)
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&MealId> for ItemId {
    fn from(value: &MealId) -> Self {
        Self::new(value.as_str())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A meal chosen as part of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSelection {
    /// Selected meal
    pub meal_id: MealId,

    /// Meal name at selection time
    pub meal_name: String,

    /// Number of portions of this meal in the package
    pub quantity: u32,
}

/// Contents of a package captured when it was added to the cart.
///
/// Snapshots are never refreshed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSnapshot {
    /// Catalog id of the package
    pub package_id: String,

    /// Package name at selection time
    pub package_name: String,

    /// Selected meals
    pub selections: Vec<PackageSelection>,
}

impl PackageSnapshot {
    /// Total number of portions across all selections.
    pub fn portions(&self) -> u32 {
        self.selections
            .iter()
            .fold(0_u32, |acc, selection| acc.saturating_add(selection.quantity))
    }
}

/// What a cart line holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// A single meal
    Meal,

    /// A package with its selected meals
    Package(PackageSnapshot),
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Line id; meals use their meal id
    pub id: ItemId,

    /// Display name
    pub name: String,

    /// Unit price in minor units
    pub price: u64,

    /// Number of units, at least 1 while the line exists
    pub quantity: u32,

    /// Line contents
    pub kind: ItemKind,

    /// Days the item stays good after production
    pub shelf_life_days: u32,
}

impl CartItem {
    /// A meal line.
    pub fn meal(
        id: ItemId,
        name: impl Into<String>,
        price: u64,
        quantity: u32,
        shelf_life_days: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            quantity,
            kind: ItemKind::Meal,
            shelf_life_days,
        }
    }

    /// A package line holding `snapshot`.
    pub fn package(
        id: ItemId,
        price: u64,
        shelf_life_days: u32,
        snapshot: PackageSnapshot,
    ) -> Self {
        Self {
            id,
            name: snapshot.package_name.clone(),
            price,
            quantity: 1,
            kind: ItemKind::Package(snapshot),
            shelf_life_days,
        }
    }

    /// The zero priced line a free-item coupon grants.
    pub fn free_item(meal: &MealId, name: impl Into<String>, shelf_life_days: u32) -> Self {
        Self::meal(ItemId::free_item(meal), name, 0, 1, shelf_life_days)
    }

    /// Whether the line is a package.
    pub fn is_package(&self) -> bool {
        matches!(self.kind, ItemKind::Package(_))
    }

    /// The package snapshot, if this line is a package.
    pub fn package_snapshot(&self) -> Option<&PackageSnapshot> {
        match &self.kind {
            ItemKind::Package(snapshot) => Some(snapshot),
            ItemKind::Meal => None,
        }
    }

    /// The catalog meal a meal line refers to, free items included.
    pub fn meal_id(&self) -> Option<MealId> {
        match self.kind {
            ItemKind::Meal => Some(MealId::new(
                self.id
                    .as_str()
                    .strip_prefix(FREE_ITEM_PREFIX)
                    .unwrap_or(self.id.as_str()),
            )),
            ItemKind::Package(_) => None,
        }
    }
}
