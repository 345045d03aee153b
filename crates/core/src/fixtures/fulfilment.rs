//! Delivery zone and collection point fixtures

use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, prices::CurrencyGuard},
    fulfilment::{CollectionPoint, DeliveryZone},
};

/// Wrapper for zones and collection points in YAML
#[derive(Debug, Deserialize)]
pub struct FulfilmentFixture {
    /// Delivery zones, in lookup order
    #[serde(default)]
    pub delivery_zones: Vec<DeliveryZoneFixture>,

    /// Collection points
    #[serde(default)]
    pub collection_points: Vec<CollectionPointFixture>,
}

/// Delivery Zone Fixture
#[derive(Debug, Deserialize)]
pub struct DeliveryZoneFixture {
    /// Zone name
    pub name: String,

    /// Exact postcodes
    #[serde(default)]
    pub postcodes: Vec<String>,

    /// Postcode prefixes
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// Delivery weekdays
    pub days: Vec<String>,

    /// Delivery fee (e.g., "3.99 GBP"); the configured default applies when absent
    #[serde(default)]
    pub fee: Option<String>,
}

impl DeliveryZoneFixture {
    pub(crate) fn into_zone(self, guard: &mut CurrencyGuard) -> Result<DeliveryZone, FixtureError> {
        Ok(DeliveryZone {
            delivery_fee: guard.optional_price(self.fee.as_deref())?,
            zone_name: self.name,
            postcodes: self.postcodes,
            postcode_prefixes: self.prefixes,
            delivery_days: self.days,
        })
    }
}

/// Collection Point Fixture
#[derive(Debug, Deserialize)]
pub struct CollectionPointFixture {
    /// Point id
    pub id: String,

    /// Display name
    pub name: String,

    /// Collection weekdays
    pub days: Vec<String>,

    /// Collection fee (e.g., "0.00 GBP")
    #[serde(default)]
    pub fee: Option<String>,

    /// Whether the point is accepting collections
    pub active: bool,
}

impl CollectionPointFixture {
    pub(crate) fn into_point(
        self,
        guard: &mut CurrencyGuard,
    ) -> Result<CollectionPoint, FixtureError> {
        Ok(CollectionPoint {
            collection_fee: guard.optional_price(self.fee.as_deref())?.unwrap_or_default(),
            id: self.id,
            name: self.name,
            collection_days: self.days,
            is_active: self.active,
        })
    }
}
