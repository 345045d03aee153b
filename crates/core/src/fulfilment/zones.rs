//! Delivery zones and collection points

use serde::{Deserialize, Serialize};

use crate::fulfilment::postcode::{Postcode, normalise};

/// An area served by home delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryZone {
    /// Zone name
    pub zone_name: String,

    /// Full postcodes served by this zone
    #[serde(default)]
    pub postcodes: Vec<String>,

    /// Postcode prefixes served by this zone
    #[serde(default)]
    pub postcode_prefixes: Vec<String>,

    /// Weekday names on which the zone receives deliveries
    pub delivery_days: Vec<String>,

    /// Delivery fee in minor units; the configured default applies when absent
    #[serde(default)]
    pub delivery_fee: Option<u64>,
}

impl DeliveryZone {
    /// Whether `postcode` is listed exactly.
    pub fn serves_exactly(&self, postcode: &Postcode) -> bool {
        self.postcodes
            .iter()
            .any(|entry| normalise(entry) == postcode.as_str())
    }

    /// Whether any prefix leads either the full postcode or its outward code.
    pub fn serves_by_prefix(&self, postcode: &Postcode) -> bool {
        let outward = postcode.outward_code();

        self.postcode_prefixes
            .iter()
            .map(|prefix| normalise(prefix))
            .filter(|prefix| !prefix.is_empty())
            .any(|prefix| {
                postcode.as_str().starts_with(&prefix)
                    || outward.is_some_and(|outward| outward.starts_with(&prefix))
            })
    }
}

/// A pickup location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPoint {
    /// Point id
    pub id: String,

    /// Display name
    pub name: String,

    /// Weekday names on which orders can be collected
    pub collection_days: Vec<String>,

    /// Collection fee in minor units
    #[serde(default)]
    pub collection_fee: u64,

    /// Whether the point is currently accepting collections
    pub is_active: bool,
}

/// Outcome of looking up the zone for a postcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneLookup<'z> {
    /// Not enough of the postcode has been entered to check it.
    Insufficient,

    /// No zone delivers to the postcode.
    NoMatch,

    /// The zone that delivers to the postcode.
    Matched(&'z DeliveryZone),
}

impl<'z> ZoneLookup<'z> {
    /// The matched zone, if any.
    pub fn zone(self) -> Option<&'z DeliveryZone> {
        match self {
            ZoneLookup::Matched(zone) => Some(zone),
            ZoneLookup::Insufficient | ZoneLookup::NoMatch => None,
        }
    }
}

/// Find the zone delivering to `postcode`.
///
/// Exact postcode entries are checked across all zones before any prefix, and the first zone to
/// match wins.
pub fn resolve_zone<'z>(postcode: &str, zones: &'z [DeliveryZone]) -> ZoneLookup<'z> {
    let Ok(postcode) = Postcode::parse(postcode) else {
        return ZoneLookup::Insufficient;
    };

    resolve_parsed_zone(&postcode, zones)
}

/// [`resolve_zone`] for an already parsed postcode.
pub fn resolve_parsed_zone<'z>(postcode: &Postcode, zones: &'z [DeliveryZone]) -> ZoneLookup<'z> {
    zones
        .iter()
        .find(|zone| zone.serves_exactly(postcode))
        .or_else(|| zones.iter().find(|zone| zone.serves_by_prefix(postcode)))
        .map_or(ZoneLookup::NoMatch, ZoneLookup::Matched)
}
