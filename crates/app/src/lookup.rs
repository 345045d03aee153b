//! Fulfilment lookup
//!
//! Loads zones and collection points and resolves a customer's fulfilment choice against them.
//! Every load is tagged with a [`RequestToken`]; a response that arrives after a newer load was
//! started is discarded.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use jiff::civil::Date;
use larder::fulfilment::{
    CollectionPoint, DeliveryZone, EligibilityError, FulfilmentEligibility, FulfilmentMethod,
    FulfilmentTarget, InputError, Postcode, ZoneLookup, resolve_parsed_zone,
};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::Settings,
    domain::fulfilment::{FulfilmentService, FulfilmentServiceError},
};

/// Dates offered to the customer, counted from tomorrow.
pub const DEFAULT_DATE_HORIZON: usize = 28;

/// Errors raised resolving a fulfilment choice.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error("fulfilment options could not be loaded")]
    Service(#[from] FulfilmentServiceError),
}

/// Identifies one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Issues increasing [`RequestToken`]s and remembers the latest.
#[derive(Debug, Default)]
pub struct RequestTokens {
    latest: AtomicU64,
}

impl RequestTokens {
    /// Start a lookup, superseding every earlier one.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst).saturating_add(1))
    }

    /// Whether `token` belongs to the most recent lookup.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// What the customer picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfilmentChoice {
    /// Delivery to a postcode as typed
    Delivery { postcode: String },

    /// Collection from a point by id
    Collection { point_id: String },
}

impl FulfilmentChoice {
    pub fn method(&self) -> FulfilmentMethod {
        match self {
            FulfilmentChoice::Delivery { .. } => FulfilmentMethod::Delivery,
            FulfilmentChoice::Collection { .. } => FulfilmentMethod::Collection,
        }
    }
}

/// Zones and collection points from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub delivery_zones: Vec<DeliveryZone>,
    pub collection_points: Vec<CollectionPoint>,
}

impl ReferenceData {
    /// The zone or point `choice` resolves to.
    ///
    /// A postcode that no zone serves resolves to a delivery target without a zone, which is
    /// ineligible for every date.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::IncompletePostcode`] when too little of the postcode was entered.
    pub fn target(&self, choice: &FulfilmentChoice) -> Result<FulfilmentTarget<'_>, InputError> {
        match choice {
            FulfilmentChoice::Delivery { postcode } => {
                let postcode = Postcode::parse(postcode)?;

                let zone = match resolve_parsed_zone(&postcode, &self.delivery_zones) {
                    ZoneLookup::Matched(zone) => Some(zone),
                    ZoneLookup::Insufficient | ZoneLookup::NoMatch => None,
                };

                debug!(
                    postcode = postcode.as_str(),
                    zone = ?zone.map(|zone| &zone.zone_name),
                    "resolved delivery zone",
                );

                Ok(FulfilmentTarget::Delivery(zone))
            }
            FulfilmentChoice::Collection { point_id } => Ok(FulfilmentTarget::Collection(
                self.collection_points
                    .iter()
                    .find(|point| &point.id == point_id),
            )),
        }
    }
}

/// The fee and bookable dates for a fulfilment choice.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfilmentOptions {
    pub method: FulfilmentMethod,
    /// Zone name or collection point name
    pub destination: String,
    pub fee: Money<'static, Currency>,
    pub available_dates: Vec<Date>,
}

/// Loads fulfilment reference data, discarding superseded responses.
pub struct FulfilmentLookup {
    service: Arc<dyn FulfilmentService>,
    tokens: RequestTokens,
    settings: Settings,
}

impl std::fmt::Debug for FulfilmentLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfilmentLookup")
            .field("tokens", &self.tokens)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl FulfilmentLookup {
    #[must_use]
    pub fn new(service: Arc<dyn FulfilmentService>, settings: Settings) -> Self {
        Self {
            service,
            tokens: RequestTokens::default(),
            settings,
        }
    }

    /// Begin a lookup. Any lookup started earlier becomes stale.
    pub fn begin(&self) -> RequestToken {
        self.tokens.issue()
    }

    /// Load zones and collection points together for the lookup identified by `token`.
    ///
    /// Returns `None` when a newer lookup began while this one was in flight.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Service`] when either list fails to load.
    pub async fn load(&self, token: RequestToken) -> Result<Option<ReferenceData>, LookupError> {
        let (delivery_zones, collection_points) = tokio::try_join!(
            self.service.list_active_delivery_zones(),
            self.service.list_active_collection_points(),
        )?;

        if !self.tokens.is_current(token) {
            warn!(?token, "discarding stale fulfilment lookup");

            return Ok(None);
        }

        Ok(Some(ReferenceData {
            delivery_zones,
            collection_points,
        }))
    }

    /// Start a lookup and load it.
    ///
    /// # Errors
    ///
    /// See [`FulfilmentLookup::load`].
    pub async fn refresh(&self) -> Result<Option<ReferenceData>, LookupError> {
        let token = self.begin();

        self.load(token).await
    }

    /// The fee and bookable dates for `choice` within `horizon` days of `today`.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the postcode is incomplete, nothing serves the choice, or
    /// no fee can be determined.
    pub fn options(
        &self,
        data: &ReferenceData,
        choice: &FulfilmentChoice,
        today: Date,
        horizon: usize,
    ) -> Result<FulfilmentOptions, LookupError> {
        let target = data.target(choice)?;
        let eligibility =
            FulfilmentEligibility::new(target, self.settings.fee_policy, self.settings.currency)?;

        let destination = match target {
            FulfilmentTarget::Delivery(Some(zone)) => zone.zone_name.clone(),
            FulfilmentTarget::Collection(Some(point)) => point.name.clone(),
            FulfilmentTarget::Delivery(None) => return Err(EligibilityError::NoDeliveryZone.into()),
            FulfilmentTarget::Collection(None) => {
                return Err(EligibilityError::NoCollectionPoint.into());
            }
        };

        Ok(FulfilmentOptions {
            method: target.method(),
            destination,
            fee: eligibility.fee(),
            available_dates: target.available_dates(today, horizon),
        })
    }
}
