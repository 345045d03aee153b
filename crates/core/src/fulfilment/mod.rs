//! Fulfilment
//!
//! Decides whether an order can be delivered to a postcode or collected from a point on a given
//! calendar date, and what that costs.

use std::fmt;

use jiff::civil::Date;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{PricingError, to_money};

pub mod calendar;
pub mod postcode;
pub mod zones;

pub use postcode::Postcode;
pub use zones::{CollectionPoint, DeliveryZone, ZoneLookup, resolve_parsed_zone, resolve_zone};

/// Incomplete or malformed customer input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Not enough of the postcode has been entered to check it.
    #[error("postcode is incomplete ({length} characters)")]
    IncompletePostcode {
        /// Normalised length
        length: usize,
    },

    /// No delivery or collection date was chosen.
    #[error("no delivery date selected")]
    MissingDeliveryDate,
}

/// Reasons an order cannot be fulfilled as requested.
#[derive(Debug, Error, PartialEq)]
pub enum EligibilityError {
    /// No delivery zone covers the address.
    #[error("delivery is not available to this address")]
    NoDeliveryZone,

    /// Collection was chosen without a collection point.
    #[error("no collection point selected")]
    NoCollectionPoint,

    /// The selected collection point is not accepting collections.
    #[error("collection point {0} is not active")]
    CollectionPointInactive(String),

    /// The date is earlier than tomorrow.
    #[error("{date} is too soon; the earliest date is {earliest}")]
    DateTooSoon {
        /// Requested date
        date: Date,
        /// Tomorrow
        earliest: Date,
    },

    /// The zone or point does not operate on that weekday.
    #[error("{method} is not available on {weekday}s")]
    DayNotOffered {
        /// Requested method
        method: FulfilmentMethod,
        /// Weekday name of the requested date
        weekday: &'static str,
    },

    /// The zone has no fee and no default delivery fee is configured.
    #[error("no delivery fee configured for zone {0}")]
    FeeUnavailable(String),

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfilmentMethod {
    /// Home delivery to a postcode in a delivery zone
    Delivery,

    /// Pickup from a collection point
    Collection,
}

impl fmt::Display for FulfilmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FulfilmentMethod::Delivery => f.write_str("delivery"),
            FulfilmentMethod::Collection => f.write_str("collection"),
        }
    }
}

/// Fee configuration applied when reference data leaves a fee unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeePolicy {
    /// Delivery fee in minor units for zones without their own fee
    pub default_delivery_fee: Option<u64>,
}

/// A fulfilment method together with the zone or point it resolved to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfilmentTarget<'a> {
    /// Delivery to the resolved zone
    Delivery(Option<&'a DeliveryZone>),

    /// Collection from the selected point
    Collection(Option<&'a CollectionPoint>),
}

impl FulfilmentTarget<'_> {
    /// The method of this target.
    pub fn method(&self) -> FulfilmentMethod {
        match self {
            FulfilmentTarget::Delivery(_) => FulfilmentMethod::Delivery,
            FulfilmentTarget::Collection(_) => FulfilmentMethod::Collection,
        }
    }

    fn schedule(&self) -> Result<&[String], EligibilityError> {
        match self {
            FulfilmentTarget::Delivery(None) => Err(EligibilityError::NoDeliveryZone),
            FulfilmentTarget::Delivery(Some(zone)) => Ok(zone.delivery_days.as_slice()),
            FulfilmentTarget::Collection(None) => Err(EligibilityError::NoCollectionPoint),
            FulfilmentTarget::Collection(Some(point)) if !point.is_active => {
                Err(EligibilityError::CollectionPointInactive(point.id.clone()))
            }
            FulfilmentTarget::Collection(Some(point)) => Ok(point.collection_days.as_slice()),
        }
    }

    /// Check `date` against the schedule, relative to the local calendar day `today`.
    ///
    /// # Errors
    ///
    /// Returns the first reason the date is not available.
    pub fn check_date(&self, date: Date, today: Date) -> Result<(), EligibilityError> {
        let schedule = self.schedule()?;

        if !calendar::is_after_today(date, today) {
            return Err(EligibilityError::DateTooSoon {
                date,
                earliest: today.tomorrow().unwrap_or(today),
            });
        }

        if !calendar::schedule_includes(schedule, date) {
            return Err(EligibilityError::DayNotOffered {
                method: self.method(),
                weekday: calendar::weekday_name(date.weekday()),
            });
        }

        Ok(())
    }

    /// Whether `date` can be booked.
    pub fn is_eligible_for_date(&self, date: Date, today: Date) -> bool {
        self.check_date(date, today).is_ok()
    }

    /// Bookable dates within `horizon` days from tomorrow.
    pub fn available_dates(&self, today: Date, horizon: usize) -> Vec<Date> {
        calendar::upcoming(today, horizon)
            .filter(|date| self.is_eligible_for_date(*date, today))
            .collect()
    }

    /// The fee for this method.
    ///
    /// # Errors
    ///
    /// Returns an [`EligibilityError`] when the zone or point is missing, or a delivery zone has no
    /// fee and [`FeePolicy::default_delivery_fee`] is unset.
    pub fn fee(
        &self,
        policy: FeePolicy,
        currency: &'static Currency,
    ) -> Result<Money<'static, Currency>, EligibilityError> {
        let minor = match self {
            FulfilmentTarget::Delivery(None) => return Err(EligibilityError::NoDeliveryZone),
            FulfilmentTarget::Delivery(Some(zone)) => zone
                .delivery_fee
                .or(policy.default_delivery_fee)
                .ok_or_else(|| EligibilityError::FeeUnavailable(zone.zone_name.clone()))?,
            FulfilmentTarget::Collection(None) => return Err(EligibilityError::NoCollectionPoint),
            FulfilmentTarget::Collection(Some(point)) => point.collection_fee,
        };

        Ok(to_money(minor, currency)?)
    }
}

/// Whether `target` can fulfil an order on `date`.
pub fn is_eligible_for_date(target: FulfilmentTarget<'_>, date: Date, today: Date) -> bool {
    target.is_eligible_for_date(date, today)
}

/// The fee `target` charges.
///
/// # Errors
///
/// See [`FulfilmentTarget::fee`].
pub fn fee_for(
    target: FulfilmentTarget<'_>,
    policy: FeePolicy,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, EligibilityError> {
    target.fee(policy, currency)
}

/// Resolved fulfilment for a session: the target and its fee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FulfilmentEligibility<'a> {
    target: FulfilmentTarget<'a>,
    fee: Money<'static, Currency>,
}

impl<'a> FulfilmentEligibility<'a> {
    /// Resolve the fee for `target`.
    ///
    /// # Errors
    ///
    /// See [`FulfilmentTarget::fee`].
    pub fn new(
        target: FulfilmentTarget<'a>,
        policy: FeePolicy,
        currency: &'static Currency,
    ) -> Result<Self, EligibilityError> {
        let fee = target.fee(policy, currency)?;

        Ok(Self { target, fee })
    }

    /// The resolved target.
    pub fn target(&self) -> FulfilmentTarget<'a> {
        self.target
    }

    /// The fee for the method.
    pub fn fee(&self) -> Money<'static, Currency> {
        self.fee
    }

    /// Whether `date` can be booked.
    pub fn is_eligible_for_date(&self, date: Date, today: Date) -> bool {
        self.target.is_eligible_for_date(date, today)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn zone(fee: Option<u64>) -> DeliveryZone {
        DeliveryZone {
            zone_name: "Bridgwater".to_string(),
            postcodes: vec![],
            postcode_prefixes: vec!["TA6".to_string()],
            delivery_days: vec!["Tuesday".to_string(), "friday".to_string()],
            delivery_fee: fee,
        }
    }

    fn point(is_active: bool) -> CollectionPoint {
        CollectionPoint {
            id: "farm-shop".to_string(),
            name: "Farm Shop".to_string(),
            collection_days: vec!["Saturday".to_string()],
            collection_fee: 0,
            is_active,
        }
    }

    // Wednesday
    const TODAY: Date = date(2026, 10, 14);

    #[test]
    fn delivery_on_a_scheduled_day_is_eligible() {
        let zone = zone(Some(399));
        let target = FulfilmentTarget::Delivery(Some(&zone));

        assert!(target.is_eligible_for_date(date(2026, 10, 16), TODAY));
        assert!(target.is_eligible_for_date(date(2026, 10, 20), TODAY));
    }

    #[test]
    fn delivery_on_an_unscheduled_day_is_rejected() {
        let zone = zone(Some(399));
        let target = FulfilmentTarget::Delivery(Some(&zone));

        assert_eq!(
            target.check_date(date(2026, 10, 15), TODAY),
            Err(EligibilityError::DayNotOffered {
                method: FulfilmentMethod::Delivery,
                weekday: "Thursday",
            })
        );
    }

    #[test]
    fn today_and_past_dates_are_too_soon() {
        let zone = zone(Some(399));
        let target = FulfilmentTarget::Delivery(Some(&zone));

        // 2026-10-13 is a scheduled Tuesday, but in the past.
        assert_eq!(
            target.check_date(date(2026, 10, 13), TODAY),
            Err(EligibilityError::DateTooSoon {
                date: date(2026, 10, 13),
                earliest: date(2026, 10, 15),
            })
        );
        assert!(!target.is_eligible_for_date(TODAY, TODAY));
    }

    #[test]
    fn missing_zone_makes_every_date_ineligible() {
        let target = FulfilmentTarget::Delivery(None);

        assert_eq!(
            target.check_date(date(2026, 10, 16), TODAY),
            Err(EligibilityError::NoDeliveryZone)
        );
        assert!(target.available_dates(TODAY, 28).is_empty());
    }

    #[test]
    fn collection_requires_an_active_point() {
        let inactive = point(false);

        assert_eq!(
            FulfilmentTarget::Collection(None).check_date(date(2026, 10, 17), TODAY),
            Err(EligibilityError::NoCollectionPoint)
        );
        assert_eq!(
            FulfilmentTarget::Collection(Some(&inactive)).check_date(date(2026, 10, 17), TODAY),
            Err(EligibilityError::CollectionPointInactive("farm-shop".to_string()))
        );
    }

    #[test]
    fn collection_on_scheduled_day_is_eligible() {
        let point = point(true);
        let target = FulfilmentTarget::Collection(Some(&point));

        assert!(target.is_eligible_for_date(date(2026, 10, 17), TODAY));
        assert!(!target.is_eligible_for_date(date(2026, 10, 16), TODAY));
    }

    #[test]
    fn available_dates_lists_scheduled_days_from_tomorrow() {
        let zone = zone(Some(399));
        let target = FulfilmentTarget::Delivery(Some(&zone));

        assert_eq!(
            target.available_dates(TODAY, 7),
            vec![date(2026, 10, 16), date(2026, 10, 20)]
        );
    }

    #[test]
    fn zone_fee_takes_precedence_over_default() -> TestResult {
        let zone = zone(Some(399));
        let policy = FeePolicy {
            default_delivery_fee: Some(500),
        };

        assert_eq!(
            fee_for(FulfilmentTarget::Delivery(Some(&zone)), policy, GBP)?,
            Money::from_minor(399, GBP)
        );

        Ok(())
    }

    #[test]
    fn default_fee_applies_to_zone_without_fee() -> TestResult {
        let zone = zone(None);
        let policy = FeePolicy {
            default_delivery_fee: Some(500),
        };

        assert_eq!(
            fee_for(FulfilmentTarget::Delivery(Some(&zone)), policy, GBP)?,
            Money::from_minor(500, GBP)
        );

        Ok(())
    }

    #[test]
    fn missing_fee_is_an_error_not_zero() {
        let zone = zone(None);

        assert_eq!(
            fee_for(FulfilmentTarget::Delivery(Some(&zone)), FeePolicy::default(), GBP),
            Err(EligibilityError::FeeUnavailable("Bridgwater".to_string()))
        );
        assert_eq!(
            fee_for(FulfilmentTarget::Delivery(None), FeePolicy::default(), GBP),
            Err(EligibilityError::NoDeliveryZone)
        );
    }

    #[test]
    fn eligibility_carries_collection_fee() -> TestResult {
        let mut point = point(true);
        point.collection_fee = 150;

        let eligibility = FulfilmentEligibility::new(
            FulfilmentTarget::Collection(Some(&point)),
            FeePolicy::default(),
            GBP,
        )?;

        assert_eq!(eligibility.fee(), Money::from_minor(150, GBP));
        assert!(eligibility.is_eligible_for_date(date(2026, 10, 17), TODAY));

        Ok(())
    }
}
