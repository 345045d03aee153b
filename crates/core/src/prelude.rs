//! Larder prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        CartAction, CartEffect, CartState, CartStorage, CartStore, FileStorage, MemoryStorage,
        StorageError, reduce,
    },
    coupons::{Coupon, CouponError, CouponKind, CouponRecord},
    discounts::{DiscountComposer, DiscountError, DiscountWarning, Quote, QuoteRequest},
    fixtures::{Fixture, FixtureError},
    fulfilment::{
        CollectionPoint, DeliveryZone, EligibilityError, FeePolicy, FulfilmentEligibility,
        FulfilmentMethod, FulfilmentTarget, InputError, Postcode, ZoneLookup, fee_for,
        is_eligible_for_date, resolve_zone,
    },
    gift_cards::{GiftCardBalance, GiftCardError, GiftCardRedemption},
    items::{CartItem, ItemId, ItemKind, MealId, PackageSelection, PackageSnapshot},
    pricing::PricingError,
    production::{ShelfLife, compute_production_date},
    reorder::{
        HistoricalOrder, MealAvailability, OrderId, OrderKind, ReconciliationFetchError,
        ReorderContext, ReorderError, ReorderEvent, ReorderPhase, ReorderPlan, UnavailableItem,
    },
    summary::SummaryError,
};
