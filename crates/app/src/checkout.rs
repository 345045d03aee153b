//! Checkout
//!
//! Turns the cart into an order. Orders whose total is covered by discounts and gift cards are
//! placed straight away; anything else first gets a payment intent, and is placed once the
//! customer has confirmed payment.

use std::sync::Arc;

use jiff::civil::Date;
use larder::{
    cart::{CartAction, CartStorage, CartStore},
    coupons::{Coupon, CouponError},
    discounts::{DiscountComposer, DiscountError, Quote, QuoteRequest},
    fulfilment::{EligibilityError, FeePolicy, FulfilmentTarget, InputError},
    gift_cards::GiftCardBalance,
    pricing::{PricingError, to_minor},
    production::compute_production_date,
    reorder::OrderId,
};
use thiserror::Error;
use tracing::info;

use crate::{
    clock::Clock,
    config::Settings,
    domain::{
        orders::{OrdersService, OrdersServiceError, models::NewOrder},
        payments::{
            PaymentsService, PaymentsServiceError,
            models::{PaymentIntent, PaymentRequest},
        },
    },
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("the cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("payment could not be set up")]
    Payment(#[from] PaymentsServiceError),

    #[error("order could not be placed")]
    Order(#[from] OrdersServiceError),
}

/// What the customer is checking out with.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRequest<'a> {
    pub target: FulfilmentTarget<'a>,
    pub date: Option<Date>,
    pub coupon: Option<&'a Coupon>,
    pub gift_card: Option<&'a GiftCardBalance>,
}

/// An order waiting for the customer to confirm payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    pub intent: PaymentIntent,
    pub order: NewOrder,
    pub quote: Quote,
}

/// How checkout ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Nothing was payable; the order is placed and the cart cleared.
    Placed { order_id: OrderId, quote: Quote },

    /// The customer must confirm payment before the order is placed.
    PaymentRequired(PendingOrder),
}

/// Places orders for a cart.
pub struct CheckoutService {
    payments: Arc<dyn PaymentsService>,
    orders: Arc<dyn OrdersService>,
    clock: Arc<dyn Clock>,
    composer: DiscountComposer,
    fee_policy: FeePolicy,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("composer", &self.composer)
            .field("fee_policy", &self.fee_policy)
            .finish_non_exhaustive()
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        payments: Arc<dyn PaymentsService>,
        orders: Arc<dyn OrdersService>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        Self {
            payments,
            orders,
            clock,
            composer: DiscountComposer::new(settings.currency)
                .with_expiring_soon_days(settings.expiring_soon_days),
            fee_policy: settings.fee_policy,
        }
    }

    /// Price the cart for `request` without placing anything.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] when the cart is empty, the fulfilment choice has no fee, or a
    /// discount cannot be computed.
    pub fn quote<S: CartStorage>(
        &self,
        store: &CartStore<S>,
        request: &CheckoutRequest<'_>,
    ) -> Result<Quote, CheckoutError> {
        if store.items().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let fee = request
            .target
            .fee(self.fee_policy, self.composer.currency())?;

        Ok(self.composer.compose(&QuoteRequest {
            items: store.items(),
            method: request.target.method(),
            fee,
            coupon: request.coupon,
            gift_card: request.gift_card,
            now: self.clock.now(),
        })?)
    }

    /// Check the date, price the cart and either place the order or request payment.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] when no date is chosen, the date cannot be booked, the coupon
    /// has lapsed since it was applied, pricing fails, or a collaborator fails. The cart is only
    /// cleared once an order is placed.
    pub async fn checkout<S: CartStorage>(
        &self,
        store: &mut CartStore<S>,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let delivery_date = request.date.ok_or(InputError::MissingDeliveryDate)?;

        request
            .target
            .check_date(delivery_date, self.clock.today())?;

        if let Some(coupon) = request.coupon {
            coupon.ensure_usable(self.clock.now())?;
        }

        let quote = self.quote(store, &request)?;

        let production_date = compute_production_date(Some(delivery_date), store.items())
            .ok_or(CheckoutError::EmptyCart)?;

        let order = NewOrder {
            items: store.items().to_vec(),
            method: request.target.method(),
            destination: destination(request.target)?,
            delivery_date,
            production_date,
            coupon_code: quote.coupon.as_ref().map(|coupon| coupon.code.clone()),
            gift_card: quote.gift_card.clone(),
            total: to_minor(&quote.total)?,
            payment_intent_id: None,
        };

        if quote.is_fully_covered() {
            let order_id = self.orders.create_order(order).await?;

            info!(order = %order_id, %production_date, "placed free order");

            store.dispatch(CartAction::ClearCart);

            return Ok(CheckoutOutcome::Placed { order_id, quote });
        }

        let intent = self
            .payments
            .create_intent(PaymentRequest {
                amount: order.total,
                currency: quote.total.currency().iso_alpha_code.to_string(),
                description: format!("Meal order for {delivery_date}"),
            })
            .await?;

        info!(intent = %intent.id, total = %quote.total, "payment required");

        Ok(CheckoutOutcome::PaymentRequired(PendingOrder {
            intent,
            order,
            quote,
        }))
    }

    /// Place an order once its payment has been confirmed, then clear the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Order`] when the order cannot be placed; the cart is kept.
    pub async fn complete<S: CartStorage>(
        &self,
        store: &mut CartStore<S>,
        pending: PendingOrder,
    ) -> Result<OrderId, CheckoutError> {
        let order = NewOrder {
            payment_intent_id: Some(pending.intent.id),
            ..pending.order
        };

        let order_id = self.orders.create_order(order).await?;

        info!(order = %order_id, "placed paid order");

        store.dispatch(CartAction::ClearCart);

        Ok(order_id)
    }
}

fn destination(target: FulfilmentTarget<'_>) -> Result<String, EligibilityError> {
    match target {
        FulfilmentTarget::Delivery(Some(zone)) => Ok(zone.zone_name.clone()),
        FulfilmentTarget::Collection(Some(point)) => Ok(point.id.clone()),
        FulfilmentTarget::Delivery(None) => Err(EligibilityError::NoDeliveryZone),
        FulfilmentTarget::Collection(None) => Err(EligibilityError::NoCollectionPoint),
    }
}
