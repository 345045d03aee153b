//! Coupon and gift card application

use std::sync::Arc;

use larder::{
    cart::{CartStorage, CartStore},
    coupons::{Coupon, CouponError},
    gift_cards::{GiftCardBalance, GiftCardError},
    items::CartItem,
    pricing::to_minor,
};
use rusty_money::iso::Currency;
use tracing::{debug, info};

use crate::{
    clock::Clock,
    domain::{catalog::CatalogService, coupons::CouponsService, gift_cards::GiftCardsService},
};

/// Checks coupons and gift cards with their services and keeps the cart in step.
pub struct Offers {
    coupons: Arc<dyn CouponsService>,
    gift_cards: Arc<dyn GiftCardsService>,
    catalog: Arc<dyn CatalogService>,
    clock: Arc<dyn Clock>,
    currency: &'static Currency,
}

impl std::fmt::Debug for Offers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Offers")
            .field("currency", &self.currency.iso_alpha_code)
            .finish_non_exhaustive()
    }
}

impl Offers {
    #[must_use]
    pub fn new(
        coupons: Arc<dyn CouponsService>,
        gift_cards: Arc<dyn GiftCardsService>,
        catalog: Arc<dyn CatalogService>,
        clock: Arc<dyn Clock>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            coupons,
            gift_cards,
            catalog,
            clock,
            currency,
        }
    }

    /// Validate `code` against the cart and apply it.
    ///
    /// A free-item coupon adds its meal to the cart; applying it again leaves one free line.
    /// Nothing in the cart changes when the coupon is rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] when the service rejects the code, the record grants nothing,
    /// the coupon is inactive or expired, or its free meal is unavailable.
    pub async fn apply_coupon<S: CartStorage>(
        &self,
        code: &str,
        store: &mut CartStore<S>,
    ) -> Result<Coupon, CouponError> {
        let code = code.trim();

        let subtotal = store
            .state()
            .subtotal(self.currency)
            .and_then(|subtotal| to_minor(&subtotal))
            .map_err(|err| CouponError::Unavailable(err.to_string()))?;

        let validation = self
            .coupons
            .validate_coupon(code, subtotal)
            .await
            .map_err(|err| CouponError::Unavailable(err.to_string()))?;

        let record = match validation.coupon {
            Some(record) if validation.valid => record,
            _ => {
                return Err(CouponError::Rejected {
                    code: code.to_string(),
                    reason: validation
                        .error
                        .unwrap_or_else(|| "Invalid coupon code".to_string()),
                });
            }
        };

        let coupon = Coupon::try_from(record)?;
        coupon.ensure_usable(self.clock.now())?;

        if let Some(meal_id) = coupon.free_item() {
            let meal = self
                .catalog
                .get_meal_availability(std::slice::from_ref(meal_id))
                .await
                .map_err(|err| CouponError::Unavailable(err.to_string()))?
                .into_iter()
                .find(|meal| &meal.id == meal_id && meal.is_active)
                .ok_or_else(|| CouponError::FreeItemUnavailable(meal_id.clone()))?;

            store.grant_free_item(CartItem::free_item(meal_id, meal.name, meal.shelf_life_days));
        }

        info!(code = %coupon.code, kind = ?coupon.kind, "coupon applied");

        Ok(coupon)
    }

    /// Take `coupon` off the cart, removing the free line it added.
    pub fn remove_coupon<S: CartStorage>(&self, coupon: &Coupon, store: &mut CartStore<S>) {
        if let Some(meal_id) = coupon.free_item() {
            store.revoke_free_item(meal_id);
        }

        debug!(code = %coupon.code, "coupon removed");
    }

    /// Look up the balance behind a gift card code.
    ///
    /// How much of the balance applies is worked out when the order is quoted.
    ///
    /// # Errors
    ///
    /// Returns [`GiftCardError::Invalid`] for an unknown code, [`GiftCardError::Exhausted`] for an
    /// empty card, or [`GiftCardError::Unavailable`] when the service fails.
    pub async fn check_gift_card(&self, code: &str) -> Result<GiftCardBalance, GiftCardError> {
        let code = code.trim();

        let check = self
            .gift_cards
            .check_balance(code)
            .await
            .map_err(|err| GiftCardError::Unavailable(err.to_string()))?;

        let (true, Some(gift_card_id)) = (check.valid, check.gift_card_id) else {
            return Err(GiftCardError::Invalid(code.to_string()));
        };

        if check.balance == 0 {
            return Err(GiftCardError::Exhausted(code.to_string()));
        }

        Ok(GiftCardBalance {
            code: code.to_string(),
            gift_card_id,
            balance: check.balance,
        })
    }
}
