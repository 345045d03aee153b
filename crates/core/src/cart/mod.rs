//! Cart
//!
//! [`CartStore`] owns the cart for a session. Every change goes through [`CartAction`] and the
//! pure [`reduce`] function; the store persists the item list whenever it changes.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::{debug, warn};

use crate::{
    items::{CartItem, ItemId, MealId},
    pricing::{self, PricingError},
    reorder::{ReorderContext, ReorderError, ReorderPlan},
};

pub mod storage;

pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};

/// Cart lines plus any pending reorder context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    /// Cart lines, in the order they were added
    pub items: Vec<CartItem>,

    /// Replacements still needed for a reorder
    pub reorder_context: Option<ReorderContext>,
}

impl CartState {
    /// The line with `id`.
    pub fn item(&self, id: &ItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Whether a line with `id` exists.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.item(id).is_some()
    }

    /// Sum of line totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on overflow.
    pub fn subtotal(
        &self,
        currency: &'static Currency,
    ) -> Result<Money<'static, Currency>, PricingError> {
        pricing::subtotal(&self.items, currency)
    }

    /// Total units per meal across meal lines, free items excluded.
    pub fn quantity_by_meal(&self) -> FxHashMap<MealId, u32> {
        let mut quantities = FxHashMap::default();

        for item in self.items.iter().filter(|item| !item.id.is_free_item()) {
            if let Some(meal) = item.meal_id() {
                let entry = quantities.entry(meal).or_insert(0_u32);
                *entry = entry.saturating_add(item.quantity);
            }
        }

        quantities
    }

    fn next_package_id(&self, id: &ItemId) -> ItemId {
        if !self.contains(id) {
            return id.clone();
        }

        (2_u32..)
            .map(|n| ItemId::new(format!("{id}#{n}")))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| id.clone())
    }
}

/// Changes to a cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Replace every line
    SetItems(Vec<CartItem>),

    /// Add a line, merging quantities with an existing meal line of the same id.
    /// Free-item lines are ignored; only [`CartAction::GrantFreeItem`] adds them.
    AddItem(CartItem),

    /// Add a package line; it never merges
    AddPackage(CartItem),

    /// Set a line's quantity; zero or less removes it. Free-item lines keep a quantity of one.
    UpdateQuantity {
        /// Line to change
        id: ItemId,
        /// New quantity
        quantity: i64,
    },

    /// Remove a line
    RemoveItem(ItemId),

    /// Remove every line and any reorder context
    ClearCart,

    /// Set or clear the reorder context
    SetReorderContext(Option<ReorderContext>),

    /// Record the replacement chosen for an unavailable reorder item
    RecordReplacement {
        /// Unavailable line from the original order
        unavailable: ItemId,
        /// Line that replaces it
        replacement: ItemId,
    },

    /// Add a coupon's free item unless it is already present
    GrantFreeItem(CartItem),
}

/// What the store must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEffect {
    /// Nothing
    None,

    /// The item list changed and must be saved
    Persist,
}

fn add_package(state: &mut CartState, mut item: CartItem) -> CartEffect {
    item.id = state.next_package_id(&item.id);
    state.items.push(item);

    CartEffect::Persist
}

fn add_item(state: &mut CartState, item: CartItem) -> CartEffect {
    if item.quantity == 0 || item.id.is_free_item() {
        return CartEffect::None;
    }

    if item.is_package() {
        return add_package(state, item);
    }

    match state
        .items
        .iter_mut()
        .find(|existing| existing.id == item.id && !existing.is_package())
    {
        Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
        None => state.items.push(item),
    }

    CartEffect::Persist
}

/// Apply `action` to `state`.
///
/// Transitions never fail; an action that does not apply leaves the state unchanged.
pub fn reduce(state: &mut CartState, action: CartAction) -> CartEffect {
    match action {
        CartAction::SetItems(items) => {
            state.items = items.into_iter().filter(|item| item.quantity > 0).collect();

            CartEffect::Persist
        }
        CartAction::AddItem(item) => add_item(state, item),
        CartAction::AddPackage(item) => add_package(state, item),
        CartAction::UpdateQuantity { id, quantity } => {
            if !state.contains(&id) || (id.is_free_item() && quantity > 0) {
                return CartEffect::None;
            }

            if quantity <= 0 {
                state.items.retain(|item| item.id != id);
            } else if let Some(item) = state.items.iter_mut().find(|item| item.id == id) {
                item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            }

            CartEffect::Persist
        }
        CartAction::RemoveItem(id) => {
            let before = state.items.len();
            state.items.retain(|item| item.id != id);

            if state.items.len() == before {
                CartEffect::None
            } else {
                CartEffect::Persist
            }
        }
        CartAction::ClearCart => {
            state.items.clear();
            state.reorder_context = None;

            CartEffect::Persist
        }
        CartAction::SetReorderContext(context) => {
            state.reorder_context = context;

            CartEffect::None
        }
        CartAction::RecordReplacement {
            unavailable,
            replacement,
        } => {
            if let Some(context) = state.reorder_context.as_mut() {
                context.record_replacement(&unavailable, replacement);

                if context.is_resolved() {
                    state.reorder_context = None;
                }
            }

            CartEffect::None
        }
        CartAction::GrantFreeItem(item) => {
            if state.contains(&item.id) {
                CartEffect::None
            } else {
                state.items.push(item);

                CartEffect::Persist
            }
        }
    }
}

/// The session's cart and its persistence.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Create a store, hydrating the items from `storage`.
    ///
    /// Unreadable or corrupt stored data starts an empty cart.
    pub fn new(storage: S) -> Self {
        let items = match storage.load() {
            Ok(items) => items.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "discarding unreadable stored cart");

                Vec::new()
            }
        };

        let state = CartState {
            items: items.into_iter().filter(|item| item.quantity > 0).collect(),
            reorder_context: None,
        };

        debug!(lines = state.items.len(), "hydrated cart");

        Self { state, storage }
    }

    /// Current state.
    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Current lines.
    pub fn items(&self) -> &[CartItem] {
        &self.state.items
    }

    /// Pending reorder context.
    pub fn reorder_context(&self) -> Option<&ReorderContext> {
        self.state.reorder_context.as_ref()
    }

    /// The backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Apply `action`, saving the items if they changed.
    ///
    /// Storage failures are logged and do not undo the transition.
    pub fn dispatch(&mut self, action: CartAction) {
        debug!(?action, "cart action");

        if reduce(&mut self.state, action) == CartEffect::Persist {
            self.persist();
        }
    }

    fn persist(&self) {
        if let Err(err) = self.storage.save(&self.state.items) {
            warn!(error = %err, "failed to save cart");
        }
    }

    /// Apply a reorder plan: its actions in order, then its context.
    pub fn apply_plan(&mut self, plan: ReorderPlan) {
        for action in plan.actions {
            self.dispatch(action);
        }

        self.dispatch(CartAction::SetReorderContext(plan.context));
    }

    /// Add `replacement` for the unavailable reorder item `unavailable`.
    ///
    /// The reorder context is cleared once every unavailable item is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::UnknownUnavailableItem`] and leaves the cart unchanged when
    /// `unavailable` is not still waiting for a replacement.
    pub fn resolve_replacement(
        &mut self,
        unavailable: &ItemId,
        replacement: CartItem,
    ) -> Result<(), ReorderError> {
        let pending = self.reorder_context().is_some_and(|context| {
            context
                .outstanding()
                .any(|item| &item.item_id == unavailable)
        });

        if !pending {
            return Err(ReorderError::UnknownUnavailableItem(unavailable.clone()));
        }

        let replacement_id = replacement.id.clone();

        self.dispatch(CartAction::AddItem(replacement));
        self.dispatch(CartAction::RecordReplacement {
            unavailable: unavailable.clone(),
            replacement: replacement_id,
        });

        Ok(())
    }

    /// Drop the pending reorder context, keeping the cart lines.
    pub fn abandon_reorder(&mut self) {
        self.dispatch(CartAction::SetReorderContext(None));
    }

    /// Add the free item a coupon grants. Repeated calls add it once.
    pub fn grant_free_item(&mut self, item: CartItem) {
        self.dispatch(CartAction::GrantFreeItem(item));
    }

    /// Remove the free item added for `meal`, leaving any line the customer added themselves.
    pub fn revoke_free_item(&mut self, meal: &MealId) {
        self.dispatch(CartAction::RemoveItem(ItemId::free_item(meal)));
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        items::{PackageSelection, PackageSnapshot},
        reorder::{HistoricalOrder, OrderId, OrderKind, UnavailableItem},
    };

    use super::*;

    fn meal(id: &str, quantity: u32) -> CartItem {
        CartItem::meal(ItemId::from(id), id, 500, quantity, 4)
    }

    fn package() -> CartItem {
        CartItem::package(
            ItemId::from("family-box"),
            4_500,
            3,
            PackageSnapshot {
                package_id: "family-box".to_string(),
                package_name: "Family Box".to_string(),
                selections: vec![PackageSelection {
                    meal_id: MealId::from("soup"),
                    meal_name: "Soup".to_string(),
                    quantity: 4,
                }],
            },
        )
    }

    fn context(ids: &[&str]) -> ReorderContext {
        let order = HistoricalOrder {
            id: OrderId::from("ord_1"),
            kind: OrderKind::Regular,
            lines: vec![],
            package: None,
            coupon_code: None,
        };

        ReorderContext::new(
            &order,
            ids.iter()
                .map(|id| UnavailableItem {
                    item_id: ItemId::from(*id),
                    item_name: (*id).to_string(),
                    requested_qty: 1,
                })
                .collect(),
        )
    }

    #[test]
    fn add_item_merges_meals_by_id() {
        let mut state = CartState::default();

        reduce(&mut state, CartAction::AddItem(meal("soup", 1)));
        reduce(&mut state, CartAction::AddItem(meal("soup", 2)));

        assert_eq!(state.items.len(), 1);
        assert_eq!(state.item(&ItemId::from("soup")).map(|i| i.quantity), Some(3));
    }

    #[test]
    fn packages_always_append_with_unique_ids() {
        let mut state = CartState::default();

        reduce(&mut state, CartAction::AddPackage(package()));
        reduce(&mut state, CartAction::AddItem(package()));
        reduce(&mut state, CartAction::AddPackage(package()));

        let ids: Vec<&str> = state.items.iter().map(|item| item.id.as_str()).collect();

        assert_eq!(ids, vec!["family-box", "family-box#2", "family-box#3"]);
    }

    #[test]
    fn zero_or_negative_quantity_removes_line() {
        let mut state = CartState::default();
        reduce(&mut state, CartAction::AddItem(meal("soup", 2)));
        reduce(&mut state, CartAction::AddItem(meal("stew", 2)));

        reduce(
            &mut state,
            CartAction::UpdateQuantity {
                id: ItemId::from("soup"),
                quantity: 0,
            },
        );
        reduce(
            &mut state,
            CartAction::UpdateQuantity {
                id: ItemId::from("stew"),
                quantity: -3,
            },
        );

        assert!(state.items.is_empty());
    }

    #[test]
    fn update_quantity_sets_value() {
        let mut state = CartState::default();
        reduce(&mut state, CartAction::AddItem(meal("soup", 2)));

        let effect = reduce(
            &mut state,
            CartAction::UpdateQuantity {
                id: ItemId::from("soup"),
                quantity: 5,
            },
        );

        assert_eq!(effect, CartEffect::Persist);
        assert_eq!(state.item(&ItemId::from("soup")).map(|i| i.quantity), Some(5));
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let mut state = CartState::default();

        assert_eq!(
            reduce(&mut state, CartAction::RemoveItem(ItemId::from("ghost"))),
            CartEffect::None
        );
        assert_eq!(
            reduce(
                &mut state,
                CartAction::UpdateQuantity {
                    id: ItemId::from("ghost"),
                    quantity: 2,
                }
            ),
            CartEffect::None
        );
    }

    #[test]
    fn free_item_is_granted_once() {
        let mut state = CartState::default();
        let brownie = MealId::from("brownie");

        reduce(&mut state, CartAction::AddItem(meal("brownie", 1)));
        reduce(
            &mut state,
            CartAction::GrantFreeItem(CartItem::free_item(&brownie, "Brownie", 5)),
        );
        reduce(
            &mut state,
            CartAction::GrantFreeItem(CartItem::free_item(&brownie, "Brownie", 5)),
        );

        assert_eq!(state.items.len(), 2);
        assert_eq!(
            state.item(&ItemId::free_item(&brownie)).map(|i| i.quantity),
            Some(1)
        );
        assert_eq!(state.quantity_by_meal().get(&brownie), Some(&1));
    }

    #[test]
    fn replacements_clear_context_when_resolved() {
        let mut state = CartState {
            items: vec![],
            reorder_context: Some(context(&["a", "b"])),
        };

        reduce(
            &mut state,
            CartAction::RecordReplacement {
                unavailable: ItemId::from("a"),
                replacement: ItemId::from("x"),
            },
        );
        assert!(state.reorder_context.is_some());

        reduce(
            &mut state,
            CartAction::RecordReplacement {
                unavailable: ItemId::from("b"),
                replacement: ItemId::from("y"),
            },
        );
        assert!(state.reorder_context.is_none());
    }

    #[test]
    fn clear_cart_drops_items_and_context() {
        let mut state = CartState {
            items: vec![meal("soup", 1)],
            reorder_context: Some(context(&["a"])),
        };

        reduce(&mut state, CartAction::ClearCart);

        assert_eq!(state, CartState::default());
    }

    #[test]
    fn store_persists_item_changes() -> TestResult {
        let mut store = CartStore::new(MemoryStorage::new());

        store.dispatch(CartAction::AddItem(meal("soup", 2)));

        let reloaded = CartStore::new(MemoryStorage::with_raw(
            store.storage().raw()?.ok_or("nothing saved")?,
        ));

        assert_eq!(reloaded.items(), store.items());
        assert_eq!(reloaded.state().subtotal(GBP)?, Money::from_minor(1_000, GBP));

        Ok(())
    }

    #[test]
    fn reorder_context_is_not_persisted() -> TestResult {
        let mut store = CartStore::new(MemoryStorage::new());

        store.dispatch(CartAction::AddItem(meal("soup", 1)));
        store.dispatch(CartAction::SetReorderContext(Some(context(&["a"]))));

        let raw = store.storage().raw()?.ok_or("nothing saved")?;
        let reloaded = CartStore::new(MemoryStorage::with_raw(raw));

        assert!(store.reorder_context().is_some());
        assert!(reloaded.reorder_context().is_none());

        Ok(())
    }

    #[test]
    fn corrupt_storage_hydrates_empty_cart() {
        let store = CartStore::new(MemoryStorage::with_raw("[[["));

        assert!(store.items().is_empty());
    }

    #[test]
    fn resolving_replacement_adds_line_and_clears_context() -> TestResult {
        let mut store = CartStore::new(MemoryStorage::new());
        store.dispatch(CartAction::SetReorderContext(Some(context(&["retired"]))));

        store.resolve_replacement(&ItemId::from("retired"), meal("new", 1))?;

        assert!(store.state().contains(&ItemId::from("new")));
        assert!(store.reorder_context().is_none());

        Ok(())
    }

    #[test]
    fn replacement_for_unlisted_item_is_refused() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.dispatch(CartAction::SetReorderContext(Some(context(&["retired"]))));

        let unlisted = store.resolve_replacement(&ItemId::from("not-listed"), meal("new", 2));

        assert_eq!(
            unlisted,
            Err(ReorderError::UnknownUnavailableItem(ItemId::from("not-listed")))
        );
        assert!(store.items().is_empty());
        assert!(store.reorder_context().is_some());
    }

    #[test]
    fn replacement_without_reorder_is_refused() {
        let mut store = CartStore::new(MemoryStorage::new());

        let result = store.resolve_replacement(&ItemId::from("retired"), meal("new", 1));

        assert!(
            matches!(result, Err(ReorderError::UnknownUnavailableItem(_))),
            "expected UnknownUnavailableItem, got {result:?}"
        );
        assert!(store.items().is_empty());
    }

    #[test]
    fn free_line_only_changes_through_grant_and_remove() {
        let mut state = CartState::default();
        let brownie = MealId::from("brownie");
        let free_id = ItemId::free_item(&brownie);

        reduce(
            &mut state,
            CartAction::GrantFreeItem(CartItem::free_item(&brownie, "Brownie", 5)),
        );

        let added = reduce(
            &mut state,
            CartAction::AddItem(CartItem::free_item(&brownie, "Brownie", 5)),
        );
        let raised = reduce(
            &mut state,
            CartAction::UpdateQuantity {
                id: free_id.clone(),
                quantity: 10,
            },
        );

        assert_eq!(added, CartEffect::None);
        assert_eq!(raised, CartEffect::None);
        assert_eq!(
            state.item(&free_id).map(|item| (item.quantity, item.price)),
            Some((1, 0))
        );

        reduce(
            &mut state,
            CartAction::UpdateQuantity {
                id: free_id.clone(),
                quantity: 0,
            },
        );

        assert!(!state.contains(&free_id));
    }

    #[test]
    fn revoking_free_item_keeps_customer_line() {
        let mut store = CartStore::new(MemoryStorage::new());
        let brownie = MealId::from("brownie");

        store.dispatch(CartAction::AddItem(meal("brownie", 2)));
        store.grant_free_item(CartItem::free_item(&brownie, "Brownie", 5));
        store.revoke_free_item(&brownie);

        assert_eq!(store.items(), &[meal("brownie", 2)]);
    }
}
