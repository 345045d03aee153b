//! Reorder planning
//!
//! Maps a historical order onto the live catalog. Planning is pure: the caller fetches the order
//! and its meals' availability, and applies the resulting [`ReorderPlan`] to a cart.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::CartAction,
    items::{CartItem, ItemId, MealId, PackageSelection, PackageSnapshot},
};

/// Failures fetching the data a reorder needs. Nothing in the cart changes when one occurs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconciliationFetchError {
    /// No order with that id and kind exists.
    #[error("order {0} was not found")]
    OrderNotFound(OrderId),

    /// The order could not be loaded.
    #[error("order could not be loaded: {0}")]
    Order(String),

    /// Meal availability could not be loaded.
    #[error("meal availability could not be loaded: {0}")]
    Catalog(String),
}

/// Errors raised by reorder planning and its state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReorderError {
    /// The event is not valid in the current phase.
    #[error("cannot {event} while {from}")]
    InvalidTransition {
        /// Phase the event arrived in
        from: &'static str,
        /// Rejected event
        event: &'static str,
    },

    /// A package order has no package details.
    #[error("package order {0} has no package")]
    MissingPackage(OrderId),

    /// The item is not waiting for a replacement.
    #[error("{0} is not waiting for a replacement")]
    UnknownUnavailableItem(ItemId),

    /// Wrapped fetch error.
    #[error(transparent)]
    Fetch(#[from] ReconciliationFetchError),
}

/// Identifier of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create an order id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Regular orders hold individual meals; package orders hold one package of selected meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Individual meals
    Regular,

    /// A package
    Package,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Regular => f.write_str("regular"),
            OrderKind::Package => f.write_str("package"),
        }
    }
}

/// A meal line of a historical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Meal ordered
    pub meal_id: MealId,

    /// Meal name when ordered
    pub meal_name: String,

    /// Units ordered
    pub quantity: u32,

    /// Unit price when ordered, in minor units
    pub unit_price: u64,

    /// Shelf life when ordered
    pub shelf_life_days: u32,
}

/// Package details of a historical package order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPackage {
    /// Catalog id of the package
    pub package_id: String,

    /// Package name when ordered
    pub package_name: String,

    /// Package price in minor units
    pub price: u64,

    /// Shelf life of the package
    pub shelf_life_days: u32,
}

/// A previously placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalOrder {
    /// Order id
    pub id: OrderId,

    /// Order kind
    pub kind: OrderKind,

    /// Meal lines; for package orders, the package's selections
    pub lines: Vec<OrderLine>,

    /// Package details, for package orders
    #[serde(default)]
    pub package: Option<HistoricalPackage>,

    /// Coupon used on the order
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Live catalog state of a meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealAvailability {
    /// Meal id
    pub id: MealId,

    /// Current name
    pub name: String,

    /// Whether the meal can be ordered
    pub is_active: bool,

    /// Current unit price in minor units
    pub price: u64,

    /// Current shelf life
    pub shelf_life_days: u32,
}

/// A line of a historical order that cannot be reordered as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableItem {
    /// Line id the item had in the order
    pub item_id: ItemId,

    /// Name when ordered
    pub item_name: String,

    /// Units ordered
    pub requested_qty: u32,
}

/// Pending replacements for a partially available reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderContext {
    /// Order being reordered
    pub original_order_id: OrderId,

    /// Kind of that order
    pub original_order_kind: OrderKind,

    /// Lines that were unavailable
    pub unavailable_items: Vec<UnavailableItem>,

    /// Chosen replacement line for each unavailable item
    pub replacements: FxHashMap<ItemId, ItemId>,
}

impl ReorderContext {
    /// A context with no replacements chosen yet.
    pub fn new(order: &HistoricalOrder, unavailable_items: Vec<UnavailableItem>) -> Self {
        Self {
            original_order_id: order.id.clone(),
            original_order_kind: order.kind,
            unavailable_items,
            replacements: FxHashMap::default(),
        }
    }

    /// Record `replacement` for the unavailable item `unavailable`.
    ///
    /// Returns `false` and records nothing when `unavailable` is not one of the listed items.
    pub fn record_replacement(&mut self, unavailable: &ItemId, replacement: ItemId) -> bool {
        if !self
            .unavailable_items
            .iter()
            .any(|item| &item.item_id == unavailable)
        {
            return false;
        }

        self.replacements.insert(unavailable.clone(), replacement);

        true
    }

    /// Unavailable items still without a replacement.
    pub fn outstanding(&self) -> impl Iterator<Item = &UnavailableItem> {
        self.unavailable_items
            .iter()
            .filter(|item| !self.replacements.contains_key(&item.item_id))
    }

    /// Whether every unavailable item has a replacement.
    pub fn is_resolved(&self) -> bool {
        self.outstanding().next().is_none()
    }
}

/// Order lines split by live availability.
#[derive(Debug)]
pub struct Partition<'a> {
    /// Lines whose meal is active, with its live catalog state
    pub available: Vec<(&'a OrderLine, &'a MealAvailability)>,

    /// Lines whose meal is inactive or missing from the catalog
    pub unavailable: Vec<&'a OrderLine>,
}

impl Partition<'_> {
    /// Whether every line is available.
    pub fn is_fully_available(&self) -> bool {
        self.unavailable.is_empty()
    }
}

/// Split `order`'s lines into available and unavailable.
///
/// A meal missing from `availability` counts as unavailable.
pub fn partition<'a>(
    order: &'a HistoricalOrder,
    availability: &'a [MealAvailability],
) -> Partition<'a> {
    let by_id: FxHashMap<&MealId, &MealAvailability> =
        availability.iter().map(|meal| (&meal.id, meal)).collect();

    let mut available = Vec::new();
    let mut unavailable = Vec::new();

    for line in &order.lines {
        match by_id.get(&line.meal_id) {
            Some(meal) if meal.is_active => available.push((line, *meal)),
            _ => unavailable.push(line),
        }
    }

    Partition {
        available,
        unavailable,
    }
}

/// Cart changes that reconstruct an order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    /// Actions to dispatch, in order
    pub actions: Vec<CartAction>,

    /// Context to set when some lines were unavailable
    pub context: Option<ReorderContext>,

    /// Original coupon to re-validate, for fully available regular orders
    pub coupon_to_revalidate: Option<String>,
}

impl ReorderPlan {
    /// Whether the order could be reconstructed without replacements.
    pub fn is_fully_available(&self) -> bool {
        self.context.is_none()
    }
}

/// Plan the cart changes that reconstruct `order` from live `availability`.
///
/// Regular orders re-add each available meal one unit at a time at its live price. Package orders
/// add one package line holding the available selections. Unavailable lines are listed in a
/// [`ReorderContext`] with no replacements.
///
/// # Errors
///
/// Returns [`ReorderError::MissingPackage`] for a package order without package details.
pub fn plan(
    order: &HistoricalOrder,
    availability: &[MealAvailability],
) -> Result<ReorderPlan, ReorderError> {
    let partition = partition(order, availability);

    let actions = match order.kind {
        OrderKind::Regular => regular_actions(&partition),
        OrderKind::Package => {
            let package = order
                .package
                .as_ref()
                .ok_or_else(|| ReorderError::MissingPackage(order.id.clone()))?;

            package_action(package, &partition).into_iter().collect()
        }
    };

    let context = (!partition.is_fully_available()).then(|| {
        ReorderContext::new(
            order,
            partition
                .unavailable
                .iter()
                .map(|line| UnavailableItem {
                    item_id: ItemId::from(&line.meal_id),
                    item_name: line.meal_name.clone(),
                    requested_qty: line.quantity,
                })
                .collect(),
        )
    });

    let coupon_to_revalidate = match (order.kind, &context) {
        (OrderKind::Regular, None) => order.coupon_code.clone(),
        _ => None,
    };

    Ok(ReorderPlan {
        actions,
        context,
        coupon_to_revalidate,
    })
}

fn regular_actions(partition: &Partition<'_>) -> Vec<CartAction> {
    partition
        .available
        .iter()
        .flat_map(|(line, meal)| {
            let unit = CartItem::meal(
                ItemId::from(&meal.id),
                meal.name.clone(),
                meal.price,
                1,
                meal.shelf_life_days,
            );

            (0..line.quantity).map(move |_| CartAction::AddItem(unit.clone()))
        })
        .collect()
}

fn package_action(package: &HistoricalPackage, partition: &Partition<'_>) -> Option<CartAction> {
    if partition.available.is_empty() {
        return None;
    }

    let snapshot = PackageSnapshot {
        package_id: package.package_id.clone(),
        package_name: package.package_name.clone(),
        selections: partition
            .available
            .iter()
            .map(|(line, meal)| PackageSelection {
                meal_id: meal.id.clone(),
                meal_name: meal.name.clone(),
                quantity: line.quantity,
            })
            .collect(),
    };

    Some(CartAction::AddPackage(CartItem::package(
        ItemId::new(package.package_id.clone()),
        package.price,
        package.shelf_life_days,
        snapshot,
    )))
}

/// Events driving [`ReorderPhase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderEvent {
    /// Start fetching an order
    Start,

    /// The order and its availability were fetched
    Fetched {
        /// Whether every line is available
        fully_available: bool,
    },

    /// Fetching failed
    FetchFailed(String),

    /// The plan was applied to the cart
    Applied,

    /// Every unavailable item has a replacement
    ReplacementsResolved,

    /// The customer gave up on replacing items
    Abandoned,
}

impl ReorderEvent {
    fn name(&self) -> &'static str {
        match self {
            ReorderEvent::Start => "start",
            ReorderEvent::Fetched { .. } => "finish fetching",
            ReorderEvent::FetchFailed(_) => "fail fetching",
            ReorderEvent::Applied => "apply",
            ReorderEvent::ReplacementsResolved => "resolve replacements",
            ReorderEvent::Abandoned => "abandon",
        }
    }
}

/// Progress of a reorder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReorderPhase {
    /// Nothing in progress
    #[default]
    Idle,

    /// Loading the order and availability
    Fetching,

    /// Every line can be reordered
    FullyAvailable,

    /// Some lines need replacing
    PartiallyAvailable,

    /// Available lines applied, waiting for replacements
    AwaitingReplacement,

    /// The reorder is in the cart
    Applied,

    /// Fetching failed
    Failed(String),
}

impl ReorderPhase {
    /// Short name of the phase.
    pub fn name(&self) -> &'static str {
        match self {
            ReorderPhase::Idle => "idle",
            ReorderPhase::Fetching => "fetching",
            ReorderPhase::FullyAvailable => "fully available",
            ReorderPhase::PartiallyAvailable => "partially available",
            ReorderPhase::AwaitingReplacement => "awaiting replacement",
            ReorderPhase::Applied => "applied",
            ReorderPhase::Failed(_) => "failed",
        }
    }

    /// The phase after `event`.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::InvalidTransition`] when `event` is not valid in this phase.
    pub fn on(&self, event: ReorderEvent) -> Result<ReorderPhase, ReorderError> {
        let next = match (self, &event) {
            (
                ReorderPhase::Idle | ReorderPhase::Applied | ReorderPhase::Failed(_),
                ReorderEvent::Start,
            ) => ReorderPhase::Fetching,
            (ReorderPhase::Fetching, ReorderEvent::Fetched { fully_available }) => {
                if *fully_available {
                    ReorderPhase::FullyAvailable
                } else {
                    ReorderPhase::PartiallyAvailable
                }
            }
            (ReorderPhase::Fetching, ReorderEvent::FetchFailed(message)) => {
                ReorderPhase::Failed(message.clone())
            }
            (ReorderPhase::FullyAvailable, ReorderEvent::Applied)
            | (ReorderPhase::AwaitingReplacement, ReorderEvent::ReplacementsResolved) => {
                ReorderPhase::Applied
            }
            (ReorderPhase::PartiallyAvailable, ReorderEvent::Applied) => {
                ReorderPhase::AwaitingReplacement
            }
            (ReorderPhase::AwaitingReplacement, ReorderEvent::Abandoned) => ReorderPhase::Idle,
            _ => {
                return Err(ReorderError::InvalidTransition {
                    from: self.name(),
                    event: event.name(),
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn line(meal: &str, quantity: u32) -> OrderLine {
        OrderLine {
            meal_id: MealId::from(meal),
            meal_name: meal.to_uppercase(),
            quantity,
            unit_price: 500,
            shelf_life_days: 4,
        }
    }

    fn meal(id: &str, is_active: bool) -> MealAvailability {
        MealAvailability {
            id: MealId::from(id),
            name: id.to_uppercase(),
            is_active,
            price: 650,
            shelf_life_days: 3,
        }
    }

    fn regular(lines: Vec<OrderLine>) -> HistoricalOrder {
        HistoricalOrder {
            id: OrderId::from("ord_1"),
            kind: OrderKind::Regular,
            lines,
            package: None,
            coupon_code: Some("WELCOME".to_string()),
        }
    }

    fn package_order(lines: Vec<OrderLine>) -> HistoricalOrder {
        HistoricalOrder {
            id: OrderId::from("ord_2"),
            kind: OrderKind::Package,
            lines,
            package: Some(HistoricalPackage {
                package_id: "family-box".to_string(),
                package_name: "Family Box".to_string(),
                price: 4_500,
                shelf_life_days: 3,
            }),
            coupon_code: Some("WELCOME".to_string()),
        }
    }

    #[test]
    fn missing_and_inactive_meals_are_unavailable() {
        let order = regular(vec![line("a", 1), line("b", 1), line("c", 1)]);
        let availability = [meal("a", true), meal("b", false)];

        let partition = partition(&order, &availability);

        assert_eq!(partition.available.len(), 1);
        assert_eq!(
            partition
                .unavailable
                .iter()
                .map(|line| line.meal_id.as_str())
                .collect::<Vec<_>>(),
            vec!["b", "c"]
        );
    }

    #[test]
    fn fully_available_regular_order_adds_units_and_revalidates_coupon() -> TestResult {
        let order = regular(vec![line("a", 2), line("b", 1)]);
        let availability = [meal("a", true), meal("b", true)];

        let plan = plan(&order, &availability)?;

        assert!(plan.is_fully_available());
        assert_eq!(plan.actions.len(), 3);
        assert!(plan.actions.iter().all(|action| matches!(
            action,
            CartAction::AddItem(item) if item.quantity == 1 && item.price == 650
        )));
        assert_eq!(plan.coupon_to_revalidate.as_deref(), Some("WELCOME"));

        Ok(())
    }

    #[test]
    fn partially_available_regular_order_lists_retired_lines() -> TestResult {
        let order = regular(vec![line("a", 2), line("b", 3)]);
        let availability = [meal("a", true), meal("b", false)];

        let plan = plan(&order, &availability)?;
        let context = plan.context.ok_or("expected a reorder context")?;

        assert_eq!(plan.actions.len(), 2);
        assert_eq!(
            context.unavailable_items,
            vec![UnavailableItem {
                item_id: ItemId::from("b"),
                item_name: "B".to_string(),
                requested_qty: 3,
            }]
        );
        assert!(context.replacements.is_empty());
        assert_eq!(plan.coupon_to_revalidate, None);

        Ok(())
    }

    #[test]
    fn package_order_becomes_single_package_line() -> TestResult {
        let order = package_order(vec![line("a", 2), line("b", 2)]);
        let availability = [meal("a", true), meal("b", true)];

        let plan = plan(&order, &availability)?;

        let [CartAction::AddPackage(item)] = plan.actions.as_slice() else {
            return Err(format!("expected one package line, got {:?}", plan.actions).into());
        };

        assert_eq!(item.price, 4_500);
        assert_eq!(item.package_snapshot().map(PackageSnapshot::portions), Some(4));
        assert_eq!(plan.coupon_to_revalidate, None);

        Ok(())
    }

    #[test]
    fn partially_available_package_keeps_available_selections() -> TestResult {
        let order = package_order(vec![line("a", 2), line("b", 2)]);
        let availability = [meal("a", true)];

        let plan = plan(&order, &availability)?;

        let [CartAction::AddPackage(item)] = plan.actions.as_slice() else {
            return Err(format!("expected one package line, got {:?}", plan.actions).into());
        };

        let selections = item
            .package_snapshot()
            .map(|snapshot| snapshot.selections.clone())
            .unwrap_or_default();

        assert_eq!(selections.len(), 1);
        assert_eq!(
            plan.context.map(|context| context.unavailable_items.len()),
            Some(1)
        );

        Ok(())
    }

    #[test]
    fn package_order_without_package_is_rejected() {
        let mut order = package_order(vec![line("a", 1)]);
        order.package = None;

        assert_eq!(
            plan(&order, &[meal("a", true)]),
            Err(ReorderError::MissingPackage(OrderId::from("ord_2")))
        );
    }

    #[test]
    fn context_resolves_once_every_item_is_replaced() {
        let order = regular(vec![line("a", 1), line("b", 1)]);
        let mut context = ReorderContext::new(
            &order,
            vec![
                UnavailableItem {
                    item_id: ItemId::from("a"),
                    item_name: "A".to_string(),
                    requested_qty: 1,
                },
                UnavailableItem {
                    item_id: ItemId::from("b"),
                    item_name: "B".to_string(),
                    requested_qty: 1,
                },
            ],
        );

        assert!(!context.record_replacement(&ItemId::from("z"), ItemId::from("y")));
        assert!(context.record_replacement(&ItemId::from("a"), ItemId::from("x")));
        assert!(!context.is_resolved());
        assert!(context.record_replacement(&ItemId::from("b"), ItemId::from("x")));
        assert!(context.is_resolved());
    }

    #[test]
    fn phases_follow_the_happy_paths() -> TestResult {
        let phase = ReorderPhase::Idle.on(ReorderEvent::Start)?;
        let full = phase.on(ReorderEvent::Fetched {
            fully_available: true,
        })?;

        assert_eq!(full.on(ReorderEvent::Applied)?, ReorderPhase::Applied);

        let partial = phase.on(ReorderEvent::Fetched {
            fully_available: false,
        })?;
        let awaiting = partial.on(ReorderEvent::Applied)?;

        assert_eq!(awaiting, ReorderPhase::AwaitingReplacement);
        assert_eq!(
            awaiting.on(ReorderEvent::ReplacementsResolved)?,
            ReorderPhase::Applied
        );
        assert_eq!(awaiting.on(ReorderEvent::Abandoned)?, ReorderPhase::Idle);

        Ok(())
    }

    #[test]
    fn failed_fetch_can_be_retried() -> TestResult {
        let failed = ReorderPhase::Fetching.on(ReorderEvent::FetchFailed("timeout".to_string()))?;

        assert_eq!(failed, ReorderPhase::Failed("timeout".to_string()));
        assert_eq!(failed.on(ReorderEvent::Start)?, ReorderPhase::Fetching);

        Ok(())
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        assert_eq!(
            ReorderPhase::Idle.on(ReorderEvent::Applied),
            Err(ReorderError::InvalidTransition {
                from: "idle",
                event: "apply",
            })
        );
        assert!(ReorderPhase::Fetching.on(ReorderEvent::Start).is_err());
        assert!(ReorderPhase::Applied.on(ReorderEvent::Abandoned).is_err());
    }
}
