use clap::{Args, ValueEnum};
use larder::{
    items::{CartItem, ItemId, MealId},
    reorder::{OrderId, OrderKind},
};
use larder_app::{context::AppContext, reconciler::CouponAdvisory};

use super::Store;

#[derive(Debug, Args)]
pub(crate) struct ReorderArgs {
    /// Order to rebuild the cart from
    #[arg(long)]
    order: String,

    /// Kind of order
    #[arg(long, value_enum, default_value_t = Kind::Regular)]
    kind: Kind,

    /// Replace an unavailable line with a meal, as line=meal; repeat for more lines
    #[arg(long = "replace", value_parser = parse_replacement)]
    replacements: Vec<(ItemId, MealId)>,

    /// Keep the available lines and stop waiting for replacements
    #[arg(long, conflicts_with = "replacements")]
    abandon: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Regular,
    Package,
}

impl From<Kind> for OrderKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Regular => OrderKind::Regular,
            Kind::Package => OrderKind::Package,
        }
    }
}

fn parse_replacement(raw: &str) -> Result<(ItemId, MealId), String> {
    match raw.split_once('=') {
        Some((line, meal)) if !line.trim().is_empty() && !meal.trim().is_empty() => {
            Ok((ItemId::new(line.trim()), MealId::from(meal.trim())))
        }
        _ => Err(format!("expected line=meal, got {raw}")),
    }
}

pub(crate) async fn run(
    args: ReorderArgs,
    context: &AppContext,
    store: &mut Store,
) -> Result<(), String> {
    let mut reconciler = context.reconciler();

    let outcome = reconciler
        .reorder(&OrderId::new(args.order.clone()), args.kind.into(), store)
        .await
        .map_err(|error| format!("failed to reorder {}: {error}", args.order))?;

    match &outcome.coupon {
        Some(CouponAdvisory::StillValid(code)) => println!("coupon {code} still applies"),
        Some(CouponAdvisory::NoLongerValid { code, reason }) => {
            println!("coupon {code} no longer applies: {reason}");
        }
        Some(CouponAdvisory::Unchecked { code, reason }) => {
            println!("coupon {code} could not be checked: {reason}");
        }
        None => {}
    }

    if !args.replacements.is_empty() {
        let ids: Vec<MealId> = args.replacements.iter().map(|(_, meal)| meal.clone()).collect();

        let availability = context
            .catalog
            .get_meal_availability(&ids)
            .await
            .map_err(|error| format!("failed to load replacements: {error}"))?;

        for (line, meal_id) in &args.replacements {
            let meal = availability
                .iter()
                .find(|meal| &meal.id == meal_id && meal.is_active)
                .ok_or_else(|| format!("meal {meal_id} is not available"))?;

            let requested = outcome
                .unavailable
                .iter()
                .find(|item| &item.item_id == line)
                .map_or(1, |item| item.requested_qty);

            reconciler
                .replace(
                    store,
                    line,
                    CartItem::meal(
                        ItemId::from(meal_id),
                        meal.name.clone(),
                        meal.price,
                        requested,
                        meal.shelf_life_days,
                    ),
                )
                .map_err(|error| format!("failed to replace {line}: {error}"))?;
        }
    }

    if args.abandon {
        reconciler
            .abandon(store)
            .map_err(|error| format!("failed to abandon the reorder: {error}"))?;
    }

    for item in store.items() {
        println!("{} x {} ({})", item.quantity, item.name, item.id);
    }

    if let Some(pending) = store.reorder_context() {
        for item in &pending.unavailable_items {
            println!(
                "unavailable: {} x {} ({})",
                item.requested_qty, item.item_name, item.item_id
            );
        }
    }

    println!("phase: {}", reconciler.phase().name());

    Ok(())
}
