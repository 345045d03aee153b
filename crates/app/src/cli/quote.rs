use std::io;

use clap::Args;
use jiff::civil::Date;
use larder::{
    cart::CartAction,
    items::{CartItem, ItemId, MealId},
    production::compute_production_date,
};
use larder_app::{
    checkout::{CheckoutOutcome, CheckoutRequest},
    context::AppContext,
    lookup::DEFAULT_DATE_HORIZON,
};

use super::{FulfilmentArgs, Store, reference_data};

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// Meal to add as id=quantity, e.g. lasagne=2; repeat for more meals
    #[arg(long = "meal", value_parser = parse_meal)]
    meals: Vec<(MealId, u32)>,

    #[command(flatten)]
    fulfilment: FulfilmentArgs,

    /// Delivery or collection date; the first bookable date when omitted
    #[arg(long)]
    date: Option<Date>,

    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,

    /// Gift card code to redeem
    #[arg(long)]
    gift_card: Option<String>,

    /// Place the order, confirming any payment straight away
    #[arg(long)]
    place: bool,
}

fn parse_meal(raw: &str) -> Result<(MealId, u32), String> {
    let (id, quantity) = raw.split_once('=').unwrap_or((raw, "1"));

    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid quantity for {id}: {error}"))?;

    if id.trim().is_empty() || quantity == 0 {
        return Err(format!("expected id=quantity with a positive quantity, got {raw}"));
    }

    Ok((MealId::from(id.trim()), quantity))
}

pub(crate) async fn run(
    args: QuoteArgs,
    context: &AppContext,
    store: &mut Store,
) -> Result<(), String> {
    add_meals(&args.meals, context, store).await?;

    let offers = context.offers();

    let coupon = match &args.coupon {
        Some(code) => Some(
            offers
                .apply_coupon(code, store)
                .await
                .map_err(|error| format!("coupon not applied: {error}"))?,
        ),
        None => None,
    };

    let gift_card = match &args.gift_card {
        Some(code) => Some(
            offers
                .check_gift_card(code)
                .await
                .map_err(|error| format!("gift card not accepted: {error}"))?,
        ),
        None => None,
    };

    let choice = args.fulfilment.choice()?;
    let data = reference_data(context).await?;
    let target = data
        .target(&choice)
        .map_err(|error| format!("invalid fulfilment choice: {error}"))?;

    let date = match args.date {
        Some(date) => Some(date),
        None => target
            .available_dates(context.clock.today(), DEFAULT_DATE_HORIZON)
            .first()
            .copied(),
    };

    let request = CheckoutRequest {
        target,
        date,
        coupon: coupon.as_ref(),
        gift_card: gift_card.as_ref(),
    };

    let checkout = context.checkout();

    let quote = checkout
        .quote(store, &request)
        .map_err(|error| format!("failed to price the cart: {error}"))?;

    quote
        .write_to(io::stdout().lock())
        .map_err(|error| format!("failed to write quote: {error}"))?;

    match (date, compute_production_date(date, store.items())) {
        (Some(date), Some(production)) => {
            println!("{} on {date}, produced on {production}", target.method());
        }
        _ => println!("no bookable date in the next {DEFAULT_DATE_HORIZON} days"),
    }

    if !args.place {
        return Ok(());
    }

    let outcome = checkout
        .checkout(store, request)
        .await
        .map_err(|error| format!("checkout failed: {error}"))?;

    let order_id = match outcome {
        CheckoutOutcome::Placed { order_id, .. } => order_id,
        CheckoutOutcome::PaymentRequired(pending) => {
            println!("payment_intent: {}", pending.intent.id);

            checkout
                .complete(store, pending)
                .await
                .map_err(|error| format!("failed to place order: {error}"))?
        }
    };

    println!("order_id: {order_id}");

    Ok(())
}

async fn add_meals(
    meals: &[(MealId, u32)],
    context: &AppContext,
    store: &mut Store,
) -> Result<(), String> {
    if meals.is_empty() {
        return Ok(());
    }

    let ids: Vec<MealId> = meals.iter().map(|(id, _)| id.clone()).collect();

    let availability = context
        .catalog
        .get_meal_availability(&ids)
        .await
        .map_err(|error| format!("failed to load meals: {error}"))?;

    for (id, quantity) in meals {
        let meal = availability
            .iter()
            .find(|meal| &meal.id == id && meal.is_active)
            .ok_or_else(|| format!("meal {id} is not available"))?;

        store.dispatch(CartAction::AddItem(CartItem::meal(
            ItemId::from(id),
            meal.name.clone(),
            meal.price,
            *quantity,
            meal.shelf_life_days,
        )));
    }

    Ok(())
}
