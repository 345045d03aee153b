use clap::Args;
use larder_app::{context::AppContext, lookup::DEFAULT_DATE_HORIZON};

use super::{FulfilmentArgs, reference_data};

#[derive(Debug, Args)]
pub(crate) struct OptionsArgs {
    #[command(flatten)]
    fulfilment: FulfilmentArgs,

    /// Number of days ahead to list
    #[arg(long, default_value_t = DEFAULT_DATE_HORIZON)]
    days: usize,
}

pub(crate) async fn run(args: OptionsArgs, context: &AppContext) -> Result<(), String> {
    let choice = args.fulfilment.choice()?;
    let data = reference_data(context).await?;

    let options = context
        .lookup()
        .options(&data, &choice, context.clock.today(), args.days)
        .map_err(|error| format!("no fulfilment options: {error}"))?;

    println!("method: {}", options.method);
    println!("destination: {}", options.destination);
    println!("fee: {}", options.fee);

    if options.available_dates.is_empty() {
        println!("no dates available in the next {} days", args.days);
        return Ok(());
    }

    for date in options.available_dates {
        println!("{} {date}", date.strftime("%a"));
    }

    Ok(())
}
