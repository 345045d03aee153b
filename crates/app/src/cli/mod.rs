use clap::{Args, Parser, Subcommand};
use larder::cart::{CartStorage, CartStore, FileStorage, MemoryStorage};
use larder_app::{
    config::AppConfig,
    context::AppContext,
    lookup::{FulfilmentChoice, ReferenceData},
    observability,
};

mod options;
mod quote;
mod reorder;

#[derive(Debug, Parser)]
#[command(name = "larder-app", about = "Larder storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the fee and bookable dates for a delivery postcode or collection point
    Options(options::OptionsArgs),

    /// Price meals in the cart and optionally place the order
    Quote(quote::QuoteArgs),

    /// Rebuild the cart from a past order
    Reorder(reorder::ReorderArgs),
}

type Store = CartStore<Box<dyn CartStorage>>;

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.config.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let context = AppContext::from_config(&self.config.store)
            .map_err(|error| format!("failed to start: {error}"))?;

        let storage: Box<dyn CartStorage> = match &self.config.store.cart_path {
            Some(path) => Box::new(FileStorage::new(path)),
            None => Box::new(MemoryStorage::new()),
        };

        let mut store = CartStore::new(storage);

        match self.command {
            Commands::Options(args) => options::run(args, &context).await,
            Commands::Quote(args) => quote::run(args, &context, &mut store).await,
            Commands::Reorder(args) => reorder::run(args, &context, &mut store).await,
        }
    }
}

/// Delivery postcode or collection point.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub(crate) struct FulfilmentArgs {
    /// Postcode to deliver to
    #[arg(long)]
    postcode: Option<String>,

    /// Collection point id to collect from
    #[arg(long = "collect")]
    collection_point: Option<String>,
}

impl FulfilmentArgs {
    pub(crate) fn choice(&self) -> Result<FulfilmentChoice, String> {
        match (&self.postcode, &self.collection_point) {
            (Some(postcode), None) => Ok(FulfilmentChoice::Delivery {
                postcode: postcode.clone(),
            }),
            (None, Some(point_id)) => Ok(FulfilmentChoice::Collection {
                point_id: point_id.clone(),
            }),
            _ => Err("choose either --postcode or --collect".to_string()),
        }
    }
}

pub(crate) async fn reference_data(context: &AppContext) -> Result<ReferenceData, String> {
    context
        .lookup()
        .refresh()
        .await
        .map_err(|error| format!("failed to load fulfilment options: {error}"))?
        .ok_or_else(|| "fulfilment lookup was superseded".to_string())
}
