mod auth;
mod cart;
mod local;
mod products;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use craftshop_api::ApiClient;
use craftshop_cart::{CartStore, FavoritesStore};
use craftshop_catalog::CatalogCache;
use craftshop_core::AppConfig;
use craftshop_store::{FileStore, Storage};
use tracing_subscriber::EnvFilter;

use auth::AuthCommands;
use cart::{CartCommands, FavoritesCommands};
use local::LocalCommands;
use products::ProductsCommands;

#[derive(Debug, Parser)]
#[command(name = "craftshop")]
#[command(about = "Craftshop storefront client: catalog, cart and session from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse the catalog and manage products
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },
    /// Inspect and change the shopping cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Saved-for-later products
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
    /// Log in, sign up and inspect the session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// The locally persisted product collection
    Local {
        #[command(subcommand)]
        command: LocalCommands,
    },
    /// Print the catalog every time it changes, until interrupted
    Watch {
        /// Follow one product's detail instead of the whole listing
        #[arg(long)]
        product: Option<i64>,
        /// Resync interval in seconds; 0 disables polling (defaults to config)
        #[arg(long)]
        resync_secs: Option<u64>,
    },
}

/// Everything a command handler needs, built once from config.
pub(crate) struct App {
    pub config: AppConfig,
    pub catalog: CatalogCache,
    pub cart: CartStore,
    pub favorites: FavoritesStore,
}

impl App {
    fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let backend = FileStore::open(&config.data_dir, config.storage_quota_bytes)?;
        let storage = Storage::from_shared(Arc::new(backend));
        let api = ApiClient::from_config(&config)?;
        let catalog = CatalogCache::from_config(api, storage.clone(), &config);
        let cart = CartStore::new(storage.clone(), config.shipping_policy());
        let favorites = FavoritesStore::new(storage);
        Ok(Self {
            config,
            catalog,
            cart,
            favorites,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = craftshop_core::load_app_config()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("craftshop: run with --help to list commands");
        return Ok(());
    };

    tracing::debug!(env = %config.env, data_dir = %config.data_dir.display(), "starting");
    let app = App::from_config(config)?;

    match command {
        Commands::Products { command } => products::run(&app, command).await,
        Commands::Cart { command } => cart::run_cart(&app, command).await,
        Commands::Favorites { command } => cart::run_favorites(&app, command).await,
        Commands::Auth { command } => auth::run(&app, command).await,
        Commands::Local { command } => local::run(&app, &command),
        Commands::Watch {
            product,
            resync_secs,
        } => products::run_watch(&app, product, resync_secs).await,
    }
}

/// Truncate `text` to `max` characters, marking the cut with `...`.
pub(crate) fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests;
