//! Cart and favorites command handlers.

use clap::Subcommand;
use craftshop_core::CartItem;

use crate::{ellipsize, App};

/// Sub-commands available under `cart`.
#[derive(Debug, Subcommand)]
pub enum CartCommands {
    /// Show cart lines and totals
    Show,
    /// Add a product to the cart
    Add {
        id: i64,
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
    /// Set the quantity of a cart line; below 1 removes it
    Set {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a product from the cart
    Remove { id: i64 },
    /// Empty the cart
    Clear,
}

/// Sub-commands available under `favorites`.
#[derive(Debug, Subcommand)]
pub enum FavoritesCommands {
    /// List saved products
    List,
    /// Save a product, or unsave it if already saved
    Toggle { id: i64 },
    /// Unsave a product
    Remove { id: i64 },
}

pub(crate) async fn run_cart(app: &App, command: CartCommands) -> anyhow::Result<()> {
    match command {
        CartCommands::Show => {}
        CartCommands::Add { id, quantity } => {
            let product = app
                .catalog
                .get_product(id)
                .await
                .ok_or_else(|| anyhow::anyhow!("product {id} not found"))?;
            if !product.in_stock {
                tracing::warn!(id, "adding an out-of-stock product");
            }
            app.cart.add_item(product.to_cart_item(quantity))?;
        }
        CartCommands::Set { id, quantity } => {
            app.cart.update_quantity(id, quantity)?;
        }
        CartCommands::Remove { id } => {
            app.cart.remove_item(id)?;
        }
        CartCommands::Clear => app.cart.clear()?,
    }
    print_cart(app);
    Ok(())
}

pub(crate) async fn run_favorites(app: &App, command: FavoritesCommands) -> anyhow::Result<()> {
    match command {
        FavoritesCommands::List => {}
        FavoritesCommands::Toggle { id } => {
            let product = app
                .catalog
                .get_product(id)
                .await
                .ok_or_else(|| anyhow::anyhow!("product {id} not found"))?;
            let saved = app.favorites.toggle(product.to_favorite())?;
            println!(
                "{} {}",
                product.name,
                if saved { "saved" } else { "removed from favorites" }
            );
        }
        FavoritesCommands::Remove { id } => {
            if !app.favorites.remove(id)? {
                println!("product {id} was not a favorite");
            }
        }
    }

    let favorites = app.favorites.list();
    if favorites.is_empty() {
        println!("no favorites");
        return Ok(());
    }
    println!("{:<6}{:<32}{:>10}", "ID", "NAME", "PRICE");
    for item in &favorites {
        println!(
            "{:<6}{:<32}{:>10}",
            item.id,
            ellipsize(&item.name, 28),
            item.price.round_dp(2)
        );
    }
    Ok(())
}

fn print_cart(app: &App) {
    let items = app.cart.items();
    if items.is_empty() {
        println!("cart is empty");
        return;
    }
    println!("{:<6}{:<32}{:>10}{:>6}{:>12}", "ID", "NAME", "PRICE", "QTY", "LINE");
    for item in &items {
        print_line(item);
    }
    let totals = app.cart.totals();
    println!();
    println!("items:    {}", app.cart.item_count());
    println!("subtotal: {}", totals.subtotal.round_dp(2));
    if totals.shipping.is_zero() {
        println!("shipping: free");
    } else {
        println!(
            "shipping: {} (add {} more for free shipping)",
            totals.shipping.round_dp(2),
            app.cart.amount_until_free_shipping().round_dp(2)
        );
    }
    println!("total:    {}", totals.total.round_dp(2));
}

fn print_line(item: &CartItem) {
    println!(
        "{:<6}{:<32}{:>10}{:>6}{:>12}",
        item.id,
        ellipsize(&item.name, 28),
        item.price.round_dp(2),
        item.quantity,
        item.line_total().round_dp(2)
    );
}
