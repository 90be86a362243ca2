//! Catalog command handlers: listing, detail, admin writes and the watch loop.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use craftshop_api::{ImageUpload, NewReview};
use craftshop_catalog::query::{
    average_rating, price_bounds, rating_distribution, related_products,
};
use craftshop_catalog::{
    spawn_product_watch, spawn_watch, CatalogWatch, ListingQuery, ResyncInterval, SortOrder,
};
use craftshop_core::{Category, Product, ProductDraft, ProductPatch};
use rust_decimal::Decimal;

use crate::{ellipsize, App};

/// Sub-commands available under `products`.
#[derive(Debug, Subcommand)]
pub enum ProductsCommands {
    /// List products, filtered, sorted and paged like the shop page
    List {
        /// Restrict to a category (repeatable)
        #[arg(long = "category")]
        categories: Vec<Category>,
        /// Lowest price to include
        #[arg(long)]
        min_price: Option<Decimal>,
        /// Highest price to include
        #[arg(long)]
        max_price: Option<Decimal>,
        /// popularity, price-low-to-high, price-high-to-low or newest
        #[arg(long, default_value = "popularity")]
        sort: SortOrder,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "6")]
        per_page: usize,
        /// Print the normalized records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one product with its reviews and related products
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Photo Frames")]
        category: Category,
        #[arg(long)]
        price: Decimal,
        /// Image URL or data URI
        #[arg(long)]
        image: String,
        #[arg(long)]
        alt: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        dimensions: Option<String>,
        #[arg(long)]
        material: Option<String>,
        #[arg(long)]
        weight: Option<String>,
        #[arg(long)]
        out_of_stock: bool,
    },
    /// Change selected fields of a product
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        in_stock: Option<bool>,
    },
    /// Delete a product
    Delete { id: i64 },
    /// Add a review to a product
    Review {
        id: i64,
        /// Stars, 1 to 5
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        comment: String,
        /// Reviewer name; defaults to the signed-in user
        #[arg(long)]
        user_name: Option<String>,
    },
    /// Upload an image file, or a data URI, and print its URL
    Upload {
        #[arg(long, conflicts_with = "data_uri", required_unless_present = "data_uri")]
        file: Option<PathBuf>,
        #[arg(long)]
        data_uri: Option<String>,
    },
}

pub(crate) async fn run(app: &App, command: ProductsCommands) -> anyhow::Result<()> {
    match command {
        ProductsCommands::List {
            categories,
            min_price,
            max_price,
            sort,
            page,
            per_page,
            json,
        } => {
            let products = app.catalog.list_products().await;
            let (low, high) = price_bounds(&products);
            let price_range = match (min_price, max_price) {
                (None, None) => None,
                (min, max) => Some((min.unwrap_or(low), max.unwrap_or(high))),
            };
            let query = ListingQuery {
                categories,
                price_range,
                sort,
                page,
                per_page,
            };
            let page = query.apply(&products);
            if json {
                println!("{}", serde_json::to_string_pretty(&page.items)?);
                return Ok(());
            }
            print_table(&page.items);
            println!(
                "page {}/{} ({} products, prices {low}-{high})",
                page.page, page.total_pages, page.total_items
            );
            Ok(())
        }
        ProductsCommands::Show { id, json } => {
            let product = app
                .catalog
                .get_product(id)
                .await
                .ok_or_else(|| anyhow::anyhow!("product {id} not found"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&product)?);
                return Ok(());
            }
            let all = app.catalog.list_products().await;
            print_detail(&product, &related_products(&product, &all));
            Ok(())
        }
        ProductsCommands::Create {
            name,
            category,
            price,
            image,
            alt,
            description,
            dimensions,
            material,
            weight,
            out_of_stock,
        } => {
            let draft = ProductDraft {
                alt: alt.unwrap_or_else(|| name.clone()),
                name,
                category,
                price,
                image,
                description,
                main_description: None,
                sub_descriptions: Vec::new(),
                dimensions,
                material,
                weight,
                in_stock: Some(!out_of_stock),
                thumbnails: Vec::new(),
                reviews: Vec::new(),
                rating: None,
            };
            let product = app.catalog.create_product(&draft).await?;
            println!("created product {} ({})", product.id, product.name);
            Ok(())
        }
        ProductsCommands::Update {
            id,
            name,
            category,
            price,
            image,
            description,
            in_stock,
        } => {
            let patch = ProductPatch {
                name,
                category,
                price,
                image,
                description,
                in_stock,
                ..ProductPatch::default()
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            let product = app.catalog.update_product(id, &patch).await?;
            println!("updated product {} ({})", product.id, product.name);
            Ok(())
        }
        ProductsCommands::Delete { id } => {
            app.catalog.delete_product(id).await?;
            println!("deleted product {id}");
            Ok(())
        }
        ProductsCommands::Review {
            id,
            rating,
            comment,
            user_name,
        } => {
            let user_name = user_name
                .or_else(|| app.catalog.session().user().map(|u| u.full_name))
                .unwrap_or_default();
            let review = NewReview {
                user_name,
                rating,
                comment,
            };
            let product = app.catalog.add_review(id, &review).await?;
            println!(
                "{} now has {} reviews, rated {:.2}",
                product.name,
                product.reviews.len(),
                average_rating(&product)
            );
            Ok(())
        }
        ProductsCommands::Upload { file, data_uri } => {
            let upload = match (file, data_uri) {
                (Some(path), _) => image_file(&path)?,
                (None, Some(uri)) => ImageUpload::DataUri(uri),
                (None, None) => anyhow::bail!("pass --file or --data-uri"),
            };
            let url = app.catalog.upload_image(upload).await?;
            println!("{}", ellipsize(&url, 120));
            Ok(())
        }
    }
}

/// Print the catalog, or one product, once and then again on every change,
/// until Ctrl-C.
pub(crate) async fn run_watch(
    app: &App,
    product: Option<i64>,
    resync_secs: Option<u64>,
) -> anyhow::Result<()> {
    let interval = ResyncInterval::from_secs(resync_secs.or(app.config.catalog_resync_secs));
    match product {
        Some(id) => {
            let mut watch = spawn_product_watch(app.catalog.clone(), id, interval);
            println!("watching product {id} ({interval:?}); Ctrl-C to stop");
            follow(&mut watch, |product| match product {
                Some(product) => {
                    let all = app.catalog.local().all();
                    print_detail(product, &related_products(product, &all));
                }
                None => println!("product {id} not found"),
            })
            .await
        }
        None => {
            let mut watch = spawn_watch(app.catalog.clone(), interval);
            println!("watching catalog ({interval:?}); Ctrl-C to stop");
            follow(&mut watch, |products| print_table(products)).await
        }
    }
}

async fn follow<T: Clone>(
    watch: &mut CatalogWatch<T>,
    print: impl Fn(&T),
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            next = watch.changed() => {
                let Some(value) = next else {
                    anyhow::bail!("catalog watch stopped unexpectedly");
                };
                println!();
                print(&value);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                tracing::info!("received ctrl-c, stopping watch");
                return Ok(());
            }
        }
    }
}

fn image_file(path: &std::path::Path) -> anyhow::Result<ImageUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("webp") => Some("image/webp"),
        _ => None,
    };
    Ok(ImageUpload::File {
        file_name,
        bytes,
        mime: mime.map(str::to_string),
    })
}

fn print_table(products: &[Product]) {
    if products.is_empty() {
        println!("no products");
        return;
    }
    println!(
        "{:<6}{:<32}{:<18}{:>10}  {:<7}{:<6}",
        "ID", "NAME", "CATEGORY", "PRICE", "RATING", "STOCK"
    );
    for p in products {
        println!(
            "{:<6}{:<32}{:<18}{:>10}  {:<7.1}{:<6}",
            p.id,
            ellipsize(&p.name, 28),
            p.category.label(),
            p.price.round_dp(2),
            p.rating,
            if p.in_stock { "yes" } else { "no" }
        );
    }
}

fn print_detail(product: &Product, related: &[Product]) {
    println!("{} (#{})", product.name, product.id);
    println!("{} | {} | rating {:.2}", product.category, product.price.round_dp(2), average_rating(product));
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    for sub in &product.sub_descriptions {
        println!();
        println!("{}", sub.title);
        println!("{}", sub.body);
    }
    for (label, value) in [
        ("Dimensions", &product.dimensions),
        ("Material", &product.material),
        ("Weight", &product.weight),
    ] {
        if let Some(value) = value {
            println!("{label}: {value}");
        }
    }
    println!("In stock: {}", if product.in_stock { "yes" } else { "no" });

    let distribution = rating_distribution(product);
    println!();
    println!("Reviews ({})", product.reviews.len());
    for (stars, percent) in distribution.iter().enumerate().rev() {
        println!("  {} star: {percent:>5.1}%", stars + 1);
    }
    for review in &product.reviews {
        println!(
            "  [{}] {} ({}): {}",
            review.rating,
            review.user_name,
            review.date,
            ellipsize(&review.comment, 80)
        );
    }

    if !related.is_empty() {
        println!();
        println!("Related");
        for p in related {
            println!("  #{:<5}{} ({})", p.id, p.name, p.price.round_dp(2));
        }
    }
}
