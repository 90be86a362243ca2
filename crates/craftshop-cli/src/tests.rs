use rust_decimal::Decimal;

use super::*;
use craftshop_catalog::SortOrder;
use craftshop_core::Category;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["craftshop"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn products_list_defaults() {
    let cli = Cli::try_parse_from(["craftshop", "products", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Products {
            command: ProductsCommands::List {
                ref categories,
                min_price: None,
                max_price: None,
                sort: SortOrder::Popularity,
                page: 1,
                per_page: 6,
                json: false,
            }
        }) if categories.is_empty()
    ));
}

#[test]
fn products_list_with_filters() {
    let cli = Cli::try_parse_from([
        "craftshop",
        "products",
        "list",
        "--category",
        "idols",
        "--category",
        "Photo Frames",
        "--max-price",
        "150.50",
        "--sort",
        "price-high-to-low",
        "--page",
        "2",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Products {
            command:
                ProductsCommands::List {
                    categories,
                    min_price,
                    max_price,
                    sort,
                    page,
                    ..
                },
        }) => {
            assert_eq!(categories, vec![Category::Idols, Category::PhotoFrames]);
            assert_eq!(min_price, None);
            assert_eq!(max_price, Some(Decimal::new(15050, 2)));
            assert_eq!(sort, SortOrder::PriceHighToLow);
            assert_eq!(page, 2);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn products_list_rejects_unknown_category() {
    let result = Cli::try_parse_from(["craftshop", "products", "list", "--category", "garden"]);
    assert!(result.is_err());
}

#[test]
fn products_create_parses_draft_fields() {
    let cli = Cli::try_parse_from([
        "craftshop",
        "products",
        "create",
        "--name",
        "Clay Vase",
        "--category",
        "home-interiors",
        "--price",
        "40",
        "--image",
        "https://cdn.example.com/vase.jpg",
        "--out-of-stock",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Products {
            command:
                ProductsCommands::Create {
                    name,
                    category,
                    price,
                    out_of_stock,
                    alt,
                    ..
                },
        }) => {
            assert_eq!(name, "Clay Vase");
            assert_eq!(category, Category::HomeInteriors);
            assert_eq!(price, Decimal::from(40));
            assert!(out_of_stock);
            assert!(alt.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn products_review_requires_rating() {
    assert!(Cli::try_parse_from(["craftshop", "products", "review", "3"]).is_err());
    let cli =
        Cli::try_parse_from(["craftshop", "products", "review", "3", "--rating", "4"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Products {
            command: ProductsCommands::Review {
                id: 3,
                rating: 4,
                user_name: None,
                ..
            }
        })
    ));
}

#[test]
fn products_upload_needs_exactly_one_source() {
    assert!(Cli::try_parse_from(["craftshop", "products", "upload"]).is_err());
    assert!(Cli::try_parse_from([
        "craftshop",
        "products",
        "upload",
        "--file",
        "a.png",
        "--data-uri",
        "data:image/png;base64,AAAA",
    ])
    .is_err());
    assert!(Cli::try_parse_from(["craftshop", "products", "upload", "--file", "a.png"]).is_ok());
}

#[test]
fn cart_add_defaults_to_one() {
    let cli = Cli::try_parse_from(["craftshop", "cart", "add", "7"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Add { id: 7, quantity: 1 }
        })
    ));
}

#[test]
fn cart_set_accepts_negative_quantity() {
    let cli = Cli::try_parse_from(["craftshop", "cart", "set", "7", "-1"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Cart {
            command: CartCommands::Set { id: 7, quantity: -1 }
        })
    ));
}

#[test]
fn favorites_toggle_parses_id() {
    let cli = Cli::try_parse_from(["craftshop", "favorites", "toggle", "12"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Favorites {
            command: FavoritesCommands::Toggle { id: 12 }
        })
    ));
}

#[test]
fn auth_login_takes_email_and_password() {
    let cli = Cli::try_parse_from([
        "craftshop",
        "auth",
        "login",
        "--email",
        "asha@example.com",
        "--password",
        "hunter22",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Auth {
            command: AuthCommands::Login { ref email, .. }
        }) if email == "asha@example.com"
    ));
}

#[test]
fn local_clear_flag() {
    let cli = Cli::try_parse_from(["craftshop", "local", "clear", "--yes"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Local {
            command: LocalCommands::Clear { yes: true }
        })
    ));
}

#[test]
fn watch_resync_override() {
    let cli = Cli::try_parse_from(["craftshop", "watch", "--resync-secs", "0"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Watch {
            product: None,
            resync_secs: Some(0)
        })
    ));
}

#[test]
fn watch_single_product() {
    let cli = Cli::try_parse_from(["craftshop", "watch", "--product", "4"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Watch {
            product: Some(4),
            resync_secs: None
        })
    ));
}

#[test]
fn ellipsize_marks_truncation() {
    assert_eq!(ellipsize("Brass Ganesha", 20), "Brass Ganesha");
    assert_eq!(ellipsize("Brass Ganesha", 5), "Brass...");
}
