use serde_json::json;

use super::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

fn norm(raw: &Value) -> Product {
    normalize_product_on(raw, today()).unwrap()
}

// -----------------------------------------------------------------------
// numeric coercion
// -----------------------------------------------------------------------

#[test]
fn string_price_parses_and_missing_rating_is_zero() {
    let product = norm(&json!({ "id": 1, "name": "Teak Frame", "price": "199.50" }));
    assert_eq!(product.price, Decimal::new(19950, 2));
    assert!(product.rating.abs() < f64::EPSILON);
}

#[test]
fn numeric_price_is_kept() {
    let product = norm(&json!({ "id": 1, "price": 149.5 }));
    assert_eq!(product.price, Decimal::new(1495, 1));
}

#[test]
fn non_numeric_or_negative_price_defaults_to_zero() {
    assert_eq!(norm(&json!({ "id": 1, "price": "call us" })).price, Decimal::ZERO);
    assert_eq!(norm(&json!({ "id": 1, "price": -4 })).price, Decimal::ZERO);
    assert_eq!(norm(&json!({ "id": 1 })).price, Decimal::ZERO);
}

#[test]
fn string_rating_parses() {
    let product = norm(&json!({ "id": 1, "rating": "4.25" }));
    assert!((product.rating - 4.25).abs() < f64::EPSILON);
}

#[test]
fn rating_derived_from_reviews_when_absent() {
    let product = norm(&json!({
        "id": 1,
        "reviews": [
            { "user_name": "a", "rating": 5 },
            { "user_name": "b", "rating": 4 },
            { "user_name": "c", "rating": 4 }
        ]
    }));
    assert!((product.rating - 4.33).abs() < 1e-9);
}

#[test]
fn supplied_rating_wins_over_reviews() {
    let product = norm(&json!({ "id": 1, "rating": 3.5, "reviews": [{ "rating": 5 }] }));
    assert!((product.rating - 3.5).abs() < f64::EPSILON);
}

// -----------------------------------------------------------------------
// identity and defaults
// -----------------------------------------------------------------------

#[test]
fn non_object_is_an_error() {
    let err = normalize_product_on(&json!("oops"), today()).unwrap_err();
    assert!(matches!(err, CatalogError::Normalization { .. }));
}

#[test]
fn missing_id_is_an_error() {
    let err = normalize_product_on(&json!({ "name": "No Id" }), today()).unwrap_err();
    assert!(matches!(err, CatalogError::Normalization { ref reason, .. } if reason.contains("id")));
}

#[test]
fn string_and_float_ids_are_accepted() {
    assert_eq!(norm(&json!({ "id": "42" })).id, 42);
    assert_eq!(norm(&json!({ "id": 7.0 })).id, 7);
    assert!(normalize_product_on(&json!({ "id": 7.5 }), today()).is_err());
}

#[test]
fn defaults_fill_empty_record() {
    let product = norm(&json!({ "id": 3 }));
    assert_eq!(product.name, "Unnamed Product");
    assert_eq!(product.alt, "Unnamed Product");
    assert_eq!(product.category, Category::PhotoFrames);
    assert!(product.in_stock);
    assert!(product.thumbnails.is_empty());
    assert!(product.reviews.is_empty());
    assert!(product.dimensions.is_none());
}

#[test]
fn alt_defaults_to_name() {
    let product = norm(&json!({ "id": 3, "name": "Brass Diya", "alt": "" }));
    assert_eq!(product.alt, "Brass Diya");
}

#[test]
fn category_accepts_slugs_and_falls_back() {
    assert_eq!(
        norm(&json!({ "id": 1, "category": "home_interiors" })).category,
        Category::HomeInteriors
    );
    assert_eq!(
        norm(&json!({ "id": 1, "category": "Garden" })).category,
        Category::PhotoFrames
    );
}

// -----------------------------------------------------------------------
// field precedence
// -----------------------------------------------------------------------

#[test]
fn descriptions_fill_each_other() {
    let product = norm(&json!({ "id": 1, "main_description": "Long text" }));
    assert_eq!(product.description, "Long text");
    assert_eq!(product.main_description, "Long text");

    let product = norm(&json!({ "id": 1, "description": "Short" }));
    assert_eq!(product.main_description, "Short");
}

#[test]
fn description_prefers_its_own_key() {
    let product = norm(&json!({
        "id": 1,
        "description": "Short",
        "main_description": "Long"
    }));
    assert_eq!(product.description, "Short");
    assert_eq!(product.main_description, "Long");
}

#[test]
fn sub_descriptions_accept_snake_case() {
    let product = norm(&json!({
        "id": 1,
        "sub_descriptions": [{ "title": "Care", "body": "Dust weekly" }, "junk"]
    }));
    assert_eq!(
        product.sub_descriptions,
        vec![SubDescription {
            title: "Care".to_string(),
            body: "Dust weekly".to_string()
        }]
    );
}

#[test]
fn in_stock_false_is_respected_in_either_case() {
    assert!(!norm(&json!({ "id": 1, "in_stock": false })).in_stock);
    assert!(!norm(&json!({ "id": 1, "inStock": false, "in_stock": true })).in_stock);
}

#[test]
fn in_stock_accepts_string_and_numeric_flags() {
    for raw in [json!("false"), json!("FALSE"), json!("0"), json!(0)] {
        assert!(
            !norm(&json!({ "id": 1, "inStock": raw.clone() })).in_stock,
            "{raw} reads as out of stock"
        );
    }
    for raw in [json!("true"), json!(" True "), json!("1"), json!(1)] {
        assert!(
            norm(&json!({ "id": 1, "in_stock": raw.clone() })).in_stock,
            "{raw} reads as in stock"
        );
    }
}

#[test]
fn unreadable_in_stock_defaults_to_true() {
    assert!(norm(&json!({ "id": 1, "inStock": "maybe" })).in_stock);
    assert!(norm(&json!({ "id": 1, "inStock": 2 })).in_stock);
}

#[test]
fn thumbnails_unwrap_objects_and_drop_empties() {
    let product = norm(&json!({
        "id": 1,
        "thumbnails": [
            "a.jpg",
            { "image_url": "b.jpg" },
            { "imageUrl": "c.jpg" },
            { "image_url": "" },
            "",
            null,
            42
        ]
    }));
    assert_eq!(product.thumbnails, vec!["a.jpg", "b.jpg", "c.jpg"]);
}

#[test]
fn reviews_get_positional_ids_and_defaults() {
    let product = norm(&json!({
        "id": 1,
        "reviews": [
            { "user_name": "Ravi", "rating": 4, "comment": "Nice", "date": "2025-01-02" },
            { "comment": "No name" },
            { "id": 99, "userName": "Meera", "rating": "3" }
        ]
    }));
    let reviews = &product.reviews;
    assert_eq!(reviews[0].id, 1);
    assert_eq!(reviews[0].user_name, "Ravi");
    assert_eq!(reviews[0].date, "2025-01-02");
    assert_eq!(reviews[1].id, 2);
    assert_eq!(reviews[1].user_name, "Anonymous");
    assert_eq!(reviews[1].rating, 5);
    assert_eq!(reviews[1].date, "2025-03-14");
    assert_eq!(reviews[2].id, 99);
    assert_eq!(reviews[2].user_name, "Meera");
    assert_eq!(reviews[2].rating, 3);
}

#[test]
fn review_rating_clamped_to_five() {
    let product = norm(&json!({ "id": 1, "reviews": [{ "rating": 9 }] }));
    assert_eq!(product.reviews[0].rating, 5);
}

// -----------------------------------------------------------------------
// idempotence
// -----------------------------------------------------------------------

#[test]
fn normalizing_canonical_record_is_a_fixed_point() {
    let raw = json!({
        "id": "12",
        "name": "Marble Idol",
        "category": "idols",
        "price": "1299.00",
        "image": "data:image/png;base64,AAAA",
        "main_description": "Carved by hand.",
        "sub_descriptions": [{ "title": "Origin", "body": "Jaipur" }],
        "in_stock": false,
        "weight": "2 kg",
        "thumbnails": [{ "image_url": "t1.jpg" }, "t2.jpg"],
        "reviews": [{ "user_name": "Asha", "rating": 4 }, { "comment": "ok" }]
    });
    let once = norm(&raw);
    let twice = norm(&serde_json::to_value(&once).unwrap());
    assert_eq!(once, twice);
}

#[test]
fn normalize_products_fails_on_any_bad_record() {
    let raw = vec![json!({ "id": 1 }), json!({ "name": "no id" })];
    assert!(normalize_products(&raw).is_err());
    let ok = vec![json!({ "id": 1 }), json!({ "id": 2 })];
    assert_eq!(normalize_products(&ok).unwrap().len(), 2);
}
