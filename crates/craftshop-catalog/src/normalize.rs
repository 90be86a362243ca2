//! Normalization from raw API or stored JSON to the canonical [`Product`].
//!
//! Records arrive in snake_case or camelCase, with prices as numbers or
//! numeric strings and thumbnails as plain strings or `{ image_url }`
//! objects. Every field has an explicit precedence list and default here, so
//! transport and rendering code never see the raw shapes. Normalizing a
//! canonical record returns it unchanged.

use std::str::FromStr;

use chrono::{Local, NaiveDate};
use craftshop_core::{Category, Product, Review, SubDescription};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::CatalogError;

pub(crate) const DEFAULT_NAME: &str = "Unnamed Product";
const DEFAULT_REVIEWER: &str = "Anonymous";
const DEFAULT_REVIEW_RATING: u8 = 5;
const THUMBNAIL_KEYS: [&str; 3] = ["image_url", "imageUrl", "url"];

/// Keys that name the same canonical field. When filling gaps in a partial
/// record, a group counts as present if any of its keys is.
pub(crate) const ALIAS_GROUPS: [&[&str]; 3] = [
    &["description", "main_description", "mainDescription"],
    &["subDescriptions", "sub_descriptions"],
    &["inStock", "in_stock"],
];

/// Normalizes a raw product record, defaulting review dates to today.
///
/// # Errors
///
/// Returns [`CatalogError::Normalization`] if the record is not an object or
/// has no usable integer `id`.
pub fn normalize_product(raw: &Value) -> Result<Product, CatalogError> {
    normalize_product_on(raw, Local::now().date_naive())
}

/// Normalizes every record, failing on the first one that cannot be mapped.
///
/// # Errors
///
/// Returns the first record's [`CatalogError::Normalization`].
pub fn normalize_products(raw: &[Value]) -> Result<Vec<Product>, CatalogError> {
    let today = Local::now().date_naive();
    raw.iter().map(|r| normalize_product_on(r, today)).collect()
}

/// Normalizes a raw product record; reviews without a date get `today`.
///
/// # Errors
///
/// Returns [`CatalogError::Normalization`] if the record is not an object or
/// has no usable integer `id`.
pub fn normalize_product_on(raw: &Value, today: NaiveDate) -> Result<Product, CatalogError> {
    let Some(obj) = raw.as_object() else {
        return Err(CatalogError::Normalization {
            product_id: "?".to_string(),
            reason: format!("expected an object, got {}", type_name(raw)),
        });
    };
    let Some(id) = obj.get("id").and_then(as_integer) else {
        return Err(CatalogError::Normalization {
            product_id: obj.get("id").map_or_else(|| "?".to_string(), Value::to_string),
            reason: "missing or non-integer id".to_string(),
        });
    };

    let name = first_text(obj, &["name"]).unwrap_or_else(|| DEFAULT_NAME.to_string());
    let category = first_text(obj, &["category"])
        .and_then(|c| Category::from_str(&c).ok())
        .unwrap_or_default();
    let price = obj
        .get("price")
        .and_then(as_decimal)
        .filter(|p| !p.is_sign_negative())
        .unwrap_or(Decimal::ZERO);
    let image = first_text(obj, &["image"]).unwrap_or_default();
    let alt = first_text(obj, &["alt"]).unwrap_or_else(|| name.clone());

    let description = first_text(obj, &["description", "main_description", "mainDescription"])
        .unwrap_or_default();
    let main_description =
        first_text(obj, &["main_description", "mainDescription", "description"])
            .unwrap_or_default();

    let sub_descriptions = first_array(obj, &["subDescriptions", "sub_descriptions"])
        .map(|items| items.iter().filter_map(sub_description).collect())
        .unwrap_or_default();

    let in_stock = ["inStock", "in_stock"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(as_flag))
        .unwrap_or(true);

    let thumbnails = first_array(obj, &["thumbnails"])
        .map(|items| items.iter().filter_map(thumbnail).collect())
        .unwrap_or_default();

    let reviews: Vec<Review> = first_array(obj, &["reviews"])
        .map(|items| {
            items
                .iter()
                .filter(|r| r.is_object())
                .enumerate()
                .map(|(idx, r)| review(r, idx, today))
                .collect()
        })
        .unwrap_or_default();

    let rating = match obj.get("rating").and_then(as_f64) {
        Some(r) if r.is_finite() => r.max(0.0),
        _ => mean_rating(&reviews).unwrap_or(0.0),
    };

    Ok(Product {
        id,
        name,
        category,
        price,
        image,
        alt,
        description,
        main_description,
        sub_descriptions,
        dimensions: first_text(obj, &["dimensions"]),
        material: first_text(obj, &["material"]),
        weight: first_text(obj, &["weight"]),
        in_stock,
        thumbnails,
        reviews,
        rating,
    })
}

/// Mean review rating rounded to two decimals; `None` without reviews.
#[must_use]
pub fn mean_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = f64::from(sum) / reviews.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

fn review(raw: &Value, idx: usize, today: NaiveDate) -> Review {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let fallback_id = i64::try_from(idx).map_or(i64::MAX, |i| i + 1);
    Review {
        id: obj.get("id").and_then(as_integer).unwrap_or(fallback_id),
        user_name: first_text(obj, &["userName", "user_name"])
            .unwrap_or_else(|| DEFAULT_REVIEWER.to_string()),
        rating: obj
            .get("rating")
            .and_then(as_f64)
            .filter(|r| r.is_finite() && *r >= 1.0)
            .map_or(DEFAULT_REVIEW_RATING, |r| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let stars = r.round().min(5.0) as u8;
                stars
            }),
        date: first_text(obj, &["date", "created_at"])
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
        comment: first_text(obj, &["comment"]).unwrap_or_default(),
    }
}

fn sub_description(raw: &Value) -> Option<SubDescription> {
    let obj = raw.as_object()?;
    Some(SubDescription {
        title: first_text(obj, &["title"]).unwrap_or_default(),
        body: first_text(obj, &["body"]).unwrap_or_default(),
    })
}

fn thumbnail(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(obj) => first_text(obj, &THUMBNAIL_KEYS),
        _ => None,
    }
}

/// First key whose value is a non-empty string. Numbers are accepted and
/// rendered as text.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn first_array<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_array))
}

fn as_integer(value: &Value) -> Option<i64> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract().abs() < f64::EPSILON && f.abs() <= MAX_EXACT)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation)]
                    let i = f as i64;
                    i
                })
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Booleans, plus the `"true"`/`"false"`/`"1"`/`"0"` spellings and 0/1.
fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
