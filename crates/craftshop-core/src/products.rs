use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::FavoriteItem;
use crate::{CartItem, CoreError};

/// The fixed set of storefront collections a product can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "Photo Frames")]
    PhotoFrames,
    #[serde(rename = "Idols")]
    Idols,
    #[serde(rename = "Home Interiors")]
    HomeInteriors,
    #[serde(rename = "Corporate Gifts")]
    CorporateGifts,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::PhotoFrames,
        Category::Idols,
        Category::HomeInteriors,
        Category::CorporateGifts,
    ];

    /// Display label, identical to the wire value.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::PhotoFrames => "Photo Frames",
            Category::Idols => "Idols",
            Category::HomeInteriors => "Home Interiors",
            Category::CorporateGifts => "Corporate Gifts",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    /// Accepts the display label in any case, plus `snake_case` and
    /// `kebab-case` spellings (`"photo_frames"`, `"home-interiors"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "photoframes" => Ok(Category::PhotoFrames),
            "idols" => Ok(Category::Idols),
            "homeinteriors" => Ok(Category::HomeInteriors),
            "corporategifts" => Ok(Category::CorporateGifts),
            _ => Err(CoreError::UnknownCategory(s.to_string())),
        }
    }
}

/// One titled paragraph of a product's long-form description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDescription {
    pub title: String,
    pub body: String,
}

/// A customer review attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique within the owning product.
    pub id: i64,
    pub user_name: String,
    /// Star rating on a 1–5 scale.
    pub rating: u8,
    pub date: String,
    pub comment: String,
}

/// Canonical product record, as produced by catalog normalization and stored
/// in the local product collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub price: Decimal,
    pub image: String,
    pub alt: String,
    pub description: String,
    pub main_description: String,
    pub sub_descriptions: Vec<SubDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    pub in_stock: bool,
    pub thumbnails: Vec<String>,
    pub reviews: Vec<Review>,
    pub rating: f64,
}

impl Product {
    /// Mean of the review ratings, or `None` when there are no reviews.
    #[must_use]
    pub fn review_average(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        #[allow(clippy::cast_precision_loss)]
        Some(f64::from(sum) / self.reviews.len() as f64)
    }

    /// Snapshot of this product as a cart line with the given quantity.
    #[must_use]
    pub fn to_cart_item(&self, quantity: u32) -> CartItem {
        CartItem {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
            alt: self.alt.clone(),
            quantity,
        }
    }

    #[must_use]
    pub fn to_favorite(&self) -> FavoriteItem {
        FavoriteItem {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
            alt: self.alt.clone(),
        }
    }
}

/// Admin payload for creating a product. The id and, usually, the rating are
/// assigned by whichever store accepts the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub category: Category,
    pub price: Decimal,
    pub image: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_descriptions: Vec<SubDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thumbnails: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Partial admin update. Only the fields that are `Some` are sent and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_descriptions: Option<Vec<SubDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Vec<String>>,
}

impl ProductPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_review(id: i64, rating: u8) -> Review {
        Review {
            id,
            user_name: "Asha".to_string(),
            rating,
            date: "2025-01-04".to_string(),
            comment: "Lovely finish".to_string(),
        }
    }

    fn make_product(reviews: Vec<Review>) -> Product {
        Product {
            id: 7,
            name: "Oak Frame".to_string(),
            category: Category::PhotoFrames,
            price: Decimal::new(8500, 2),
            image: "https://cdn.example.com/oak.jpg".to_string(),
            alt: "Oak frame on a shelf".to_string(),
            description: "Hand-finished oak.".to_string(),
            main_description: "Hand-finished oak.".to_string(),
            sub_descriptions: vec![],
            dimensions: Some("8x10 in".to_string()),
            material: Some("Oak".to_string()),
            weight: None,
            in_stock: true,
            thumbnails: vec![],
            reviews,
            rating: 4.5,
        }
    }

    #[test]
    fn category_parses_labels_and_slugs() {
        assert_eq!(
            "Photo Frames".parse::<Category>().unwrap(),
            Category::PhotoFrames
        );
        assert_eq!(
            "home_interiors".parse::<Category>().unwrap(),
            Category::HomeInteriors
        );
        assert_eq!(
            "corporate-gifts".parse::<Category>().unwrap(),
            Category::CorporateGifts
        );
        assert_eq!(" IDOLS ".parse::<Category>().unwrap(), Category::Idols);
    }

    #[test]
    fn category_rejects_unknown_label() {
        let err = "Garden Tools".parse::<Category>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownCategory(ref s) if s == "Garden Tools"));
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&Category::HomeInteriors).unwrap();
        assert_eq!(json, "\"Home Interiors\"");
    }

    #[test]
    fn review_average_none_without_reviews() {
        assert!(make_product(vec![]).review_average().is_none());
    }

    #[test]
    fn review_average_is_mean_of_ratings() {
        let product = make_product(vec![make_review(1, 5), make_review(2, 4), make_review(3, 3)]);
        assert_eq!(product.review_average(), Some(4.0));
    }

    #[test]
    fn to_cart_item_snapshots_fields() {
        let item = make_product(vec![]).to_cart_item(2);
        assert_eq!(item.id, 7);
        assert_eq!(item.name, "Oak Frame");
        assert_eq!(item.price, Decimal::new(8500, 2));
        assert_eq!(item.alt, "Oak frame on a shelf");
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn product_serializes_camel_case() {
        let value = serde_json::to_value(make_product(vec![])).unwrap();
        assert!(value.get("mainDescription").is_some());
        assert!(value.get("inStock").is_some());
        assert!(value.get("subDescriptions").is_some());
        assert!(value.get("weight").is_none(), "None fields are omitted");
        assert_eq!(value["price"], serde_json::json!("85.00"));
    }

    #[test]
    fn patch_is_empty_by_default() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch {
            price: Some(Decimal::from(12)),
            ..ProductPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn draft_accepts_numeric_price() {
        let draft: ProductDraft = serde_json::from_str(
            r#"{"name":"Brass Ganesha","category":"Idols","price":149.5,"image":"x.jpg"}"#,
        )
        .unwrap();
        assert_eq!(draft.price, Decimal::new(1495, 1));
        assert_eq!(draft.category, Category::Idols);
        assert!(draft.in_stock.is_none());
    }
}
