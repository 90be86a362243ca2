//! Shop listing helpers: filtering, sorting, pagination and the derived
//! figures shown beside a product.

use std::cmp::Ordering;
use std::str::FromStr;

use craftshop_core::{Category, Product};
use rust_decimal::Decimal;

use crate::error::CatalogError;
use crate::normalize::mean_rating;

pub const DEFAULT_PER_PAGE: usize = 6;
pub const RELATED_LIMIT: usize = 4;

/// Upper price slider bound when there is nothing to measure.
const EMPTY_PRICE_CEILING: i64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Highest rating first.
    #[default]
    Popularity,
    PriceLowToHigh,
    PriceHighToLow,
    /// Highest id first.
    Newest,
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "popularity" | "popular" => Ok(SortOrder::Popularity),
            "price-low-to-high" | "price-asc" => Ok(SortOrder::PriceLowToHigh),
            "price-high-to-low" | "price-desc" => Ok(SortOrder::PriceHighToLow),
            "newest" => Ok(SortOrder::Newest),
            _ => Err(CatalogError::Invalid(format!("unknown sort order: {s}"))),
        }
    }
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to the available pages.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    /// Empty means every category.
    pub categories: Vec<Category>,
    /// Inclusive on both ends.
    pub price_range: Option<(Decimal, Decimal)>,
    pub sort: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            price_range: None,
            sort: SortOrder::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListingQuery {
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let in_category = self.categories.is_empty() || self.categories.contains(&product.category);
        let in_range = self
            .price_range
            .is_none_or(|(min, max)| product.price >= min && product.price <= max);
        in_category && in_range
    }

    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Page<Product> {
        let mut matched: Vec<Product> = products.iter().filter(|p| self.matches(p)).cloned().collect();
        sort_products(&mut matched, self.sort);

        let per_page = self.per_page.max(1);
        let total_items = matched.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = self.page.clamp(1, total_pages);
        let items = matched
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Page {
            items,
            page,
            total_pages,
            total_items,
        }
    }
}

/// Stable sort; ties keep their listing order.
pub fn sort_products(products: &mut [Product], order: SortOrder) {
    match order {
        SortOrder::Popularity => products.sort_by(|a, b| {
            b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
        }),
        SortOrder::PriceLowToHigh => products.sort_by(|a, b| a.price.cmp(&b.price)),
        SortOrder::PriceHighToLow => products.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOrder::Newest => products.sort_by(|a, b| b.id.cmp(&a.id)),
    }
}

/// Floor of the cheapest price and ceiling of the dearest.
#[must_use]
pub fn price_bounds(products: &[Product]) -> (Decimal, Decimal) {
    let min = products.iter().map(|p| p.price).min();
    let max = products.iter().map(|p| p.price).max();
    match (min, max) {
        (Some(min), Some(max)) => (min.floor(), max.ceil()),
        _ => (Decimal::ZERO, Decimal::from(EMPTY_PRICE_CEILING)),
    }
}

/// Up to four other products, same category first.
#[must_use]
pub fn related_products(product: &Product, all: &[Product]) -> Vec<Product> {
    let others = all.iter().filter(|p| p.id != product.id);
    let (same, rest): (Vec<&Product>, Vec<&Product>) =
        others.partition(|p| p.category == product.category);
    same.into_iter()
        .chain(rest)
        .take(RELATED_LIMIT)
        .cloned()
        .collect()
}

/// Percentage of reviews at each star level, index 0 being one star.
#[must_use]
pub fn rating_distribution(product: &Product) -> [f64; 5] {
    let mut counts = [0u32; 5];
    for review in &product.reviews {
        if (1..=5).contains(&review.rating) {
            counts[usize::from(review.rating - 1)] += 1;
        }
    }
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return [0.0; 5];
    }
    counts.map(|n| f64::from(n) * 100.0 / f64::from(total))
}

#[must_use]
pub fn average_rating(product: &Product) -> f64 {
    mean_rating(&product.reviews).unwrap_or(product.rating)
}

#[cfg(test)]
mod tests {
    use craftshop_core::Review;

    use super::*;

    fn product(id: i64, category: Category, price: i64, rating: f64) -> Product {
        Product {
            id,
            name: format!("Item {id}"),
            category,
            price: Decimal::from(price),
            image: String::new(),
            alt: String::new(),
            description: String::new(),
            main_description: String::new(),
            sub_descriptions: vec![],
            dimensions: None,
            material: None,
            weight: None,
            in_stock: true,
            thumbnails: vec![],
            reviews: vec![],
            rating,
        }
    }

    fn review(id: i64, rating: u8) -> Review {
        Review {
            id,
            user_name: "Meera".to_string(),
            rating,
            date: "2025-02-01".to_string(),
            comment: String::new(),
        }
    }

    fn shelf() -> Vec<Product> {
        vec![
            product(1, Category::PhotoFrames, 85, 4.0),
            product(2, Category::Idols, 150, 4.8),
            product(3, Category::HomeInteriors, 40, 3.5),
            product(4, Category::PhotoFrames, 25, 4.2),
            product(5, Category::CorporateGifts, 300, 2.0),
            product(6, Category::Idols, 60, 5.0),
            product(7, Category::PhotoFrames, 120, 1.0),
        ]
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn default_query_sorts_by_rating_and_pages_by_six() {
        let page = ListingQuery::default().apply(&shelf());
        assert_eq!(page.total_items, 7);
        assert_eq!(page.total_pages, 2);
        assert_eq!(ids(&page.items), vec![6, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn second_page_holds_the_remainder() {
        let query = ListingQuery {
            page: 2,
            ..ListingQuery::default()
        };
        assert_eq!(ids(&query.apply(&shelf()).items), vec![7]);
    }

    #[test]
    fn page_past_the_end_is_clamped() {
        let query = ListingQuery {
            page: 9,
            ..ListingQuery::default()
        };
        let page = query.apply(&shelf());
        assert_eq!(page.page, 2);
    }

    #[test]
    fn category_and_inclusive_price_filter() {
        let query = ListingQuery {
            categories: vec![Category::PhotoFrames],
            price_range: Some((Decimal::from(25), Decimal::from(85))),
            sort: SortOrder::PriceLowToHigh,
            ..ListingQuery::default()
        };
        assert_eq!(ids(&query.apply(&shelf()).items), vec![4, 1]);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let query = ListingQuery {
            price_range: Some((Decimal::from(1000), Decimal::from(2000))),
            ..ListingQuery::default()
        };
        let page = query.apply(&shelf());
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn newest_and_price_desc_orders() {
        let mut products = shelf();
        sort_products(&mut products, SortOrder::Newest);
        assert_eq!(ids(&products), vec![7, 6, 5, 4, 3, 2, 1]);
        sort_products(&mut products, SortOrder::PriceHighToLow);
        assert_eq!(ids(&products), vec![5, 2, 7, 1, 6, 3, 4]);
    }

    #[test]
    fn sort_order_parses_slugs() {
        assert_eq!("price_low_to_high".parse::<SortOrder>().unwrap(), SortOrder::PriceLowToHigh);
        assert_eq!("Newest".parse::<SortOrder>().unwrap(), SortOrder::Newest);
        assert!("cheapest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn price_bounds_floor_and_ceil() {
        let mut products = shelf();
        products[0].price = Decimal::new(2499, 2);
        products[4].price = Decimal::new(30001, 2);
        assert_eq!(price_bounds(&products), (Decimal::from(24), Decimal::from(301)));
    }

    #[test]
    fn price_bounds_default_when_empty() {
        assert_eq!(price_bounds(&[]), (Decimal::ZERO, Decimal::from(100_000)));
    }

    #[test]
    fn related_prefers_same_category() {
        let all = shelf();
        let related = related_products(&all[0], &all);
        assert_eq!(ids(&related), vec![4, 7, 2, 3]);
    }

    #[test]
    fn rating_distribution_percentages() {
        let mut p = product(1, Category::Idols, 10, 0.0);
        p.reviews = vec![review(1, 5), review(2, 5), review(3, 4), review(4, 1)];
        assert_eq!(rating_distribution(&p), [25.0, 0.0, 0.0, 25.0, 50.0]);
        assert_eq!(rating_distribution(&product(2, Category::Idols, 10, 0.0)), [0.0; 5]);
    }

    #[test]
    fn average_rating_prefers_reviews() {
        let mut p = product(1, Category::Idols, 10, 3.0);
        assert!((average_rating(&p) - 3.0).abs() < f64::EPSILON);
        p.reviews = vec![review(1, 5), review(2, 4)];
        assert!((average_rating(&p) - 4.5).abs() < f64::EPSILON);
    }
}
