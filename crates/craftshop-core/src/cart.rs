use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A cart line: a snapshot of the product taken when it was added, plus the
/// quantity. Never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub alt: String,
    /// Always at least 1 once persisted.
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A saved-for-later product snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub alt: String,
}

/// Flat-fee shipping that becomes free once the subtotal exceeds a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub free_threshold: Decimal,
    pub flat_fee: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Decimal::from(100),
            flat_fee: Decimal::from(10),
        }
    }
}

impl ShippingPolicy {
    /// Shipping charged for `subtotal`. Free only when strictly above the threshold.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_threshold {
            Decimal::ZERO
        } else {
            self.flat_fee
        }
    }

    /// How much more must be spent before shipping is free; zero once it is.
    #[must_use]
    pub fn amount_until_free(&self, subtotal: Decimal) -> Decimal {
        if subtotal < self.free_threshold {
            self.free_threshold - subtotal
        } else {
            Decimal::ZERO
        }
    }
}

/// Derived cart aggregates. Recomputed on every read, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    #[must_use]
    pub fn compute(items: &[CartItem], policy: &ShippingPolicy) -> Self {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let shipping = policy.shipping_for(subtotal);
        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}
