//! Property-based invariants for the cart under arbitrary operation
//! sequences.

use craftshop_cart::CartStore;
use craftshop_core::{CartItem, ShippingPolicy};
use craftshop_store::{MemoryStore, Storage};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;

#[derive(Debug, Clone)]
enum CartOp {
    Add { id: i64, quantity: u32 },
    AddOne { id: i64 },
    Update { id: i64, quantity: i64 },
    Remove { id: i64 },
    Clear,
}

fn item(id: i64, quantity: u32) -> CartItem {
    CartItem {
        id,
        name: format!("Item {id}"),
        price: Decimal::new(id * 1_250, 2),
        image: String::new(),
        alt: String::new(),
        quantity,
    }
}

fn arb_id() -> impl Strategy<Value = i64> {
    1i64..=6
}

fn arb_op() -> impl Strategy<Value = CartOp> {
    prop_oneof![
        4 => (arb_id(), 0u32..=4).prop_map(|(id, quantity)| CartOp::Add { id, quantity }),
        3 => arb_id().prop_map(|id| CartOp::AddOne { id }),
        3 => (arb_id(), -2i64..=8).prop_map(|(id, quantity)| CartOp::Update { id, quantity }),
        2 => arb_id().prop_map(|id| CartOp::Remove { id }),
        1 => Just(CartOp::Clear),
    ]
}

/// Expected lines as (id, quantity) in insertion order.
fn apply(model: &mut Vec<(i64, u32)>, op: &CartOp) {
    match *op {
        CartOp::Add { id, quantity } => {
            if quantity == 0 {
                return;
            }
            match model.iter_mut().find(|(line, _)| *line == id) {
                Some((_, q)) => *q += quantity,
                None => model.push((id, quantity)),
            }
        }
        CartOp::AddOne { id } => apply(model, &CartOp::Add { id, quantity: 1 }),
        CartOp::Update { id, quantity } => {
            if quantity < 1 {
                model.retain(|(line, _)| *line != id);
            } else if let Some((_, q)) = model.iter_mut().find(|(line, _)| *line == id) {
                *q = u32::try_from(quantity).unwrap();
            }
        }
        CartOp::Remove { id } => model.retain(|(line, _)| *line != id),
        CartOp::Clear => model.clear(),
    }
}

fn run(cart: &CartStore, op: &CartOp) {
    match *op {
        CartOp::Add { id, quantity } => {
            cart.add_item(item(id, quantity)).unwrap();
        }
        CartOp::AddOne { id } => {
            cart.add_one(item(id, 7)).unwrap();
        }
        CartOp::Update { id, quantity } => {
            cart.update_quantity(id, quantity).unwrap();
        }
        CartOp::Remove { id } => {
            cart.remove_item(id).unwrap();
        }
        CartOp::Clear => cart.clear().unwrap(),
    }
}

fn stored_quantities(storage: &Storage) -> Vec<i64> {
    let Some(raw) = storage.get_raw("cartItems") else {
        return Vec::new();
    };
    let rows: Vec<Value> = serde_json::from_str(&raw).unwrap();
    rows.iter()
        .map(|row| row["quantity"].as_i64().unwrap())
        .collect()
}

// =============================================================================
// Cart invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Invariant: the item count is the sum of line quantities and nothing
    /// below one is ever persisted.
    #[test]
    fn invariant_count_matches_lines_and_rows_stay_positive(
        ops in prop::collection::vec(arb_op(), 1..60)
    ) {
        let storage = Storage::new(MemoryStore::new());
        let cart = CartStore::new(storage.clone(), ShippingPolicy::default());

        for op in &ops {
            run(&cart, op);

            let items = cart.items();
            let sum: u64 = items.iter().map(|line| u64::from(line.quantity)).sum();
            prop_assert_eq!(cart.item_count(), sum);
            prop_assert!(items.iter().all(|line| line.quantity >= 1));

            let stored = stored_quantities(&storage);
            prop_assert!(stored.iter().all(|q| *q >= 1), "persisted {:?} after {:?}", stored, op);
            prop_assert_eq!(stored.len(), items.len());
        }
    }

    /// Invariant: the cart behaves like a list of (id, quantity) lines kept
    /// in first-added order, one line per id.
    #[test]
    fn invariant_cart_matches_line_model(
        ops in prop::collection::vec(arb_op(), 1..60)
    ) {
        let cart = CartStore::new(Storage::new(MemoryStore::new()), ShippingPolicy::default());
        let mut model: Vec<(i64, u32)> = Vec::new();

        for op in &ops {
            run(&cart, op);
            apply(&mut model, op);

            let lines: Vec<(i64, u32)> =
                cart.items().iter().map(|line| (line.id, line.quantity)).collect();
            prop_assert_eq!(&lines, &model, "after {:?}", op);
        }
    }

    /// Invariant: totals are the subtotal plus shipping, and shipping is
    /// only ever zero or the flat fee.
    #[test]
    fn invariant_totals_add_up(
        ops in prop::collection::vec(arb_op(), 1..40)
    ) {
        let policy = ShippingPolicy::default();
        let cart = CartStore::new(Storage::new(MemoryStore::new()), policy);

        for op in &ops {
            run(&cart, op);
        }

        let totals = cart.totals();
        prop_assert_eq!(totals.total, totals.subtotal + totals.shipping);
        prop_assert!(totals.shipping == Decimal::ZERO || totals.shipping == policy.flat_fee);
        let expected: Decimal = cart
            .items()
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();
        prop_assert_eq!(totals.subtotal, expected);
    }
}
