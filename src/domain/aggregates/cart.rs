//! Cart Aggregate
//!
//! One cart document per user. Lines are keyed by (product_id, variant type);
//! adding an existing key increments its quantity instead of duplicating.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::product::Variant;
use crate::domain::value_objects::{Money, Quantity};

/// One cart entry. Serialized shape matches the stored document:
/// `{"productId", "name", "quantity", "variant": {"type", "price"}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub variant: Variant,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal { self.variant.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug)]
pub struct Cart {
    user_id: Uuid,
    items: Vec<CartLine>,
}

impl Cart {
    /// Rebuild the aggregate from a stored document (or an absent one).
    pub fn hydrate(user_id: Uuid, items: Vec<CartLine>) -> Self {
        Self { user_id, items }
    }

    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[CartLine] { &self.items }
    pub fn into_items(self) -> Vec<CartLine> { self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Add a line, merging into an existing (product_id, variant type) entry.
    pub fn add_line(
        &mut self,
        product_id: Uuid,
        name: &str,
        variant: Variant,
        quantity: Quantity,
    ) -> Result<(), CartError> {
        if variant.price < Decimal::ZERO {
            return Err(CartError::NegativePrice);
        }
        if let Some(existing) = self.find_mut(product_id, &variant.variant_type) {
            existing.quantity = existing.quantity.saturating_add(quantity.get());
        } else {
            self.items.push(CartLine {
                product_id,
                name: name.to_string(),
                quantity: quantity.get(),
                variant,
            });
        }
        Ok(())
    }

    /// Replace the quantity of an existing line.
    pub fn set_quantity(
        &mut self,
        product_id: Uuid,
        variant_type: &str,
        quantity: Quantity,
    ) -> Result<(), CartError> {
        let line = self
            .find_mut(product_id, variant_type)
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity.get();
        Ok(())
    }

    /// Remove every line for the product, optionally narrowed to one variant
    /// type. Removing absent lines is a no-op; returns how many were dropped.
    pub fn remove(&mut self, product_id: Uuid, variant_type: Option<&str>) -> usize {
        let before = self.items.len();
        self.items.retain(|line| {
            line.product_id != product_id
                || variant_type.is_some_and(|t| line.variant.variant_type != t)
        });
        before - self.items.len()
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn total(&self, currency: &str) -> Money {
        Money::new(self.items.iter().map(CartLine::line_total).sum(), currency)
    }

    fn find_mut(&mut self, product_id: Uuid, variant_type: &str) -> Option<&mut CartLine> {
        self.items
            .iter_mut()
            .find(|line| line.product_id == product_id && line.variant.variant_type == variant_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError { NegativePrice, LineNotFound }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativePrice => write!(f, "Variant price must not be negative"),
            Self::LineNotFound => write!(f, "Item not found in cart"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(kind: &str, price: i64) -> Variant {
        Variant { variant_type: kind.to_string(), price: Decimal::new(price, 0) }
    }

    fn qty(n: u32) -> Quantity { Quantity::new(n).unwrap() }

    #[test]
    fn add_same_key_merges_quantity() {
        let mut cart = Cart::hydrate(Uuid::new_v4(), vec![]);
        let pid = Uuid::new_v4();
        cart.add_line(pid, "Widget", variant("black", 10), qty(1)).unwrap();
        cart.add_line(pid, "Widget", variant("black", 10), qty(2)).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn different_variant_types_stay_separate() {
        let mut cart = Cart::hydrate(Uuid::new_v4(), vec![]);
        let pid = Uuid::new_v4();
        cart.add_line(pid, "Widget", variant("black", 10), qty(1)).unwrap();
        cart.add_line(pid, "Widget", variant("silver", 12), qty(1)).unwrap();
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn add_rejects_negative_price() {
        let mut cart = Cart::hydrate(Uuid::new_v4(), vec![]);
        let err = cart
            .add_line(Uuid::new_v4(), "Widget", variant("black", -5), qty(1))
            .unwrap_err();
        assert_eq!(err, CartError::NegativePrice);
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_replaces_and_requires_existing_line() {
        let mut cart = Cart::hydrate(Uuid::new_v4(), vec![]);
        let pid = Uuid::new_v4();
        cart.add_line(pid, "Widget", variant("black", 10), qty(2)).unwrap();
        cart.set_quantity(pid, "black", qty(5)).unwrap();
        assert_eq!(cart.items()[0].quantity, 5);
        let err = cart.set_quantity(Uuid::new_v4(), "black", qty(1)).unwrap_err();
        assert_eq!(err, CartError::LineNotFound);
    }

    #[test]
    fn remove_missing_line_is_noop() {
        let mut cart = Cart::hydrate(Uuid::new_v4(), vec![]);
        let pid = Uuid::new_v4();
        cart.add_line(pid, "Widget", variant("black", 10), qty(1)).unwrap();
        assert_eq!(cart.remove(Uuid::new_v4(), None), 0);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn remove_narrows_by_variant_type() {
        let mut cart = Cart::hydrate(Uuid::new_v4(), vec![]);
        let pid = Uuid::new_v4();
        cart.add_line(pid, "Widget", variant("black", 10), qty(1)).unwrap();
        cart.add_line(pid, "Widget", variant("silver", 12), qty(1)).unwrap();
        assert_eq!(cart.remove(pid, Some("black")), 1);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].variant.variant_type, "silver");
        assert_eq!(cart.remove(pid, None), 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn total_sums_line_totals() {
        let mut cart = Cart::hydrate(Uuid::new_v4(), vec![]);
        cart.add_line(Uuid::new_v4(), "Widget", variant("black", 10), qty(2)).unwrap();
        cart.add_line(Uuid::new_v4(), "Gadget", variant("std", 7), qty(3)).unwrap();
        assert_eq!(cart.total("INR").amount(), Decimal::new(41, 0));
    }
}
