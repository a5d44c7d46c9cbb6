//! Shopping cart lines with snapshotted prices.

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::value_objects::{Money, ProductId};

/// One line in a shopper's cart.
///
/// `unit_price` is the price snapshotted when the product was added;
/// `available_stock` is the live stock observed at the last validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub available_stock: Option<u32>,
    pub weight_grams: u32,
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
}

impl CartLine {
    /// Creates a line with default package dimensions.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            available_stock: None,
            weight_grams: 500,
            length_cm: 20,
            width_cm: 20,
            height_cm: 10,
        }
    }

    /// Snapshots a product into a cart line at its current price.
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            available_stock: Some(product.stock),
            weight_grams: product.weight_grams,
            length_cm: product.length_cm,
            width_cm: product.width_cm,
            height_cm: product.height_cm,
        }
    }

    /// Returns the total price for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Folds lines for the same product into one, in first-seen order.
///
/// The first line keeps its name, price snapshot and package; quantities add up.
pub fn merge_lines(lines: impl IntoIterator<Item = CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::new();
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }
    merged
}

/// A shopper's cart. `total` is always derived from the lines, and each
/// product appears on at most one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub total: Money,
}

impl Cart {
    pub fn new(user_id: UserId, lines: Vec<CartLine>) -> Self {
        let mut cart = Self {
            user_id,
            lines: merge_lines(lines),
            total: Money::zero(),
        };
        cart.recompute_total();
        cart
    }

    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, Vec::new())
    }

    /// Recomputes `total` from line snapshots and returns it.
    pub fn recompute_total(&mut self) -> Money {
        self.total = self.lines.iter().map(CartLine::line_total).sum();
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }
}
