//! Catalog products as seen by the order flow.

use serde::{Deserialize, Serialize};

use crate::value_objects::{Money, ProductId};

/// Live product record: price, stock and availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub sold: u32,
    pub active: bool,
    /// Package weight of one unit in grams.
    pub weight_grams: u32,
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
}

impl Product {
    /// Creates an active product with zero sales and a default 20x20x10cm, 500g package.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            sold: 0,
            active: true,
            weight_grams: 500,
            length_cm: 20,
            width_cm: 20,
            height_cm: 10,
        }
    }

    /// Overrides the package dimensions of one unit.
    pub fn with_package(
        mut self,
        weight_grams: u32,
        length_cm: u32,
        width_cm: u32,
        height_cm: u32,
    ) -> Self {
        self.weight_grams = weight_grams;
        self.length_cm = length_cm;
        self.width_cm = width_cm;
        self.height_cm = height_cm;
        self
    }

    /// Marks the product as no longer sold.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns true if the product can be sold in the requested quantity.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.active && self.stock >= quantity
    }
}
