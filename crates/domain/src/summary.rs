//! Derived order totals.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::value_objects::Money;

/// Totals shown to the shopper before confirmation.
///
/// Always computed from its inputs, never stored independently of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub service_fee: Money,
    pub total: Money,
}

impl OrderSummary {
    pub fn compute(lines: &[CartLine], shipping_fee: Money, service_fee: Money) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
        Self {
            item_count: lines.iter().fold(0u32, |acc, l| acc.saturating_add(l.quantity)),
            subtotal,
            shipping_fee,
            service_fee,
            total: subtotal + shipping_fee + service_fee,
        }
    }
}
