//! Shipping quotes and package dimensions.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::value_objects::Money;

/// Aggregated parcel dimensions sent to the shipping-rate provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageDimensions {
    pub weight_grams: u32,
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
}

impl PackageDimensions {
    /// Aggregates a parcel from cart lines.
    ///
    /// Weight is the sum of per-line weight times quantity, length and width
    /// are the per-line maximum, and heights are summed across lines.
    /// Sums saturate at `u32::MAX`.
    pub fn from_lines(lines: &[CartLine]) -> Self {
        lines.iter().fold(Self::default(), |acc, line| Self {
            weight_grams: acc
                .weight_grams
                .saturating_add(line.weight_grams.saturating_mul(line.quantity)),
            length_cm: acc.length_cm.max(line.length_cm),
            width_cm: acc.width_cm.max(line.width_cm),
            height_cm: acc.height_cm.saturating_add(line.height_cm),
        })
    }
}

/// A shipping quote bound to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub fee: Money,
    pub estimated_days: u32,
    /// True when the provider was unreachable and a fixed fee was substituted.
    pub fallback: bool,
}

impl ShippingInfo {
    pub fn quoted(fee: Money, estimated_days: u32) -> Self {
        Self {
            fee,
            estimated_days,
            fallback: false,
        }
    }

    pub fn fallback(fee: Money, estimated_days: u32) -> Self {
        Self {
            fee,
            estimated_days,
            fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_aggregate_across_lines() {
        let mut a = CartLine::new("A", "A", 2, Money::from_dong(10_000));
        a.weight_grams = 300;
        a.length_cm = 30;
        a.width_cm = 10;
        a.height_cm = 5;
        let mut b = CartLine::new("B", "B", 1, Money::from_dong(10_000));
        b.weight_grams = 1_000;
        b.length_cm = 20;
        b.width_cm = 25;
        b.height_cm = 8;

        let dims = PackageDimensions::from_lines(&[a, b]);
        assert_eq!(dims.weight_grams, 1_600);
        assert_eq!(dims.length_cm, 30);
        assert_eq!(dims.width_cm, 25);
        assert_eq!(dims.height_cm, 13);
    }

    #[test]
    fn test_heavy_parcel_saturates() {
        let mut line = CartLine::new("A", "A", u32::MAX, Money::from_dong(10_000));
        line.weight_grams = 2_000;
        let other = line.clone();

        let dims = PackageDimensions::from_lines(&[line, other]);
        assert_eq!(dims.weight_grams, u32::MAX);
        assert_eq!(dims.height_cm, 20);
    }

    #[test]
    fn test_empty_lines_give_zero_parcel() {
        assert_eq!(PackageDimensions::from_lines(&[]), PackageDimensions::default());
    }
}
