//! Value objects for the shopping domain.

use serde::{Deserialize, Serialize};

/// Product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Money amount in whole đồng.
///
/// VND has no minor unit in practice, so amounts are integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new Money amount from đồng.
    pub fn from_dong(dong: i64) -> Self {
        Self(dong)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in đồng.
    pub fn dong(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a quantity, saturating at the `i64` bounds.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

/// Formats with dot thousands separators, e.g. `1.250.000đ`.
impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{grouped}đ")
        } else {
            write!(f, "{grouped}đ")
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A shipping address saved on the shopper's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: String,
    pub phone: String,
    pub street: String,
    pub ward: String,
    pub district: String,
    pub province: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Creates an address; ward/district/province are required for rate lookups.
    pub fn new(
        recipient: impl Into<String>,
        phone: impl Into<String>,
        street: impl Into<String>,
        ward: impl Into<String>,
        district: impl Into<String>,
        province: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            phone: phone.into(),
            street: street.into(),
            ward: ward.into(),
            district: district.into(),
            province: province.into(),
            is_default: false,
        }
    }

    /// Marks this address as the profile default.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Single-line rendering used in chat prompts.
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.street, self.ward, self.district, self.province
        )
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) - {}", self.recipient, self.phone, self.one_line())
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// Bank transfer or e-wallet, settled before shipping.
    Online,
}

impl PaymentMethod {
    /// All methods in the order they are offered to the shopper.
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Cod, PaymentMethod::Online];

    /// Returns the method offered at the given 1-based position.
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        let index = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::Online => "ONLINE",
        }
    }

    /// Human-readable label shown in chat.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "Thanh toán khi nhận hàng (COD)",
            PaymentMethod::Online => "Chuyển khoản / ví điện tử",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_string_conversion() {
        let id = ProductId::new("SKU-001");
        assert_eq!(id.as_str(), "SKU-001");

        let id2: ProductId = "SKU-002".into();
        assert_eq!(id2.as_str(), "SKU-002");
    }

    #[test]
    fn test_money_display_groups_thousands() {
        assert_eq!(Money::from_dong(30_000).to_string(), "30.000đ");
        assert_eq!(Money::from_dong(1_250_000).to_string(), "1.250.000đ");
        assert_eq!(Money::from_dong(999).to_string(), "999đ");
        assert_eq!(Money::from_dong(0).to_string(), "0đ");
        assert_eq!(Money::from_dong(-45_500).to_string(), "-45.500đ");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_dong(100_000);
        let b = Money::from_dong(30_000);

        assert_eq!((a + b).dong(), 130_000);
        assert_eq!((a - b).dong(), 70_000);
        assert_eq!(a.multiply(3).dong(), 300_000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.dong(), 160_000);
    }

    #[test]
    fn test_money_saturates_instead_of_overflowing() {
        let huge = Money::from_dong(i64::MAX / 2);

        assert_eq!(huge.multiply(u32::MAX).dong(), i64::MAX);
        assert_eq!((huge + huge + huge).dong(), i64::MAX);
        assert_eq!((Money::from_dong(i64::MIN) - huge).dong(), i64::MIN);

        let mut acc = huge;
        acc += huge.multiply(4);
        assert_eq!(acc.dong(), i64::MAX);
    }

    #[test]
    fn test_payment_method_ordinals() {
        assert_eq!(PaymentMethod::from_ordinal(1), Some(PaymentMethod::Cod));
        assert_eq!(PaymentMethod::from_ordinal(2), Some(PaymentMethod::Online));
        assert_eq!(PaymentMethod::from_ordinal(0), None);
        assert_eq!(PaymentMethod::from_ordinal(3), None);
    }

    #[test]
    fn test_payment_method_serialization() {
        let json = serde_json::to_string(&PaymentMethod::Cod).unwrap();
        assert_eq!(json, "\"COD\"");
        let online: PaymentMethod = serde_json::from_str("\"ONLINE\"").unwrap();
        assert_eq!(online, PaymentMethod::Online);
    }

    #[test]
    fn test_address_one_line() {
        let address = Address::new(
            "Nguyễn Văn A",
            "0900000000",
            "12 Lý Thường Kiệt",
            "Phường 7",
            "Quận 10",
            "TP. Hồ Chí Minh",
        );
        assert_eq!(
            address.one_line(),
            "12 Lý Thường Kiệt, Phường 7, Quận 10, TP. Hồ Chí Minh"
        );
        assert!(!address.is_default);
        assert!(address.as_default().is_default);
    }
}
