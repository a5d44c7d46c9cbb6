//! Persisted orders.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::summary::OrderSummary;
use crate::value_objects::{Address, Money, PaymentMethod, ProductId};

/// Fulfillment status of a persisted order.
///
/// ```text
/// Processing ──► Shipped ──► Delivered
///      │            │
///      └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel an order was placed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSource {
    Chat,
    Web,
}

/// An item in an order, priced at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Order data handed to the order store for creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Repeated creates with the same key yield the same order.
    pub idempotency_key: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    pub items_price: Money,
    pub shipping_price: Money,
    pub service_fee: Money,
    pub total_price: Money,
    pub source: OrderSource,
}

impl NewOrder {
    /// Builds chat-originated order data from priced lines and a summary.
    pub fn from_chat(
        idempotency_key: impl Into<String>,
        user_id: UserId,
        lines: &[CartLine],
        shipping_address: Address,
        payment_method: PaymentMethod,
        summary: &OrderSummary,
    ) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            user_id,
            items: lines.iter().map(OrderItem::from).collect(),
            shipping_address,
            payment_method,
            items_price: summary.subtotal,
            shipping_price: summary.shipping_fee,
            service_fee: summary.service_fee,
            total_price: summary.total,
            source: OrderSource::Chat,
        }
    }
}

/// A committed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub idempotency_key: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    pub items_price: Money,
    pub shipping_price: Money,
    pub service_fee: Money,
    pub total_price: Money,
    pub status: OrderStatus,
    pub source: OrderSource,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Materializes order data with a fresh ID in `Processing` status.
    pub fn create(data: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            idempotency_key: data.idempotency_key,
            user_id: data.user_id,
            items: data.items,
            shipping_address: data.shipping_address,
            payment_method: data.payment_method,
            items_price: data.items_price,
            shipping_price: data.shipping_price,
            service_fee: data.service_fee,
            total_price: data.total_price,
            status: OrderStatus::Processing,
            source: data.source,
            created_at,
        }
    }

    /// Short human reference, e.g. `#1A2B3C4D`.
    pub fn reference(&self) -> String {
        let uuid = self.id.as_uuid().simple().to_string();
        format!("#{}", uuid[..8].to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new_order() -> NewOrder {
        let lines = vec![CartLine::new("SKU-1", "Áo", 2, Money::from_dong(100_000))];
        let summary = OrderSummary::compute(&lines, Money::from_dong(30_000), Money::zero());
        NewOrder::from_chat(
            "s-1:1",
            UserId::from("u-1"),
            &lines,
            Address::new("A", "0900", "1 Đường", "P1", "Q1", "HCM"),
            PaymentMethod::Cod,
            &summary,
        )
    }

    #[test]
    fn test_from_chat_copies_totals() {
        let data = sample_new_order();
        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items_price.dong(), 200_000);
        assert_eq!(data.shipping_price.dong(), 30_000);
        assert_eq!(data.total_price.dong(), 230_000);
        assert_eq!(data.source, OrderSource::Chat);
    }

    #[test]
    fn test_create_starts_processing() {
        let order = Order::create(sample_new_order(), Utc::now());
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(!order.status.is_terminal());
        assert_eq!(order.reference().len(), 9);
    }

    #[test]
    fn test_source_serialization() {
        assert_eq!(serde_json::to_string(&OrderSource::Chat).unwrap(), "\"chat\"");
    }
}
