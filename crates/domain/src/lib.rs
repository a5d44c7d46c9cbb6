//! Domain layer for the chat ordering system.
//!
//! This crate provides the shopping value objects the order flow works with:
//! - Products, cart lines and carts with snapshotted prices
//! - Addresses, payment methods and shipping quotes
//! - Order summaries (derived totals) and persisted orders
//! - The per-conversation session record and its flow state

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod shipping;
pub mod summary;
pub mod value_objects;

pub use cart::{Cart, CartLine, merge_lines};
pub use order::{NewOrder, Order, OrderItem, OrderSource, OrderStatus};
pub use product::Product;
pub use session::{ConversationTurn, FlowState, OrderContext, Session, Speaker};
pub use shipping::{PackageDimensions, ShippingInfo};
pub use summary::OrderSummary;
pub use value_objects::{Address, Money, PaymentMethod, ProductId};
