//! Intents and classification results.

use domain::PaymentMethod;
use serde::{Deserialize, Serialize};

/// The classified purpose of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Not related to ordering.
    NoOrder,
    /// Start checking out the current cart.
    OrderRequest,
    /// Answer to a yes/no question.
    OrderConfirmation { confirmed: bool },
    /// Abort the current purchase.
    OrderCancellation,
    /// Pick a saved address by its 1-based position.
    AddressSelection { ordinal: u32 },
    /// Pick a payment method.
    PaymentSelection { method: PaymentMethod },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::NoOrder => IntentKind::NoOrder,
            Intent::OrderRequest => IntentKind::OrderRequest,
            Intent::OrderConfirmation { .. } => IntentKind::OrderConfirmation,
            Intent::OrderCancellation => IntentKind::OrderCancellation,
            Intent::AddressSelection { .. } => IntentKind::AddressSelection,
            Intent::PaymentSelection { .. } => IntentKind::PaymentSelection,
        }
    }
}

/// Payload-free intent discriminant, used as the event key of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    NoOrder,
    OrderRequest,
    OrderConfirmation,
    OrderCancellation,
    AddressSelection,
    PaymentSelection,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::NoOrder => "NO_ORDER",
            IntentKind::OrderRequest => "ORDER_REQUEST",
            IntentKind::OrderConfirmation => "ORDER_CONFIRMATION",
            IntentKind::OrderCancellation => "ORDER_CANCELLATION",
            IntentKind::AddressSelection => "ADDRESS_SELECTION",
            IntentKind::PaymentSelection => "PAYMENT_SELECTION",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Fixed per rule, in `[0, 1]`.
    pub confidence: f32,
    /// True if the order flow should act on this message.
    pub trigger: bool,
    pub reason: String,
}

impl Classification {
    /// The "nothing recognized" result.
    pub fn no_order(reason: impl Into<String>) -> Self {
        Self {
            intent: Intent::NoOrder,
            confidence: 0.0,
            trigger: false,
            reason: reason.into(),
        }
    }
}
