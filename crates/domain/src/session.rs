//! Per-conversation order session.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use common::{OrderId, SessionId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::shipping::ShippingInfo;
use crate::summary::OrderSummary;
use crate::value_objects::{Address, PaymentMethod};

/// Where a conversation is in the purchase flow.
///
/// ```text
/// Idle ─► CartValidated ─┬─► AddressSelection ─┐
///                        └───────────────────┬─┘
///                                            ▼
///   AddressSelected ─► ShippingCalculated ─► PaymentSelection ─► PaymentSelected
///                                                                     │
///        Idle ◄── (grace) ── OrderCreated ◄── SummaryShown ◄──────────┘
/// ```
///
/// Any state returns to `Idle` on cancellation; unexpected failures land in
/// `ErrorState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    #[default]
    Idle,
    OrderInitiated,
    CartValidated,
    AddressSelection,
    AddressSelected,
    ShippingCalculated,
    PaymentSelection,
    PaymentSelected,
    SummaryShown,
    OrderCreated,
    ErrorState,
}

impl FlowState {
    pub const ALL: [FlowState; 11] = [
        FlowState::Idle,
        FlowState::OrderInitiated,
        FlowState::CartValidated,
        FlowState::AddressSelection,
        FlowState::AddressSelected,
        FlowState::ShippingCalculated,
        FlowState::PaymentSelection,
        FlowState::PaymentSelected,
        FlowState::SummaryShown,
        FlowState::OrderCreated,
        FlowState::ErrorState,
    ];

    /// Returns true while a purchase is being assembled.
    pub fn is_in_flow(&self) -> bool {
        !matches!(self, FlowState::Idle | FlowState::OrderCreated)
    }

    /// Returns true for states the engine leaves on its own, without user input.
    pub fn is_auto(&self) -> bool {
        matches!(
            self,
            FlowState::AddressSelected | FlowState::ShippingCalculated | FlowState::PaymentSelected
        )
    }

    /// Returns true if the shopper is being asked a yes/no question.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, FlowState::CartValidated | FlowState::SummaryShown)
    }

    pub fn needs_address_selection(&self) -> bool {
        matches!(self, FlowState::AddressSelection)
    }

    pub fn needs_payment_selection(&self) -> bool {
        matches!(self, FlowState::PaymentSelection)
    }

    /// Returns true if this state ends a purchase cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::OrderCreated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "IDLE",
            FlowState::OrderInitiated => "ORDER_INITIATED",
            FlowState::CartValidated => "CART_VALIDATED",
            FlowState::AddressSelection => "ADDRESS_SELECTION",
            FlowState::AddressSelected => "ADDRESS_SELECTED",
            FlowState::ShippingCalculated => "SHIPPING_CALCULATED",
            FlowState::PaymentSelection => "PAYMENT_SELECTION",
            FlowState::PaymentSelected => "PAYMENT_SELECTED",
            FlowState::SummaryShown => "SUMMARY_SHOWN",
            FlowState::OrderCreated => "ORDER_CREATED",
            FlowState::ErrorState => "ERROR_STATE",
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Purchase data accumulated during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContext {
    /// Cart as validated when the order was initiated.
    pub cart: Option<Cart>,
    /// Addresses offered for selection, in prompt order.
    #[serde(default)]
    pub candidate_addresses: Vec<Address>,
    pub selected_address: Option<Address>,
    pub shipping: Option<ShippingInfo>,
    pub payment_method: Option<PaymentMethod>,
    pub summary: Option<OrderSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the bounded conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Conversational state for one ongoing order attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: Option<UserId>,
    pub state: FlowState,
    pub context: OrderContext,
    pub history: VecDeque<ConversationTurn>,
    pub error_count: u32,
    pub last_activity: DateTime<Utc>,
    /// When the session entered `OrderCreated`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of purchase cycles started in this session.
    pub cycle: u64,
    /// Optimistic concurrency version, bumped by the store on every save.
    pub version: u64,
    pub last_order: Option<OrderId>,
}

impl Session {
    pub fn new(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: None,
            state: FlowState::Idle,
            context: OrderContext::default(),
            history: VecDeque::new(),
            error_count: 0,
            last_activity: now,
            completed_at: None,
            cycle: 0,
            version: 0,
            last_order: None,
        }
    }

    /// Appends a turn, dropping the oldest beyond `limit`.
    pub fn record_turn(
        &mut self,
        speaker: Speaker,
        text: impl Into<String>,
        limit: usize,
        now: DateTime<Utc>,
    ) {
        self.history.push_back(ConversationTurn {
            speaker,
            text: text.into(),
            at: now,
        });
        while self.history.len() > limit {
            self.history.pop_front();
        }
        self.last_activity = now;
    }

    /// Discards the purchase context and returns to `Idle`.
    pub fn reset_to_idle(&mut self) {
        self.state = FlowState::Idle;
        self.context = OrderContext::default();
        self.completed_at = None;
    }

    /// Returns true if an `OrderCreated` session has outlived its grace window.
    pub fn grace_expired(&self, grace: Duration, now: DateTime<Utc>) -> bool {
        match (self.state, self.completed_at) {
            (FlowState::OrderCreated, Some(at)) => now - at >= grace,
            (FlowState::OrderCreated, None) => true,
            _ => false,
        }
    }

    /// Idempotency key for the order of the current cycle.
    pub fn order_key(&self) -> String {
        format!("{}:{}", self.id, self.cycle)
    }
}
