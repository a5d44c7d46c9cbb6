//! Structured chat responses.

use domain::{Address, FlowState, Order, OrderSummary};
use intent::IntentKind;
use inventory::ValidationReport;
use serde::Serialize;

/// What the shopper is expected to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    ConfirmCart,
    SelectAddress,
    SelectPayment,
    ConfirmOrder,
}

impl NextStep {
    pub fn for_state(state: FlowState) -> Option<Self> {
        match state {
            FlowState::CartValidated => Some(NextStep::ConfirmCart),
            FlowState::AddressSelection => Some(NextStep::SelectAddress),
            FlowState::PaymentSelection => Some(NextStep::SelectPayment),
            FlowState::SummaryShown => Some(NextStep::ConfirmOrder),
            _ => None,
        }
    }
}

/// Answer to one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
    /// False when the message was not about ordering and no flow is active.
    pub order_flow: bool,
    pub state: FlowState,
    pub intent: IntentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<NextStep>,
    pub needs_confirmation: bool,
    pub needs_address_selection: bool,
    pub needs_payment_selection: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address_options: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<OrderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    /// True once the order of this cycle has been created.
    pub completed: bool,
}

impl Response {
    /// A response positioned at `state`, with prompt flags derived from it.
    pub fn at(state: FlowState, intent: IntentKind, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            order_flow: true,
            state,
            intent,
            next_step: NextStep::for_state(state),
            needs_confirmation: state.needs_confirmation(),
            needs_address_selection: state.needs_address_selection(),
            needs_payment_selection: state.needs_payment_selection(),
            address_options: Vec::new(),
            summary: None,
            validation: None,
            order: None,
            completed: state.is_terminal(),
        }
    }

    /// The message is not for the order flow.
    pub fn not_order(state: FlowState) -> Self {
        Self {
            order_flow: false,
            ..Self::at(state, IntentKind::NoOrder, String::new())
        }
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}
