//! The declared transition table.
//!
//! `(state, trigger) -> action` rows decide what a message does, and the
//! edge list bounds which state changes an action may make. Anything not
//! listed gets guidance and leaves the state alone.

use std::collections::{HashSet, VecDeque};

use domain::FlowState;
use intent::Intent;
use serde::Serialize;

/// What the shopper's message asks for, stripped of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    Request,
    Confirm,
    Decline,
    Cancel,
    PickAddress,
    PickPayment,
}

impl Trigger {
    pub fn from_intent(intent: &Intent) -> Option<Self> {
        match intent {
            Intent::NoOrder => None,
            Intent::OrderRequest => Some(Trigger::Request),
            Intent::OrderConfirmation { confirmed: true } => Some(Trigger::Confirm),
            Intent::OrderConfirmation { confirmed: false } => Some(Trigger::Decline),
            Intent::OrderCancellation => Some(Trigger::Cancel),
            Intent::AddressSelection { .. } => Some(Trigger::PickAddress),
            Intent::PaymentSelection { .. } => Some(Trigger::PickPayment),
        }
    }
}

/// One step the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Validate and snapshot the cart.
    InitiateOrder,
    /// Pick the address automatically or prompt for one.
    ResolveAddress,
    BindAddress,
    CalculateShipping,
    PromptPayment,
    BindPayment,
    BuildSummary,
    Commit,
    /// Drop the order context and return to `IDLE`.
    Discard,
    /// Explain what is expected in the current state.
    Guidance,
}

/// Actions triggered by shopper messages.
pub static TRANSITIONS: &[(FlowState, Trigger, Action)] = &[
    (FlowState::Idle, Trigger::Request, Action::InitiateOrder),
    (FlowState::OrderInitiated, Trigger::Request, Action::InitiateOrder),
    (FlowState::OrderCreated, Trigger::Request, Action::InitiateOrder),
    (FlowState::ErrorState, Trigger::Request, Action::InitiateOrder),
    (FlowState::CartValidated, Trigger::Confirm, Action::ResolveAddress),
    (FlowState::CartValidated, Trigger::Decline, Action::Discard),
    (FlowState::AddressSelection, Trigger::PickAddress, Action::BindAddress),
    (FlowState::PaymentSelection, Trigger::PickPayment, Action::BindPayment),
    (FlowState::SummaryShown, Trigger::Confirm, Action::Commit),
    (FlowState::SummaryShown, Trigger::Decline, Action::Discard),
];

/// Actions the engine runs on its own when a session rests in these states.
pub static AUTO_TRANSITIONS: &[(FlowState, Action)] = &[
    (FlowState::AddressSelected, Action::CalculateShipping),
    (FlowState::ShippingCalculated, Action::PromptPayment),
    (FlowState::PaymentSelected, Action::BuildSummary),
];

/// State changes actions may make, besides any state to `IDLE` or `ERROR_STATE`.
pub static EDGES: &[(FlowState, FlowState)] = &[
    (FlowState::Idle, FlowState::OrderInitiated),
    (FlowState::ErrorState, FlowState::OrderInitiated),
    (FlowState::OrderCreated, FlowState::OrderInitiated),
    (FlowState::OrderInitiated, FlowState::CartValidated),
    (FlowState::CartValidated, FlowState::AddressSelection),
    (FlowState::CartValidated, FlowState::AddressSelected),
    (FlowState::AddressSelection, FlowState::AddressSelected),
    (FlowState::AddressSelected, FlowState::ShippingCalculated),
    (FlowState::ShippingCalculated, FlowState::PaymentSelection),
    (FlowState::PaymentSelection, FlowState::PaymentSelected),
    (FlowState::PaymentSelected, FlowState::SummaryShown),
    (FlowState::SummaryShown, FlowState::OrderCreated),
];

/// Looks up the action for a message. Cancellation applies in every state.
pub fn action_for(state: FlowState, intent: &Intent) -> Action {
    let Some(trigger) = Trigger::from_intent(intent) else {
        return Action::Guidance;
    };
    if trigger == Trigger::Cancel {
        return Action::Discard;
    }
    TRANSITIONS
        .iter()
        .find(|(from, t, _)| *from == state && *t == trigger)
        .map(|(_, _, action)| *action)
        .unwrap_or(Action::Guidance)
}

pub fn auto_action(state: FlowState) -> Option<Action> {
    AUTO_TRANSITIONS
        .iter()
        .find(|(from, _)| *from == state)
        .map(|(_, action)| *action)
}

/// Returns true if a single step may move `from` to `to`.
pub fn is_allowed(from: FlowState, to: FlowState) -> bool {
    from == to
        || matches!(to, FlowState::Idle | FlowState::ErrorState)
        || EDGES.contains(&(from, to))
}

/// Returns true if `to` can be reached from `from` through allowed steps.
pub fn reachable(from: FlowState, to: FlowState) -> bool {
    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(state) = queue.pop_front() {
        if state == to {
            return true;
        }
        for next in FlowState::ALL {
            if is_allowed(state, next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    false
}
