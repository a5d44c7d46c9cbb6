use domain::FlowState;
use serde::{Deserialize, Serialize};

/// Conversation facts the classifier may condition on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntentContext {
    pub is_in_flow: bool,
    pub current_state: FlowState,
    pub has_cart_items: bool,
    pub needs_address_selection: bool,
    pub needs_payment_selection: bool,
    pub needs_confirmation: bool,
}

impl IntentContext {
    /// Derives the context for a session in `state`.
    pub fn for_state(state: FlowState, has_cart_items: bool) -> Self {
        Self {
            is_in_flow: state.is_in_flow(),
            current_state: state,
            has_cart_items,
            needs_address_selection: state.needs_address_selection(),
            needs_payment_selection: state.needs_payment_selection(),
            needs_confirmation: state.needs_confirmation(),
        }
    }

    /// True when the flow is waiting on a specific answer.
    pub fn awaits_answer(&self) -> bool {
        self.needs_confirmation || self.needs_address_selection || self.needs_payment_selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_state_summary_shown() {
        let ctx = IntentContext::for_state(FlowState::SummaryShown, true);
        assert!(ctx.is_in_flow);
        assert!(ctx.needs_confirmation);
        assert!(!ctx.needs_address_selection);
        assert!(ctx.awaits_answer());
    }

    #[test]
    fn test_idle_awaits_nothing() {
        let ctx = IntentContext::for_state(FlowState::Idle, false);
        assert!(!ctx.is_in_flow);
        assert!(!ctx.awaits_answer());
    }
}
