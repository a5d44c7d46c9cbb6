use tracing::debug;

use crate::context::IntentContext;
use crate::intent::Classification;
use crate::normalize::NormalizedText;
use crate::rules::{RULES, Rule, Tier};

/// Classifies chat messages by running an ordered rule table.
///
/// Never fails: anything unrecognized is `NO_ORDER` with confidence 0.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<Rule>,
}

impl IntentClassifier {
    /// Creates a classifier over the built-in rules.
    pub fn new() -> Self {
        Self::with_rules(RULES.to_vec())
    }

    /// Creates a classifier over custom rules, ordered by tier.
    ///
    /// The sort is stable, so rules in the same tier keep their given order.
    pub fn with_rules(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|rule| rule.tier);
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn classify(&self, message: &str, ctx: &IntentContext) -> Classification {
        let text = NormalizedText::new(message);
        if text.is_empty() {
            return Classification::no_order("empty message");
        }

        for rule in &self.rules {
            if let Some(classification) = rule.evaluate(&text, ctx) {
                debug!(
                    rule = rule.name,
                    intent = %classification.intent.kind(),
                    confidence = classification.confidence,
                    "Intent classified"
                );
                return classification;
            }
        }

        Classification::no_order("no rule matched")
    }

    /// Runs only the rules of one tier. Useful for inspecting a tier in isolation.
    pub fn classify_tier(
        &self,
        tier: Tier,
        message: &str,
        ctx: &IntentContext,
    ) -> Option<Classification> {
        let text = NormalizedText::new(message);
        self.rules
            .iter()
            .filter(|rule| rule.tier == tier)
            .find_map(|rule| rule.evaluate(&text, ctx))
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::rules::{Guard, Matcher, Outcome};
    use domain::{FlowState, PaymentMethod};
    use proptest::prelude::*;

    fn classify(message: &str, state: FlowState, has_cart_items: bool) -> Classification {
        IntentClassifier::new().classify(message, &IntentContext::for_state(state, has_cart_items))
    }

    #[test]
    fn test_unmatched_is_no_order() {
        let c = classify("shop có áo màu đỏ không nhỉ", FlowState::Idle, true);
        assert_eq!(c.intent, Intent::NoOrder);
        assert_eq!(c.confidence, 0.0);
        assert!(!c.trigger);
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(classify("   ", FlowState::Idle, true).intent, Intent::NoOrder);
    }

    #[test]
    fn test_order_request_from_idle() {
        let c = classify("Đặt hàng", FlowState::Idle, false);
        assert_eq!(c.intent, Intent::OrderRequest);
        assert_eq!(c.confidence, 0.95);
    }

    #[test]
    fn test_exclusion_beats_order_verbs() {
        let c = classify("xóa khỏi giỏ rồi mua cái khác", FlowState::Idle, true);
        assert_eq!(c.intent, Intent::NoOrder);
        assert!(c.reason.starts_with("cart management"));
    }

    #[test]
    fn test_cancellation_beats_order_verbs() {
        let c = classify("hủy đặt hàng", FlowState::Idle, true);
        assert_eq!(c.intent, Intent::OrderCancellation);
    }

    #[test]
    fn test_bare_no_cancels_at_summary() {
        let c = classify("không", FlowState::SummaryShown, true);
        assert_eq!(c.intent, Intent::OrderCancellation);
    }

    #[test]
    fn test_bare_yes_ignored_outside_flow() {
        assert_eq!(classify("có", FlowState::Idle, true).intent, Intent::NoOrder);
        assert_eq!(classify("ok", FlowState::Idle, false).intent, Intent::NoOrder);
    }

    #[test]
    fn test_bare_yes_confirms_in_flow() {
        let c = classify("có", FlowState::SummaryShown, true);
        assert_eq!(c.intent, Intent::OrderConfirmation { confirmed: true });
    }

    #[test]
    fn test_decomposed_text_classifies_like_composed() {
        let c = classify("co\u{301}", FlowState::SummaryShown, true);
        assert_eq!(c.intent, Intent::OrderConfirmation { confirmed: true });

        let c = classify("\u{110}a\u{323}\u{302}t ha\u{300}ng", FlowState::Idle, false);
        assert_eq!(c.intent, Intent::OrderRequest);
    }

    #[test]
    fn test_order_verb_at_summary_confirms() {
        let c = classify("xác nhận đặt hàng", FlowState::SummaryShown, true);
        assert_eq!(c.intent, Intent::OrderConfirmation { confirmed: true });
    }

    #[test]
    fn test_numeric_only_needs_address_selection() {
        assert_eq!(classify("1", FlowState::Idle, true).intent, Intent::NoOrder);
        assert_eq!(
            classify("1", FlowState::AddressSelection, true).intent,
            Intent::AddressSelection { ordinal: 1 }
        );
    }

    #[test]
    fn test_payment_selection() {
        assert_eq!(
            classify("COD", FlowState::PaymentSelection, true).intent,
            Intent::PaymentSelection {
                method: PaymentMethod::Cod
            }
        );
        assert_eq!(
            classify("2", FlowState::PaymentSelection, true).intent,
            Intent::PaymentSelection {
                method: PaymentMethod::Online
            }
        );
        assert_eq!(classify("cod", FlowState::Idle, true).intent, Intent::NoOrder);
    }

    #[test]
    fn test_classify_tier_in_isolation() {
        let classifier = IntentClassifier::new();
        let ctx = IntentContext::for_state(FlowState::Idle, true);
        assert!(classifier.classify_tier(Tier::Secondary, "mua áo", &ctx).is_some());
        assert!(classifier.classify_tier(Tier::Primary, "mua áo", &ctx).is_none());
    }

    #[test]
    fn test_custom_rules_are_sorted_by_tier() {
        let late = Rule {
            name: "late",
            tier: Tier::FlowSpecific,
            guard: Guard::Always,
            matcher: Matcher::AnyPhrase(&["go"]),
            outcome: Outcome::Fixed(Intent::OrderRequest),
            confidence: 0.5,
        };
        let early = Rule {
            name: "early",
            tier: Tier::Exclusion,
            guard: Guard::Always,
            matcher: Matcher::AnyPhrase(&["go"]),
            outcome: Outcome::Exclude,
            confidence: 0.0,
        };
        let classifier = IntentClassifier::with_rules(vec![late, early]);
        assert_eq!(classifier.rules()[0].name, "early");
        let c = classifier.classify("go", &IntentContext::default());
        assert_eq!(c.intent, Intent::NoOrder);
    }

    proptest! {
        #[test]
        fn test_classify_never_panics_and_stays_in_range(message in ".{0,64}", state_index in 0usize..11) {
            let state = FlowState::ALL[state_index];
            let c = classify(&message, state, true);
            prop_assert!((0.0..=1.0).contains(&c.confidence));
            prop_assert_eq!(c.trigger, c.intent != Intent::NoOrder);
        }

        #[test]
        fn test_cancellation_wins_in_every_state(state_index in 0usize..11, suffix in "[0-9 ]{0,8}") {
            let state = FlowState::ALL[state_index];
            let c = classify(&format!("hủy {suffix}"), state, true);
            prop_assert_eq!(c.intent, Intent::OrderCancellation);
        }
    }
}
