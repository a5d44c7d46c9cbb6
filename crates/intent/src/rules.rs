//! The ordered rule table.
//!
//! Tiers are evaluated in their declared order and the first matching rule
//! wins. Within a tier, rules keep their position in [`RULES`].

use domain::PaymentMethod;

use crate::context::IntentContext;
use crate::intent::{Classification, Intent};
use crate::normalize::NormalizedText;

/// Priority band of a rule. Lower variants are evaluated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Exclusion,
    Cancellation,
    Primary,
    Secondary,
    Contextual,
    Confirmation,
    FlowSpecific,
}

/// Condition on the conversation that must hold for a rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    InFlow,
    HasCartItems,
    /// The flow is not waiting on a yes/no, address or payment answer.
    NotAwaitingAnswer,
    NeedsConfirmation,
    NeedsAddressSelection,
    NeedsPaymentSelection,
}

impl Guard {
    pub fn allows(&self, ctx: &IntentContext) -> bool {
        match self {
            Guard::Always => true,
            Guard::InFlow => ctx.is_in_flow,
            Guard::HasCartItems => ctx.has_cart_items,
            Guard::NotAwaitingAnswer => !ctx.awaits_answer(),
            Guard::NeedsConfirmation => ctx.needs_confirmation,
            Guard::NeedsAddressSelection => ctx.needs_address_selection,
            Guard::NeedsPaymentSelection => ctx.needs_payment_selection,
        }
    }
}

/// How a rule recognizes text.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Any of the phrases occurs as a run of whole words.
    AnyPhrase(&'static [&'static str]),
    /// The whole message is one of the entries.
    Exactly(&'static [&'static str]),
    /// The whole message is a positive integer.
    Ordinal,
}

/// What a matcher found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Phrase(&'static str),
    Ordinal(u32),
}

impl std::fmt::Display for Hit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hit::Phrase(phrase) => write!(f, "'{phrase}'"),
            Hit::Ordinal(n) => write!(f, "#{n}"),
        }
    }
}

impl Matcher {
    pub fn find(&self, text: &NormalizedText) -> Option<Hit> {
        match *self {
            Matcher::AnyPhrase(phrases) => phrases
                .iter()
                .copied()
                .find(|phrase| text.contains_phrase(phrase))
                .map(Hit::Phrase),
            Matcher::Exactly(entries) => entries
                .iter()
                .copied()
                .find(|entry| text.as_str() == *entry)
                .map(Hit::Phrase),
            Matcher::Ordinal => text.as_ordinal().map(Hit::Ordinal),
        }
    }
}

/// What a matching rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stop classification with `NO_ORDER`.
    Exclude,
    Fixed(Intent),
    /// Address selection carrying the matched ordinal.
    AddressOrdinal,
    /// Payment selection by 1-based position in [`PaymentMethod::ALL`].
    PaymentOrdinal,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub tier: Tier,
    pub guard: Guard,
    pub matcher: Matcher,
    pub outcome: Outcome,
    pub confidence: f32,
}

impl Rule {
    /// Applies this rule alone. `None` means the rule does not match.
    pub fn evaluate(&self, text: &NormalizedText, ctx: &IntentContext) -> Option<Classification> {
        if !self.guard.allows(ctx) {
            return None;
        }
        let hit = self.matcher.find(text)?;
        let ordinal = match hit {
            Hit::Ordinal(n) => Some(n),
            Hit::Phrase(_) => None,
        };

        let intent = match self.outcome {
            Outcome::Exclude => {
                return Some(Classification {
                    intent: Intent::NoOrder,
                    confidence: self.confidence,
                    trigger: false,
                    reason: format!("{} {hit}", self.name),
                });
            }
            Outcome::Fixed(intent) => intent,
            Outcome::AddressOrdinal => Intent::AddressSelection { ordinal: ordinal? },
            Outcome::PaymentOrdinal => Intent::PaymentSelection {
                method: PaymentMethod::from_ordinal(ordinal?)?,
            },
        };

        Some(Classification {
            intent,
            confidence: self.confidence,
            trigger: true,
            reason: format!("{} {hit}", self.name),
        })
    }
}

const CART_MANAGEMENT: &[&str] = &[
    "xóa khỏi giỏ",
    "xoá khỏi giỏ",
    "xóa giỏ",
    "xoá giỏ",
    "xóa sản phẩm",
    "xoá sản phẩm",
    "bỏ khỏi giỏ",
    "làm trống giỏ",
    "xem giỏ",
    "giỏ hàng có gì",
    "remove from cart",
    "delete from cart",
    "clear cart",
    "empty cart",
    "empty my cart",
    "view cart",
    "show cart",
    "show my cart",
];

const CANCEL_PHRASES: &[&str] = &[
    "hủy",
    "huỷ",
    "cancel",
    "thôi không mua",
    "thôi không đặt",
    "không mua nữa",
    "không đặt nữa",
    "dừng lại",
    "stop order",
];

const BARE_NEGATIVES: &[&str] = &["không", "ko", "no", "nope", "thôi", "không ạ", "không cần"];

const PRIMARY_VERBS: &[&str] = &[
    "đặt hàng",
    "đặt mua",
    "đặt đơn",
    "lên đơn",
    "chốt đơn",
    "mua ngay",
    "tiến hành thanh toán",
    "checkout",
    "check out",
    "place order",
    "place an order",
    "order now",
];

const SECONDARY_VERBS: &[&str] = &[
    "mua",
    "order",
    "buy",
    "purchase",
    "giao hàng",
    "gửi hàng",
    "ship",
];

const CART_AFFIRMATIVES: &[&str] = &[
    "lấy cái này",
    "lấy luôn",
    "tôi lấy",
    "mình lấy",
    "chốt luôn",
    "i ll take it",
    "take it",
    "sounds good",
];

const BARE_AFFIRMATIVES: &[&str] = &[
    "có",
    "có ạ",
    "dạ có",
    "dạ",
    "vâng",
    "ừ",
    "được",
    "đồng ý",
    "ok",
    "oke",
    "okay",
    "ok luôn",
    "yes",
    "yep",
    "y",
];

const CONFIRM_PHRASES: &[&str] = &[
    "xác nhận",
    "đúng rồi",
    "chính xác",
    "chắc chắn",
    "tiếp tục",
    "đặt hàng",
    "đặt luôn",
    "confirm",
    "continue",
    "proceed",
];

const DECLINE_PHRASES: &[&str] = &["chưa", "để sau", "sai rồi", "không đúng", "not yet"];

const COD_PHRASES: &[&str] = &[
    "cod",
    "tiền mặt",
    "thanh toán khi nhận hàng",
    "trả khi nhận hàng",
    "cash",
];

const ONLINE_PHRASES: &[&str] = &[
    "chuyển khoản",
    "online",
    "ngân hàng",
    "bank",
    "ví điện tử",
    "momo",
    "zalopay",
    "vnpay",
    "transfer",
];

/// The classifier's rules, in evaluation order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "cart management",
        tier: Tier::Exclusion,
        guard: Guard::Always,
        matcher: Matcher::AnyPhrase(CART_MANAGEMENT),
        outcome: Outcome::Exclude,
        confidence: 0.0,
    },
    Rule {
        name: "cancellation keyword",
        tier: Tier::Cancellation,
        guard: Guard::Always,
        matcher: Matcher::AnyPhrase(CANCEL_PHRASES),
        outcome: Outcome::Fixed(Intent::OrderCancellation),
        confidence: 0.95,
    },
    Rule {
        name: "bare negative in flow",
        tier: Tier::Cancellation,
        guard: Guard::InFlow,
        matcher: Matcher::Exactly(BARE_NEGATIVES),
        outcome: Outcome::Fixed(Intent::OrderCancellation),
        confidence: 0.9,
    },
    Rule {
        name: "primary order verb",
        tier: Tier::Primary,
        guard: Guard::NotAwaitingAnswer,
        matcher: Matcher::AnyPhrase(PRIMARY_VERBS),
        outcome: Outcome::Fixed(Intent::OrderRequest),
        confidence: 0.95,
    },
    Rule {
        name: "secondary order verb",
        tier: Tier::Secondary,
        guard: Guard::NotAwaitingAnswer,
        matcher: Matcher::AnyPhrase(SECONDARY_VERBS),
        outcome: Outcome::Fixed(Intent::OrderRequest),
        confidence: 0.75,
    },
    Rule {
        name: "bare affirmative in flow",
        tier: Tier::Contextual,
        guard: Guard::InFlow,
        matcher: Matcher::Exactly(BARE_AFFIRMATIVES),
        outcome: Outcome::Fixed(Intent::OrderConfirmation { confirmed: true }),
        confidence: 0.85,
    },
    Rule {
        name: "affirmative with cart",
        tier: Tier::Contextual,
        guard: Guard::HasCartItems,
        matcher: Matcher::AnyPhrase(CART_AFFIRMATIVES),
        outcome: Outcome::Fixed(Intent::OrderRequest),
        confidence: 0.7,
    },
    Rule {
        name: "confirmation keyword",
        tier: Tier::Confirmation,
        guard: Guard::NeedsConfirmation,
        matcher: Matcher::AnyPhrase(CONFIRM_PHRASES),
        outcome: Outcome::Fixed(Intent::OrderConfirmation { confirmed: true }),
        confidence: 0.9,
    },
    Rule {
        name: "decline keyword",
        tier: Tier::Confirmation,
        guard: Guard::NeedsConfirmation,
        matcher: Matcher::AnyPhrase(DECLINE_PHRASES),
        outcome: Outcome::Fixed(Intent::OrderConfirmation { confirmed: false }),
        confidence: 0.85,
    },
    Rule {
        name: "address ordinal",
        tier: Tier::FlowSpecific,
        guard: Guard::NeedsAddressSelection,
        matcher: Matcher::Ordinal,
        outcome: Outcome::AddressOrdinal,
        confidence: 0.9,
    },
    Rule {
        name: "cash on delivery",
        tier: Tier::FlowSpecific,
        guard: Guard::NeedsPaymentSelection,
        matcher: Matcher::AnyPhrase(COD_PHRASES),
        outcome: Outcome::Fixed(Intent::PaymentSelection {
            method: PaymentMethod::Cod,
        }),
        confidence: 0.9,
    },
    Rule {
        name: "online payment",
        tier: Tier::FlowSpecific,
        guard: Guard::NeedsPaymentSelection,
        matcher: Matcher::AnyPhrase(ONLINE_PHRASES),
        outcome: Outcome::Fixed(Intent::PaymentSelection {
            method: PaymentMethod::Online,
        }),
        confidence: 0.9,
    },
    Rule {
        name: "payment ordinal",
        tier: Tier::FlowSpecific,
        guard: Guard::NeedsPaymentSelection,
        matcher: Matcher::Ordinal,
        outcome: Outcome::PaymentOrdinal,
        confidence: 0.85,
    },
];
