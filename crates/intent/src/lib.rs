//! Order intent classification for free-text chat messages.
//!
//! Classification is a pure function of the message and a small context
//! derived from the conversation. Rules are data: an ordered table of
//! `(tier, guard, matcher, outcome, confidence)` entries, evaluated in tier
//! order, first match wins.

pub mod classifier;
pub mod context;
pub mod intent;
pub mod normalize;
pub mod rules;

pub use classifier::IntentClassifier;
pub use context::IntentContext;
pub use intent::{Classification, Intent, IntentKind};
pub use normalize::NormalizedText;
pub use rules::{Guard, Hit, Matcher, Outcome, RULES, Rule, Tier};
