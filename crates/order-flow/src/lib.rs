//! Conversational order flow.
//!
//! The engine turns free-text chat messages into a purchase:
//! 1. Classify the message against the session's current state
//! 2. Look up the action for `(state, intent)` in the transition table
//! 3. Run it, then any automatic follow-up steps
//! 4. Persist the session and answer with a structured [`Response`]
//!
//! Turns for one session are serialized; different sessions run concurrently.

pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod prompts;
pub mod response;
pub mod services;
pub mod strategy;
pub mod table;

pub use config::FlowConfig;
pub use engine::{Collaborators, OrderFlowEngine};
pub use error::{FlowError, Result, StockConflictLine};
pub use locks::SessionLocks;
pub use response::{NextStep, Response};
pub use services::{InMemoryShippingFeeService, ShippingFeeService, ShippingQuote};
pub use strategy::{OrderStrategy, RequestContext};
pub use table::{Action, Trigger};
