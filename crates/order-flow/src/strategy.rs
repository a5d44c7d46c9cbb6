//! The seam between a chat front end and an order-handling strategy.

use async_trait::async_trait;
use common::{SessionId, UserId};
use serde::Deserialize;

use crate::response::Response;

/// Per-request facts supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequestContext {
    /// The authenticated shopper, if any.
    pub user_id: Option<UserId>,
}

impl RequestContext {
    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Something that turns chat messages into order-flow responses.
///
/// Implementations never fail: every outcome, including internal errors,
/// is reported through [`Response`].
#[async_trait]
pub trait OrderStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, message: &str, session_id: &SessionId, ctx: &RequestContext)
    -> Response;
}
