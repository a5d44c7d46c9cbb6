mod types;

pub use types::{OrderId, SessionId, UserId};
