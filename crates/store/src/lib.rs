//! Persistence seams for the chat ordering engine.
//!
//! The engine owns no storage of its own. It talks to:
//! - a [`SessionStore`] holding one record per conversation (externalized, TTL-bearing)
//! - the cart, product, user and order stores owned by the surrounding shop
//!
//! In-memory implementations of every trait are provided for tests and demos,
//! plus a PostgreSQL-backed session store.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{
    InMemoryCartStore, InMemoryOrderStore, InMemoryProductStore, InMemorySessionStore,
    InMemoryUserStore,
};
pub use postgres::PostgresSessionStore;
pub use traits::{
    CartStore, OrderStore, ProductStore, SessionStore, StockAdjustment, UserStore, UserStoreExt,
};
