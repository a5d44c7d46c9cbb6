use async_trait::async_trait;
use common::{SessionId, UserId};
use domain::{Address, Cart, CartLine, NewOrder, Order, Product, ProductId, Session};

use crate::Result;

/// Outcome of a stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub previous_stock: u32,
    pub new_stock: u32,
    /// True if the decrement would have driven stock negative and was clamped at zero.
    pub clamped: bool,
}

/// Shopper carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the lines in the user's cart; an unknown user has an empty cart.
    async fn get_by_user(&self, user_id: &UserId) -> Result<Vec<CartLine>>;

    /// Replaces the user's cart contents and stored total.
    async fn save(&self, cart: &Cart) -> Result<()>;

    /// Empties the user's cart.
    async fn delete_by_user(&self, user_id: &UserId) -> Result<()>;
}

/// Live catalog data.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_by_id(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Decrements stock and increments the sold counter.
    ///
    /// Stock never goes below zero; a decrement larger than the remaining
    /// stock is clamped and reported through [`StockAdjustment::clamped`].
    async fn decrement_stock_and_increment_sold(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockAdjustment>;
}

/// Shopper profiles.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns all saved shipping addresses, default first.
    async fn get_addresses(&self, user_id: &UserId) -> Result<Vec<Address>>;
}

/// Convenience methods for user stores.
#[async_trait]
pub trait UserStoreExt: UserStore {
    /// Returns the default address, or the first saved one.
    async fn get_address(&self, user_id: &UserId) -> Result<Option<Address>> {
        let addresses = self.get_addresses(user_id).await?;
        let default = addresses.iter().find(|a| a.is_default).cloned();
        Ok(default.or_else(|| addresses.into_iter().next()))
    }
}

impl<T: UserStore + ?Sized> UserStoreExt for T {}

/// Committed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order.
    ///
    /// Creating twice with the same `idempotency_key` returns the order
    /// created the first time instead of a second one.
    async fn create(&self, order: NewOrder) -> Result<Order>;
}

/// Conversation sessions.
///
/// Implementations expire records after a TTL and enforce optimistic
/// concurrency on `Session::version`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a live session. Expired sessions are reported as absent.
    async fn load(&self, session_id: &SessionId) -> Result<Option<Session>>;

    /// Saves a session and returns its new version.
    ///
    /// Fails with `VersionConflict` if the stored version differs from
    /// `session.version`. Version 0 means the session must not exist yet.
    async fn save(&self, session: &Session) -> Result<u64>;

    async fn delete(&self, session_id: &SessionId) -> Result<()>;

    /// Removes expired sessions and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64>;
}
