use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{SessionId, UserId};
use domain::{Address, Cart, CartLine, NewOrder, Order, Product, ProductId, Session};

use crate::traits::{CartStore, OrderStore, ProductStore, SessionStore, StockAdjustment, UserStore};
use crate::{Result, StoreError};

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// In-memory session store for tests and single-instance deployments.
///
/// Applies the same TTL and version rules as the PostgreSQL implementation.
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<tokio::sync::RwLock<HashMap<SessionId, StoredSession>>>,
    ttl: Duration,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemorySessionStore {
    /// Creates a store whose records expire `ttl` after their last save.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
            fail_on_save: Arc::default(),
        }
    }

    /// Returns the number of stored sessions, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Configures the store to fail on subsequent saves.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::minutes(30))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            Some(stored) if stored.expires_at > now => Ok(Some(stored.session.clone())),
            Some(_) => {
                sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<u64> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("session store offline".to_string()));
        }

        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let actual = sessions
            .get(&session.id)
            .filter(|stored| stored.expires_at > now)
            .map(|stored| stored.session.version)
            .unwrap_or(0);
        if actual != session.version {
            return Err(StoreError::VersionConflict {
                session_id: session.id.clone(),
                expected: session.version,
                actual,
            });
        }

        let mut stored = session.clone();
        stored.version = session.version + 1;
        let version = stored.version;
        sessions.insert(
            session.id.clone(),
            StoredSession {
                session: stored,
                expires_at: now + self.ttl,
            },
        );
        Ok(version)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, Cart>,
    fail_on_delete: bool,
}

/// In-memory cart store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a user's cart.
    pub fn set_lines(&self, user_id: &UserId, lines: Vec<CartLine>) {
        let cart = Cart::new(user_id.clone(), lines);
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .carts
            .insert(user_id.clone(), cart);
    }

    /// Returns a copy of a user's cart, if any.
    pub fn cart(&self, user_id: &UserId) -> Option<Cart> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).carts.get(user_id).cloned()
    }

    /// Configures the store to fail on delete_by_user.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).fail_on_delete = fail;
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_by_user(&self, user_id: &UserId) -> Result<Vec<CartLine>> {
        Ok(self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .carts
            .get(user_id)
            .map(|c| c.lines.clone())
            .unwrap_or_default())
    }

    async fn save(&self, cart: &Cart) -> Result<()> {
        let mut cart = cart.clone();
        cart.recompute_total();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .carts
            .insert(cart.user_id.clone(), cart);
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_delete {
            return Err(StoreError::Unavailable("cart service offline".to_string()));
        }
        state.carts.remove(user_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryProductState {
    products: HashMap<ProductId, Product>,
    fail_on_lookup: bool,
    fail_on_decrement: bool,
}

/// In-memory product catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    state: Arc<RwLock<InMemoryProductState>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub fn upsert(&self, product: Product) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .insert(product.id.clone(), product);
    }

    /// Returns a copy of a product, if any.
    pub fn product(&self, product_id: &ProductId) -> Option<Product> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).products.get(product_id).cloned()
    }

    /// Sets a product's live stock.
    pub fn set_stock(&self, product_id: &ProductId, stock: u32) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = state.products.get_mut(product_id) {
            p.stock = stock;
        }
    }

    /// Configures the store to fail on get_by_id.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).fail_on_lookup = fail;
    }

    /// Configures the store to fail on stock decrements.
    pub fn set_fail_on_decrement(&self, fail: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).fail_on_decrement = fail;
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get_by_id(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_lookup {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }
        Ok(state.products.get(product_id).cloned())
    }

    async fn decrement_stock_and_increment_sold(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockAdjustment> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_decrement {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })?;

        let previous_stock = product.stock;
        let clamped = quantity > previous_stock;
        if clamped {
            tracing::warn!(
                %product_id,
                previous_stock,
                quantity,
                "stock decrement clamped at zero"
            );
        }
        product.stock = previous_stock.saturating_sub(quantity);
        product.sold = product.sold.saturating_add(quantity);

        Ok(StockAdjustment {
            product_id: product_id.clone(),
            previous_stock,
            new_stock: product.stock,
            clamped,
        })
    }
}

/// In-memory user profile store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    addresses: Arc<RwLock<HashMap<UserId, Vec<Address>>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a saved address to a user's profile.
    pub fn add_address(&self, user_id: &UserId, address: Address) {
        self.addresses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id.clone())
            .or_default()
            .push(address);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_addresses(&self, user_id: &UserId) -> Result<Vec<Address>> {
        let mut addresses = self
            .addresses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        addresses.sort_by_key(|a| !a.is_default);
        Ok(addresses)
    }
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: Vec<Order>,
    by_key: HashMap<String, usize>,
    fail_on_create: bool,
}

/// In-memory order store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).orders.len()
    }

    /// Returns copies of all persisted orders in creation order.
    pub fn orders(&self) -> Vec<Order> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).orders.clone()
    }

    /// Configures the store to fail on create.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).fail_on_create = fail;
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_create {
            return Err(StoreError::Unavailable("order database offline".to_string()));
        }
        if let Some(&index) = state.by_key.get(&order.idempotency_key) {
            tracing::info!(key = %order.idempotency_key, "order already created for key");
            return Ok(state.orders[index].clone());
        }

        let order = Order::create(order, Utc::now());
        let index = state.orders.len();
        state.by_key.insert(order.idempotency_key.clone(), index);
        state.orders.push(order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::UserStoreExt;
    use domain::{Money, OrderSummary, PaymentMethod};

    fn session(id: &str) -> Session {
        Session::new(SessionId::from(id), Utc::now())
    }

    #[tokio::test]
    async fn test_session_save_and_load() {
        let store = InMemorySessionStore::default();
        let s = session("s-1");

        let version = store.save(&s).await.unwrap();
        assert_eq!(version, 1);

        let loaded = store.load(&s.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.id, s.id);
    }

    #[tokio::test]
    async fn test_session_stale_version_conflicts() {
        let store = InMemorySessionStore::default();
        let s = session("s-1");
        store.save(&s).await.unwrap();

        // Saving the version-0 copy again is a stale write.
        let result = store.save(&s).await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected: 0,
                actual: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_session_expires_after_ttl() {
        let store = InMemorySessionStore::new(Duration::zero());
        let s = session("s-1");
        store.save(&s).await.unwrap();

        assert!(store.load(&s.id).await.unwrap().is_none());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemorySessionStore::new(Duration::zero());
        store.save(&session("a")).await.unwrap();
        store.save(&session("b")).await.unwrap();
        assert_eq!(store.purge_expired().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_decrement_clamps_at_zero() {
        let store = InMemoryProductStore::new();
        let id = ProductId::new("SKU-1");
        store.upsert(Product::new(id.clone(), "Áo", Money::from_dong(100_000), 2));

        let adj = store
            .decrement_stock_and_increment_sold(&id, 5)
            .await
            .unwrap();
        assert!(adj.clamped);
        assert_eq!(adj.previous_stock, 2);
        assert_eq!(adj.new_stock, 0);

        let product = store.product(&id).unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(product.sold, 5);
    }

    #[tokio::test]
    async fn test_sold_counter_saturates() {
        let store = InMemoryProductStore::new();
        let id = ProductId::new("SKU-1");
        let mut product = Product::new(id.clone(), "Áo", Money::from_dong(100_000), 2);
        product.sold = u32::MAX - 1;
        store.upsert(product);

        store.decrement_stock_and_increment_sold(&id, 5).await.unwrap();

        assert_eq!(store.product(&id).unwrap().sold, u32::MAX);
    }

    #[tokio::test]
    async fn test_decrement_unknown_product() {
        let store = InMemoryProductStore::new();
        let result = store
            .decrement_stock_and_increment_sold(&ProductId::new("nope"), 1)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_default_address_preferred() {
        let store = InMemoryUserStore::new();
        let user = UserId::from("u-1");
        store.add_address(&user, Address::new("A", "1", "s", "w", "d", "p"));
        store.add_address(&user, Address::new("B", "2", "s", "w", "d", "p").as_default());

        let addresses = store.get_addresses(&user).await.unwrap();
        assert_eq!(addresses[0].recipient, "B");
        assert_eq!(store.get_address(&user).await.unwrap().unwrap().recipient, "B");
        assert!(store.get_address(&UserId::from("u-2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cart_save_recomputes_total() {
        let store = InMemoryCartStore::new();
        let user = UserId::from("u-1");
        let mut cart = Cart::new(
            user.clone(),
            vec![CartLine::new("SKU-1", "Áo", 2, Money::from_dong(100_000))],
        );
        cart.total = Money::from_dong(1);
        store.save(&cart).await.unwrap();
        assert_eq!(store.cart(&user).unwrap().total.dong(), 200_000);

        store.delete_by_user(&user).await.unwrap();
        assert!(store.get_by_user(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_create_is_idempotent_per_key() {
        let store = InMemoryOrderStore::new();
        let lines = vec![CartLine::new("SKU-1", "Áo", 1, Money::from_dong(100_000))];
        let summary = OrderSummary::compute(&lines, Money::from_dong(30_000), Money::zero());
        let data = NewOrder::from_chat(
            "s-1:1",
            UserId::from("u-1"),
            &lines,
            Address::new("A", "1", "s", "w", "d", "p"),
            PaymentMethod::Cod,
            &summary,
        );

        let first = store.create(data.clone()).await.unwrap();
        let second = store.create(data).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.order_count(), 1);
    }
}
