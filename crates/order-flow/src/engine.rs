//! The order flow engine.
//!
//! One [`OrderFlowEngine::handle`] call is one chat turn: load the session,
//! classify the message, run the table action plus any automatic follow-ups,
//! then persist the session with its new version.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::SessionId;
use domain::{
    Address, Cart, CartLine, FlowState, NewOrder, Order, OrderContext, OrderSummary,
    PackageDimensions, Session, ShippingInfo, Speaker, merge_lines,
};
use futures_util::FutureExt;
use intent::{Intent, IntentClassifier, IntentContext, IntentKind};
use inventory::{InventoryValidator, ValidationReport};
use store::{CartStore, OrderStore, ProductStore, SessionStore, UserStore};

use crate::config::FlowConfig;
use crate::error::{FlowError, Result, StockConflictLine};
use crate::locks::SessionLocks;
use crate::prompts;
use crate::response::Response;
use crate::services::ShippingFeeService;
use crate::strategy::{OrderStrategy, RequestContext};
use crate::table::{self, Action};

/// External systems the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub carts: Arc<dyn CartStore>,
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub orders: Arc<dyn OrderStore>,
    pub shipping: Arc<dyn ShippingFeeService>,
}

/// Text and attachments gathered while a turn runs.
struct Reply {
    success: bool,
    lines: Vec<String>,
    validation: Option<ValidationReport>,
    order: Option<Order>,
}

impl Reply {
    fn new() -> Self {
        Self {
            success: true,
            lines: Vec::new(),
            validation: None,
            order: None,
        }
    }

    fn say(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn fail(&mut self, text: impl Into<String>) {
        self.success = false;
        self.say(text);
    }
}

/// Deterministic, table-driven order flow.
pub struct OrderFlowEngine {
    stores: Collaborators,
    config: FlowConfig,
    classifier: IntentClassifier,
    validator: InventoryValidator,
    locks: SessionLocks,
}

impl OrderFlowEngine {
    pub fn new(stores: Collaborators, config: FlowConfig) -> Self {
        let validator = InventoryValidator::new(stores.products.clone());
        Self {
            stores,
            config,
            classifier: IntentClassifier::new(),
            validator,
            locks: SessionLocks::new(),
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Handles one chat turn.
    ///
    /// Never fails: fatal errors and panics move the session to
    /// `ERROR_STATE` and come back as an unsuccessful [`Response`].
    #[tracing::instrument(skip(self, message, ctx), fields(session_id = %session_id))]
    pub async fn handle(
        &self,
        message: &str,
        session_id: &SessionId,
        ctx: &RequestContext,
    ) -> Response {
        let started = Instant::now();
        let _turn = self.locks.acquire(session_id).await;

        let outcome = AssertUnwindSafe(self.process_turn(message, session_id, ctx))
            .catch_unwind()
            .await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => self.fail_turn(session_id, error).await,
            Err(panic) => {
                let error = FlowError::Internal(panic_message(panic.as_ref()));
                self.fail_turn(session_id, error).await
            }
        };

        metrics::counter!("chat_order_turns_total", "intent" => response.intent.as_str())
            .increment(1);
        metrics::histogram!("chat_order_turn_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        response
    }

    async fn process_turn(
        &self,
        message: &str,
        session_id: &SessionId,
        ctx: &RequestContext,
    ) -> Result<Response> {
        let now = Utc::now();
        let mut session = self.load_session(session_id, now).await?;
        if let Some(user_id) = &ctx.user_id {
            // The flow context (cart snapshot, address, order key) belongs to the bound user.
            let foreign = session.user_id.as_ref().is_some_and(|bound| bound != user_id);
            if foreign && session.state.is_in_flow() {
                let error = FlowError::AuthenticationRequired;
                metrics::counter!("chat_order_errors_total", "kind" => error.kind()).increment(1);
                tracing::warn!(state = %session.state, "Turn from another user rejected mid-flow");
                let response =
                    Response::at(session.state, IntentKind::NoOrder, error.user_message());
                return Ok(response.failed());
            }
            session.user_id = Some(user_id.clone());
        }
        session.record_turn(Speaker::User, message, self.config.history_limit, now);

        // A previous turn may have stopped inside an automatic step.
        if session.state.is_auto() {
            let mut resumed = Reply::new();
            self.run_or_recover(&mut session, None, &mut resumed).await?;
        }

        let has_cart_items = self.has_cart_items(&session).await;
        let intent_ctx = IntentContext::for_state(session.state, has_cart_items);
        let classification = self.classifier.classify(message, &intent_ctx);
        tracing::debug!(
            state = %session.state,
            intent = %classification.intent.kind(),
            confidence = classification.confidence,
            trigger = classification.trigger,
            "Message classified"
        );

        if classification.intent == Intent::NoOrder && !session.state.is_in_flow() {
            self.save(&mut session).await?;
            return Ok(Response::not_order(session.state));
        }

        let action = table::action_for(session.state, &classification.intent);
        let mut reply = Reply::new();
        self.run_or_recover(
            &mut session,
            Some((action, &classification.intent)),
            &mut reply,
        )
        .await?;

        let response = self.respond(&session, classification.intent.kind(), reply);
        session.record_turn(
            Speaker::Assistant,
            response.message.as_str(),
            self.config.history_limit,
            Utc::now(),
        );
        self.save(&mut session).await?;
        Ok(response)
    }

    /// Runs `step` (if any) and the automatic chain after it, turning
    /// recoverable errors into a failed reply.
    async fn run_or_recover(
        &self,
        session: &mut Session,
        step: Option<(Action, &Intent)>,
        reply: &mut Reply,
    ) -> Result<()> {
        let mut result = match step {
            Some((action, intent)) => self.run_action(action, session, intent, reply).await,
            None => Ok(()),
        };
        if result.is_ok() {
            result = self.run_auto_steps(session, reply).await;
        }

        match result {
            Ok(()) => Ok(()),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => self.recover(session, &error, reply),
        }
    }

    async fn run_action(
        &self,
        action: Action,
        session: &mut Session,
        intent: &Intent,
        reply: &mut Reply,
    ) -> Result<()> {
        match action {
            Action::InitiateOrder => self.initiate_order(session, reply).await,
            Action::ResolveAddress => self.resolve_address(session, reply).await,
            Action::BindAddress => {
                let Intent::AddressSelection { ordinal } = *intent else {
                    return Err(FlowError::UnrecognizedInput);
                };
                self.bind_address(session, ordinal, reply).await
            }
            Action::CalculateShipping => self.apply_shipping(session, reply).await,
            Action::PromptPayment => {
                transition(session, FlowState::PaymentSelection)?;
                reply.say(prompts::payment_prompt());
                Ok(())
            }
            Action::BindPayment => {
                let Intent::PaymentSelection { method } = *intent else {
                    return Err(FlowError::UnrecognizedInput);
                };
                session.context.payment_method = Some(method);
                transition(session, FlowState::PaymentSelected)?;
                reply.say(prompts::payment_bound(method));
                Ok(())
            }
            Action::BuildSummary => self.build_summary(session, reply),
            Action::Commit => self.commit(session, reply).await,
            Action::Discard => {
                let had_order = session.state.is_in_flow();
                transition(session, FlowState::Idle)?;
                session.reset_to_idle();
                reply.say(prompts::discarded(had_order));
                Ok(())
            }
            Action::Guidance => Err(FlowError::UnrecognizedInput),
        }
    }

    async fn run_auto_steps(&self, session: &mut Session, reply: &mut Reply) -> Result<()> {
        while let Some(action) = table::auto_action(session.state) {
            self.run_action(action, session, &Intent::NoOrder, reply)
                .await?;
        }
        Ok(())
    }

    fn recover(&self, session: &mut Session, error: &FlowError, reply: &mut Reply) -> Result<()> {
        metrics::counter!("chat_order_errors_total", "kind" => error.kind()).increment(1);
        tracing::info!(state = %session.state, kind = error.kind(), "Recoverable order flow error");

        let message = match error {
            FlowError::UnrecognizedInput => {
                prompts::guidance(session.state, &session.context.candidate_addresses)
            }
            _ => error.user_message(),
        };

        // An automatic step that cannot finish would fail again on every turn.
        if matches!(error, FlowError::StockConflict(_)) || session.state.is_auto() {
            transition(session, FlowState::Idle)?;
            session.reset_to_idle();
        }
        reply.fail(message);
        Ok(())
    }

    async fn fail_turn(&self, session_id: &SessionId, error: FlowError) -> Response {
        tracing::error!(%session_id, kind = error.kind(), error = %error, "Chat turn failed");
        metrics::counter!("chat_order_errors_total", "kind" => error.kind()).increment(1);

        let message = error.user_message();
        let now = Utc::now();
        let loaded = match self.stores.sessions.load(session_id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Could not load session to record failure");
                return Response::at(FlowState::ErrorState, IntentKind::NoOrder, message).failed();
            }
        };

        let mut session = loaded.unwrap_or_else(|| Session::new(session_id.clone(), now));
        session.state = FlowState::ErrorState;
        session.error_count += 1;
        session.record_turn(
            Speaker::Assistant,
            message.as_str(),
            self.config.history_limit,
            now,
        );
        if let Err(e) = self.save(&mut session).await {
            tracing::warn!(%session_id, error = %e, "Could not persist error state");
        }

        Response::at(FlowState::ErrorState, IntentKind::NoOrder, message).failed()
    }

    #[tracing::instrument(skip(self, session, reply), fields(cycle = session.cycle + 1))]
    async fn initiate_order(&self, session: &mut Session, reply: &mut Reply) -> Result<()> {
        let user_id = session
            .user_id
            .clone()
            .ok_or(FlowError::AuthenticationRequired)?;

        transition(session, FlowState::OrderInitiated)?;
        session.context = OrderContext::default();
        session.completed_at = None;
        session.cycle += 1;

        let lines = self.stores.carts.get_by_user(&user_id).await?;
        if lines.is_empty() {
            transition(session, FlowState::Idle)?;
            return Err(FlowError::EmptyCart);
        }

        let mut cart = Cart::new(user_id, lines);
        let mut report = self.validator.validate(&cart.lines).await;

        if !report.success && self.config.auto_fix_on_initiate {
            let diff = self.validator.auto_fix(&mut cart).await;
            if !diff.is_empty() {
                if let Err(e) = self.stores.carts.save(&cart).await {
                    tracing::warn!(error = %e, "Could not save repaired cart");
                }
                reply.say(diff.describe());
            }
            if cart.is_empty() {
                transition(session, FlowState::Idle)?;
                return Err(FlowError::EmptyCart);
            }
            report = self.validator.validate(&cart.lines).await;
        }

        if !report.success {
            transition(session, FlowState::Idle)?;
            reply.fail(prompts::cart_blocked(&report));
            reply.validation = Some(report);
            return Ok(());
        }

        for line in &mut cart.lines {
            line.available_stock = report
                .result_for(&line.product_id)
                .and_then(|result| result.available);
        }
        reply.say(prompts::cart_review(&cart, &report));
        reply.validation = Some(report);
        session.context.cart = Some(cart);
        transition(session, FlowState::CartValidated)
    }

    async fn resolve_address(&self, session: &mut Session, reply: &mut Reply) -> Result<()> {
        let user_id = session
            .user_id
            .clone()
            .ok_or(FlowError::AuthenticationRequired)?;
        let mut addresses = self.stores.users.get_addresses(&user_id).await?;

        match addresses.len() {
            0 => Err(FlowError::AddressMissing),
            1 => {
                let address = addresses.remove(0);
                bind_selected_address(session, address, reply)
            }
            _ => {
                reply.say(prompts::address_prompt(&addresses));
                session.context.candidate_addresses = addresses;
                transition(session, FlowState::AddressSelection)
            }
        }
    }

    async fn bind_address(
        &self,
        session: &mut Session,
        ordinal: u32,
        reply: &mut Reply,
    ) -> Result<()> {
        if session.context.candidate_addresses.is_empty() {
            if let Some(user_id) = session.user_id.clone() {
                session.context.candidate_addresses =
                    self.stores.users.get_addresses(&user_id).await?;
            }
        }

        let candidates = &session.context.candidate_addresses;
        let chosen = usize::try_from(ordinal)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| candidates.get(index))
            .cloned();

        match chosen {
            Some(address) => bind_selected_address(session, address, reply),
            None => {
                reply.fail(prompts::invalid_address_choice(ordinal, candidates.len()));
                Ok(())
            }
        }
    }

    async fn apply_shipping(&self, session: &mut Session, reply: &mut Reply) -> Result<()> {
        let info = self.shipping_for(session).await?;
        reply.say(prompts::shipping_quoted(&info));
        session.context.shipping = Some(info);
        transition(session, FlowState::ShippingCalculated)
    }

    /// The session's shipping quote, computing it on first use.
    async fn shipping_for(&self, session: &Session) -> Result<ShippingInfo> {
        if let Some(info) = &session.context.shipping {
            return Ok(info.clone());
        }
        let destination = session
            .context
            .selected_address
            .as_ref()
            .ok_or(FlowError::AddressMissing)?;
        let lines = session
            .context
            .cart
            .as_ref()
            .map(|cart| cart.lines.as_slice())
            .unwrap_or_default();
        Ok(self
            .quote(destination, PackageDimensions::from_lines(lines))
            .await)
    }

    #[tracing::instrument(skip(self, destination, dimensions), fields(province = %destination.province))]
    async fn quote(&self, destination: &Address, dimensions: PackageDimensions) -> ShippingInfo {
        let lookup =
            self.stores
                .shipping
                .compute_fee(&self.config.origin_address, destination, dimensions);

        let error = match tokio::time::timeout(self.config.shipping_timeout, lookup).await {
            Ok(Ok(quote)) => return ShippingInfo::quoted(quote.fee, quote.estimated_days),
            Ok(Err(error)) => error,
            Err(_) => FlowError::ShippingCalculationFailed(format!(
                "timed out after {:?}",
                self.config.shipping_timeout
            )),
        };

        tracing::warn!(
            error = %error,
            fee = %self.config.fallback_shipping_fee,
            "Shipping quote failed, using fallback fee"
        );
        metrics::counter!("shipping_fee_fallback_total").increment(1);
        ShippingInfo::fallback(
            self.config.fallback_shipping_fee,
            self.config.fallback_estimated_days,
        )
    }

    fn build_summary(&self, session: &mut Session, reply: &mut Reply) -> Result<()> {
        let (summary, text) = {
            let context = &session.context;
            let cart = context.cart.as_ref().ok_or(FlowError::EmptyCart)?;
            let address = context
                .selected_address
                .as_ref()
                .ok_or(FlowError::AddressMissing)?;
            let method = context
                .payment_method
                .ok_or(FlowError::PaymentMethodMissing)?;
            let shipping = context.shipping.as_ref().ok_or_else(|| {
                FlowError::Internal("summary requested before shipping was quoted".to_string())
            })?;

            let summary = OrderSummary::compute(&cart.lines, shipping.fee, self.config.service_fee);
            let text = prompts::summary(&cart.lines, &summary, address, method);
            (summary, text)
        };

        session.context.summary = Some(summary);
        transition(session, FlowState::SummaryShown)?;
        reply.say(text);
        Ok(())
    }

    #[tracing::instrument(skip(self, session, reply), fields(order_key = %session.order_key()))]
    async fn commit(&self, session: &mut Session, reply: &mut Reply) -> Result<()> {
        let user_id = session
            .user_id
            .clone()
            .ok_or(FlowError::AuthenticationRequired)?;
        let cart = session.context.cart.clone().ok_or(FlowError::EmptyCart)?;
        let address = session
            .context
            .selected_address
            .clone()
            .ok_or(FlowError::AddressMissing)?;
        let method = session
            .context
            .payment_method
            .ok_or(FlowError::PaymentMethodMissing)?;
        let shipping = self.shipping_for(session).await?;

        // Stock may have moved since the cart was reviewed.
        let report = self.validator.validate(&cart.lines).await;
        if !report.success {
            let conflicts = report
                .blocking()
                .map(|result| StockConflictLine {
                    product_id: result.product_id.clone(),
                    product_name: result.product_name.clone(),
                    requested: result.requested,
                    available: result.available.unwrap_or(0),
                })
                .collect();
            return Err(FlowError::StockConflict(conflicts));
        }

        let lines: Vec<CartLine> = merge_lines(cart.lines.iter().cloned())
            .into_iter()
            .map(|mut line| {
                if let Some(price) = report
                    .result_for(&line.product_id)
                    .and_then(|result| result.current_price)
                {
                    line.unit_price = price;
                }
                line
            })
            .collect();
        let summary = OrderSummary::compute(&lines, shipping.fee, self.config.service_fee);

        let order = self
            .stores
            .orders
            .create(NewOrder::from_chat(
                session.order_key(),
                user_id.clone(),
                &lines,
                address,
                method,
                &summary,
            ))
            .await?;
        tracing::info!(order_id = %order.id, total = %order.total_price, "Order created from chat");
        metrics::counter!("chat_orders_created_total").increment(1);

        for line in &lines {
            match self
                .stores
                .products
                .decrement_stock_and_increment_sold(&line.product_id, line.quantity)
                .await
            {
                Ok(adjustment) if adjustment.clamped => tracing::warn!(
                    product_id = %line.product_id,
                    previous_stock = adjustment.previous_stock,
                    quantity = line.quantity,
                    "Stock decrement clamped at zero"
                ),
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    product_id = %line.product_id,
                    error = %e,
                    "Stock decrement failed, order kept"
                ),
            }
        }

        if let Err(e) = self.stores.carts.delete_by_user(&user_id).await {
            tracing::warn!(error = %e, "Could not clear cart after order");
        }

        session.context.summary = Some(summary);
        session.completed_at = Some(Utc::now());
        session.last_order = Some(order.id);
        transition(session, FlowState::OrderCreated)?;
        reply.say(prompts::order_created(&order));
        reply.order = Some(order);
        Ok(())
    }

    /// Computes shipping for a session resting in `ADDRESS_SELECTED`.
    ///
    /// Calling it again once the quote exists returns the same quote without
    /// another provider call.
    #[tracing::instrument(skip(self), fields(session_id = %session_id))]
    pub async fn calculate_shipping(&self, session_id: &SessionId) -> Result<ShippingInfo> {
        let _turn = self.locks.acquire(session_id).await;
        let mut session = self
            .load_session(session_id, Utc::now())
            .await?;

        if session.state != FlowState::AddressSelected {
            return session
                .context
                .shipping
                .clone()
                .ok_or(FlowError::InvalidTransition {
                    from: session.state,
                    to: FlowState::ShippingCalculated,
                });
        }

        let mut reply = Reply::new();
        self.apply_shipping(&mut session, &mut reply).await?;
        let info = session.context.shipping.clone();
        self.save(&mut session).await?;
        info.ok_or_else(|| FlowError::Internal("shipping quote was not stored".to_string()))
    }

    /// The session as the next turn would see it.
    pub async fn session_state(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let Some(mut session) = self.stores.sessions.load(session_id).await? else {
            return Ok(None);
        };
        if session.grace_expired(self.config.grace_period, Utc::now()) {
            session.reset_to_idle();
        }
        Ok(Some(session))
    }

    /// Drops sessions past their TTL.
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let purged = self.stores.sessions.purge_expired().await?;
        if purged > 0 {
            tracing::info!(purged, "Purged expired chat sessions");
        }
        Ok(purged)
    }

    async fn load_session(&self, session_id: &SessionId, now: DateTime<Utc>) -> Result<Session> {
        let mut session = match self.stores.sessions.load(session_id).await? {
            Some(session) => session,
            None => {
                tracing::debug!(%session_id, "Starting new chat session");
                Session::new(session_id.clone(), now)
            }
        };
        if session.grace_expired(self.config.grace_period, now) {
            tracing::debug!(%session_id, "Order grace window elapsed, returning to idle");
            transition(&mut session, FlowState::Idle)?;
            session.reset_to_idle();
        }
        Ok(session)
    }

    async fn save(&self, session: &mut Session) -> Result<()> {
        session.version = self.stores.sessions.save(session).await?;
        Ok(())
    }

    async fn has_cart_items(&self, session: &Session) -> bool {
        if let (true, Some(cart)) = (session.state.is_in_flow(), &session.context.cart) {
            return !cart.is_empty();
        }
        let Some(user_id) = &session.user_id else {
            return false;
        };
        match self.stores.carts.get_by_user(user_id).await {
            Ok(lines) => !lines.is_empty(),
            Err(e) => {
                tracing::warn!(error = %e, "Cart lookup failed during classification");
                false
            }
        }
    }

    fn respond(&self, session: &Session, intent: IntentKind, reply: Reply) -> Response {
        let mut response = Response::at(session.state, intent, reply.lines.join("\n"));
        response.success = reply.success;
        if session.state == FlowState::AddressSelection {
            response.address_options = session.context.candidate_addresses.clone();
        }
        response.summary = session.context.summary;
        response.validation = reply.validation;
        response.completed = reply.order.is_some();
        response.order = reply.order;
        response
    }
}

#[async_trait]
impl OrderStrategy for OrderFlowEngine {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    async fn handle(
        &self,
        message: &str,
        session_id: &SessionId,
        ctx: &RequestContext,
    ) -> Response {
        OrderFlowEngine::handle(self, message, session_id, ctx).await
    }
}

fn transition(session: &mut Session, to: FlowState) -> Result<()> {
    let from = session.state;
    if !table::is_allowed(from, to) {
        return Err(FlowError::InvalidTransition { from, to });
    }
    if from != to {
        tracing::debug!(%from, %to, "Order flow transition");
    }
    session.state = to;
    Ok(())
}

fn bind_selected_address(session: &mut Session, address: Address, reply: &mut Reply) -> Result<()> {
    reply.say(prompts::address_bound(&address));
    session.context.selected_address = Some(address);
    session.context.shipping = None;
    transition(session, FlowState::AddressSelected)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryShippingFeeService;
    use common::UserId;
    use domain::{Money, PaymentMethod, Product};
    use store::{
        InMemoryCartStore, InMemoryOrderStore, InMemoryProductStore, InMemorySessionStore,
        InMemoryUserStore,
    };

    struct Harness {
        engine: OrderFlowEngine,
        sessions: InMemorySessionStore,
        carts: InMemoryCartStore,
        products: InMemoryProductStore,
        users: InMemoryUserStore,
        orders: InMemoryOrderStore,
        shipping: InMemoryShippingFeeService,
    }

    fn setup() -> Harness {
        let sessions = InMemorySessionStore::default();
        let carts = InMemoryCartStore::new();
        let products = InMemoryProductStore::new();
        let users = InMemoryUserStore::new();
        let orders = InMemoryOrderStore::new();
        let shipping = InMemoryShippingFeeService::new();

        let user = UserId::from("u-1");
        products.upsert(Product::new("A", "Áo thun", Money::from_dong(100_000), 10));
        carts.set_lines(
            &user,
            vec![CartLine::new("A", "Áo thun", 2, Money::from_dong(100_000))],
        );
        users.add_address(
            &user,
            Address::new("An", "0900000000", "1 Lê Lợi", "Bến Nghé", "Quận 1", "Hồ Chí Minh"),
        );

        let engine = OrderFlowEngine::new(
            Collaborators {
                sessions: Arc::new(sessions.clone()),
                carts: Arc::new(carts.clone()),
                products: Arc::new(products.clone()),
                users: Arc::new(users.clone()),
                orders: Arc::new(orders.clone()),
                shipping: Arc::new(shipping.clone()),
            },
            FlowConfig::default(),
        );

        Harness {
            engine,
            sessions,
            carts,
            products,
            users,
            orders,
            shipping,
        }
    }

    fn shopper() -> RequestContext {
        RequestContext::for_user("u-1")
    }

    #[tokio::test]
    async fn test_small_talk_is_not_an_order() {
        let h = setup();
        let sid = SessionId::from("s-1");

        let response = h.engine.handle("hôm nay trời đẹp quá", &sid, &shopper()).await;

        assert!(!response.order_flow);
        assert_eq!(response.state, FlowState::Idle);
        assert_eq!(h.sessions.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_order_request_reviews_cart() {
        let h = setup();
        let sid = SessionId::from("s-1");

        let response = h.engine.handle("đặt hàng", &sid, &shopper()).await;

        assert!(response.success);
        assert_eq!(response.state, FlowState::CartValidated);
        assert!(response.needs_confirmation);
        assert!(response.validation.is_some());
        assert!(response.message.contains("Áo thun x2"));
    }

    #[tokio::test]
    async fn test_single_address_is_bound_and_chain_reaches_payment() {
        let h = setup();
        let sid = SessionId::from("s-1");
        h.engine.handle("đặt hàng", &sid, &shopper()).await;

        let response = h.engine.handle("có", &sid, &shopper()).await;

        assert_eq!(response.state, FlowState::PaymentSelection);
        assert!(response.needs_payment_selection);
        assert!(response.message.contains("Phí vận chuyển"));
        assert_eq!(h.shipping.call_count(), 1);
    }

    #[tokio::test]
    async fn test_full_flow_creates_one_order() {
        let h = setup();
        let sid = SessionId::from("s-1");
        for message in ["đặt hàng", "có", "cod"] {
            h.engine.handle(message, &sid, &shopper()).await;
        }

        let response = h.engine.handle("xác nhận", &sid, &shopper()).await;

        assert!(response.success);
        assert!(response.completed);
        assert_eq!(response.state, FlowState::OrderCreated);
        let order = response.order.expect("order attached");
        assert_eq!(order.payment_method, PaymentMethod::Cod);
        assert_eq!(order.idempotency_key, "s-1:1");
        assert_eq!(h.orders.order_count(), 1);
        assert_eq!(h.products.product(&"A".into()).unwrap().stock, 8);
        assert!(h.carts.cart(&UserId::from("u-1")).is_none());
    }

    #[tokio::test]
    async fn test_anonymous_shopper_must_log_in() {
        let h = setup();
        let sid = SessionId::from("s-1");

        let response = h
            .engine
            .handle("đặt hàng", &sid, &RequestContext::anonymous())
            .await;

        assert!(!response.success);
        assert_eq!(response.state, FlowState::Idle);
        assert!(response.message.contains("đăng nhập"));
    }

    #[tokio::test]
    async fn test_other_user_mid_flow_leaves_session_untouched() {
        let h = setup();
        let sid = SessionId::from("s-1");
        h.engine.handle("đặt hàng", &sid, &shopper()).await;
        let before = h.sessions.load(&sid).await.unwrap().unwrap();

        let response = h
            .engine
            .handle("có", &sid, &RequestContext::for_user("u-2"))
            .await;

        assert!(!response.success);
        assert_eq!(response.state, FlowState::CartValidated);
        let after = h.sessions.load(&sid).await.unwrap().unwrap();
        assert_eq!(after.version, before.version);
        assert_eq!(after.user_id, Some(UserId::from("u-1")));
        assert_eq!(h.shipping.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_keeps_cart() {
        let h = setup();
        let sid = SessionId::from("s-1");
        h.engine.handle("đặt hàng", &sid, &shopper()).await;

        let response = h.engine.handle("hủy đơn", &sid, &shopper()).await;

        assert_eq!(response.state, FlowState::Idle);
        assert!(h.carts.cart(&UserId::from("u-1")).is_some());
        assert_eq!(h.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_unexpected_message_gets_guidance() {
        let h = setup();
        let sid = SessionId::from("s-1");
        h.engine.handle("đặt hàng", &sid, &shopper()).await;
        h.engine.handle("có", &sid, &shopper()).await;

        let response = h.engine.handle("màu gì đẹp nhỉ", &sid, &shopper()).await;

        assert!(!response.success);
        assert_eq!(response.state, FlowState::PaymentSelection);
        assert!(response.message.contains("thanh toán"));
    }

    #[tokio::test]
    async fn test_no_address_stays_at_cart_review() {
        let h = setup();
        let sid = SessionId::from("s-2");
        let ctx = RequestContext::for_user("u-2");
        h.carts.set_lines(
            &UserId::from("u-2"),
            vec![CartLine::new("A", "Áo thun", 1, Money::from_dong(100_000))],
        );
        h.engine.handle("đặt hàng", &sid, &ctx).await;

        let response = h.engine.handle("có", &sid, &ctx).await;

        assert!(!response.success);
        assert_eq!(response.state, FlowState::CartValidated);
        assert!(h.users.get_addresses(&UserId::from("u-2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_save_failure_is_fatal() {
        let h = setup();
        let sid = SessionId::from("s-1");
        h.sessions.set_fail_on_save(true);

        let response = h.engine.handle("đặt hàng", &sid, &shopper()).await;

        assert!(!response.success);
        assert_eq!(response.state, FlowState::ErrorState);
    }

    #[test]
    fn test_transition_rejects_undeclared_edges() {
        let mut session = Session::new(SessionId::from("s-1"), Utc::now());
        let result = transition(&mut session, FlowState::SummaryShown);

        assert!(matches!(result, Err(FlowError::InvalidTransition { .. })));
        assert_eq!(session.state, FlowState::Idle);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
