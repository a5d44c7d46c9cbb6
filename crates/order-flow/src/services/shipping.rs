//! Shipping-fee service trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{Address, Money, PackageDimensions};

use crate::error::FlowError;

/// A rate quote from the shipping provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingQuote {
    pub fee: Money,
    pub estimated_days: u32,
}

/// Trait for shipping-rate lookups.
#[async_trait]
pub trait ShippingFeeService: Send + Sync {
    /// Quotes a parcel from `origin` to `destination`.
    async fn compute_fee(
        &self,
        origin: &Address,
        destination: &Address,
        dimensions: PackageDimensions,
    ) -> Result<ShippingQuote, FlowError>;
}

#[derive(Debug)]
struct InMemoryShippingState {
    base_fee: Money,
    per_extra_kg: Money,
    fail: bool,
    delay: Option<Duration>,
    calls: u32,
}

impl Default for InMemoryShippingState {
    fn default() -> Self {
        Self {
            base_fee: Money::from_dong(22_000),
            per_extra_kg: Money::from_dong(5_000),
            fail: false,
            delay: None,
            calls: 0,
        }
    }
}

/// In-memory shipping-fee service for testing.
///
/// Charges a base fee for the first kilogram plus a per-kilogram surcharge,
/// two days within the origin province and four days elsewhere.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippingFeeService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingFeeService {
    /// Creates a new in-memory shipping-fee service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every lookup.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).fail = fail;
    }

    /// Delays every lookup, for exercising timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).delay = delay;
    }

    /// Sets the fee for a parcel of up to one kilogram.
    pub fn set_base_fee(&self, fee: Money) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).base_fee = fee;
    }

    /// Returns the number of lookups made so far.
    pub fn call_count(&self) -> u32 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).calls
    }
}

#[async_trait]
impl ShippingFeeService for InMemoryShippingFeeService {
    async fn compute_fee(
        &self,
        origin: &Address,
        destination: &Address,
        dimensions: PackageDimensions,
    ) -> Result<ShippingQuote, FlowError> {
        let delay = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.calls += 1;
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.fail {
            return Err(FlowError::ShippingCalculationFailed(
                "Shipping provider unavailable".to_string(),
            ));
        }

        let extra_kg = dimensions.weight_grams.div_ceil(1_000).max(1) - 1;
        let fee = state.base_fee + state.per_extra_kg.multiply(extra_kg);
        let estimated_days = if origin.province == destination.province {
            2
        } else {
            4
        };

        Ok(ShippingQuote {
            fee,
            estimated_days,
        })
    }
}
