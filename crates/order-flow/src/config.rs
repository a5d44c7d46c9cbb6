//! Order flow configuration loaded from environment variables.

use std::time::Duration;

use domain::{Address, Money};

/// Tunables for the order flow engine.
///
/// Reads from environment variables:
/// - `FALLBACK_SHIPPING_FEE`: fee in đồng used when the rate service fails (default: `30000`)
/// - `SHIPPING_TIMEOUT_MS`: bound on a rate lookup (default: `5000`)
/// - `SERVICE_FEE`: flat fee added to every order (default: `0`)
/// - `ORDER_GRACE_SECS`: how long a created order stays on screen before reset (default: `10`)
/// - `SESSION_TTL_SECS`: idle session lifetime (default: `1800`)
/// - `AUTO_FIX_CART`: repair the cart automatically when an order starts (default: `false`)
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub fallback_shipping_fee: Money,
    pub fallback_estimated_days: u32,
    pub shipping_timeout: Duration,
    pub service_fee: Money,
    pub grace_period: chrono::Duration,
    pub session_ttl: chrono::Duration,
    pub history_limit: usize,
    pub auto_fix_on_initiate: bool,
    /// Warehouse address parcels ship from.
    pub origin_address: Address,
}

impl FlowConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fallback_shipping_fee: env_parse("FALLBACK_SHIPPING_FEE")
                .map(Money::from_dong)
                .unwrap_or(defaults.fallback_shipping_fee),
            shipping_timeout: env_parse("SHIPPING_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.shipping_timeout),
            service_fee: env_parse("SERVICE_FEE")
                .map(Money::from_dong)
                .unwrap_or(defaults.service_fee),
            grace_period: env_parse("ORDER_GRACE_SECS")
                .map(chrono::Duration::seconds)
                .unwrap_or(defaults.grace_period),
            session_ttl: env_parse("SESSION_TTL_SECS")
                .map(chrono::Duration::seconds)
                .unwrap_or(defaults.session_ttl),
            auto_fix_on_initiate: env_parse("AUTO_FIX_CART")
                .unwrap_or(defaults.auto_fix_on_initiate),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            fallback_shipping_fee: Money::from_dong(30_000),
            fallback_estimated_days: 3,
            shipping_timeout: Duration::from_secs(5),
            service_fee: Money::zero(),
            grace_period: chrono::Duration::seconds(10),
            session_ttl: chrono::Duration::minutes(30),
            history_limit: 10,
            auto_fix_on_initiate: false,
            origin_address: Address::new(
                "Kho trung tâm",
                "02800000000",
                "12 Nguyễn Huệ",
                "Phường Bến Nghé",
                "Quận 1",
                "Hồ Chí Minh",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = FlowConfig::default();
        assert_eq!(config.fallback_shipping_fee, Money::from_dong(30_000));
        assert_eq!(config.shipping_timeout, Duration::from_secs(5));
        assert_eq!(config.grace_period, chrono::Duration::seconds(10));
        assert_eq!(config.history_limit, 10);
        assert!(!config.auto_fix_on_initiate);
    }

    #[test]
    fn test_env_parse_ignores_garbage() {
        assert_eq!(env_parse::<i64>("ORDER_FLOW_TEST_UNSET_VARIABLE"), None);
    }
}
