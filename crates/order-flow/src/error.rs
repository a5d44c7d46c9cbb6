//! Order flow error types.

use domain::{FlowState, ProductId};
use store::StoreError;
use thiserror::Error;

/// A cart line that can no longer be fulfilled at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockConflictLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub requested: u32,
    pub available: u32,
}

/// Errors that can occur while handling a chat turn.
#[derive(Debug, Error)]
pub enum FlowError {
    /// No user is bound to the session.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The shopper's cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The shopper has no saved shipping address.
    #[error("No shipping address on file")]
    AddressMissing,

    /// The summary step was reached without a payment method.
    #[error("Payment method missing")]
    PaymentMethodMissing,

    /// Re-validation at commit found lines that cannot be fulfilled.
    #[error("Stock conflict on {} line(s)", .0.len())]
    StockConflict(Vec<StockConflictLine>),

    /// The shipping-rate service failed. Recovered with a fallback fee.
    #[error("Shipping calculation failed: {0}")]
    ShippingCalculationFailed(String),

    /// A store call failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The message means nothing in the current state.
    #[error("Unrecognized input")]
    UnrecognizedInput,

    /// A transition outside the declared table was attempted.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: FlowState, to: FlowState },

    /// A handler panicked or broke an internal invariant.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlowError {
    /// Returns true if the turn cannot continue and the session moves to `ERROR_STATE`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FlowError::Persistence(_) | FlowError::InvalidTransition { .. } | FlowError::Internal(_)
        )
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::AuthenticationRequired => "authentication_required",
            FlowError::EmptyCart => "empty_cart",
            FlowError::AddressMissing => "address_missing",
            FlowError::PaymentMethodMissing => "payment_method_missing",
            FlowError::StockConflict(_) => "stock_conflict",
            FlowError::ShippingCalculationFailed(_) => "shipping_calculation_failed",
            FlowError::Persistence(_) => "persistence",
            FlowError::UnrecognizedInput => "unrecognized_input",
            FlowError::InvalidTransition { .. } => "invalid_transition",
            FlowError::Internal(_) => "internal",
        }
    }

    /// Localized, actionable text for the shopper.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::AuthenticationRequired => {
                "Bạn cần đăng nhập để đặt hàng. Vui lòng đăng nhập rồi thử lại nhé.".to_string()
            }
            FlowError::EmptyCart => {
                "Giỏ hàng của bạn đang trống. Hãy thêm sản phẩm vào giỏ trước khi đặt hàng nhé."
                    .to_string()
            }
            FlowError::AddressMissing => {
                "Bạn chưa có địa chỉ giao hàng. Vui lòng thêm địa chỉ trong trang tài khoản rồi nhắn \"có\" để tiếp tục."
                    .to_string()
            }
            FlowError::PaymentMethodMissing => {
                "Bạn chưa chọn phương thức thanh toán. Vui lòng chọn 1 (COD) hoặc 2 (chuyển khoản)."
                    .to_string()
            }
            FlowError::StockConflict(lines) => {
                let mut message =
                    "Rất tiếc, tồn kho vừa thay đổi nên chưa thể tạo đơn:".to_string();
                for line in lines {
                    message.push_str(&format!(
                        "\n- {}: chỉ còn {} (bạn đặt {})",
                        line.product_name, line.available, line.requested
                    ));
                }
                message.push_str("\nVui lòng cập nhật giỏ hàng rồi đặt lại.");
                message
            }
            FlowError::ShippingCalculationFailed(_) => {
                "Không tính được phí vận chuyển, hệ thống đã áp dụng phí mặc định.".to_string()
            }
            FlowError::UnrecognizedInput => {
                "Mình chưa hiểu ý bạn. Bạn có thể nói rõ hơn không?".to_string()
            }
            FlowError::Persistence(_)
            | FlowError::InvalidTransition { .. }
            | FlowError::Internal(_) => {
                "Hệ thống đang gặp sự cố, vui lòng thử lại sau ít phút. Nhắn \"đặt hàng\" để bắt đầu lại hoặc \"hủy\" để dừng."
                    .to_string()
            }
        }
    }
}

/// Convenience type alias for order flow results.
pub type Result<T> = std::result::Result<T, FlowError>;
