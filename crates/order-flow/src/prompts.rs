//! Chat text for each step, in Vietnamese.

use domain::{Address, Cart, CartLine, FlowState, Order, OrderSummary, PaymentMethod, ShippingInfo};
use inventory::ValidationReport;

pub fn cart_review(cart: &Cart, report: &ValidationReport) -> String {
    let mut text = String::from("Giỏ hàng của bạn:");
    for (i, line) in cart.lines.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, line_text(line)));
    }
    text.push_str(&format!("\nTạm tính: {}", cart.total));
    if report.has_issues {
        text.push('\n');
        text.push_str(&report.summary);
    }
    text.push_str("\nBạn có muốn tiếp tục đặt hàng không? (có/không)");
    text
}

fn line_text(line: &CartLine) -> String {
    format!(
        "{} x{} - {}",
        line.product_name,
        line.quantity,
        line.line_total()
    )
}

pub fn cart_blocked(report: &ValidationReport) -> String {
    format!(
        "Giỏ hàng chưa thể đặt hàng.\n{}\nVui lòng cập nhật giỏ hàng rồi nhắn \"đặt hàng\" lại.",
        report.summary
    )
}

pub fn address_prompt(addresses: &[Address]) -> String {
    let mut text = String::from("Bạn muốn giao đến địa chỉ nào?");
    for (i, address) in addresses.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, address));
    }
    text.push_str("\nNhắn số thứ tự để chọn.");
    text
}

pub fn address_bound(address: &Address) -> String {
    format!("Giao đến: {address}")
}

pub fn invalid_address_choice(ordinal: u32, count: usize) -> String {
    format!("Không có địa chỉ số {ordinal}. Vui lòng chọn từ 1 đến {count}.")
}

pub fn shipping_quoted(info: &ShippingInfo) -> String {
    let mut text = format!(
        "Phí vận chuyển: {} (dự kiến {} ngày)",
        info.fee, info.estimated_days
    );
    if info.fallback {
        text.push_str(". Không liên hệ được đơn vị vận chuyển nên áp dụng phí mặc định");
    }
    text
}

pub fn payment_prompt() -> String {
    let mut text = String::from("Bạn muốn thanh toán bằng cách nào?");
    for (i, method) in PaymentMethod::ALL.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, method.label()));
    }
    text
}

pub fn payment_bound(method: PaymentMethod) -> String {
    format!("Thanh toán: {}", method.label())
}

pub fn summary(
    lines: &[CartLine],
    summary: &OrderSummary,
    address: &Address,
    method: PaymentMethod,
) -> String {
    let mut text = String::from("Tóm tắt đơn hàng:");
    for line in lines {
        text.push_str(&format!("\n- {}", line_text(line)));
    }
    text.push_str(&format!("\nTạm tính: {}", summary.subtotal));
    text.push_str(&format!("\nPhí vận chuyển: {}", summary.shipping_fee));
    if summary.service_fee.is_positive() {
        text.push_str(&format!("\nPhí dịch vụ: {}", summary.service_fee));
    }
    text.push_str(&format!("\nTổng cộng: {}", summary.total));
    text.push_str(&format!("\nGiao đến: {}", address.one_line()));
    text.push_str(&format!("\nThanh toán: {}", method.label()));
    text.push_str("\nXác nhận đặt hàng? (có/không)");
    text
}

pub fn order_created(order: &Order) -> String {
    format!(
        "Đặt hàng thành công! Mã đơn {} - tổng {}. Cảm ơn bạn đã mua sắm.",
        order.reference(),
        order.total_price
    )
}

pub fn discarded(had_order: bool) -> String {
    if had_order {
        "Đã hủy đơn hàng. Giỏ hàng của bạn vẫn được giữ nguyên.".to_string()
    } else {
        "Hiện không có đơn hàng nào đang xử lý.".to_string()
    }
}

/// What to say when a message means nothing in `state`.
pub fn guidance(state: FlowState, addresses: &[Address]) -> String {
    match state {
        FlowState::CartValidated => {
            "Bạn có muốn tiếp tục đặt hàng với giỏ hàng này không? (có/không)".to_string()
        }
        FlowState::AddressSelection => address_prompt(addresses),
        FlowState::PaymentSelection => payment_prompt(),
        FlowState::SummaryShown => {
            "Bạn xác nhận đặt đơn hàng này chứ? Nhắn \"có\" để đặt hoặc \"không\" để hủy."
                .to_string()
        }
        FlowState::OrderCreated => {
            "Đơn hàng của bạn đã được tạo. Nhắn \"đặt hàng\" nếu muốn đặt đơn mới.".to_string()
        }
        FlowState::ErrorState => {
            "Đơn hàng trước gặp sự cố. Nhắn \"đặt hàng\" để thử lại hoặc \"hủy\" để dừng."
                .to_string()
        }
        _ => "Bạn muốn đặt hàng? Hãy nhắn \"đặt hàng\" nhé.".to_string(),
    }
}
