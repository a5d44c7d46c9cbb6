use domain::{CartLine, Money, Product, ProductId};
use serde::{Deserialize, Serialize};

/// Outcome of checking one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Valid,
    InsufficientStock,
    ProductUnavailable,
    ProductNotFound,
    PriceChanged,
    /// The product could not be looked up.
    ValidationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Validation result for a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineValidation {
    pub product_id: ProductId,
    pub product_name: String,
    pub requested: u32,
    /// Live stock, when the product was found.
    pub available: Option<u32>,
    pub snapshot_price: Money,
    pub current_price: Option<Money>,
    pub status: ValidationStatus,
    pub severity: Severity,
    pub message: String,
}

impl LineValidation {
    /// Classifies `line` against the live product record.
    ///
    /// Precedence: not found, unavailable, insufficient stock, price changed, valid.
    pub fn classify(line: &CartLine, product: Option<&Product>) -> Self {
        let mut result = Self {
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            requested: line.quantity,
            available: product.map(|p| p.stock),
            snapshot_price: line.unit_price,
            current_price: product.map(|p| p.price),
            status: ValidationStatus::Valid,
            severity: Severity::Success,
            message: format!("{}: còn hàng", line.product_name),
        };

        let Some(product) = product else {
            result.status = ValidationStatus::ProductNotFound;
            result.severity = Severity::Error;
            result.message = format!("Sản phẩm {} không còn tồn tại", line.product_name);
            return result;
        };

        if !product.active {
            result.status = ValidationStatus::ProductUnavailable;
            result.severity = Severity::Error;
            result.message = format!("Sản phẩm {} hiện ngừng kinh doanh", line.product_name);
        } else if !product.can_fulfill(line.quantity) {
            result.status = ValidationStatus::InsufficientStock;
            if product.stock == 0 {
                result.severity = Severity::Error;
                result.message = format!("Sản phẩm {} đã hết hàng", line.product_name);
            } else {
                result.severity = Severity::Warning;
                result.message = format!(
                    "Sản phẩm {} chỉ còn {} (bạn chọn {})",
                    line.product_name, product.stock, line.quantity
                );
            }
        } else if product.price != line.unit_price {
            result.status = ValidationStatus::PriceChanged;
            result.severity = Severity::Info;
            result.message = format!(
                "Giá {} đã thay đổi từ {} thành {}",
                line.product_name, line.unit_price, product.price
            );
        }

        result
    }

    /// Result for a line whose product lookup failed.
    pub fn lookup_failed(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            requested: line.quantity,
            available: None,
            snapshot_price: line.unit_price,
            current_price: None,
            status: ValidationStatus::ValidationError,
            severity: Severity::Error,
            message: format!("Không thể kiểm tra tồn kho cho {}", line.product_name),
        }
    }

    /// True if this line must be fixed before checkout.
    pub fn blocks_checkout(&self) -> bool {
        self.severity == Severity::Error || self.status == ValidationStatus::InsufficientStock
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    /// The fix to suggest for this line, if any.
    pub fn remediation(&self) -> Option<RemediationAction> {
        match (self.status, self.available) {
            (ValidationStatus::InsufficientStock, Some(available)) if available > 0 => {
                Some(RemediationAction::AdjustQuantity {
                    product_id: self.product_id.clone(),
                    suggested_quantity: available,
                })
            }
            (ValidationStatus::InsufficientStock, _)
            | (ValidationStatus::ProductNotFound, _)
            | (ValidationStatus::ProductUnavailable, _) => Some(RemediationAction::RemoveProduct {
                product_id: self.product_id.clone(),
            }),
            _ => None,
        }
    }
}

/// Structured fix hint attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationAction {
    AdjustQuantity {
        product_id: ProductId,
        suggested_quantity: u32,
    },
    RemoveProduct {
        product_id: ProductId,
    },
}

/// Aggregate result of validating a set of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// No line blocks checkout.
    pub success: bool,
    /// At least one line is not `VALID`.
    pub has_issues: bool,
    pub results: Vec<LineValidation>,
    pub summary: String,
    pub actions: Vec<RemediationAction>,
}

impl ValidationReport {
    pub fn from_results(results: Vec<LineValidation>) -> Self {
        let success = !results.iter().any(LineValidation::blocks_checkout);
        let issues: Vec<&LineValidation> = results.iter().filter(|r| !r.is_valid()).collect();
        let has_issues = !issues.is_empty();

        let summary = if results.is_empty() {
            "Giỏ hàng trống.".to_string()
        } else if !has_issues {
            format!("Tất cả {} sản phẩm đều hợp lệ.", results.len())
        } else {
            let mut summary = format!("Phát hiện {} vấn đề:", issues.len());
            for issue in &issues {
                summary.push_str("\n- ");
                summary.push_str(&issue.message);
            }
            summary
        };

        let actions = results.iter().filter_map(LineValidation::remediation).collect();

        Self {
            success,
            has_issues,
            results,
            summary,
            actions,
        }
    }

    /// Lines that block checkout.
    pub fn blocking(&self) -> impl Iterator<Item = &LineValidation> {
        self.results.iter().filter(|r| r.blocks_checkout())
    }

    pub fn result_for(&self, product_id: &ProductId) -> Option<&LineValidation> {
        self.results.iter().find(|r| &r.product_id == product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub status: ValidationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub from_quantity: u32,
    pub to_quantity: u32,
}

/// What `auto_fix` changed in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFixDiff {
    pub removed: Vec<RemovedLine>,
    pub adjusted: Vec<AdjustedLine>,
    /// Lines whose snapshot price was refreshed to the live price.
    pub repriced: Vec<ProductId>,
    pub remaining_count: usize,
    pub new_total: Money,
}

impl AutoFixDiff {
    /// True if the cart was left untouched.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.adjusted.is_empty() && self.repriced.is_empty()
    }

    /// Human-readable description of the changes, in Vietnamese.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        for line in &self.removed {
            parts.push(format!("Đã xóa {} khỏi giỏ", line.product_name));
        }
        for line in &self.adjusted {
            parts.push(format!(
                "Đã giảm {} từ {} xuống {}",
                line.product_name, line.from_quantity, line.to_quantity
            ));
        }
        if !self.repriced.is_empty() {
            parts.push(format!("Đã cập nhật giá {} sản phẩm", self.repriced.len()));
        }
        parts.join("\n")
    }
}
