use std::sync::Arc;

use domain::{Cart, CartLine, merge_lines};
use store::ProductStore;
use tracing::{info, instrument, warn};

use crate::report::{
    AdjustedLine, AutoFixDiff, LineValidation, RemovedLine, Severity, ValidationReport,
    ValidationStatus,
};

/// Checks cart lines against the live product store.
#[derive(Clone)]
pub struct InventoryValidator {
    products: Arc<dyn ProductStore>,
}

impl InventoryValidator {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    /// Validates every product in `lines`. Lookup failures become
    /// `VALIDATION_ERROR` lines.
    ///
    /// Lines for the same product are summed first, so stock is checked
    /// against the whole requested quantity.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn validate(&self, lines: &[CartLine]) -> ValidationReport {
        let lines = merge_lines(lines.iter().cloned());
        let mut results = Vec::with_capacity(lines.len());
        for line in &lines {
            results.push(self.validate_line(line).await);
        }

        let report = ValidationReport::from_results(results);
        metrics::counter!(
            "inventory_validations_total",
            "success" => report.success.to_string()
        )
        .increment(1);
        info!(
            success = report.success,
            has_issues = report.has_issues,
            "Cart validated"
        );
        report
    }

    pub async fn validate_line(&self, line: &CartLine) -> LineValidation {
        match self.products.get_by_id(&line.product_id).await {
            Ok(product) => LineValidation::classify(line, product.as_ref()),
            Err(e) => {
                warn!(product_id = %line.product_id, error = %e, "Product lookup failed");
                LineValidation::lookup_failed(line)
            }
        }
    }

    /// True only if every line is `VALID`.
    pub async fn quick_validate(&self, lines: &[CartLine]) -> bool {
        let report = self.validate(lines).await;
        report.success && !report.has_issues
    }

    /// Repairs `cart` in place.
    ///
    /// Removes lines with `ERROR` severity, clamps short lines to the
    /// available stock, refreshes changed prices and recomputes the total.
    /// Running it again on the result changes nothing.
    #[instrument(skip(self, cart), fields(user_id = %cart.user_id))]
    pub async fn auto_fix(&self, cart: &mut Cart) -> AutoFixDiff {
        let mut removed = Vec::new();
        let mut adjusted = Vec::new();
        let mut repriced = Vec::new();
        let mut kept = Vec::with_capacity(cart.lines.len());

        for mut line in merge_lines(std::mem::take(&mut cart.lines)) {
            let result = self.validate_line(&line).await;
            line.available_stock = result.available;

            if result.severity == Severity::Error {
                removed.push(RemovedLine {
                    product_id: line.product_id,
                    product_name: line.product_name,
                    status: result.status,
                });
                continue;
            }

            match (result.status, result.available) {
                (ValidationStatus::InsufficientStock, Some(available)) => {
                    adjusted.push(AdjustedLine {
                        product_id: line.product_id.clone(),
                        product_name: line.product_name.clone(),
                        from_quantity: line.quantity,
                        to_quantity: available,
                    });
                    line.quantity = available;
                    if let Some(price) = result.current_price.filter(|p| *p != line.unit_price) {
                        line.unit_price = price;
                        repriced.push(line.product_id.clone());
                    }
                }
                (ValidationStatus::PriceChanged, _) => {
                    if let Some(price) = result.current_price {
                        line.unit_price = price;
                        repriced.push(line.product_id.clone());
                    }
                }
                _ => {}
            }
            kept.push(line);
        }

        cart.lines = kept;
        let new_total = cart.recompute_total();

        let diff = AutoFixDiff {
            removed,
            adjusted,
            repriced,
            remaining_count: cart.lines.len(),
            new_total,
        };
        if !diff.is_empty() {
            info!(
                removed = diff.removed.len(),
                adjusted = diff.adjusted.len(),
                repriced = diff.repriced.len(),
                new_total = %diff.new_total,
                "Cart auto-fixed"
            );
        }
        diff
    }
}
