//! Inventory validation for checkout.
//!
//! Classifies each cart line against the live product record, reports
//! remediation hints, and can repair a cart in place.

pub mod report;
pub mod validator;

pub use report::{
    AdjustedLine, AutoFixDiff, LineValidation, RemediationAction, RemovedLine, Severity,
    ValidationReport, ValidationStatus,
};
pub use validator::InventoryValidator;
