//! Error types for the budgeting core
//!
//! Every expected business-rule failure is a variant of [`BudgetError`] and is
//! returned through [`BudgetResult`]. Each variant carries a stable
//! machine-readable code (see [`BudgetError::code`]) so callers can map
//! failures to their own responses without matching on message text.

use std::fmt;

use thiserror::Error;

use crate::models::ids::BudgetCategoryId;
use crate::models::BudgetStatus;

/// The main error type for budgeting operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BudgetError {
    // === Money ===
    /// A money value was created without a currency code
    #[error("Currency code cannot be empty")]
    EmptyCurrency,

    /// Two money values with different currencies were combined
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Money was divided by zero
    #[error("Cannot divide money by zero")]
    DivisionByZero,

    /// An allocation request could not be honoured
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    // === Structure ===
    #[error("Category not found: {0}")]
    CategoryNotFound(BudgetCategoryId),

    /// A category looked up by name or id text does not exist
    #[error("No category matches '{0}'")]
    UnknownCategory(String),

    #[error("A sibling category named '{0}' already exists")]
    DuplicateCategoryName(String),

    #[error("Subcategories cannot have subcategories (maximum depth is 2)")]
    MaxDepthExceeded,

    #[error("Category {0} still has subcategories")]
    CategoryHasChildren(BudgetCategoryId),

    #[error("Category {0} still has a planned amount")]
    CategoryHasPlannedAmount(BudgetCategoryId),

    // === Validation ===
    #[error("Invalid budget data: {0}")]
    InvalidBudgetData(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // === State ===
    #[error("Cannot {action} a budget in status {status}")]
    InvalidStatusTransition {
        action: String,
        status: BudgetStatus,
    },

    #[error("Budget cannot be activated: {0}")]
    ActivationValidation(String),

    // === Infrastructure ===
    #[error("Budget not found: {0}")]
    BudgetNotFound(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON/YAML serialization errors
    #[error("Serialization error: {0}")]
    Json(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Broad families of [`BudgetError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Money,
    Structure,
    Validation,
    State,
    Infrastructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Money => "money",
            Self::Structure => "structure",
            Self::Validation => "validation",
            Self::State => "state",
            Self::Infrastructure => "infrastructure",
        };
        f.write_str(label)
    }
}

impl BudgetError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyCurrency => "money.empty_currency",
            Self::CurrencyMismatch { .. } => "money.currency_mismatch",
            Self::DivisionByZero => "money.division_by_zero",
            Self::InvalidAllocation(_) => "money.invalid_allocation",
            Self::CategoryNotFound(_) | Self::UnknownCategory(_) => "category.not_found",
            Self::DuplicateCategoryName(_) => "category.duplicate_name",
            Self::MaxDepthExceeded => "category.max_depth_exceeded",
            Self::CategoryHasChildren(_) => "category.has_children",
            Self::CategoryHasPlannedAmount(_) => "category.has_planned_amount",
            Self::InvalidBudgetData(_) => "budget.invalid_data",
            Self::InvalidAmount(_) => "budget.invalid_amount",
            Self::InvalidStatusTransition { .. } => "budget.invalid_status_transition",
            Self::ActivationValidation(_) => "budget.activation_validation",
            Self::BudgetNotFound(_) => "budget.not_found",
            Self::Config(_) => "infra.config",
            Self::Io(_) => "infra.io",
            Self::Json(_) => "infra.serialization",
            Self::Storage(_) => "infra.storage",
        }
    }

    /// The taxonomy family this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCurrency
            | Self::CurrencyMismatch { .. }
            | Self::DivisionByZero
            | Self::InvalidAllocation(_) => ErrorKind::Money,
            Self::CategoryNotFound(_)
            | Self::UnknownCategory(_)
            | Self::DuplicateCategoryName(_)
            | Self::MaxDepthExceeded
            | Self::CategoryHasChildren(_)
            | Self::CategoryHasPlannedAmount(_) => ErrorKind::Structure,
            Self::InvalidBudgetData(_) | Self::InvalidAmount(_) => ErrorKind::Validation,
            Self::InvalidStatusTransition { .. } | Self::ActivationValidation(_) => {
                ErrorKind::State
            }
            Self::BudgetNotFound(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Storage(_) => ErrorKind::Infrastructure,
        }
    }

    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::BudgetNotFound(identifier.into())
    }

    /// Create an invalid status transition error
    pub fn invalid_transition(action: impl Into<String>, status: BudgetStatus) -> Self {
        Self::InvalidStatusTransition {
            action: action.into(),
            status,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CategoryNotFound(_) | Self::UnknownCategory(_) | Self::BudgetNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for BudgetError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for budgeting operations
pub type BudgetResult<T> = Result<T, BudgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BudgetError::CurrencyMismatch {
            expected: "ZAR".into(),
            actual: "USD".into(),
        };
        assert_eq!(err.to_string(), "Currency mismatch: expected ZAR, got USD");
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(BudgetError::EmptyCurrency.code(), "money.empty_currency");
        assert_eq!(BudgetError::MaxDepthExceeded.code(), "category.max_depth_exceeded");
        assert_eq!(
            BudgetError::invalid_transition("activate", BudgetStatus::Active).code(),
            "budget.invalid_status_transition"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(BudgetError::DivisionByZero.kind(), ErrorKind::Money);
        assert_eq!(
            BudgetError::CategoryHasChildren(BudgetCategoryId::new()).kind(),
            ErrorKind::Structure
        );
        assert!(BudgetError::InvalidAmount("negative".into()).is_validation());
        assert_eq!(
            BudgetError::ActivationValidation("empty".into()).kind(),
            ErrorKind::State
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = BudgetError::invalid_transition("activate", BudgetStatus::Active);
        assert_eq!(err.to_string(), "Cannot activate a budget in status Active");
    }

    #[test]
    fn test_not_found() {
        let err = BudgetError::budget_not_found("Groceries 2025");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Budget not found: Groceries 2025");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BudgetError = io_err.into();
        assert!(matches!(err, BudgetError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
