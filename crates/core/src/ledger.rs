//! Ledger vocabulary: transaction directions, sort keys, report groupings
//! and validation of split transaction items.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of items a single transaction may be split into.
pub const MAX_ITEMS_PER_TRANSACTION: usize = 50;

/// Maximum length of a category name.
pub const MAX_CATEGORY_LENGTH: usize = 64;

/// Maximum length of a counterparty name.
pub const MAX_COUNTERPARTY_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Whether money left or entered the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    Expense,
    Income,
}

impl TransactionDirection {
    pub const ALL: &'static [&'static str] = &["expense", "income"];

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let v = value.trim();
        if v.eq_ignore_ascii_case("expense") {
            Ok(Self::Expense)
        } else if v.eq_ignore_ascii_case("income") {
            Ok(Self::Income)
        } else {
            Err(CoreError::invalid_choice("direction", v, Self::ALL))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

// ---------------------------------------------------------------------------
// Sort keys
// ---------------------------------------------------------------------------

/// Whitelisted sort keys for transaction listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionSortKey {
    #[default]
    Date,
    Amount,
    Counterparty,
}

impl TransactionSortKey {
    pub const ALL: &'static [&'static str] = &["date", "amount", "counterparty"];

    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Self::default());
        };
        match v.to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "counterparty" => Ok(Self::Counterparty),
            _ => Err(CoreError::invalid_choice("sort_by", v, Self::ALL)),
        }
    }
}

// ---------------------------------------------------------------------------
// Report grouping
// ---------------------------------------------------------------------------

/// Dimension a ledger report aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportGrouping {
    #[default]
    Category,
    Month,
    Counterparty,
}

impl ReportGrouping {
    pub const ALL: &'static [&'static str] = &["category", "month", "counterparty"];

    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Self::default());
        };
        match v.to_ascii_lowercase().as_str() {
            "category" => Ok(Self::Category),
            "month" => Ok(Self::Month),
            "counterparty" => Ok(Self::Counterparty),
            _ => Err(CoreError::invalid_choice("group_by", v, Self::ALL)),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate one split item of a transaction.
pub fn validate_item(category: &str, amount_cents: i64) -> Result<(), CoreError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(CoreError::Validation("item category must not be empty".into()));
    }
    if category.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(CoreError::Validation(format!(
            "item category must be at most {MAX_CATEGORY_LENGTH} characters"
        )));
    }
    if amount_cents <= 0 {
        return Err(CoreError::Validation(format!(
            "item amount must be positive, got {amount_cents}"
        )));
    }
    Ok(())
}

/// Validate the item list as a whole plus the counterparty.
pub fn validate_transaction(counterparty: &str, item_count: usize) -> Result<(), CoreError> {
    if counterparty.trim().is_empty() {
        return Err(CoreError::Validation("counterparty must not be empty".into()));
    }
    if counterparty.chars().count() > MAX_COUNTERPARTY_LENGTH {
        return Err(CoreError::Validation(format!(
            "counterparty must be at most {MAX_COUNTERPARTY_LENGTH} characters"
        )));
    }
    if item_count == 0 {
        return Err(CoreError::Validation(
            "a transaction needs at least one item".into(),
        ));
    }
    if item_count > MAX_ITEMS_PER_TRANSACTION {
        return Err(CoreError::Validation(format!(
            "a transaction can have at most {MAX_ITEMS_PER_TRANSACTION} items"
        )));
    }
    Ok(())
}

/// Validate an amount range filter.
pub fn validate_amount_range(min: Option<i64>, max: Option<i64>) -> Result<(), CoreError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(CoreError::Validation(format!(
                "min_amount_cents ({min}) must not exceed max_amount_cents ({max})"
            )));
        }
    }
    Ok(())
}
