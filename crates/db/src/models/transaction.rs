//! Ledger transactions, their split items, and report rows.

use homestead_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `transaction_items` table, as aggregated into listing rows.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TransactionItem {
    pub id: DbId,
    pub category: String,
    pub amount_cents: i64,
}

/// One row of the transaction listing query.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: DbId,
    pub direction: String,
    pub transaction_date: Date,
    pub counterparty: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub total_cents: i64,
    pub items: Option<Json<Vec<TransactionItem>>>,
}

/// A transaction with its items, as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: DbId,
    pub direction: String,
    pub transaction_date: Date,
    pub counterparty: String,
    pub notes: Option<String>,
    pub total_cents: i64,
    pub items: Vec<TransactionItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            direction: row.direction,
            transaction_date: row.transaction_date,
            counterparty: row.counterparty,
            notes: row.notes,
            total_cents: row.total_cents,
            items: row.items.map(|Json(items)| items).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// One group of a ledger report.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub key: String,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub transaction_count: i64,
}

/// Totals without grouping.
#[derive(Debug, Clone, FromRow)]
pub struct SummaryRow {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub transaction_count: i64,
}

/// Income, expense and their difference for a group or the whole filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerTotals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub income_cents: i64,
    pub expense_cents: i64,
    pub net_cents: i64,
    pub transaction_count: i64,
}

impl From<ReportRow> for LedgerTotals {
    fn from(row: ReportRow) -> Self {
        Self {
            key: Some(row.key),
            income_cents: row.income_cents,
            expense_cents: row.expense_cents,
            net_cents: row.income_cents - row.expense_cents,
            transaction_count: row.transaction_count,
        }
    }
}

impl From<SummaryRow> for LedgerTotals {
    fn from(row: SummaryRow) -> Self {
        Self {
            key: None,
            income_cents: row.income_cents,
            expense_cents: row.expense_cents,
            net_cents: row.income_cents - row.expense_cents,
            transaction_count: row.transaction_count,
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// DTO for creating a transaction, or replacing one wholesale on update.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    pub direction: String,
    pub transaction_date: Date,
    pub counterparty: String,
    pub notes: Option<String>,
    pub items: Vec<CreateTransactionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionItem {
    pub category: String,
    pub amount_cents: i64,
}
