//! Repository for `transactions` and `transaction_items`.

use homestead_core::ledger::{ReportGrouping, TransactionDirection};
use homestead_core::types::DbId;
use sqlx::{PgPool, Postgres};

use crate::models::transaction::{
    CreateTransaction, CreateTransactionItem, LedgerTotals, ReportRow, SummaryRow, Transaction,
    TransactionRow,
};
use crate::query::transactions::{
    build_count_query, build_list_query, build_report_query, build_summary_query,
    TransactionFilter, LIST_COLUMNS, TOTALS_JOIN,
};

/// Provides ledger CRUD, filtered listings and aggregate reports.
pub struct TransactionRepo;

impl TransactionRepo {
    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let query = format!(
            "SELECT {LIST_COLUMNS} FROM transactions tr {TOTALS_JOIN} \
             WHERE tr.id = $1 AND tr.user_id = $2"
        );
        let row = sqlx::query_as::<_, TransactionRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Transaction::from))
    }

    /// Insert a transaction and its items atomically.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        direction: TransactionDirection,
        input: &CreateTransaction,
    ) -> Result<Transaction, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO transactions (user_id, direction, transaction_date, counterparty, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(user_id)
        .bind(direction.as_str())
        .bind(input.transaction_date)
        .bind(input.counterparty.trim())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        insert_items(&mut tx, id, &input.items).await?;
        tx.commit().await?;

        Self::find_by_id(pool, user_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Replace a transaction's fields and items. Returns `None` if the
    /// transaction does not exist or belongs to another user.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        direction: TransactionDirection,
        input: &CreateTransaction,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE transactions SET direction = $3, transaction_date = $4, counterparty = $5, \
                    notes = $6, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(direction.as_str())
        .bind(input.transaction_date)
        .bind(input.counterparty.trim())
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM transaction_items WHERE transaction_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, id, &input.items).await?;
        tx.commit().await?;

        Self::find_by_id(pool, user_id, id).await
    }

    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Listing and aggregates
    // -----------------------------------------------------------------------

    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let query = build_list_query(user_id, filter);
        let rows = query.query_as::<TransactionRow>().fetch_all(pool).await?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    pub async fn count(
        pool: &PgPool,
        user_id: DbId,
        filter: &TransactionFilter,
    ) -> Result<i64, sqlx::Error> {
        build_count_query(user_id, filter)
            .query_count()
            .fetch_one(pool)
            .await
    }

    pub async fn report(
        pool: &PgPool,
        user_id: DbId,
        filter: &TransactionFilter,
        grouping: ReportGrouping,
    ) -> Result<Vec<LedgerTotals>, sqlx::Error> {
        let query = build_report_query(user_id, filter, grouping);
        let rows = query.query_as::<ReportRow>().fetch_all(pool).await?;
        Ok(rows.into_iter().map(LedgerTotals::from).collect())
    }

    pub async fn summary(
        pool: &PgPool,
        user_id: DbId,
        filter: &TransactionFilter,
    ) -> Result<LedgerTotals, sqlx::Error> {
        let query = build_summary_query(user_id, filter);
        let row = query.query_as::<SummaryRow>().fetch_one(pool).await?;
        Ok(LedgerTotals::from(row))
    }

    /// Distinct item categories the user has used, alphabetically.
    pub async fn categories(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT ti.category FROM transaction_items ti \
             JOIN transactions tr ON tr.id = ti.transaction_id \
             WHERE tr.user_id = $1 ORDER BY ti.category",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

async fn insert_items(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    transaction_id: DbId,
    items: &[CreateTransactionItem],
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query(
            "INSERT INTO transaction_items (transaction_id, category, amount_cents) VALUES ($1, $2, $3)",
        )
        .bind(transaction_id)
        .bind(item.category.trim())
        .bind(item.amount_cents)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
