//! Transaction listing plus the grouped report and summary statements.
//!
//! All three share one predicate list, so a report over a filter always
//! aggregates exactly the transactions the listing for that filter returns.

use homestead_core::ledger::{ReportGrouping, TransactionDirection, TransactionSortKey};
use homestead_core::pagination::PageRequest;
use homestead_core::sorting::SortDirection;
use homestead_core::text::contains_pattern;
use homestead_core::types::{Date, DbId};

use super::{merge_joins, BindValue, Fragment, Join, Listing, Ordering, Predicate, SqlBuilder, SqlQuery};

/// Validated filter set for transaction listings and reports.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub direction: Option<TransactionDirection>,
    /// Inclusive lower bound on the transaction date.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on the transaction date.
    pub date_to: Option<Date>,
    pub category: Option<String>,
    pub search_term: Option<String>,
    pub min_amount_cents: Option<i64>,
    pub max_amount_cents: Option<i64>,
    pub sort_by: TransactionSortKey,
    pub sort_direction: SortDirection,
    pub page: PageRequest,
}

/// Lateral join exposing `tot.total_cents`, the sum of a transaction's items.
pub(crate) const TOTALS_JOIN: &str = "LEFT JOIN LATERAL (\
        SELECT COALESCE(SUM(i.amount_cents), 0)::BIGINT AS total_cents \
        FROM transaction_items i WHERE i.transaction_id = tr.id\
     ) tot ON TRUE";

fn totals_join() -> Join {
    Join::new("tot", Fragment::raw(TOTALS_JOIN))
}

/// Translate a transaction filter into predicates, owner scope first.
pub fn transaction_predicates(user_id: DbId, filter: &TransactionFilter) -> Vec<Predicate> {
    let mut predicates = vec![Predicate::new(
        "tr.user_id = ?",
        vec![BindValue::BigInt(user_id)],
    )];

    if let Some(direction) = filter.direction {
        predicates.push(Predicate::new(
            "tr.direction = ?",
            vec![BindValue::Text(direction.as_str().to_string())],
        ));
    }
    if let Some(from) = filter.date_from {
        predicates.push(Predicate::new("tr.transaction_date >= ?", vec![BindValue::Date(from)]));
    }
    if let Some(to) = filter.date_to {
        predicates.push(Predicate::new("tr.transaction_date <= ?", vec![BindValue::Date(to)]));
    }
    if let Some(category) = filter.category.as_deref() {
        predicates.push(Predicate::new(
            "EXISTS (SELECT 1 FROM transaction_items ci \
             WHERE ci.transaction_id = tr.id AND LOWER(ci.category) = LOWER(?))",
            vec![BindValue::Text(category.to_string())],
        ));
    }
    if let Some(term) = filter.search_term.as_deref() {
        let pattern = contains_pattern(term);
        predicates.push(Predicate::new(
            "tr.counterparty ILIKE ? OR tr.notes ILIKE ?",
            vec![BindValue::Text(pattern.clone()), BindValue::Text(pattern)],
        ));
    }
    if let Some(min) = filter.min_amount_cents {
        predicates.push(
            Predicate::new("tot.total_cents >= ?", vec![BindValue::BigInt(min)])
                .requires(totals_join()),
        );
    }
    if let Some(max) = filter.max_amount_cents {
        predicates.push(
            Predicate::new("tot.total_cents <= ?", vec![BindValue::BigInt(max)])
                .requires(totals_join()),
        );
    }

    predicates
}

pub fn transaction_sort_expression(key: TransactionSortKey) -> &'static str {
    match key {
        TransactionSortKey::Date => "tr.transaction_date",
        TransactionSortKey::Amount => "tot.total_cents",
        TransactionSortKey::Counterparty => "LOWER(tr.counterparty)",
    }
}

pub(crate) const LIST_COLUMNS: &str = "tr.id, tr.direction, tr.transaction_date, tr.counterparty, tr.notes, \
     tr.created_at, tr.updated_at, tot.total_cents, \
     (SELECT JSON_AGG(JSON_BUILD_OBJECT(\
                'id', li.id, 'category', li.category, 'amount_cents', li.amount_cents) \
             ORDER BY li.id) \
        FROM transaction_items li WHERE li.transaction_id = tr.id) AS items";

pub fn transaction_listing(user_id: DbId, filter: &TransactionFilter) -> Listing {
    Listing {
        from: "transactions tr",
        id_column: "tr.id",
        columns: Fragment::raw(LIST_COLUMNS),
        row_joins: vec![totals_join()],
        predicates: transaction_predicates(user_id, filter),
        ordering: Ordering {
            expression: transaction_sort_expression(filter.sort_by),
            direction: filter.sort_direction,
            tie_breaker: "tr.id",
        },
        page: filter.page,
    }
}

pub fn build_list_query(user_id: DbId, filter: &TransactionFilter) -> SqlQuery {
    transaction_listing(user_id, filter).page_query()
}

pub fn build_count_query(user_id: DbId, filter: &TransactionFilter) -> SqlQuery {
    transaction_listing(user_id, filter).count_query()
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

const AMOUNT_COLUMNS: &str = "COALESCE(SUM(ti.amount_cents) FILTER (WHERE tr.direction = 'income'), 0)::BIGINT AS income_cents, \
     COALESCE(SUM(ti.amount_cents) FILTER (WHERE tr.direction = 'expense'), 0)::BIGINT AS expense_cents, \
     COUNT(DISTINCT tr.id) AS transaction_count";

fn group_expression(grouping: ReportGrouping) -> &'static str {
    match grouping {
        ReportGrouping::Category => "ti.category",
        ReportGrouping::Month => "TO_CHAR(tr.transaction_date, 'YYYY-MM')",
        ReportGrouping::Counterparty => "tr.counterparty",
    }
}

/// Aggregates sum individual items, so a category filter also narrows the
/// items counted inside each matching transaction.
fn aggregate_query(user_id: DbId, filter: &TransactionFilter, group: Option<&str>) -> SqlQuery {
    let mut predicates = transaction_predicates(user_id, filter);
    if let Some(category) = filter.category.as_deref() {
        predicates.push(Predicate::new(
            "LOWER(ti.category) = LOWER(?)",
            vec![BindValue::Text(category.to_string())],
        ));
    }
    let joins = merge_joins(predicates.iter().flat_map(|p| p.requires.iter()));

    let mut b = SqlBuilder::new();
    b.push("SELECT ");
    if let Some(expr) = group {
        b.push(expr).push(" AS key, ");
    }
    b.push(AMOUNT_COLUMNS)
        .push(" FROM transactions tr JOIN transaction_items ti ON ti.transaction_id = tr.id")
        .push_joins(&joins)
        .push_where(&predicates);
    if group.is_some() {
        b.push(" GROUP BY 1 ORDER BY 1");
    }
    b.finish()
}

/// Income and expense totals per group. Sort and pagination are ignored.
pub fn build_report_query(
    user_id: DbId,
    filter: &TransactionFilter,
    grouping: ReportGrouping,
) -> SqlQuery {
    aggregate_query(user_id, filter, Some(group_expression(grouping)))
}

/// Income and expense totals over every matching transaction.
pub fn build_summary_query(user_id: DbId, filter: &TransactionFilter) -> SqlQuery {
    aggregate_query(user_id, filter, None)
}
