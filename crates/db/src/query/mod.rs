//! Parameterized SQL assembly for filtered, sorted, paginated listings.
//!
//! A listing is described by a base table, the columns and joins its rows
//! need, a list of [`Predicate`]s and an [`Ordering`]. From one description
//! the [`Listing`] produces two statements:
//!
//! - the page query: columns, every row join, all predicates, `ORDER BY`,
//!   and `LIMIT`/`OFFSET` when a page size was requested;
//! - the count query: `COUNT(DISTINCT id)` over the base table with only the
//!   joins the predicates declared, and the same predicates.
//!
//! Fragments are written with `?` markers. [`SqlBuilder`] renumbers them to
//! `$1, $2, ...` in emission order and collects the bind values alongside, so
//! the placeholder index and the bind position can never drift apart. Values
//! supplied by clients only ever travel as [`BindValue`]s.

pub mod titles;
pub mod transactions;

use homestead_core::pagination::PageRequest;
use homestead_core::sorting::SortDirection;
use homestead_core::types::{Date, Timestamp};
use sqlx::postgres::PgArguments;
use sqlx::Postgres;

// ---------------------------------------------------------------------------
// Bind values and fragments
// ---------------------------------------------------------------------------

/// Typed positional parameter for a dynamically built statement.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    BigInt(i64),
    Int(i32),
    Bool(bool),
    Text(String),
    Date(Date),
    Timestamp(Timestamp),
}

/// A piece of SQL with `?` markers and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    sql: String,
    binds: Vec<BindValue>,
}

impl Fragment {
    /// Fragment with bind values. The number of `?` markers must equal
    /// `binds.len()`.
    pub fn new(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        let sql = sql.into();
        debug_assert_eq!(
            sql.matches('?').count(),
            binds.len(),
            "placeholder count mismatch in fragment: {sql}"
        );
        Self { sql, binds }
    }

    /// Fragment without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }
}

/// A join clause identified by its alias so it is emitted at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub alias: &'static str,
    pub clause: Fragment,
}

impl Join {
    pub fn new(alias: &'static str, clause: Fragment) -> Self {
        Self { alias, clause }
    }
}

/// A single boolean condition plus its binds and the joins it reads from.
///
/// Joins are listed in dependency order: a lateral join that references
/// another alias comes after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub condition: Fragment,
    pub requires: Vec<Join>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        Self {
            condition: Fragment::new(sql, binds),
            requires: Vec::new(),
        }
    }

    /// Declare a join this condition reads from.
    pub fn requires(mut self, join: Join) -> Self {
        self.requires.push(join);
        self
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Resolved `ORDER BY`: a whitelisted expression, a direction and the
/// primary-key tie-breaker that keeps pages stable across executions.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub expression: &'static str,
    pub direction: SortDirection,
    pub tie_breaker: &'static str,
}

impl Ordering {
    pub fn to_sql(&self) -> String {
        format!(
            "ORDER BY {} {} NULLS LAST, {} ASC",
            self.expression,
            self.direction.as_sql(),
            self.tie_breaker
        )
    }
}

// ---------------------------------------------------------------------------
// Statement builder
// ---------------------------------------------------------------------------

/// A finished statement and its bind values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Accumulates SQL text and binds, numbering placeholders as it goes.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    binds: Vec<BindValue>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append trusted SQL text. Never pass client input here.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append a fragment, rewriting each `?` to the next `$n`.
    pub fn push_fragment(&mut self, fragment: &Fragment) -> &mut Self {
        let mut binds = fragment.binds.iter();
        for c in fragment.sql.chars() {
            if c == '?' {
                if let Some(value) = binds.next() {
                    self.binds.push(value.clone());
                    self.sql.push('$');
                    self.sql.push_str(&self.binds.len().to_string());
                    continue;
                }
            }
            self.sql.push(c);
        }
        self
    }

    /// Append `WHERE a AND b AND ...`, or nothing when there are no predicates.
    pub fn push_where(&mut self, predicates: &[Predicate]) -> &mut Self {
        for (i, predicate) in predicates.iter().enumerate() {
            self.push(if i == 0 { " WHERE " } else { " AND " });
            self.push("(");
            self.push_fragment(&predicate.condition);
            self.push(")");
        }
        self
    }

    /// Append each join clause, space separated.
    pub fn push_joins(&mut self, joins: &[Join]) -> &mut Self {
        for join in joins {
            self.push(" ");
            self.push_fragment(&join.clause);
        }
        self
    }

    pub fn finish(self) -> SqlQuery {
        SqlQuery {
            sql: self.sql,
            binds: self.binds,
        }
    }
}

/// Merge join lists, keeping the first occurrence of each alias in order.
pub fn merge_joins<'a>(groups: impl IntoIterator<Item = &'a Join>) -> Vec<Join> {
    let mut merged: Vec<Join> = Vec::new();
    for join in groups {
        if !merged.iter().any(|j| j.alias == join.alias) {
            merged.push(join.clone());
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Listing composer
// ---------------------------------------------------------------------------

/// Everything needed to compose the page and count statements of a listing.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Base table with alias, e.g. `titles t`.
    pub from: &'static str,
    /// Primary key of the base table, e.g. `t.id`.
    pub id_column: &'static str,
    /// Select list of the page query. May carry binds (user-scoped subqueries).
    pub columns: Fragment,
    /// Joins the select list reads from (always present in the page query).
    pub row_joins: Vec<Join>,
    pub predicates: Vec<Predicate>,
    pub ordering: Ordering,
    pub page: PageRequest,
}

impl Listing {
    fn predicate_joins(&self) -> impl Iterator<Item = &Join> {
        self.predicates.iter().flat_map(|p| p.requires.iter())
    }

    /// The paginated list statement.
    pub fn page_query(&self) -> SqlQuery {
        let joins = merge_joins(self.row_joins.iter().chain(self.predicate_joins()));

        let mut b = SqlBuilder::new();
        b.push("SELECT ")
            .push_fragment(&self.columns)
            .push(" FROM ")
            .push(self.from)
            .push_joins(&joins)
            .push_where(&self.predicates)
            .push(" ")
            .push(&self.ordering.to_sql());

        if let Some((limit, offset)) = self.page.limit_offset() {
            b.push(" ").push_fragment(&Fragment::new(
                "LIMIT ? OFFSET ?",
                vec![BindValue::BigInt(limit), BindValue::BigInt(offset)],
            ));
        }
        b.finish()
    }

    /// The count statement: same predicates, only the joins they need.
    pub fn count_query(&self) -> SqlQuery {
        let joins = merge_joins(self.predicate_joins());

        let mut b = SqlBuilder::new();
        b.push("SELECT COUNT(DISTINCT ")
            .push(self.id_column)
            .push(") FROM ")
            .push(self.from)
            .push_joins(&joins)
            .push_where(&self.predicates);
        b.finish()
    }
}

// ---------------------------------------------------------------------------
// sqlx binding
// ---------------------------------------------------------------------------

impl SqlQuery {
    /// Prepare a row-returning query with all binds applied.
    pub fn query_as<'q, O>(&'q self) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
    where
        O: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        let mut q = sqlx::query_as::<_, O>(&self.sql);
        for value in &self.binds {
            q = match value {
                BindValue::BigInt(v) => q.bind(*v),
                BindValue::Int(v) => q.bind(*v),
                BindValue::Bool(v) => q.bind(*v),
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Date(v) => q.bind(*v),
                BindValue::Timestamp(v) => q.bind(*v),
            };
        }
        q
    }

    /// Prepare a single `BIGINT` scalar query (counts) with all binds applied.
    pub fn query_count(&self) -> sqlx::query::QueryScalar<'_, Postgres, i64, PgArguments> {
        let mut q = sqlx::query_scalar::<_, i64>(&self.sql);
        for value in &self.binds {
            q = match value {
                BindValue::BigInt(v) => q.bind(*v),
                BindValue::Int(v) => q.bind(*v),
                BindValue::Bool(v) => q.bind(*v),
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Date(v) => q.bind(*v),
                BindValue::Timestamp(v) => q.bind(*v),
            };
        }
        q
    }
}
