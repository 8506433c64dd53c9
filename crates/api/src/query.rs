//! Query-string parameters for the filtered listings and their validation
//! into the typed filters the query builders accept.
//!
//! Enum-valued parameters arrive as free text and are parsed here, so an
//! unknown `title_type`, `watch_status`, `sort_by` or direction is rejected
//! with a validation error before any SQL is built.

use chrono::Utc;
use homestead_core::error::CoreError;
use homestead_core::ledger::{validate_amount_range, ReportGrouping, TransactionDirection, TransactionSortKey};
use homestead_core::pagination::PageRequest;
use homestead_core::sorting::SortDirection;
use homestead_core::text::non_blank;
use homestead_core::types::{Date, DbId};
use homestead_core::watchlist::{TitleScope, TitleSortKey, TitleType, WatchStatus};
use homestead_db::query::titles::TitleFilter;
use homestead_db::query::transactions::TransactionFilter;
use serde::Deserialize;

/// Raw parameters for `GET /titles`.
#[derive(Debug, Default, Deserialize)]
pub struct TitleListParams {
    pub title_type: Option<String>,
    pub in_watchlist: Option<bool>,
    pub search_term: Option<String>,
    pub collection_id: Option<DbId>,
    pub watch_status: Option<String>,
    pub favourite: Option<bool>,
    pub released: Option<bool>,
    pub season_in_progress: Option<bool>,
    pub has_media_entry: Option<bool>,
    pub sort_by: Option<String>,
    #[serde(alias = "sort_direction")]
    pub direction: Option<String>,
    pub page: Option<i64>,
    #[serde(alias = "title_limit")]
    pub page_size: Option<i64>,
}

impl TitleListParams {
    /// Validate into a [`TitleFilter`], using today's UTC date for `released`.
    pub fn into_filter(self) -> Result<TitleFilter, CoreError> {
        self.into_filter_on(Utc::now().date_naive())
    }

    pub fn into_filter_on(self, today: Date) -> Result<TitleFilter, CoreError> {
        let title_type = non_blank(self.title_type.as_deref())
            .map(TitleType::parse)
            .transpose()?;
        let watch_status = non_blank(self.watch_status.as_deref())
            .map(WatchStatus::parse)
            .transpose()?;

        Ok(TitleFilter {
            title_type,
            scope: TitleScope::from_flag(self.in_watchlist),
            search_term: non_blank(self.search_term.as_deref()).map(str::to_string),
            collection_id: self.collection_id,
            watch_status,
            favourite: self.favourite,
            released: self.released,
            season_in_progress: self.season_in_progress,
            has_media_entry: self.has_media_entry,
            sort_by: TitleSortKey::parse(self.sort_by.as_deref())?,
            direction: SortDirection::parse(self.direction.as_deref())?,
            page: PageRequest::new(self.page, self.page_size)?,
            today,
        })
    }
}

/// Raw parameters for `GET /transactions` and the aggregate endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub direction: Option<String>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
    pub category: Option<String>,
    pub search_term: Option<String>,
    pub min_amount_cents: Option<i64>,
    pub max_amount_cents: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Only read by `GET /transactions/report`.
    pub group_by: Option<String>,
}

impl TransactionListParams {
    pub fn to_filter(&self) -> Result<TransactionFilter, CoreError> {
        let direction = non_blank(self.direction.as_deref())
            .map(TransactionDirection::parse)
            .transpose()?;

        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(CoreError::Validation(format!(
                    "date_from ({from}) must not be after date_to ({to})"
                )));
            }
        }
        validate_amount_range(self.min_amount_cents, self.max_amount_cents)?;

        Ok(TransactionFilter {
            direction,
            date_from: self.date_from,
            date_to: self.date_to,
            category: non_blank(self.category.as_deref()).map(str::to_string),
            search_term: non_blank(self.search_term.as_deref()).map(str::to_string),
            min_amount_cents: self.min_amount_cents,
            max_amount_cents: self.max_amount_cents,
            sort_by: TransactionSortKey::parse(self.sort_by.as_deref())?,
            sort_direction: SortDirection::parse(self.sort_direction.as_deref())?,
            page: PageRequest::new(self.page, self.page_size)?,
        })
    }

    pub fn grouping(&self) -> Result<ReportGrouping, CoreError> {
        ReportGrouping::parse(self.group_by.as_deref())
    }
}

/// Raw parameters for the telemetry history endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub host: Option<String>,
    pub name: Option<String>,
    pub since: Option<homestead_core::types::Timestamp>,
    pub limit: Option<i64>,
}

/// Default and maximum row count for telemetry history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;
pub const MAX_HISTORY_LIMIT: i64 = 1_000;

impl HistoryParams {
    pub fn limit(&self) -> Result<i64, CoreError> {
        match self.limit {
            None => Ok(DEFAULT_HISTORY_LIMIT),
            Some(n) if (1..=MAX_HISTORY_LIMIT).contains(&n) => Ok(n),
            Some(n) => Err(CoreError::Validation(format!(
                "limit must be between 1 and {MAX_HISTORY_LIMIT}, got {n}"
            ))),
        }
    }
}
