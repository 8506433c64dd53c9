//! Title listing: predicate assembly, sort resolution and statement composition.
//!
//! Every title listing is scoped to the requesting user through the
//! `user_title_details` join, which carries the user id in its `ON` clause.
//! The scope predicate then keeps either the matched rows (watchlist) or the
//! unmatched ones (catalog titles not yet added).

use homestead_core::pagination::PageRequest;
use homestead_core::sorting::SortDirection;
use homestead_core::text::contains_pattern;
use homestead_core::types::{Date, DbId};
use homestead_core::watchlist::{TitleScope, TitleSortKey, TitleType, WatchStatus};

use super::{BindValue, Fragment, Join, Listing, Ordering, Predicate, SqlQuery};

/// Aggregate watch count: the title-level count for movies, the minimum
/// episode count for tv.
const WATCH_COUNT_EXPR: &str =
    "CASE WHEN t.type = 'movie' THEN COALESCE(utd.watch_count, 0) ELSE ep.min_watch_count END";

/// Runtime in minutes: movie runtime, or the sum of episode runtimes for tv.
const DURATION_EXPR: &str = "CASE WHEN t.type = 'movie' THEN t.runtime \
     ELSE (SELECT SUM(e.runtime) FROM episodes e WHERE e.title_id = t.id)::INTEGER END";

/// Most recent title-level or episode-level activity, falling back to the
/// catalog refresh time for titles the user never touched.
const LAST_UPDATED_EXPR: &str = "COALESCE(GREATEST(utd.last_updated, ep.last_updated), t.updated_at)";

/// Validated filter set for a title listing.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    pub title_type: Option<TitleType>,
    pub scope: TitleScope,
    pub search_term: Option<String>,
    pub collection_id: Option<DbId>,
    pub watch_status: Option<WatchStatus>,
    pub favourite: Option<bool>,
    pub released: Option<bool>,
    pub season_in_progress: Option<bool>,
    pub has_media_entry: Option<bool>,
    pub sort_by: TitleSortKey,
    pub direction: SortDirection,
    pub page: PageRequest,
    /// Reference date for `released`.
    pub today: Date,
}

impl TitleFilter {
    /// A filter with no optional restrictions: the user's watchlist in the
    /// default order, unpaginated.
    pub fn new(today: Date) -> Self {
        Self {
            title_type: None,
            scope: TitleScope::default(),
            search_term: None,
            collection_id: None,
            watch_status: None,
            favourite: None,
            released: None,
            season_in_progress: None,
            has_media_entry: None,
            sort_by: TitleSortKey::default(),
            direction: SortDirection::default(),
            page: PageRequest::default(),
            today,
        }
    }
}

// ---------------------------------------------------------------------------
// Joins
// ---------------------------------------------------------------------------

fn user_details_join(user_id: DbId) -> Join {
    Join::new(
        "utd",
        Fragment::new(
            "LEFT JOIN user_title_details utd ON utd.title_id = t.id AND utd.user_id = ?",
            vec![BindValue::BigInt(user_id)],
        ),
    )
}

fn episode_progress_join(user_id: DbId) -> Join {
    Join::new(
        "ep",
        Fragment::new(
            "LEFT JOIN LATERAL (\
                SELECT COALESCE(MIN(COALESCE(ued.watch_count, 0)), 0) AS min_watch_count, \
                       COALESCE(MAX(ued.watch_count), 0) AS max_watch_count, \
                       MAX(ued.last_updated) AS last_updated \
                FROM episodes e \
                LEFT JOIN user_episode_details ued ON ued.episode_id = e.id AND ued.user_id = ? \
                WHERE e.title_id = t.id\
             ) ep ON TRUE",
            vec![BindValue::BigInt(user_id)],
        ),
    )
}

fn collection_join() -> Join {
    Join::new(
        "ct",
        Fragment::raw("JOIN collection_titles ct ON ct.title_id = t.id"),
    )
}

// ---------------------------------------------------------------------------
// Predicate assembly
// ---------------------------------------------------------------------------

fn exists_or_not(exists: bool, subquery: &str, binds: Vec<BindValue>) -> Predicate {
    let keyword = if exists { "EXISTS" } else { "NOT EXISTS" };
    Predicate::new(format!("{keyword} ({subquery})"), binds)
}

/// Translate a title filter into predicates, user scope first.
///
/// Absent filters contribute nothing; the scope predicate is always present.
pub fn title_predicates(user_id: DbId, filter: &TitleFilter) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    let scope = match filter.scope {
        TitleScope::Watchlist => "utd.id IS NOT NULL",
        TitleScope::NotInWatchlist => "utd.id IS NULL",
    };
    predicates.push(Predicate::new(scope, vec![]).requires(user_details_join(user_id)));

    if let Some(title_type) = filter.title_type {
        predicates.push(Predicate::new(
            "t.type = ?",
            vec![BindValue::Text(title_type.as_str().to_string())],
        ));
    }

    if let Some(term) = filter.search_term.as_deref() {
        let pattern = contains_pattern(term);
        predicates.push(Predicate::new(
            "t.name ILIKE ? OR t.original_name ILIKE ?",
            vec![BindValue::Text(pattern.clone()), BindValue::Text(pattern)],
        ));
    }

    if let Some(collection_id) = filter.collection_id {
        predicates.push(
            Predicate::new(
                "ct.collection_id = ? AND EXISTS (\
                    SELECT 1 FROM collections oc WHERE oc.id = ct.collection_id AND oc.user_id = ?)",
                vec![BindValue::BigInt(collection_id), BindValue::BigInt(user_id)],
            )
            .requires(collection_join()),
        );
    }

    if let Some(status) = filter.watch_status {
        let condition = match status {
            WatchStatus::Unwatched => {
                format!("{WATCH_COUNT_EXPR} = 0 AND (t.type = 'movie' OR ep.max_watch_count = 0)")
            }
            WatchStatus::PartiallyWatched => {
                format!("t.type = 'tv' AND {WATCH_COUNT_EXPR} = 0 AND ep.max_watch_count > 0")
            }
            WatchStatus::FullyWatched => format!("{WATCH_COUNT_EXPR} >= 1"),
        };
        predicates.push(
            Predicate::new(condition, vec![])
                .requires(user_details_join(user_id))
                .requires(episode_progress_join(user_id)),
        );
    }

    if let Some(favourite) = filter.favourite {
        predicates.push(
            Predicate::new("COALESCE(utd.favourite, FALSE) = ?", vec![BindValue::Bool(favourite)])
                .requires(user_details_join(user_id)),
        );
    }

    if let Some(released) = filter.released {
        let condition = if released {
            "t.release_date <= ?"
        } else {
            "t.release_date IS NULL OR t.release_date > ?"
        };
        predicates.push(Predicate::new(condition, vec![BindValue::Date(filter.today)]));
    }

    if let Some(in_progress) = filter.season_in_progress {
        predicates.push(exists_or_not(
            in_progress,
            "SELECT 1 FROM episodes e \
             LEFT JOIN user_episode_details ued ON ued.episode_id = e.id AND ued.user_id = ? \
             WHERE e.title_id = t.id \
             GROUP BY e.season_id \
             HAVING COUNT(DISTINCT COALESCE(ued.watch_count, 0)) > 1",
            vec![BindValue::BigInt(user_id)],
        ));
    }

    if let Some(has_media) = filter.has_media_entry {
        predicates.push(exists_or_not(
            has_media,
            "SELECT 1 FROM media_entries me WHERE me.title_id = t.id",
            vec![],
        ));
    }

    predicates
}

// ---------------------------------------------------------------------------
// Sort resolution
// ---------------------------------------------------------------------------

/// Orderable expression for a title sort key.
pub fn title_sort_expression(key: TitleSortKey) -> &'static str {
    match key {
        TitleSortKey::LastUpdated => LAST_UPDATED_EXPR,
        TitleSortKey::Rating => "t.rating",
        TitleSortKey::Popularity => "t.vote_count",
        TitleSortKey::ReleaseDate => "t.release_date",
        TitleSortKey::TitleName => "t.name",
        TitleSortKey::Duration => DURATION_EXPR,
        TitleSortKey::DataUpdated => "t.updated_at",
    }
}

pub fn title_ordering(key: TitleSortKey, direction: SortDirection) -> Ordering {
    Ordering {
        expression: title_sort_expression(key),
        direction,
        tie_breaker: "t.id",
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

fn list_columns(user_id: DbId) -> Fragment {
    Fragment::new(
        format!(
            "t.id, t.tmdb_id, t.type AS title_type, t.name, t.original_name, t.overview, t.rating, \
             t.vote_count, t.release_date, t.runtime, t.updated_at, \
             {DURATION_EXPR} AS duration, \
             (utd.id IS NOT NULL) AS in_watchlist, \
             COALESCE(utd.favourite, FALSE) AS favourite, \
             utd.notes, \
             {WATCH_COUNT_EXPR} AS watch_count, \
             ep.max_watch_count, \
             GREATEST(utd.last_updated, ep.last_updated) AS last_updated, \
             (SELECT STRING_AGG(g.name, CHR(31) ORDER BY g.name) \
                FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
               WHERE tg.title_id = t.id) AS genres, \
             (SELECT STRING_AGG(c.name, CHR(31) ORDER BY c.name) \
                FROM collection_titles ct2 JOIN collections c ON c.id = ct2.collection_id \
               WHERE ct2.title_id = t.id AND c.user_id = ?) AS collections, \
             (SELECT JSON_AGG(JSON_BUILD_OBJECT(\
                        'id', ti.id, 'type', ti.type, 'format', ti.format, \
                        'width', ti.width, 'height', ti.height) ORDER BY ti.id) \
                FROM title_images ti WHERE ti.title_id = t.id) AS images"
        ),
        vec![BindValue::BigInt(user_id)],
    )
}

/// Describe the title listing for `user_id` under `filter`.
pub fn title_listing(user_id: DbId, filter: &TitleFilter) -> Listing {
    Listing {
        from: "titles t",
        id_column: "t.id",
        columns: list_columns(user_id),
        row_joins: vec![user_details_join(user_id), episode_progress_join(user_id)],
        predicates: title_predicates(user_id, filter),
        ordering: title_ordering(filter.sort_by, filter.direction),
        page: filter.page,
    }
}

/// Paginated title list statement.
pub fn build_list_query(user_id: DbId, filter: &TitleFilter) -> SqlQuery {
    title_listing(user_id, filter).page_query()
}

/// Count of titles matching `filter`, ignoring pagination.
pub fn build_count_query(user_id: DbId, filter: &TitleFilter) -> SqlQuery {
    title_listing(user_id, filter).count_query()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> Date {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn placeholder_count(sql: &str) -> usize {
        (1..=64).take_while(|n| sql.contains(&format!("${n}"))).count()
    }

    #[test]
    fn no_filters_still_scopes_to_user() {
        let predicates = title_predicates(7, &TitleFilter::new(today()));
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].condition.sql(), "utd.id IS NOT NULL");
        assert_eq!(predicates[0].requires[0].alias, "utd");
        assert_eq!(
            predicates[0].requires[0].clause.binds(),
            &[BindValue::BigInt(7)]
        );
    }

    #[test]
    fn not_in_watchlist_scope() {
        let mut filter = TitleFilter::new(today());
        filter.scope = TitleScope::NotInWatchlist;
        let predicates = title_predicates(7, &filter);
        assert_eq!(predicates[0].condition.sql(), "utd.id IS NULL");
    }

    #[test]
    fn search_term_is_bound_not_interpolated() {
        let mut filter = TitleFilter::new(today());
        filter.search_term = Some("wick'; DROP TABLE titles; --".into());
        let q = build_list_query(1, &filter);

        assert!(!q.sql.contains("DROP TABLE"));
        assert!(q
            .binds
            .contains(&BindValue::Text("%wick'; DROP TABLE titles; --%".into())));
    }

    #[test]
    fn placeholders_match_binds() {
        let mut filter = TitleFilter::new(today());
        filter.title_type = Some(TitleType::Tv);
        filter.search_term = Some("wick".into());
        filter.collection_id = Some(3);
        filter.watch_status = Some(WatchStatus::PartiallyWatched);
        filter.favourite = Some(true);
        filter.released = Some(false);
        filter.season_in_progress = Some(true);
        filter.has_media_entry = Some(false);
        filter.page = PageRequest::new(Some(2), Some(10)).unwrap();

        let list = build_list_query(1, &filter);
        assert_eq!(placeholder_count(&list.sql), list.binds.len());

        let count = build_count_query(1, &filter);
        assert_eq!(placeholder_count(&count.sql), count.binds.len());
    }

    #[test]
    fn count_query_skips_row_only_joins() {
        let count = build_count_query(1, &TitleFilter::new(today()));
        assert!(count.sql.starts_with("SELECT COUNT(DISTINCT t.id) FROM titles t"));
        assert!(count.sql.contains("LEFT JOIN user_title_details utd"));
        assert!(!count.sql.contains("LATERAL"));
        assert!(!count.sql.contains("STRING_AGG"));
    }

    #[test]
    fn watch_status_pulls_in_episode_progress() {
        let mut filter = TitleFilter::new(today());
        filter.watch_status = Some(WatchStatus::FullyWatched);
        let count = build_count_query(1, &filter);
        assert!(count.sql.contains("LEFT JOIN LATERAL"));
        assert_eq!(count.sql.matches("LEFT JOIN user_title_details").count(), 1);
    }

    #[test]
    fn collection_filter_requires_join() {
        let mut filter = TitleFilter::new(today());
        filter.collection_id = Some(5);
        let count = build_count_query(1, &filter);
        assert!(count.sql.contains("JOIN collection_titles ct ON ct.title_id = t.id"));
        assert!(count.binds.contains(&BindValue::BigInt(5)));
    }

    #[test]
    fn collection_filter_is_scoped_to_owner() {
        let mut filter = TitleFilter::new(today());
        filter.collection_id = Some(5);
        let predicates = title_predicates(9, &filter);
        let collection = predicates
            .iter()
            .find(|p| p.condition.sql().contains("ct.collection_id"))
            .unwrap();
        assert!(collection.condition.sql().contains("oc.user_id = ?"));
        assert_eq!(
            collection.condition.binds(),
            &[BindValue::BigInt(5), BindValue::BigInt(9)]
        );
    }

    #[test]
    fn released_false_includes_missing_dates() {
        let mut filter = TitleFilter::new(today());
        filter.released = Some(false);
        let predicates = title_predicates(1, &filter);
        let last = predicates.last().unwrap();
        assert!(last.condition.sql().contains("IS NULL"));
        assert_eq!(last.condition.binds(), &[BindValue::Date(today())]);
    }

    #[test]
    fn boolean_exists_filters_negate() {
        let mut filter = TitleFilter::new(today());
        filter.has_media_entry = Some(false);
        let predicates = title_predicates(1, &filter);
        assert!(predicates
            .last()
            .unwrap()
            .condition
            .sql()
            .starts_with("NOT EXISTS"));
    }

    #[test]
    fn sort_keys_resolve_to_expressions() {
        assert_eq!(title_sort_expression(TitleSortKey::Rating), "t.rating");
        assert_eq!(title_sort_expression(TitleSortKey::Popularity), "t.vote_count");
        assert!(title_sort_expression(TitleSortKey::Duration).contains("SUM(e.runtime)"));
        assert!(title_sort_expression(TitleSortKey::LastUpdated).contains("GREATEST"));
    }

    #[test]
    fn list_query_orders_with_tie_breaker_and_paginates() {
        let mut filter = TitleFilter::new(today());
        filter.sort_by = TitleSortKey::ReleaseDate;
        filter.direction = SortDirection::Asc;
        filter.page = PageRequest::new(Some(1), Some(2)).unwrap();

        let q = build_list_query(1, &filter);
        assert!(q
            .sql
            .contains("ORDER BY t.release_date ASC NULLS LAST, t.id ASC LIMIT"));
        assert_eq!(q.binds[q.binds.len() - 2], BindValue::BigInt(2));
        assert_eq!(q.binds[q.binds.len() - 1], BindValue::BigInt(0));
    }
}
