//! Integration tests for the filtered title listing.
//!
//! Exercises the list and count statements against a real database:
//! - User scoping with and without filters
//! - Count/list agreement and page concatenation
//! - Watch status, release and EXISTS-based partitions
//! - Row mapping of genres, collections and images

use chrono::NaiveDate;
use homestead_core::pagination::{has_more, PageRequest};
use homestead_core::sorting::SortDirection;
use homestead_core::types::DbId;
use homestead_core::watchlist::{TitleScope, TitleSortKey, TitleType, WatchStatus};
use homestead_db::models::collection::CreateCollection;
use homestead_db::models::media::CreateMediaEntry;
use homestead_db::models::title::{
    TitleListItem, UpdateTitleDetails, UpsertEpisode, UpsertImage, UpsertSeason, UpsertTitle,
};
use homestead_db::models::user::CreateUser;
use homestead_db::query::titles::TitleFilter;
use homestead_db::repositories::{CollectionRepo, EpisodeRepo, MediaRepo, TitleRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

async fn new_user(pool: &PgPool, name: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: name.to_string(),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

fn title_input(tmdb_id: i64, kind: TitleType, name: &str, release: Option<NaiveDate>) -> UpsertTitle {
    UpsertTitle {
        tmdb_id,
        title_type: kind.as_str().to_string(),
        name: name.to_string(),
        original_name: None,
        overview: None,
        rating: Some(7.0),
        vote_count: Some(100),
        release_date: release,
        runtime: Some(120),
        genres: vec![],
        images: vec![],
        seasons: vec![],
    }
}

async fn add_title(
    pool: &PgPool,
    user_id: DbId,
    tmdb_id: i64,
    kind: TitleType,
    name: &str,
    release: Option<NaiveDate>,
) -> DbId {
    let title = TitleRepo::upsert(pool, kind, &title_input(tmdb_id, kind, name, release))
        .await
        .unwrap();
    TitleRepo::add_to_watchlist(pool, user_id, title.id).await.unwrap();
    title.id
}

async fn set_favourite(pool: &PgPool, user_id: DbId, title_id: DbId) {
    TitleRepo::update_details(
        pool,
        user_id,
        title_id,
        &UpdateTitleDetails {
            favourite: Some(true),
            notes: None,
        },
    )
    .await
    .unwrap();
}

/// A tv title with one season of `episodes` episodes.
async fn add_show(pool: &PgPool, user_id: DbId, tmdb_id: i64, name: &str, episodes: i32) -> DbId {
    let mut input = title_input(tmdb_id, TitleType::Tv, name, date(2020, 1, 1));
    input.runtime = None;
    input.seasons = vec![UpsertSeason {
        season_number: 1,
        name: Some("Season 1".into()),
        episodes: (1..=episodes)
            .map(|n| UpsertEpisode {
                episode_number: n,
                name: None,
                air_date: None,
                runtime: Some(25),
            })
            .collect(),
    }];
    let title = TitleRepo::upsert(pool, TitleType::Tv, &input).await.unwrap();
    TitleRepo::add_to_watchlist(pool, user_id, title.id).await.unwrap();
    title.id
}

async fn list(pool: &PgPool, user_id: DbId, filter: &TitleFilter) -> Vec<TitleListItem> {
    TitleRepo::list(pool, user_id, filter).await.unwrap()
}

fn ids(items: &[TitleListItem]) -> Vec<DbId> {
    items.iter().map(|t| t.id).collect()
}

// ---------------------------------------------------------------------------
// Scoping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn no_filters_only_returns_own_watchlist(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;

    let a1 = add_title(&pool, alice, 1, TitleType::Movie, "Heat", date(1995, 12, 15)).await;
    let a2 = add_title(&pool, alice, 2, TitleType::Movie, "Ronin", date(1998, 9, 25)).await;
    let b1 = add_title(&pool, bob, 3, TitleType::Movie, "Collateral", date(2004, 8, 6)).await;

    let filter = TitleFilter::new(today());
    let mut listed = ids(&list(&pool, alice, &filter).await);
    listed.sort();

    assert_eq!(listed, vec![a1, a2]);
    assert!(!listed.contains(&b1));
    assert_eq!(TitleRepo::count(&pool, alice, &filter).await.unwrap(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn not_in_watchlist_lists_the_rest_of_the_catalog(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;

    add_title(&pool, alice, 1, TitleType::Movie, "Heat", None).await;
    let other = add_title(&pool, bob, 2, TitleType::Movie, "Ronin", None).await;

    let mut filter = TitleFilter::new(today());
    filter.scope = TitleScope::NotInWatchlist;
    let items = list(&pool, alice, &filter).await;

    assert_eq!(ids(&items), vec![other]);
    assert!(!items[0].in_watchlist);
    assert!(!items[0].favourite);
}

#[sqlx::test(migrations = "./migrations")]
async fn empty_watchlist_is_not_an_error(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let filter = TitleFilter::new(today());
    assert!(list(&pool, alice, &filter).await.is_empty());
    assert_eq!(TitleRepo::count(&pool, alice, &filter).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Filters, sorting and pagination
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn favourite_tv_by_release_date_first_page(pool: PgPool) {
    let user = new_user(&pool, "alice").await;

    let mut shows = Vec::new();
    for (i, year) in [2015, 2011, 2019, 2013, 2017].iter().enumerate() {
        let id = add_title(
            &pool,
            user,
            100 + i as i64,
            TitleType::Tv,
            &format!("Show {i}"),
            date(*year, 1, 1),
        )
        .await;
        set_favourite(&pool, user, id).await;
        shows.push((id, *year));
    }
    // Not tv, and not favourite: both must be filtered out.
    let movie = add_title(&pool, user, 200, TitleType::Movie, "Movie", date(2000, 1, 1)).await;
    set_favourite(&pool, user, movie).await;
    add_title(&pool, user, 300, TitleType::Tv, "Plain show", date(2001, 1, 1)).await;

    let mut filter = TitleFilter::new(today());
    filter.title_type = Some(TitleType::Tv);
    filter.favourite = Some(true);
    filter.sort_by = TitleSortKey::ReleaseDate;
    filter.direction = SortDirection::Asc;
    filter.page = PageRequest::new(Some(1), Some(2)).unwrap();

    let page = list(&pool, user, &filter).await;
    let total = TitleRepo::count(&pool, user, &filter).await.unwrap();

    shows.sort_by_key(|(_, year)| *year);
    assert_eq!(ids(&page), vec![shows[0].0, shows[1].0]);
    assert_eq!(total, 5);
    assert!(has_more(&filter.page, page.len(), total));
}

#[sqlx::test(migrations = "./migrations")]
async fn search_matches_substring_case_insensitively(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let wick = add_title(&pool, user, 1, TitleType::Movie, "John Wick: Chapter 4", None).await;
    add_title(&pool, user, 2, TitleType::Tv, "Attack on Titan", None).await;

    let mut filter = TitleFilter::new(today());
    filter.search_term = Some("wick".into());

    assert_eq!(ids(&list(&pool, user, &filter).await), vec![wick]);
}

#[sqlx::test(migrations = "./migrations")]
async fn search_wildcards_match_literally(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let literal = add_title(&pool, user, 1, TitleType::Movie, "100% Wolf", None).await;
    add_title(&pool, user, 2, TitleType::Movie, "1000 Wolves", None).await;

    let mut filter = TitleFilter::new(today());
    filter.search_term = Some("100%".into());

    assert_eq!(ids(&list(&pool, user, &filter).await), vec![literal]);
}

#[sqlx::test(migrations = "./migrations")]
async fn count_matches_unpaginated_list(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    for i in 0..6 {
        let kind = if i % 2 == 0 { TitleType::Movie } else { TitleType::Tv };
        let release = if i < 4 { date(2010 + i, 1, 1) } else { date(2030, 1, 1) };
        let id = add_title(&pool, user, i as i64, kind, &format!("Title {i}"), release).await;
        if i % 3 == 0 {
            set_favourite(&pool, user, id).await;
        }
    }

    let mut combos = Vec::new();
    combos.push(TitleFilter::new(today()));
    let mut f = TitleFilter::new(today());
    f.title_type = Some(TitleType::Movie);
    combos.push(f);
    let mut f = TitleFilter::new(today());
    f.released = Some(true);
    f.favourite = Some(false);
    combos.push(f);
    let mut f = TitleFilter::new(today());
    f.watch_status = Some(WatchStatus::Unwatched);
    f.has_media_entry = Some(false);
    combos.push(f);
    let mut f = TitleFilter::new(today());
    f.search_term = Some("title 1".into());
    combos.push(f);

    for filter in combos {
        let rows = list(&pool, user, &filter).await;
        let total = TitleRepo::count(&pool, user, &filter).await.unwrap();
        assert_eq!(rows.len() as i64, total, "filter {filter:?}");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn pages_concatenate_to_full_ordering_with_ties(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    // Every title shares the same rating, so ordering relies on the tie-breaker.
    for i in 0..7 {
        add_title(&pool, user, i, TitleType::Movie, &format!("Tie {i}"), None).await;
    }

    let mut full_filter = TitleFilter::new(today());
    full_filter.sort_by = TitleSortKey::Rating;
    let full = ids(&list(&pool, user, &full_filter).await);
    assert_eq!(full.len(), 7);

    let mut concatenated = Vec::new();
    for page in 1..=3 {
        let mut filter = full_filter.clone();
        filter.page = PageRequest::new(Some(page), Some(3)).unwrap();
        concatenated.extend(ids(&list(&pool, user, &filter).await));
    }
    assert_eq!(concatenated, full);
}

#[sqlx::test(migrations = "./migrations")]
async fn page_past_the_end_is_empty(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    add_title(&pool, user, 1, TitleType::Movie, "Only", None).await;

    let mut filter = TitleFilter::new(today());
    filter.page = PageRequest::new(Some(5), Some(10)).unwrap();
    let page = list(&pool, user, &filter).await;
    let total = TitleRepo::count(&pool, user, &filter).await.unwrap();

    assert!(page.is_empty());
    assert!(!has_more(&filter.page, page.len(), total));
}

#[sqlx::test(migrations = "./migrations")]
async fn released_partitions_are_exhaustive_and_disjoint(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let past = add_title(&pool, user, 1, TitleType::Movie, "Past", date(2020, 1, 1)).await;
    let today_id = add_title(&pool, user, 2, TitleType::Movie, "Today", Some(today())).await;
    let future = add_title(&pool, user, 3, TitleType::Movie, "Future", date(2030, 1, 1)).await;
    let undated = add_title(&pool, user, 4, TitleType::Movie, "Undated", None).await;

    let mut released = TitleFilter::new(today());
    released.released = Some(true);
    let mut unreleased = TitleFilter::new(today());
    unreleased.released = Some(false);

    let mut yes = ids(&list(&pool, user, &released).await);
    let mut no = ids(&list(&pool, user, &unreleased).await);
    yes.sort();
    no.sort();

    assert_eq!(yes, vec![past, today_id]);
    assert_eq!(no, vec![future, undated]);
}

#[sqlx::test(migrations = "./migrations")]
async fn sort_by_duration_sums_tv_episodes(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    // 120-minute movie vs. 3 x 25 and 6 x 25 minute shows.
    let movie = add_title(&pool, user, 1, TitleType::Movie, "Movie", None).await;
    let short = add_show(&pool, user, 2, "Short show", 3).await;
    let long = add_show(&pool, user, 3, "Long show", 6).await;

    let mut filter = TitleFilter::new(today());
    filter.sort_by = TitleSortKey::Duration;
    filter.direction = SortDirection::Desc;
    let items = list(&pool, user, &filter).await;

    assert_eq!(ids(&items), vec![long, movie, short]);
    assert_eq!(items[0].duration, Some(150));
}

// ---------------------------------------------------------------------------
// Watch progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn watch_status_partitions(pool: PgPool) {
    let user = new_user(&pool, "alice").await;

    let seen_movie = add_title(&pool, user, 1, TitleType::Movie, "Seen", None).await;
    TitleRepo::increment_watch_count(&pool, user, seen_movie).await.unwrap();
    let unseen_movie = add_title(&pool, user, 2, TitleType::Movie, "Unseen", None).await;

    let partial = add_show(&pool, user, 3, "Partial", 3).await;
    let episodes = EpisodeRepo::progress_for_title(&pool, user, partial).await.unwrap();
    EpisodeRepo::set_watch_count(&pool, user, episodes[0].id, 1).await.unwrap();

    let complete = add_show(&pool, user, 4, "Complete", 2).await;
    let seasons = EpisodeRepo::seasons_for_title(&pool, complete).await.unwrap();
    EpisodeRepo::mark_season_watched(&pool, user, seasons[0].id).await.unwrap();

    let status_ids = |status| {
        let mut filter = TitleFilter::new(today());
        filter.watch_status = Some(status);
        filter.sort_by = TitleSortKey::TitleName;
        filter.direction = SortDirection::Asc;
        filter
    };

    let fully = ids(&list(&pool, user, &status_ids(WatchStatus::FullyWatched)).await);
    let unwatched = ids(&list(&pool, user, &status_ids(WatchStatus::Unwatched)).await);
    let partially = ids(&list(&pool, user, &status_ids(WatchStatus::PartiallyWatched)).await);

    assert_eq!(fully, vec![complete, seen_movie]);
    assert_eq!(partially, vec![partial]);
    assert_eq!(unwatched, vec![unseen_movie]);
    assert!(!unwatched.contains(&partial));

    let all = list(&pool, user, &TitleFilter::new(today())).await;
    let partial_item = all.iter().find(|t| t.id == partial).unwrap();
    assert_eq!(partial_item.watch_status, WatchStatus::PartiallyWatched);
}

#[sqlx::test(migrations = "./migrations")]
async fn season_in_progress_needs_mixed_counts(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let mixed = add_show(&pool, user, 1, "Mixed", 2).await;
    let untouched = add_show(&pool, user, 2, "Untouched", 2).await;

    let episodes = EpisodeRepo::progress_for_title(&pool, user, mixed).await.unwrap();
    EpisodeRepo::set_watch_count(&pool, user, episodes[1].id, 1).await.unwrap();

    let mut in_progress = TitleFilter::new(today());
    in_progress.season_in_progress = Some(true);
    assert_eq!(ids(&list(&pool, user, &in_progress).await), vec![mixed]);

    let mut not_in_progress = TitleFilter::new(today());
    not_in_progress.season_in_progress = Some(false);
    assert_eq!(ids(&list(&pool, user, &not_in_progress).await), vec![untouched]);
}

// ---------------------------------------------------------------------------
// Joins and row mapping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn collection_and_media_filters(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let a = add_title(&pool, user, 1, TitleType::Movie, "A", None).await;
    let b = add_title(&pool, user, 2, TitleType::Movie, "B", None).await;

    let collection = CollectionRepo::create(
        &pool,
        user,
        &CreateCollection {
            name: "Heists".into(),
            description: None,
            parent_collection_id: None,
        },
    )
    .await
    .unwrap();
    CollectionRepo::add_title(&pool, collection.id, a).await.unwrap();
    MediaRepo::create(
        &pool,
        b,
        &CreateMediaEntry {
            file_path: "/media/b.mkv".into(),
            size_bytes: Some(1_000),
        },
    )
    .await
    .unwrap();

    let mut in_collection = TitleFilter::new(today());
    in_collection.collection_id = Some(collection.id);
    let items = list(&pool, user, &in_collection).await;
    assert_eq!(ids(&items), vec![a]);
    assert_eq!(items[0].collections, vec!["Heists".to_string()]);
    assert_eq!(TitleRepo::count(&pool, user, &in_collection).await.unwrap(), 1);

    let mut with_media = TitleFilter::new(today());
    with_media.has_media_entry = Some(true);
    assert_eq!(ids(&list(&pool, user, &with_media).await), vec![b]);
}

#[sqlx::test(migrations = "./migrations")]
async fn collection_filter_ignores_other_users_collections(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let shared = add_title(&pool, alice, 1, TitleType::Movie, "Shared", None).await;
    TitleRepo::add_to_watchlist(&pool, bob, shared).await.unwrap();

    let bobs = CollectionRepo::create(
        &pool,
        bob,
        &CreateCollection {
            name: "Bob's picks".into(),
            description: None,
            parent_collection_id: None,
        },
    )
    .await
    .unwrap();
    CollectionRepo::add_title(&pool, bobs.id, shared).await.unwrap();

    let mut filter = TitleFilter::new(today());
    filter.collection_id = Some(bobs.id);
    assert!(list(&pool, alice, &filter).await.is_empty());
    assert_eq!(TitleRepo::count(&pool, alice, &filter).await.unwrap(), 0);
    assert_eq!(ids(&list(&pool, bob, &filter).await), vec![shared]);
}

#[sqlx::test(migrations = "./migrations")]
async fn genres_and_images_are_mapped(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let mut input = title_input(1, TitleType::Movie, "Mapped", None);
    input.genres = vec!["Drama".into(), "Action".into(), "Crime, Noir".into()];
    input.images = vec![
        UpsertImage {
            image_type: "poster".into(),
            format: "jpg".into(),
            width: Some(500),
            height: Some(750),
            source_path: "/images/p.jpg".into(),
        },
        UpsertImage {
            image_type: "backdrop".into(),
            format: "webp".into(),
            width: None,
            height: None,
            source_path: "/images/b.webp".into(),
        },
    ];
    let title = TitleRepo::upsert(&pool, TitleType::Movie, &input).await.unwrap();
    TitleRepo::add_to_watchlist(&pool, user, title.id).await.unwrap();

    let bare = add_title(&pool, user, 2, TitleType::Movie, "Bare", None).await;

    let items = list(&pool, user, &TitleFilter::new(today())).await;
    let mapped = items.iter().find(|t| t.id == title.id).unwrap();
    assert_eq!(
        mapped.genres,
        vec!["Action".to_string(), "Crime, Noir".to_string(), "Drama".to_string()]
    );
    assert_eq!(mapped.images["poster"].len(), 1);
    assert!(mapped.images["backdrop"][0].url.ends_with(".webp"));

    let bare = items.iter().find(|t| t.id == bare).unwrap();
    assert!(bare.genres.is_empty());
    assert!(bare.collections.is_empty());
    assert!(bare.images.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn upsert_refreshes_without_duplicating(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let first = add_show(&pool, user, 1, "Show", 2).await;
    let episodes = EpisodeRepo::progress_for_title(&pool, user, first).await.unwrap();
    EpisodeRepo::set_watch_count(&pool, user, episodes[0].id, 2).await.unwrap();

    let mut refresh = title_input(1, TitleType::Tv, "Show (renamed)", date(2020, 1, 1));
    refresh.seasons = vec![UpsertSeason {
        season_number: 1,
        name: None,
        episodes: (1..=3)
            .map(|n| UpsertEpisode {
                episode_number: n,
                name: None,
                air_date: None,
                runtime: Some(30),
            })
            .collect(),
    }];
    let again = TitleRepo::upsert(&pool, TitleType::Tv, &refresh).await.unwrap();

    assert_eq!(again.id, first);
    assert_eq!(again.name, "Show (renamed)");
    let episodes = EpisodeRepo::progress_for_title(&pool, user, first).await.unwrap();
    assert_eq!(episodes.len(), 3);
    assert_eq!(episodes[0].watch_count, 2);
}
