//! Season and episode models with per-user progress.

use homestead_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `seasons` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Season {
    pub id: DbId,
    pub title_id: DbId,
    pub season_number: i32,
    pub name: Option<String>,
}

/// An episode joined with the requesting user's watch count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EpisodeProgress {
    pub id: DbId,
    pub season_id: DbId,
    pub episode_number: i32,
    pub name: Option<String>,
    pub air_date: Option<Date>,
    pub runtime: Option<i32>,
    pub watch_count: i32,
    pub last_updated: Option<Timestamp>,
}

/// A row from the `user_episode_details` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserEpisodeDetails {
    pub id: DbId,
    pub user_id: DbId,
    pub episode_id: DbId,
    pub watch_count: i32,
    pub last_updated: Timestamp,
}

/// A season with its episodes, as nested into title detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonDetail {
    #[serde(flatten)]
    pub season: Season,
    pub episodes: Vec<EpisodeProgress>,
}

/// Nest episodes under their seasons. Seasons keep their input order;
/// episodes whose season is not in `seasons` are dropped.
pub fn nest_episodes(seasons: Vec<Season>, episodes: Vec<EpisodeProgress>) -> Vec<SeasonDetail> {
    let mut nested: Vec<SeasonDetail> = seasons
        .into_iter()
        .map(|season| SeasonDetail {
            season,
            episodes: Vec::new(),
        })
        .collect();

    for episode in episodes {
        if let Some(detail) = nested.iter_mut().find(|d| d.season.id == episode.season_id) {
            detail.episodes.push(episode);
        }
    }
    nested
}

/// DTO for setting an episode's watch count.
#[derive(Debug, Clone, Deserialize)]
pub struct SetWatchCount {
    pub watch_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(id: DbId, number: i32) -> Season {
        Season {
            id,
            title_id: 1,
            season_number: number,
            name: None,
        }
    }

    fn episode(id: DbId, season_id: DbId) -> EpisodeProgress {
        EpisodeProgress {
            id,
            season_id,
            episode_number: id as i32,
            name: None,
            air_date: None,
            runtime: Some(24),
            watch_count: 0,
            last_updated: None,
        }
    }

    #[test]
    fn episodes_nest_under_their_season() {
        let nested = nest_episodes(
            vec![season(1, 1), season(2, 2)],
            vec![episode(10, 1), episode(11, 2), episode(12, 1), episode(13, 99)],
        );
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].episodes.iter().map(|e| e.id).collect::<Vec<_>>(), vec![10, 12]);
        assert_eq!(nested[1].episodes.len(), 1);
    }
}
