//! Persistence seam for teams, games and franchise history.

pub mod postgres;

use crate::models::{Game, Team, TeamHistory};
use crate::season::Season;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A batch upsert was rolled back; `items` lists what was in flight.
    #[error("batch of {} rolled back ({}): {source}", .items.len(), .items.join(", "))]
    BatchRolledBack {
        items: Vec<String>,
        #[source]
        source: Box<StoreError>,
    },
    #[error("corrupt row: {0}")]
    CorruptRow(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Wrap an error from a batch write with the labels of the rows in flight.
    pub fn rolled_back(items: Vec<String>, source: StoreError) -> Self {
        StoreError::BatchRolledBack {
            items,
            source: Box::new(source),
        }
    }
}

/// Outcome counts for a team upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TeamUpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or update teams keyed by abbreviation in one transaction.
    /// Existing rows are only rewritten when name/division/conference changed.
    async fn upsert_teams(&self, teams: &[Team]) -> StoreResult<TeamUpsertSummary>;

    /// Insert or overwrite games keyed by id in one transaction.
    async fn upsert_games(&self, games: &[Game]) -> StoreResult<usize>;

    /// Insert or update history rows keyed by `(franchise_id, start_date)`.
    async fn upsert_team_history(&self, entries: &[TeamHistory]) -> StoreResult<usize>;

    /// Completed games with `start <= game_date <= end`, optionally restricted to a season.
    async fn games_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        season: Option<Season>,
    ) -> StoreResult<Vec<Game>>;

    async fn latest_game_date(&self, season: Season) -> StoreResult<Option<NaiveDate>>;

    async fn game(&self, id: i64) -> StoreResult<Option<Game>>;

    async fn list_teams(&self) -> StoreResult<Vec<Team>>;

    /// History rows for a franchise, newest `start_date` first.
    async fn team_history(&self, franchise_id: i32) -> StoreResult<Vec<TeamHistory>>;
}
