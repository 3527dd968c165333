//! Upstream NHL data source.

pub mod client;
pub mod wire;

use crate::season::Season;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use client::NhlApiClient;
pub use wire::{ScheduleGame, SeasonManifestEntry, UpstreamStanding, UpstreamTeam};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream returned {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("parse error for {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Everything the sync engine and API read from upstream.
#[async_trait]
pub trait NhlSource: Send + Sync {
    /// Current teams with franchise ids, divisions and conferences.
    async fn teams(&self) -> ApiResult<Vec<UpstreamTeam>>;

    /// All games scheduled on `date`, in any state.
    async fn daily_schedule(&self, date: NaiveDate) -> ApiResult<Vec<ScheduleGame>>;

    /// A club's games for a `YYYY-MM` month.
    async fn team_monthly_schedule(&self, team: &str, month: &str) -> ApiResult<Vec<ScheduleGame>>;

    /// Official league standings at the end of `season`.
    async fn league_standings(&self, season: Season) -> ApiResult<Vec<UpstreamStanding>>;

    async fn season_standing_manifest(&self) -> ApiResult<Vec<SeasonManifestEntry>>;
}
