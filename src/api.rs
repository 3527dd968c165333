//! HTTP surface: computed and official standings, teams, seasons, manual sync.

use crate::health::HealthState;
use crate::models::Game;
use crate::nhl::{ApiError, NhlSource, UpstreamStanding};
use crate::season::{Season, SeasonParseError};
use crate::standings::{compute_standings, Standing, StandingsFilter, StandingsQuery};
use crate::store::{Store, StoreError};
use crate::sync::{completed_game, SyncError, SyncReport, SyncService};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Seasons listed when the upstream manifest is unavailable.
const FALLBACK_SEASONS: usize = 10;

pub struct AppState<S, C> {
    pub sync: Arc<SyncService<S, C>>,
    pub health: HealthState,
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            sync: Arc::clone(&self.sync),
            health: self.health.clone(),
        }
    }
}

impl<S, C> AppState<S, C> {
    pub fn new(sync: Arc<SyncService<S, C>>, health: HealthState) -> Self {
        Self { sync, health }
    }
}

/// Error payload: `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ApiError> for ApiFailure {
    fn from(e: ApiError) -> Self {
        let status = match &e {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        warn!("Upstream failure: {}", e);
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<StoreError> for ApiFailure {
    fn from(e: StoreError) -> Self {
        error!("Store failure: {}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl From<SeasonParseError> for ApiFailure {
    fn from(e: SeasonParseError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<SyncError> for ApiFailure {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::InvalidRange { .. } => Self::bad_request(e.to_string()),
            SyncError::Upstream(api) => api.into(),
            other => {
                error!("Sync failure: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: other.to_string(),
                }
            }
        }
    }
}

type ApiResponse<T> = Result<Json<T>, ApiFailure>;

#[derive(Debug, Default, Deserialize)]
pub struct StandingsParams {
    pub season: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub division: Option<String>,
    pub conference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonParams {
    pub season: Option<String>,
    pub division: Option<String>,
    pub conference: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_season(raw: &Option<String>, today: NaiveDate) -> Result<Season, ApiFailure> {
    match non_empty(raw) {
        Some(s) => Ok(s.parse::<Season>()?),
        None => Ok(Season::for_date(today)),
    }
}

fn parse_date(field: &str, raw: &Option<String>) -> Result<Option<NaiveDate>, ApiFailure> {
    non_empty(raw)
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| ApiFailure::bad_request(format!("{field} must be YYYY-MM-DD, got '{s}'")))
        })
        .transpose()
}

/// Date range for a standings request.
///
/// Start only runs to today; end only starts at the season start; neither
/// covers the whole season window.
pub fn resolve_range(params: &StandingsParams, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ApiFailure> {
    let season = parse_season(&params.season, today)?;
    let start = parse_date("start_date", &params.start_date)?;
    let end = parse_date("end_date", &params.end_date)?;

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, today),
        (None, Some(e)) => (season.start_date(), e),
        (None, None) => (season.start_date(), season.end_date()),
    };
    if start > end {
        return Err(ApiFailure::bad_request(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    Ok((start, end))
}

fn filter_of(division: &Option<String>, conference: &Option<String>) -> StandingsFilter {
    StandingsFilter {
        division: non_empty(division).map(str::to_string),
        conference: non_empty(conference).map(str::to_string),
    }
}

pub fn router<S, C>(state: AppState<S, C>) -> Router
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    let api = Router::new()
        .route("/standings", get(standings::<S, C>))
        .route("/standings/official", get(official_standings::<S, C>))
        .route("/teams", get(teams::<S, C>))
        .route("/teams/:abbrev/schedule/:month", get(team_schedule::<S, C>))
        .route("/seasons", get(seasons::<S, C>))
        .route("/sync", post(trigger_sync::<S, C>));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_handler::<S, C>))
        .nest("/api/nhl", api)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "nhl-standings",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/api/nhl/standings",
            "/api/nhl/standings/official",
            "/api/nhl/teams",
            "/api/nhl/teams/:abbrev/schedule/:month",
            "/api/nhl/seasons",
            "/api/nhl/sync"
        ]
    }))
}

/// Health check handler
async fn health_handler<S, C>(State(state): State<AppState<S, C>>) -> (StatusCode, Json<serde_json::Value>)
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    let snapshot = state.health.snapshot().await;
    let http_status = if snapshot.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        http_status,
        Json(json!({
            "service": "nhl-standings",
            "version": env!("CARGO_PKG_VERSION"),
            "status": snapshot.status,
            "last_sync": snapshot.last_sync,
            "last_sync_count": snapshot.last_sync_count,
            "consecutive_errors": snapshot.consecutive_errors
        })),
    )
}

async fn standings<S, C>(
    State(state): State<AppState<S, C>>,
    Query(params): Query<StandingsParams>,
) -> ApiResponse<Vec<Standing>>
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    let (start, end) = resolve_range(&params, state.sync.today())?;
    let query = StandingsQuery {
        start,
        end,
        filter: filter_of(&params.division, &params.conference),
    };
    let rows = compute_standings(state.sync.store(), &query).await?;
    info!("Computed standings for {}..{}: {} teams", start, end, rows.len());
    Ok(Json(rows))
}

async fn official_standings<S, C>(
    State(state): State<AppState<S, C>>,
    Query(params): Query<SeasonParams>,
) -> ApiResponse<Vec<UpstreamStanding>>
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    let season = parse_season(&params.season, state.sync.today())?;
    let division = non_empty(&params.division);
    let conference = non_empty(&params.conference);

    let rows = state
        .sync
        .source()
        .league_standings(season)
        .await?
        .into_iter()
        .filter(|row| division.map_or(true, |d| d.eq_ignore_ascii_case(&row.division_name)))
        .filter(|row| conference.map_or(true, |c| c.eq_ignore_ascii_case(&row.conference_name)))
        .collect();
    Ok(Json(rows))
}

async fn teams<S, C>(State(state): State<AppState<S, C>>) -> ApiResponse<Vec<crate::models::Team>>
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    Ok(Json(state.sync.store().list_teams().await?))
}

/// Completed games from a club's monthly schedule, read through from upstream.
async fn team_schedule<S, C>(
    State(state): State<AppState<S, C>>,
    Path((abbrev, month)): Path<(String, String)>,
) -> ApiResponse<Vec<Game>>
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    let today = state.sync.today();
    let raw = state.sync.source().team_monthly_schedule(&abbrev, &month).await?;

    let games = raw
        .iter()
        .filter_map(|g| {
            let day = g
                .game_date
                .as_deref()
                .and_then(|s| s.get(..10))
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())?;
            completed_game(g, day, Season::for_date(day), today).ok()
        })
        .collect();
    Ok(Json(games))
}

/// Seasons with standings, newest first.
async fn seasons<S, C>(State(state): State<AppState<S, C>>) -> Json<Vec<Season>>
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    let fallback = || state.sync.current_season().recent(FALLBACK_SEASONS);

    let mut seasons: Vec<Season> = match state.sync.source().season_standing_manifest().await {
        Ok(entries) => entries
            .iter()
            .filter_map(|e| e.id.to_string().parse::<Season>().ok())
            .collect(),
        Err(e) => {
            warn!("Season manifest unavailable, listing recent seasons: {}", e);
            return Json(fallback());
        }
    };
    if seasons.is_empty() {
        return Json(fallback());
    }
    seasons.sort_by(|a, b| b.cmp(a));
    seasons.dedup();
    Json(seasons)
}

async fn trigger_sync<S, C>(
    State(state): State<AppState<S, C>>,
    Query(params): Query<SeasonParams>,
) -> ApiResponse<SyncReport>
where
    S: Store + 'static,
    C: NhlSource + 'static,
{
    let season = match non_empty(&params.season) {
        Some(s) => Some(s.parse::<Season>()?),
        None => None,
    };

    info!("Manual sync requested (season: {:?})", season.map(|s| s.to_string()));
    match state.sync.sync_current_season(season).await {
        Ok(report) => {
            state.health.record_success(report.games_synced()).await;
            Ok(Json(report))
        }
        Err(e) => {
            state.health.record_error().await;
            Err(e.into())
        }
    }
}
