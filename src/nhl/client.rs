use super::wire::{
    ClubScheduleResponse, Franchise, FranchiseResponse, NamedRef, ScheduleResponse,
    SeasonManifestResponse, StandingsResponse, UpstreamStanding,
};
use super::{ApiError, ApiResult, NhlSource, ScheduleGame, SeasonManifestEntry, UpstreamTeam};
use crate::season::Season;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_WEB_BASE: &str = "https://api-web.nhle.com/v1";
pub const DEFAULT_STATS_BASE: &str = "https://api.nhle.com/stats/rest/en";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub web_base_url: String,
    pub stats_base_url: String,
    pub requests_per_minute: u32,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            web_base_url: DEFAULT_WEB_BASE.to_string(),
            stats_base_url: DEFAULT_STATS_BASE.to_string(),
            requests_per_minute: 120,
            timeout: Duration::from_secs(30),
        }
    }
}

/// NHL web API client with a client-side rate limit.
pub struct NhlApiClient {
    http: reqwest::Client,
    web_base_url: String,
    stats_base_url: String,
    rate_limiter: RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>,
}

impl NhlApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(5)
            .user_agent("nhl-standings/1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            web_base_url: config.web_base_url.trim_end_matches('/').to_string(),
            stats_base_url: config.stats_base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        self.rate_limiter.until_ready().await;
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Network {
            url: url.to_string(),
            source: e,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Parse {
            url: url.to_string(),
            source: e,
        })
    }

    async fn franchises(&self) -> ApiResult<Vec<Franchise>> {
        let url = format!("{}/franchise", self.stats_base_url);
        let raw: FranchiseResponse = self.get_json(&url).await?;
        Ok(raw.data)
    }
}

#[async_trait]
impl NhlSource for NhlApiClient {
    async fn teams(&self) -> ApiResult<Vec<UpstreamTeam>> {
        let url = format!("{}/standings/now", self.web_base_url);
        let raw: serde_json::Value = self.get_json(&url).await?;
        let entries = raw
            .get("standings")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        // Franchise ids are optional enrichment; teams still sync without them.
        let franchise_ids: HashMap<String, i32> = match self.franchises().await {
            Ok(list) => list
                .into_iter()
                .map(|f| (f.full_name.to_lowercase(), f.id))
                .collect(),
            Err(e) => {
                warn!("Franchise list unavailable, teams will lack franchise ids: {}", e);
                HashMap::new()
            }
        };

        let mut teams = Vec::with_capacity(entries.len());
        for entry in entries {
            let standing: UpstreamStanding =
                serde_json::from_value(entry.clone()).map_err(|e| ApiError::Parse {
                    url: url.clone(),
                    source: e,
                })?;
            let name = standing.team_name.default.clone();
            teams.push(UpstreamTeam {
                abbr: standing.team_abbrev.default.clone(),
                franchise_id: franchise_ids.get(&name.to_lowercase()).copied(),
                name,
                division: NamedRef {
                    name: standing.division_name.clone(),
                },
                conference: NamedRef {
                    name: standing.conference_name.clone(),
                },
                metadata: entry,
            });
        }

        info!("Fetched {} teams from NHL API", teams.len());
        Ok(teams)
    }

    async fn daily_schedule(&self, date: NaiveDate) -> ApiResult<Vec<ScheduleGame>> {
        let day = date.format("%Y-%m-%d").to_string();
        let url = format!("{}/schedule/{}", self.web_base_url, day);
        let raw: ScheduleResponse = self.get_json(&url).await?;

        // The endpoint returns a whole week; keep only the requested day.
        Ok(raw
            .game_week
            .into_iter()
            .find(|d| d.date == day)
            .map(|d| d.games)
            .unwrap_or_default())
    }

    async fn team_monthly_schedule(&self, team: &str, month: &str) -> ApiResult<Vec<ScheduleGame>> {
        if NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_err() {
            return Err(ApiError::InvalidRequest(format!(
                "month must look like YYYY-MM, got '{month}'"
            )));
        }
        let team = team.trim().to_uppercase();
        if team.is_empty() {
            return Err(ApiError::InvalidRequest("team abbreviation is empty".into()));
        }

        let url = format!("{}/club-schedule/{}/month/{}", self.web_base_url, team, month);
        let raw: ClubScheduleResponse = self.get_json(&url).await?;
        Ok(raw.games)
    }

    async fn league_standings(&self, season: Season) -> ApiResult<Vec<UpstreamStanding>> {
        let code = season.to_string();
        let manifest = self.season_standing_manifest().await?;
        let entry = manifest
            .iter()
            .find(|s| s.id.to_string() == code)
            .ok_or_else(|| ApiError::NotFound(format!("season {code} not in standings manifest")))?;

        let today = Utc::now().date_naive();
        let end = entry
            .standings_end
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        let date = match end {
            Some(end) if end <= today => end.format("%Y-%m-%d").to_string(),
            _ => "now".to_string(),
        };

        let url = format!("{}/standings/{}", self.web_base_url, date);
        let raw: StandingsResponse = self.get_json(&url).await?;
        Ok(raw.standings)
    }

    async fn season_standing_manifest(&self) -> ApiResult<Vec<SeasonManifestEntry>> {
        let url = format!("{}/standings-season", self.web_base_url);
        let raw: SeasonManifestResponse = self.get_json(&url).await?;
        Ok(raw.seasons)
    }
}
