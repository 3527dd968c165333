//! In-memory store and upstream fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use nhl_standings::models::{Game, Team, TeamHistory};
use nhl_standings::nhl::wire::{NamedRef, PeriodDescriptor, ScheduleTeam};
use nhl_standings::nhl::{
    ApiError, ApiResult, NhlSource, ScheduleGame, SeasonManifestEntry, UpstreamStanding, UpstreamTeam,
};
use nhl_standings::season::Season;
use nhl_standings::store::{Store, StoreError, StoreResult, TeamUpsertSummary};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// =============================================================================
// MOCK STORE
// =============================================================================

#[derive(Default)]
struct Tables {
    teams: BTreeMap<String, Team>,
    games: BTreeMap<i64, Game>,
    history: Vec<TeamHistory>,
}

/// Store with the same upsert semantics as Postgres, plus failure injection.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_game_dates: Mutex<HashSet<NaiveDate>>,
    fail_teams: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any game batch containing a game on `date` is rolled back.
    pub fn fail_games_on(&self, date: NaiveDate) {
        self.fail_game_dates.lock().unwrap().insert(date);
    }

    pub fn fail_team_writes(&self) {
        *self.fail_teams.lock().unwrap() = true;
    }

    pub fn all_games(&self) -> Vec<Game> {
        self.tables.lock().unwrap().games.values().cloned().collect()
    }

    pub fn game_count(&self) -> usize {
        self.tables.lock().unwrap().games.len()
    }

    pub fn insert_games(&self, games: &[Game]) {
        let mut tables = self.tables.lock().unwrap();
        for g in games {
            tables.games.insert(g.id, g.clone());
        }
    }

    pub fn insert_teams(&self, teams: &[Team]) {
        let mut tables = self.tables.lock().unwrap();
        for t in teams {
            tables.teams.insert(t.abbrev.clone(), t.clone());
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_teams(&self, teams: &[Team]) -> StoreResult<TeamUpsertSummary> {
        if *self.fail_teams.lock().unwrap() {
            let items = teams.iter().map(|t| t.abbrev.clone()).collect();
            return Err(StoreError::rolled_back(
                items,
                StoreError::Unavailable("injected team failure".into()),
            ));
        }
        let mut tables = self.tables.lock().unwrap();
        let mut summary = TeamUpsertSummary::default();
        for team in teams {
            match tables.teams.get(&team.abbrev) {
                None => summary.inserted += 1,
                Some(existing) if existing.differs_from(team) => summary.updated += 1,
                Some(_) => {
                    summary.unchanged += 1;
                    continue;
                }
            }
            tables.teams.insert(team.abbrev.clone(), team.clone());
        }
        Ok(summary)
    }

    async fn upsert_games(&self, games: &[Game]) -> StoreResult<usize> {
        let failing = self.fail_game_dates.lock().unwrap().clone();
        if games.iter().any(|g| failing.contains(&g.game_date)) {
            return Err(StoreError::rolled_back(
                games.iter().map(Game::label).collect(),
                StoreError::Unavailable("injected game failure".into()),
            ));
        }
        let mut tables = self.tables.lock().unwrap();
        for g in games {
            tables.games.insert(g.id, g.clone());
        }
        Ok(games.len())
    }

    async fn upsert_team_history(&self, entries: &[TeamHistory]) -> StoreResult<usize> {
        let mut tables = self.tables.lock().unwrap();
        for entry in entries {
            tables
                .history
                .retain(|h| !(h.franchise_id == entry.franchise_id && h.start_date == entry.start_date));
            tables.history.push(entry.clone());
        }
        Ok(entries.len())
    }

    async fn games_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        season: Option<Season>,
    ) -> StoreResult<Vec<Game>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .games
            .values()
            .filter(|g| g.game_date >= start && g.game_date <= end)
            .filter(|g| season.map_or(true, |s| g.season == s))
            .filter(|g| g.is_completed())
            .cloned()
            .collect())
    }

    async fn latest_game_date(&self, season: Season) -> StoreResult<Option<NaiveDate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .games
            .values()
            .filter(|g| g.season == season)
            .map(|g| g.game_date)
            .max())
    }

    async fn game(&self, id: i64) -> StoreResult<Option<Game>> {
        Ok(self.tables.lock().unwrap().games.get(&id).cloned())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.tables.lock().unwrap().teams.values().cloned().collect())
    }

    async fn team_history(&self, franchise_id: i32) -> StoreResult<Vec<TeamHistory>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<TeamHistory> = tables
            .history
            .iter()
            .filter(|h| h.franchise_id == franchise_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }
}

// =============================================================================
// MOCK UPSTREAM
// =============================================================================

/// Upstream fake serving fixed schedules; records which days were requested.
#[derive(Default)]
pub struct FakeSource {
    pub teams: Vec<UpstreamTeam>,
    pub schedule: HashMap<NaiveDate, Vec<ScheduleGame>>,
    pub failing_days: HashSet<NaiveDate>,
    pub standings: Vec<UpstreamStanding>,
    pub manifest: Option<Vec<SeasonManifestEntry>>,
    pub monthly: HashMap<(String, String), Vec<ScheduleGame>>,
    requested: Mutex<Vec<NaiveDate>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            teams: default_teams(),
            ..Default::default()
        }
    }

    pub fn with_game(mut self, day: NaiveDate, game: ScheduleGame) -> Self {
        self.schedule.entry(day).or_default().push(game);
        self
    }

    pub fn failing_on(mut self, day: NaiveDate) -> Self {
        self.failing_days.insert(day);
        self
    }

    pub fn requested_days(&self) -> Vec<NaiveDate> {
        self.requested.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requested.lock().unwrap().clear();
    }
}

#[async_trait]
impl NhlSource for FakeSource {
    async fn teams(&self) -> ApiResult<Vec<UpstreamTeam>> {
        Ok(self.teams.clone())
    }

    async fn daily_schedule(&self, date: NaiveDate) -> ApiResult<Vec<ScheduleGame>> {
        self.requested.lock().unwrap().push(date);
        if self.failing_days.contains(&date) {
            return Err(ApiError::Status {
                url: format!("fake://schedule/{date}"),
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self.schedule.get(&date).cloned().unwrap_or_default())
    }

    async fn team_monthly_schedule(&self, team: &str, month: &str) -> ApiResult<Vec<ScheduleGame>> {
        self.monthly
            .get(&(team.to_string(), month.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("{team} {month}")))
    }

    async fn league_standings(&self, _season: Season) -> ApiResult<Vec<UpstreamStanding>> {
        Ok(self.standings.clone())
    }

    async fn season_standing_manifest(&self) -> ApiResult<Vec<SeasonManifestEntry>> {
        self.manifest.clone().ok_or_else(|| ApiError::Status {
            url: "fake://standings-season".into(),
            status: 500,
            body: String::new(),
        })
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn upstream_team(abbr: &str, name: &str, franchise: i32, division: &str, conference: &str) -> UpstreamTeam {
    UpstreamTeam {
        abbr: abbr.into(),
        name: name.into(),
        franchise_id: Some(franchise),
        division: NamedRef { name: division.into() },
        conference: NamedRef { name: conference.into() },
        metadata: serde_json::json!({}),
    }
}

pub fn default_teams() -> Vec<UpstreamTeam> {
    vec![
        upstream_team("BOS", "Boston Bruins", 6, "Atlantic", "Eastern"),
        upstream_team("TOR", "Toronto Maple Leafs", 5, "Atlantic", "Eastern"),
        upstream_team("NYR", "New York Rangers", 10, "Metropolitan", "Eastern"),
        upstream_team("COL", "Colorado Avalanche", 27, "Central", "Western"),
        upstream_team("UTA", "Utah Mammoth", 28, "Central", "Western"),
    ]
}

/// A final regular-season game listed on `day`.
pub fn final_game(id: i64, day: NaiveDate, home: &str, away: &str, home_score: i32, away_score: i32) -> ScheduleGame {
    ScheduleGame {
        id,
        game_date: Some(day.format("%Y-%m-%d").to_string()),
        start_time_utc: Some(format!("{}T23:00:00Z", day.format("%Y-%m-%d"))),
        game_type: 2,
        game_state: "OFF".into(),
        home_team: ScheduleTeam {
            abbrev: Some(home.into()),
            score: Some(home_score),
        },
        away_team: ScheduleTeam {
            abbrev: Some(away.into()),
            score: Some(away_score),
        },
        period_descriptor: Some(PeriodDescriptor {
            period_type: Some("REG".into()),
        }),
    }
}

pub fn with_period(mut game: ScheduleGame, period: &str) -> ScheduleGame {
    game.period_descriptor = Some(PeriodDescriptor {
        period_type: Some(period.into()),
    });
    game
}
