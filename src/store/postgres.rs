use super::{Store, StoreError, StoreResult, TeamUpsertSummary};
use crate::models::{Game, GameType, PeriodType, Team, TeamHistory};
use crate::season::Season;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

/// Table bootstrap, applied statement by statement.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id SERIAL PRIMARY KEY,
        abbrev VARCHAR(5) NOT NULL UNIQUE,
        name VARCHAR(100) NOT NULL,
        franchise_id INTEGER,
        division VARCHAR(50),
        conference VARCHAR(50),
        metadata_json JSONB
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_teams_franchise_id ON teams (franchise_id)",
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id BIGINT PRIMARY KEY,
        game_date DATE NOT NULL,
        season VARCHAR(10) NOT NULL,
        game_type INTEGER NOT NULL,
        game_state VARCHAR(20) NOT NULL,
        home_team_abbrev VARCHAR(5) NOT NULL REFERENCES teams (abbrev),
        away_team_abbrev VARCHAR(5) NOT NULL REFERENCES teams (abbrev),
        home_score INTEGER,
        away_score INTEGER,
        period_type VARCHAR(10)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_game_date_season ON games (game_date, season)",
    "CREATE INDEX IF NOT EXISTS idx_season_teams ON games (season, home_team_abbrev, away_team_abbrev)",
    r#"
    CREATE TABLE IF NOT EXISTS team_history (
        id SERIAL PRIMARY KEY,
        franchise_id INTEGER NOT NULL,
        abbrev VARCHAR(5) NOT NULL,
        name VARCHAR(100) NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE,
        division VARCHAR(50),
        conference VARCHAR(50),
        metadata_json JSONB,
        UNIQUE (franchise_id, start_date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ix_team_history_abbrev ON team_history (abbrev)",
];

#[derive(sqlx::FromRow)]
struct TeamRow {
    abbrev: String,
    name: String,
    franchise_id: Option<i32>,
    division: Option<String>,
    conference: Option<String>,
    metadata_json: Option<Json<serde_json::Value>>,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            abbrev: row.abbrev,
            name: row.name,
            franchise_id: row.franchise_id,
            division: row.division.unwrap_or_default(),
            conference: row.conference.unwrap_or_default(),
            metadata: row.metadata_json.map(|j| j.0).unwrap_or_default(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct GameRow {
    id: i64,
    game_date: NaiveDate,
    season: String,
    game_type: i32,
    game_state: String,
    home_team_abbrev: String,
    away_team_abbrev: String,
    home_score: Option<i32>,
    away_score: Option<i32>,
    period_type: Option<String>,
}

impl TryFrom<GameRow> for Game {
    type Error = StoreError;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        let season: Season = row
            .season
            .parse()
            .map_err(|e| StoreError::CorruptRow(format!("game {}: {}", row.id, e)))?;
        let (home_score, away_score) = match (row.home_score, row.away_score) {
            (Some(h), Some(a)) => (h, a),
            _ => {
                return Err(StoreError::CorruptRow(format!(
                    "game {}: completed game without scores",
                    row.id
                )))
            }
        };
        let period_type = match row.period_type.as_deref() {
            Some(raw) => raw
                .parse()
                .map_err(|e| StoreError::CorruptRow(format!("game {}: {}", row.id, e)))?,
            None => PeriodType::Reg,
        };

        Ok(Game {
            id: row.id,
            game_date: row.game_date,
            season,
            game_type: GameType::from_code(row.game_type),
            game_state: row.game_state,
            home_team_abbrev: row.home_team_abbrev,
            away_team_abbrev: row.away_team_abbrev,
            home_score,
            away_score,
            period_type,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    franchise_id: i32,
    abbrev: String,
    name: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    division: Option<String>,
    conference: Option<String>,
}

impl From<HistoryRow> for TeamHistory {
    fn from(row: HistoryRow) -> Self {
        TeamHistory {
            franchise_id: row.franchise_id,
            abbrev: row.abbrev,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            division: row.division.unwrap_or_default(),
            conference: row.conference.unwrap_or_default(),
        }
    }
}

const GAME_COLUMNS: &str = "id, game_date, season, game_type, game_state, home_team_abbrev, \
     away_team_abbrev, home_score, away_score, period_type";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect_with_retry(url: &str, max_retries: u32) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await
            {
                Ok(pool) => {
                    info!("Connected to PostgreSQL");
                    return Ok(Self::new(pool));
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(anyhow!(
                            "Failed to connect to database after {} attempts: {}",
                            max_retries,
                            e
                        ));
                    }
                    warn!("Database connection attempt {} failed: {}. Retrying...", attempt, e);
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
            }
        }
    }

    /// Create tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Database schema ready");
        Ok(())
    }

    async fn write_teams(&self, teams: &[Team]) -> StoreResult<TeamUpsertSummary> {
        let mut summary = TeamUpsertSummary::default();
        let mut tx = self.pool.begin().await?;

        for team in teams {
            // No row back means the WHERE guard skipped an unchanged team.
            let outcome: Option<(bool,)> = sqlx::query_as(
                r#"
                INSERT INTO teams (abbrev, name, franchise_id, division, conference, metadata_json)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (abbrev) DO UPDATE SET
                    name = EXCLUDED.name,
                    franchise_id = EXCLUDED.franchise_id,
                    division = EXCLUDED.division,
                    conference = EXCLUDED.conference,
                    metadata_json = EXCLUDED.metadata_json
                WHERE teams.name IS DISTINCT FROM EXCLUDED.name
                   OR teams.division IS DISTINCT FROM EXCLUDED.division
                   OR teams.conference IS DISTINCT FROM EXCLUDED.conference
                RETURNING (xmax = 0) AS inserted
                "#,
            )
            .bind(&team.abbrev)
            .bind(&team.name)
            .bind(team.franchise_id)
            .bind(&team.division)
            .bind(&team.conference)
            .bind(Json(&team.metadata))
            .fetch_optional(&mut *tx)
            .await?;

            match outcome {
                Some((true,)) => summary.inserted += 1,
                Some((false,)) => summary.updated += 1,
                None => summary.unchanged += 1,
            }
        }

        tx.commit().await?;
        Ok(summary)
    }

    async fn write_games(&self, games: &[Game]) -> StoreResult<usize> {
        let mut tx = self.pool.begin().await?;

        for game in games {
            sqlx::query(
                r#"
                INSERT INTO games (
                    id, game_date, season, game_type, game_state,
                    home_team_abbrev, away_team_abbrev, home_score, away_score, period_type
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (id) DO UPDATE SET
                    game_date = EXCLUDED.game_date,
                    season = EXCLUDED.season,
                    game_type = EXCLUDED.game_type,
                    game_state = EXCLUDED.game_state,
                    home_team_abbrev = EXCLUDED.home_team_abbrev,
                    away_team_abbrev = EXCLUDED.away_team_abbrev,
                    home_score = EXCLUDED.home_score,
                    away_score = EXCLUDED.away_score,
                    period_type = EXCLUDED.period_type
                "#,
            )
            .bind(game.id)
            .bind(game.game_date)
            .bind(game.season.to_string())
            .bind(game.game_type.code())
            .bind(&game.game_state)
            .bind(&game.home_team_abbrev)
            .bind(&game.away_team_abbrev)
            .bind(game.home_score)
            .bind(game.away_score)
            .bind(game.period_type.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(games.len())
    }

    async fn write_history(&self, entries: &[TeamHistory]) -> StoreResult<usize> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO team_history (
                    franchise_id, abbrev, name, start_date, end_date, division, conference
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (franchise_id, start_date) DO UPDATE SET
                    abbrev = EXCLUDED.abbrev,
                    name = EXCLUDED.name,
                    end_date = EXCLUDED.end_date,
                    division = EXCLUDED.division,
                    conference = EXCLUDED.conference
                "#,
            )
            .bind(entry.franchise_id)
            .bind(&entry.abbrev)
            .bind(&entry.name)
            .bind(entry.start_date)
            .bind(entry.end_date)
            .bind(&entry.division)
            .bind(&entry.conference)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(entries.len())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_teams(&self, teams: &[Team]) -> StoreResult<TeamUpsertSummary> {
        if teams.is_empty() {
            return Ok(TeamUpsertSummary::default());
        }
        self.write_teams(teams).await.map_err(|e| {
            StoreError::rolled_back(teams.iter().map(|t| t.abbrev.clone()).collect(), e)
        })
    }

    async fn upsert_games(&self, games: &[Game]) -> StoreResult<usize> {
        if games.is_empty() {
            return Ok(0);
        }
        self.write_games(games)
            .await
            .map_err(|e| StoreError::rolled_back(games.iter().map(Game::label).collect(), e))
    }

    async fn upsert_team_history(&self, entries: &[TeamHistory]) -> StoreResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        self.write_history(entries).await.map_err(|e| {
            StoreError::rolled_back(
                entries
                    .iter()
                    .map(|h| format!("{} {} from {}", h.franchise_id, h.abbrev, h.start_date))
                    .collect(),
                e,
            )
        })
    }

    async fn games_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        season: Option<Season>,
    ) -> StoreResult<Vec<Game>> {
        let sql = format!(
            "SELECT {GAME_COLUMNS} FROM games \
             WHERE game_date >= $1 AND game_date <= $2 \
               AND game_state IN ('OFF', 'FINAL') \
               AND ($3::TEXT IS NULL OR season = $3) \
             ORDER BY game_date, id"
        );
        let rows: Vec<GameRow> = sqlx::query_as(&sql)
            .bind(start)
            .bind(end)
            .bind(season.map(|s| s.to_string()))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Game::try_from).collect()
    }

    async fn latest_game_date(&self, season: Season) -> StoreResult<Option<NaiveDate>> {
        let latest: Option<NaiveDate> =
            sqlx::query_scalar("SELECT MAX(game_date) FROM games WHERE season = $1")
                .bind(season.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(latest)
    }

    async fn game(&self, id: i64) -> StoreResult<Option<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1");
        let row: Option<GameRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Game::try_from).transpose()
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let rows: Vec<TeamRow> = sqlx::query_as(
            "SELECT abbrev, name, franchise_id, division, conference, metadata_json \
             FROM teams ORDER BY abbrev",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn team_history(&self, franchise_id: i32) -> StoreResult<Vec<TeamHistory>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT franchise_id, abbrev, name, start_date, end_date, division, conference \
             FROM team_history WHERE franchise_id = $1 ORDER BY start_date DESC",
        )
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TeamHistory::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> GameRow {
        GameRow {
            id: 2024020001,
            game_date: NaiveDate::from_ymd_opt(2024, 10, 8).unwrap(),
            season: "20242025".into(),
            game_type: 2,
            game_state: "OFF".into(),
            home_team_abbrev: "FLA".into(),
            away_team_abbrev: "BOS".into(),
            home_score: Some(6),
            away_score: Some(4),
            period_type: Some("OT".into()),
        }
    }

    #[test]
    fn game_row_converts() {
        let game = Game::try_from(row()).unwrap();
        assert_eq!(game.season, Season::new(2024));
        assert_eq!(game.game_type, GameType::Regular);
        assert_eq!(game.period_type, PeriodType::Ot);
        assert_eq!(game.home_score, 6);
    }

    #[test]
    fn game_row_without_scores_is_corrupt() {
        let mut r = row();
        r.away_score = None;
        assert!(matches!(Game::try_from(r), Err(StoreError::CorruptRow(_))));
    }

    #[test]
    fn game_row_with_bad_season_is_corrupt() {
        let mut r = row();
        r.season = "2024".into();
        assert!(matches!(Game::try_from(r), Err(StoreError::CorruptRow(_))));
    }

    #[test]
    fn missing_period_defaults_to_regulation() {
        let mut r = row();
        r.period_type = None;
        assert_eq!(Game::try_from(r).unwrap().period_type, PeriodType::Reg);
    }

    #[test]
    fn schema_statements_are_idempotent() {
        assert!(SCHEMA.iter().all(|s| s.contains("IF NOT EXISTS")));
    }
}
