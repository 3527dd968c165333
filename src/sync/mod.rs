//! Incremental schedule sync: fetch only the missing days, upsert idempotently.

pub mod filter;
pub mod report;
pub mod teams;

use crate::nhl::{ApiError, NhlSource};
use crate::season::Season;
use crate::store::{Store, StoreError, TeamUpsertSummary};
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use filter::{completed_game, SkipReason};
pub use report::{DayOutcome, DayReport, SyncReport};

/// Days between progress log lines.
const PROGRESS_EVERY_DAYS: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("upstream request failed: {0}")]
    Upstream(#[from] ApiError),
    #[error("team sync rolled back for [{}]: {source}", .teams.join(", "))]
    TeamBatch {
        teams: Vec<String>,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives team and game sync against a store and an upstream source.
///
/// Runs are serialized: a manual trigger waits for a scheduled run to finish.
pub struct SyncService<S, C> {
    store: S,
    source: C,
    today: Option<NaiveDate>,
    run_lock: Mutex<()>,
}

impl<S: Store, C: NhlSource> SyncService<S, C> {
    pub fn new(store: S, source: C) -> Self {
        Self {
            store,
            source,
            today: None,
            run_lock: Mutex::new(()),
        }
    }

    /// Pin "today" instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    pub fn into_parts(self) -> (S, C) {
        (self.store, self.source)
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn current_season(&self) -> Season {
        Season::for_date(self.today())
    }

    /// Upsert upstream teams plus the historical entries, then seed franchise history.
    pub async fn sync_teams(&self) -> Result<TeamUpsertSummary, SyncError> {
        let _guard = self.run_lock.lock().await;
        self.sync_teams_locked().await
    }

    /// Sync completed games for `[start, end]` clamped to `season`'s window.
    pub async fn sync_games_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        season: Season,
    ) -> Result<SyncReport, SyncError> {
        if start > end {
            return Err(SyncError::InvalidRange { start, end });
        }
        let _guard = self.run_lock.lock().await;

        let mut report = SyncReport::new(Uuid::new_v4());
        report.teams = Some(self.sync_teams_locked().await?);
        self.sync_range_locked(start, end, season, &mut report).await;
        Ok(report)
    }

    /// Sync a range that may cross season boundaries, one season at a time.
    pub async fn sync_between(&self, start: NaiveDate, end: NaiveDate) -> Result<SyncReport, SyncError> {
        if start > end {
            return Err(SyncError::InvalidRange { start, end });
        }
        let _guard = self.run_lock.lock().await;

        let mut report = SyncReport::new(Uuid::new_v4());
        report.teams = Some(self.sync_teams_locked().await?);
        for (season, s, e) in Season::split_range(start, end) {
            self.sync_range_locked(s, e, season, &mut report).await;
        }
        Ok(report)
    }

    /// Resume `season` (default: the current one) from the day after the latest stored game.
    pub async fn sync_current_season(&self, season: Option<Season>) -> Result<SyncReport, SyncError> {
        let season = match season {
            Some(s) => s,
            None => {
                let s = self.current_season();
                info!("No season specified, using current season: {}", s);
                s
            }
        };
        let today = self.today();

        let _guard = self.run_lock.lock().await;
        let mut report = SyncReport::new(Uuid::new_v4());
        report.seasons.push(season);

        let start = match self.store.latest_game_date(season).await? {
            Some(latest) if latest >= today => {
                info!(
                    "Database has games up to {} which is >= today ({}); nothing to sync",
                    latest, today
                );
                return Ok(report);
            }
            Some(latest) => {
                info!("Database has games up to {}, syncing from the next day", latest);
                latest.succ_opt().unwrap_or(latest)
            }
            None => {
                info!("No games in database for {}, syncing from season start", season);
                season.start_date()
            }
        };

        if start > today {
            info!("Season {} has not started yet ({}); nothing to sync", season, start);
            return Ok(report);
        }

        report.teams = Some(self.sync_teams_locked().await?);
        self.sync_range_locked(start, today, season, &mut report).await;
        Ok(report)
    }

    async fn sync_teams_locked(&self) -> Result<TeamUpsertSummary, SyncError> {
        info!("Fetching teams from NHL API...");
        let upstream = self.source.teams().await?;
        if upstream.is_empty() {
            warn!("No teams data received from NHL API, seeding historical teams only");
        }

        // Historical rows go in regardless; old games reference them.
        let mut batch = teams::historical_teams();
        for raw in &upstream {
            match teams::team_from_upstream(raw) {
                Some(team) => batch.push(team),
                None => warn!("Skipping team with missing data: {:?} / {:?}", raw.abbr, raw.name),
            }
        }

        let abbrevs: Vec<String> = batch.iter().map(|t| t.abbrev.clone()).collect();
        let summary = match self.store.upsert_teams(&batch).await {
            Ok(summary) => summary,
            Err(source) => {
                error!("Team sync failed for {} teams: {}", abbrevs.len(), source);
                return Err(SyncError::TeamBatch {
                    teams: abbrevs,
                    source,
                });
            }
        };
        self.store.upsert_team_history(&teams::franchise_history()).await?;

        info!(
            "Teams synced: {} inserted, {} updated, {} unchanged",
            summary.inserted, summary.updated, summary.unchanged
        );
        Ok(summary)
    }

    async fn sync_range_locked(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        season: Season,
        report: &mut SyncReport,
    ) {
        if !report.seasons.contains(&season) {
            report.seasons.push(season);
        }
        let Some((start, end)) = season.clamp_to_window(start, end) else {
            info!("Range {}..{} lies outside season {}; nothing to sync", start, end, season);
            return;
        };

        let today = self.today();
        info!(run_id = %report.run_id, "Syncing games from {} to {} ({})", start, end, season);

        let mut day = start;
        let mut days_checked = 0usize;
        let mut games_synced = 0usize;
        while day <= end {
            let outcome = self.sync_day(day, season, today).await;
            if let DayOutcome::Synced { games, .. } = outcome {
                games_synced += games;
            }
            report.days.push(DayReport { date: day, outcome });

            days_checked += 1;
            if days_checked % PROGRESS_EVERY_DAYS == 0 {
                info!(
                    "Progress: checked {} days ({}), synced {} games",
                    days_checked, day, games_synced
                );
            }

            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        info!(
            run_id = %report.run_id,
            "Completed {}: {} days checked, {} games synced",
            season, days_checked, games_synced
        );
    }

    async fn sync_day(&self, day: NaiveDate, season: Season, today: NaiveDate) -> DayOutcome {
        let raw_games = match self.source.daily_schedule(day).await {
            Ok(games) => games,
            Err(e) => {
                error!("Error fetching games for {}: {}", day, e);
                return DayOutcome::Failed { error: e.to_string() };
            }
        };

        let mut games = Vec::with_capacity(raw_games.len());
        let mut skipped = 0;
        for raw in &raw_games {
            match completed_game(raw, day, season, today) {
                Ok(game) => games.push(game),
                Err(reason) => {
                    skipped += 1;
                    if reason.is_malformed() {
                        warn!("Game {}: {}", raw.id, reason);
                    } else {
                        debug!("Game {}: {}", raw.id, reason);
                    }
                }
            }
        }

        if games.is_empty() {
            return DayOutcome::NoGames { skipped };
        }

        match self.store.upsert_games(&games).await {
            Ok(count) => DayOutcome::Synced { games: count, skipped },
            Err(e) => {
                error!("Failed to sync {} games for {}: {}", games.len(), day, e);
                DayOutcome::Failed { error: e.to_string() }
            }
        }
    }
}
