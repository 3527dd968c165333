//! Standings aggregation over an arbitrary set of completed games.

use crate::identity::TeamIdentityResolver;
use crate::models::{Game, Team};
use crate::season::Season;
use crate::store::{Store, StoreResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Stable identity for a running tally. A relocated franchise keeps one key
/// across abbreviations; teams without a franchise id fall back to abbrev.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TeamKey {
    Franchise(i32),
    Abbrev(String),
}

impl TeamKey {
    pub fn of(team: &Team) -> Self {
        match team.franchise_id {
            Some(id) => TeamKey::Franchise(id),
            None => TeamKey::Abbrev(team.abbrev.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub team_abbrev: String,
    pub team_name: String,
    pub franchise_id: Option<i32>,
    pub division_name: String,
    pub conference_name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ot_losses: u32,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_differential: i64,
}

impl Standing {
    fn zeroed(team: &Team) -> Self {
        Self {
            team_abbrev: team.abbrev.clone(),
            team_name: team.name.clone(),
            franchise_id: team.franchise_id,
            division_name: team.division.clone(),
            conference_name: team.conference.clone(),
            games_played: 0,
            wins: 0,
            losses: 0,
            ot_losses: 0,
            points: 0,
            goals_for: 0,
            goals_against: 0,
            goal_differential: 0,
        }
    }

    fn record_goals(&mut self, scored: i32, conceded: i32) {
        self.games_played += 1;
        self.goals_for += scored.max(0) as u32;
        self.goals_against += conceded.max(0) as u32;
    }

    fn record_win(&mut self) {
        self.wins += 1;
        self.points += 2;
    }

    fn record_loss(&mut self, extra_time: bool) {
        if extra_time {
            self.ot_losses += 1;
            self.points += 1;
        } else {
            self.losses += 1;
        }
    }

    fn refresh_differential(&mut self) {
        self.goal_differential = i64::from(self.goals_for) - i64::from(self.goals_against);
    }
}

/// Case-insensitive division/conference filters.
#[derive(Debug, Clone, Default)]
pub struct StandingsFilter {
    pub division: Option<String>,
    pub conference: Option<String>,
}

impl StandingsFilter {
    pub fn matches(&self, team: &Team) -> bool {
        let ok = |want: &Option<String>, have: &str| match want.as_deref().map(str::trim) {
            Some(w) if !w.is_empty() => w.eq_ignore_ascii_case(have.trim()),
            _ => true,
        };
        ok(&self.division, &team.division) && ok(&self.conference, &team.conference)
    }
}

/// Running totals keyed by `TeamKey`, kept in initialization order.
#[derive(Debug, Default)]
pub struct StandingsTable {
    rows: Vec<Standing>,
    index: HashMap<TeamKey, usize>,
    by_abbrev: HashMap<String, usize>,
}

impl StandingsTable {
    pub fn new(teams: &[Team], filter: &StandingsFilter) -> Self {
        let mut table = Self::default();
        for team in teams.iter().filter(|t| filter.matches(t)) {
            let key = TeamKey::of(team);
            let slot = match table.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    table.rows.push(Standing::zeroed(team));
                    let slot = table.rows.len() - 1;
                    table.index.insert(key, slot);
                    slot
                }
            };
            table.by_abbrev.insert(team.abbrev.clone(), slot);
        }
        table
    }

    /// Fold one completed game in. Returns false when it was ignored.
    pub fn apply(&mut self, game: &Game) -> bool {
        let (Some(&home), Some(&away)) = (
            self.by_abbrev.get(&game.home_team_abbrev),
            self.by_abbrev.get(&game.away_team_abbrev),
        ) else {
            debug!("Game {} involves a team outside the table", game.id);
            return false;
        };
        if home == away {
            warn!("Game {} maps both sides to the same franchise, ignoring", game.id);
            return false;
        }
        if game.home_score == game.away_score {
            warn!("Game {} is tied {}-{}, no winner to credit", game.id, game.home_score, game.away_score);
            return false;
        }

        let extra_time = game.period_type.is_extra_time();
        let (winner, loser) = if game.home_score > game.away_score {
            (home, away)
        } else {
            (away, home)
        };

        self.rows[home].record_goals(game.home_score, game.away_score);
        self.rows[away].record_goals(game.away_score, game.home_score);
        self.rows[winner].record_win();
        self.rows[loser].record_loss(extra_time);
        self.rows[home].refresh_differential();
        self.rows[away].refresh_differential();
        true
    }

    /// Teams with games, by points then goal differential (descending).
    pub fn into_ranked(self) -> Vec<Standing> {
        let mut rows: Vec<Standing> = self.rows.into_iter().filter(|s| s.games_played > 0).collect();
        // Stable sort: exact ties keep initialization order.
        rows.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| b.goal_differential.cmp(&a.goal_differential))
        });
        rows
    }
}

/// Fold completed games into a ranked standings table.
pub fn standings_from_games(games: &[Game], teams: &[Team], filter: &StandingsFilter) -> Vec<Standing> {
    let mut table = StandingsTable::new(teams, filter);
    for game in games.iter().filter(|g| g.is_completed()) {
        table.apply(game);
    }
    table.into_ranked()
}

#[derive(Debug, Clone)]
pub struct StandingsQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub filter: StandingsFilter,
}

/// Standings from stored games over a range that may span several seasons.
/// Rows are relabelled with the franchise name(s) in use during the range.
pub async fn compute_standings<S: Store + ?Sized>(store: &S, query: &StandingsQuery) -> StoreResult<Vec<Standing>> {
    let mut games = Vec::new();
    for (season, start, end) in Season::split_range(query.start, query.end) {
        let mut chunk = store.games_in_range(start, end, Some(season)).await?;
        debug!("Loaded {} games for {} ({}..{})", chunk.len(), season, start, end);
        games.append(&mut chunk);
    }

    let teams = store.list_teams().await?;
    let mut rows = standings_from_games(&games, &teams, &query.filter);

    let resolver = TeamIdentityResolver::new(store);
    let by_abbrev: HashMap<&str, &Team> = teams.iter().map(|t| (t.abbrev.as_str(), t)).collect();
    for row in &mut rows {
        let Some(team) = by_abbrev.get(row.team_abbrev.as_str()) else {
            continue;
        };
        let label = resolver.display_name_for_range(team, query.start, query.end).await?;
        row.team_name = label.name;
        row.team_abbrev = label.abbrev;
    }

    Ok(rows)
}
