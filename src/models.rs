//! Domain records persisted by the store and consumed by the aggregator.

use crate::season::Season;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A franchise's current row, keyed by abbreviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub abbrev: String,
    pub name: String,
    pub franchise_id: Option<i32>,
    pub division: String,
    pub conference: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Team {
    /// True when name/division/conference differ, i.e. an upsert would change something.
    pub fn differs_from(&self, other: &Team) -> bool {
        self.name != other.name
            || self.division != other.division
            || self.conference != other.conference
    }
}

/// One version of a franchise (name/abbreviation over a date interval).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamHistory {
    pub franchise_id: i32,
    pub abbrev: String,
    pub name: String,
    pub start_date: NaiveDate,
    /// `None` means the entry is still current.
    pub end_date: Option<NaiveDate>,
    pub division: String,
    pub conference: String,
}

impl TeamHistory {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        if self.start_date > date {
            return false;
        }
        !matches!(self.end_date, Some(end) if end < date)
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        if self.start_date > end {
            return false;
        }
        !matches!(self.end_date, Some(e) if e < start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    Preseason,
    Regular,
    Playoffs,
    Other(i32),
}

impl GameType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => GameType::Preseason,
            2 => GameType::Regular,
            3 => GameType::Playoffs,
            other => GameType::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            GameType::Preseason => 1,
            GameType::Regular => 2,
            GameType::Playoffs => 3,
            GameType::Other(c) => *c,
        }
    }

    /// Only regular-season and playoff games count towards standings.
    pub fn counts_for_standings(&self) -> bool {
        matches!(self, GameType::Regular | GameType::Playoffs)
    }
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PeriodType {
    #[default]
    Reg,
    Ot,
    So,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Reg => "REG",
            PeriodType::Ot => "OT",
            PeriodType::So => "SO",
        }
    }

    /// Overtime or shootout: the loser takes a point.
    pub fn is_extra_time(&self) -> bool {
        matches!(self, PeriodType::Ot | PeriodType::So)
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REG" => Ok(PeriodType::Reg),
            "OT" => Ok(PeriodType::Ot),
            "SO" => Ok(PeriodType::So),
            other => Err(format!("unknown period type '{other}'")),
        }
    }
}

pub const COMPLETED_STATES: [&str; 2] = ["OFF", "FINAL"];

pub fn is_completed_state(state: &str) -> bool {
    COMPLETED_STATES.contains(&state)
}

/// A completed game as stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub game_date: NaiveDate,
    pub season: Season,
    pub game_type: GameType,
    pub game_state: String,
    pub home_team_abbrev: String,
    pub away_team_abbrev: String,
    pub home_score: i32,
    pub away_score: i32,
    pub period_type: PeriodType,
}

impl Game {
    pub fn is_completed(&self) -> bool {
        is_completed_state(&self.game_state)
    }

    /// Short label used in logs and batch error context.
    pub fn label(&self) -> String {
        format!(
            "{} {} @ {} ({})",
            self.id, self.away_team_abbrev, self.home_team_abbrev, self.game_date
        )
    }
}

/// A display name/abbreviation pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLabel {
    pub name: String,
    pub abbrev: String,
}

impl TeamLabel {
    pub fn new(name: impl Into<String>, abbrev: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abbrev: abbrev.into(),
        }
    }
}

impl From<&Team> for TeamLabel {
    fn from(team: &Team) -> Self {
        Self::new(team.name.clone(), team.abbrev.clone())
    }
}

impl From<&TeamHistory> for TeamLabel {
    fn from(entry: &TeamHistory) -> Self {
        Self::new(entry.name.clone(), entry.abbrev.clone())
    }
}
