//! Turning raw schedule entries into storable completed games.

use crate::models::{is_completed_state, Game, GameType, PeriodType};
use crate::nhl::ScheduleGame;
use crate::season::Season;
use chrono::{DateTime, NaiveDate};
use std::fmt;

/// Why a schedule entry was not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ExcludedGameType(i32),
    NotCompleted(String),
    MissingStartTime,
    InvalidStartTime(String),
    InvalidGameDate(String),
    MissingTeam,
    MissingScore,
    UnknownPeriodType(String),
    FutureDated(NaiveDate),
}

impl SkipReason {
    /// Malformed records get a warning; routine filtering does not.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            SkipReason::MissingStartTime
                | SkipReason::InvalidStartTime(_)
                | SkipReason::InvalidGameDate(_)
                | SkipReason::MissingTeam
                | SkipReason::MissingScore
                | SkipReason::UnknownPeriodType(_)
                | SkipReason::FutureDated(_)
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExcludedGameType(t) => write!(f, "game type {t} is not regular season or playoffs"),
            SkipReason::NotCompleted(state) => write!(f, "game state '{state}' is not final"),
            SkipReason::MissingStartTime => write!(f, "missing start time"),
            SkipReason::InvalidStartTime(raw) => write!(f, "invalid startTimeUTC '{raw}'"),
            SkipReason::InvalidGameDate(raw) => write!(f, "invalid gameDate '{raw}'"),
            SkipReason::MissingTeam => write!(f, "missing team abbreviation"),
            SkipReason::MissingScore => write!(f, "completed game without a score"),
            SkipReason::UnknownPeriodType(raw) => write!(f, "unknown period type '{raw}'"),
            SkipReason::FutureDated(date) => write!(f, "dated in the future ({date})"),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validate one schedule entry fetched for `day`.
///
/// The stored date is the entry's `gameDate` when present, otherwise the
/// schedule day it was listed under. `startTimeUTC` must still be present and
/// parse, since entries without it are unreliable.
pub fn completed_game(
    raw: &ScheduleGame,
    day: NaiveDate,
    season: Season,
    today: NaiveDate,
) -> Result<Game, SkipReason> {
    let game_type = GameType::from_code(raw.game_type);
    if !game_type.counts_for_standings() {
        return Err(SkipReason::ExcludedGameType(raw.game_type));
    }
    if !is_completed_state(&raw.game_state) {
        return Err(SkipReason::NotCompleted(raw.game_state.clone()));
    }

    let start_time = non_empty(&raw.start_time_utc).ok_or(SkipReason::MissingStartTime)?;
    DateTime::parse_from_rfc3339(start_time)
        .map_err(|_| SkipReason::InvalidStartTime(start_time.to_string()))?;

    let game_date = match non_empty(&raw.game_date) {
        Some(s) => {
            let date_part = s.split('T').next().unwrap_or(s);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map_err(|_| SkipReason::InvalidGameDate(s.to_string()))?
        }
        None => day,
    };
    if game_date > today {
        return Err(SkipReason::FutureDated(game_date));
    }

    let home = non_empty(&raw.home_team.abbrev).ok_or(SkipReason::MissingTeam)?;
    let away = non_empty(&raw.away_team.abbrev).ok_or(SkipReason::MissingTeam)?;

    let (home_score, away_score) = match (raw.home_team.score, raw.away_team.score) {
        (Some(h), Some(a)) => (h, a),
        _ => return Err(SkipReason::MissingScore),
    };

    let period_type = match raw
        .period_descriptor
        .as_ref()
        .and_then(|p| non_empty(&p.period_type))
    {
        Some(p) => p
            .parse::<PeriodType>()
            .map_err(|_| SkipReason::UnknownPeriodType(p.to_string()))?,
        None => PeriodType::Reg,
    };

    Ok(Game {
        id: raw.id,
        game_date,
        season,
        game_type,
        game_state: raw.game_state.clone(),
        home_team_abbrev: home.to_string(),
        away_team_abbrev: away.to_string(),
        home_score,
        away_score,
        period_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nhl::wire::{PeriodDescriptor, ScheduleTeam};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn raw() -> ScheduleGame {
        ScheduleGame {
            id: 2024020001,
            game_date: None,
            start_time_utc: Some("2024-10-08T23:00:00Z".into()),
            game_type: 2,
            game_state: "OFF".into(),
            home_team: ScheduleTeam {
                abbrev: Some("FLA".into()),
                score: Some(6),
            },
            away_team: ScheduleTeam {
                abbrev: Some("BOS".into()),
                score: Some(4),
            },
            period_descriptor: Some(PeriodDescriptor {
                period_type: Some("REG".into()),
            }),
        }
    }

    fn check(g: &ScheduleGame) -> Result<Game, SkipReason> {
        completed_game(g, d(2024, 10, 8), Season::new(2024), d(2024, 10, 20))
    }

    #[test]
    fn valid_game_is_kept() {
        let game = check(&raw()).unwrap();
        assert_eq!(game.game_date, d(2024, 10, 8));
        assert_eq!(game.season, Season::new(2024));
        assert_eq!(game.home_team_abbrev, "FLA");
        assert_eq!(game.period_type, PeriodType::Reg);
    }

    #[test]
    fn preseason_and_unfinished_games_are_filtered() {
        let mut g = raw();
        g.game_type = 1;
        assert_eq!(check(&g).unwrap_err(), SkipReason::ExcludedGameType(1));

        let mut g = raw();
        g.game_state = "LIVE".into();
        assert_eq!(check(&g).unwrap_err(), SkipReason::NotCompleted("LIVE".into()));

        let mut g = raw();
        g.game_state = "FINAL".into();
        g.game_type = 3;
        assert!(check(&g).is_ok());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let mut g = raw();
        g.start_time_utc = None;
        assert_eq!(check(&g).unwrap_err(), SkipReason::MissingStartTime);

        let mut g = raw();
        g.start_time_utc = Some("yesterday".into());
        assert!(matches!(check(&g).unwrap_err(), SkipReason::InvalidStartTime(_)));

        let mut g = raw();
        g.away_team.abbrev = Some("  ".into());
        assert_eq!(check(&g).unwrap_err(), SkipReason::MissingTeam);

        let mut g = raw();
        g.home_team.score = None;
        assert_eq!(check(&g).unwrap_err(), SkipReason::MissingScore);

        let mut g = raw();
        g.period_descriptor = Some(PeriodDescriptor {
            period_type: Some("4OT".into()),
        });
        assert!(matches!(check(&g).unwrap_err(), SkipReason::UnknownPeriodType(_)));
        assert!(check(&g).unwrap_err().is_malformed());
    }

    #[test]
    fn future_dated_games_are_never_kept() {
        let mut g = raw();
        g.game_date = Some("2024-10-21".into());
        assert_eq!(check(&g).unwrap_err(), SkipReason::FutureDated(d(2024, 10, 21)));

        // Today itself is fine.
        g.game_date = Some("2024-10-20".into());
        assert!(check(&g).is_ok());
    }

    #[test]
    fn missing_period_descriptor_means_regulation() {
        let mut g = raw();
        g.period_descriptor = None;
        assert_eq!(check(&g).unwrap().period_type, PeriodType::Reg);

        g.period_descriptor = Some(PeriodDescriptor {
            period_type: Some("SO".into()),
        });
        assert_eq!(check(&g).unwrap().period_type, PeriodType::So);
    }
}
