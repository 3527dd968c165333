use crate::season::Season;
use crate::store::TeamUpsertSummary;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Result of syncing one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayOutcome {
    Synced { games: usize, skipped: usize },
    NoGames { skipped: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub outcome: DayOutcome,
}

/// Per-day outcomes of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub seasons: Vec<Season>,
    pub teams: Option<TeamUpsertSummary>,
    pub days: Vec<DayReport>,
}

impl SyncReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            seasons: Vec::new(),
            teams: None,
            days: Vec::new(),
        }
    }

    pub fn games_synced(&self) -> usize {
        self.days
            .iter()
            .map(|d| match d.outcome {
                DayOutcome::Synced { games, .. } => games,
                _ => 0,
            })
            .sum()
    }

    pub fn games_skipped(&self) -> usize {
        self.days
            .iter()
            .map(|d| match d.outcome {
                DayOutcome::Synced { skipped, .. } | DayOutcome::NoGames { skipped } => skipped,
                DayOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn days_checked(&self) -> usize {
        self.days.len()
    }

    pub fn failed_days(&self) -> impl Iterator<Item = &DayReport> {
        self.days
            .iter()
            .filter(|d| matches!(d.outcome, DayOutcome::Failed { .. }))
    }

    pub fn is_clean(&self) -> bool {
        self.failed_days().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, outcome: DayOutcome) -> DayReport {
        DayReport {
            date: NaiveDate::from_ymd_opt(2024, 10, d).unwrap(),
            outcome,
        }
    }

    #[test]
    fn totals_fold_over_days() {
        let mut report = SyncReport::new(Uuid::nil());
        report.days = vec![
            day(8, DayOutcome::Synced { games: 4, skipped: 1 }),
            day(9, DayOutcome::NoGames { skipped: 2 }),
            day(10, DayOutcome::Failed { error: "timeout".into() }),
            day(11, DayOutcome::Synced { games: 7, skipped: 0 }),
        ];
        assert_eq!(report.games_synced(), 11);
        assert_eq!(report.games_skipped(), 3);
        assert_eq!(report.days_checked(), 4);
        assert_eq!(report.failed_days().count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn day_report_serializes_flat() {
        let json = serde_json::to_value(day(8, DayOutcome::Synced { games: 2, skipped: 0 })).unwrap();
        assert_eq!(json["status"], "synced");
        assert_eq!(json["games"], 2);
        assert_eq!(json["date"], "2024-10-08");
    }
}
