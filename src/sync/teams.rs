//! Team rows from upstream plus the fixed historical entries old games need.

use crate::models::{Team, TeamHistory};
use crate::nhl::UpstreamTeam;
use chrono::NaiveDate;

/// Franchise that moved from Arizona to Utah.
pub const COYOTES_FRANCHISE_ID: i32 = 28;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Teams that no longer exist upstream but are referenced by stored games.
pub fn historical_teams() -> Vec<Team> {
    vec![Team {
        abbrev: "ARI".to_string(),
        name: "Arizona Coyotes".to_string(),
        franchise_id: Some(COYOTES_FRANCHISE_ID),
        division: "Central".to_string(),
        conference: "Western".to_string(),
        metadata: serde_json::json!({}),
    }]
}

/// Known franchise versions, seeded alongside the team sync.
pub fn franchise_history() -> Vec<TeamHistory> {
    vec![
        TeamHistory {
            franchise_id: COYOTES_FRANCHISE_ID,
            abbrev: "ARI".to_string(),
            name: "Arizona Coyotes".to_string(),
            start_date: ymd(1996, 10, 1),
            end_date: Some(ymd(2023, 12, 31)),
            division: "Central".to_string(),
            conference: "Western".to_string(),
        },
        TeamHistory {
            franchise_id: COYOTES_FRANCHISE_ID,
            abbrev: "UTA".to_string(),
            name: "Utah Mammoth".to_string(),
            start_date: ymd(2024, 1, 1),
            end_date: None,
            division: "Central".to_string(),
            conference: "Western".to_string(),
        },
    ]
}

/// Map an upstream record; `None` when the abbreviation or name is missing.
pub fn team_from_upstream(raw: &UpstreamTeam) -> Option<Team> {
    let abbrev = raw.abbr.trim();
    let name = raw.name.trim();
    if abbrev.is_empty() || name.is_empty() {
        return None;
    }
    Some(Team {
        abbrev: abbrev.to_string(),
        name: name.to_string(),
        franchise_id: raw.franchise_id,
        division: raw.division.name.clone(),
        conference: raw.conference.name.clone(),
        metadata: raw.metadata.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nhl::wire::NamedRef;

    #[test]
    fn history_intervals_do_not_overlap() {
        let history = franchise_history();
        let open: Vec<_> = history.iter().filter(|h| h.end_date.is_none()).collect();
        assert_eq!(open.len(), 1);
        for pair in history.windows(2) {
            let end = pair[0].end_date.unwrap();
            assert!(end < pair[1].start_date);
        }
    }

    #[test]
    fn upstream_team_requires_abbrev_and_name() {
        let mut raw = UpstreamTeam {
            abbr: "BOS".into(),
            name: "Boston Bruins".into(),
            franchise_id: Some(6),
            division: NamedRef { name: "Atlantic".into() },
            conference: NamedRef { name: "Eastern".into() },
            metadata: serde_json::json!({"placeName": "Boston"}),
        };
        let team = team_from_upstream(&raw).unwrap();
        assert_eq!(team.abbrev, "BOS");
        assert_eq!(team.division, "Atlantic");
        assert_eq!(team.metadata["placeName"], "Boston");

        raw.abbr = "".into();
        assert!(team_from_upstream(&raw).is_none());
    }
}
