/// NHL web API raw wire types: serde shapes for deserializing upstream responses.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Teams (assembled from /standings/now + stats franchise list)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct NamedRef {
    pub name: String,
}

/// Team record as handed to the sync engine.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UpstreamTeam {
    pub abbr: String,
    pub name: String,
    pub franchise_id: Option<i32>,
    pub division: NamedRef,
    pub conference: NamedRef,
    /// Raw upstream entry, kept as an opaque blob.
    pub metadata: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LocalizedName {
    pub default: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FranchiseResponse {
    pub data: Vec<Franchise>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct Franchise {
    pub id: i32,
    pub full_name: String,
}

// ---------------------------------------------------------------------------
// Schedules (/schedule/{date}, /club-schedule/{team}/month/{month})
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub game_week: Vec<GameDay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GameDay {
    pub date: String,
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ClubScheduleResponse {
    pub games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleGame {
    pub id: i64,
    pub game_date: Option<String>,
    #[serde(rename = "startTimeUTC")]
    pub start_time_utc: Option<String>,
    pub game_type: i32,
    pub game_state: String,
    pub home_team: ScheduleTeam,
    pub away_team: ScheduleTeam,
    pub period_descriptor: Option<PeriodDescriptor>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ScheduleTeam {
    pub abbrev: Option<String>,
    pub score: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PeriodDescriptor {
    pub period_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Standings (/standings/{date}, /standings-season)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StandingsResponse {
    pub standings: Vec<UpstreamStanding>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamStanding {
    pub team_name: LocalizedName,
    pub team_abbrev: LocalizedName,
    pub conference_name: String,
    pub division_name: String,
    pub games_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub ot_losses: i32,
    pub points: i32,
    pub goal_for: i32,
    pub goal_against: i32,
    pub goal_differential: i32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SeasonManifestResponse {
    pub seasons: Vec<SeasonManifestEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SeasonManifestEntry {
    pub id: i64,
    pub standings_start: Option<String>,
    pub standings_end: Option<String>,
}
