//! Franchise names as they were at a point in time.

use crate::models::{Team, TeamHistory, TeamLabel};
use crate::store::{Store, StoreResult};
use chrono::NaiveDate;

fn newest_first(history: &[TeamHistory]) -> Vec<&TeamHistory> {
    let mut entries: Vec<&TeamHistory> = history.iter().collect();
    entries.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    entries
}

/// Name and abbreviation in use on `date`, or the team's current ones.
pub fn name_for_date(team: &Team, history: &[TeamHistory], date: NaiveDate) -> TeamLabel {
    newest_first(history)
        .into_iter()
        .find(|h| h.is_active_on(date))
        .map(TeamLabel::from)
        .unwrap_or_else(|| TeamLabel::from(team))
}

/// Label for a date range. A range that spans a relocation gets a combined
/// label, oldest identity first: "Arizona Coyotes / Utah Mammoth", "ARI/UTA".
pub fn display_name_for_range(
    team: &Team,
    history: &[TeamHistory],
    start: NaiveDate,
    end: NaiveDate,
) -> TeamLabel {
    let mut overlapping: Vec<&TeamHistory> = history.iter().filter(|h| h.overlaps(start, end)).collect();
    overlapping.sort_by_key(|h| h.start_date);

    match overlapping.as_slice() {
        [] => TeamLabel::from(team),
        [only] => TeamLabel::from(*only),
        many => {
            let mut names: Vec<&str> = Vec::new();
            let mut abbrevs: Vec<&str> = Vec::new();
            for h in many {
                if !names.contains(&h.name.as_str()) {
                    names.push(&h.name);
                }
                if !abbrevs.contains(&h.abbrev.as_str()) {
                    abbrevs.push(&h.abbrev);
                }
            }
            TeamLabel::new(names.join(" / "), abbrevs.join("/"))
        }
    }
}

/// Store-backed lookups for teams that carry a franchise id.
pub struct TeamIdentityResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> TeamIdentityResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn history_for(&self, team: &Team) -> StoreResult<Vec<TeamHistory>> {
        match team.franchise_id {
            Some(id) => self.store.team_history(id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn name_for_date(&self, team: &Team, date: NaiveDate) -> StoreResult<TeamLabel> {
        let history = self.history_for(team).await?;
        Ok(name_for_date(team, &history, date))
    }

    pub async fn display_name_for_range(
        &self,
        team: &Team,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<TeamLabel> {
        let history = self.history_for(team).await?;
        Ok(display_name_for_range(team, &history, start, end))
    }
}
