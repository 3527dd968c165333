//! NHL season codes and calendar windows.
//!
//! A season is written as eight digits, `YYYY(Y+1)`, and covers
//! `Y-10-01 ..= (Y+1)-06-30`. Dates from July onwards belong to the season
//! starting that calendar year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeasonParseError {
    #[error("season must be 8 digits like 20242025, got '{0}'")]
    Format(String),
    #[error("season '{0}' must span consecutive years")]
    NotConsecutive(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season {
    start_year: i32,
}

impl Season {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// Season a calendar date belongs to (July cutoff).
    pub fn for_date(date: NaiveDate) -> Self {
        if date.month() < 7 {
            Self::new(date.year() - 1)
        } else {
            Self::new(date.year())
        }
    }

    /// First day of the season window (October 1).
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, 10, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the season window (June 30 of the following year).
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year + 1, 6, 30).unwrap_or(NaiveDate::MAX)
    }

    pub fn next(&self) -> Self {
        Self::new(self.start_year + 1)
    }

    /// Intersect `[start, end]` with this season's window.
    /// Returns `None` when the two do not overlap.
    pub fn clamp_to_window(&self, start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = start.max(self.start_date());
        let end = end.min(self.end_date());
        (start <= end).then_some((start, end))
    }

    /// Split an arbitrary range into per-season sub-ranges, each clamped to its
    /// season window. Off-season days (July to September) fall out.
    pub fn split_range(start: NaiveDate, end: NaiveDate) -> Vec<(Season, NaiveDate, NaiveDate)> {
        if start > end {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut season = Self::for_date(start);
        let last = Self::for_date(end);
        while season <= last {
            if let Some((s, e)) = season.clamp_to_window(start, end) {
                out.push((season, s, e));
            }
            season = season.next();
        }
        out
    }

    /// The `count` most recent seasons ending with `self`, newest first.
    /// Never reaches back past year 0.
    pub fn recent(&self, count: usize) -> Vec<Season> {
        (0..=self.start_year).rev().take(count).map(Self::new).collect()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start_year, self.start_year + 1)
    }
}

impl FromStr for Season {
    type Err = SeasonParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SeasonParseError::Format(s.to_string()));
        }
        let first: i32 = s[..4]
            .parse()
            .map_err(|_| SeasonParseError::Format(s.to_string()))?;
        let second: i32 = s[4..]
            .parse()
            .map_err(|_| SeasonParseError::Format(s.to_string()))?;
        if second != first + 1 {
            return Err(SeasonParseError::NotConsecutive(s.to_string()));
        }
        Ok(Self::new(first))
    }
}

impl Serialize for Season {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Season {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
