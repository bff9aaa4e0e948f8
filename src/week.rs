//! Monday-anchored reporting week keys.
//!
//! A [`WeekKey`] is the Monday of an ISO week. It renders as `yyyy-MM-dd` for
//! selection inputs and as a local-midnight RFC 3339 timestamp for the
//! `week_start` query parameter. Both forms parse back to the same key.
use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat,
    TimeZone, Utc,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Date-only format used by week selectors.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised week date '{0}' (expected yyyy-MM-dd or an ISO-8601 timestamp)")]
pub struct WeekParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// Week containing today in the local calendar.
    pub fn current() -> Self {
        Self::normalize(Local::now().date_naive())
    }

    /// Snap any day to the Monday of its ISO week. Sunday belongs to the week
    /// that started six days earlier.
    pub fn normalize(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday();
        Self(date - Duration::days(i64::from(offset)))
    }

    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    pub fn sunday(&self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    /// `yyyy-MM-dd` form shown in week selectors.
    pub fn date_string(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }

    /// Full timestamp for query parameters: the Monday at local midnight,
    /// carrying the local offset so the calendar date survives the trip.
    pub fn timestamp(&self) -> String {
        let midnight = self.0.and_time(NaiveTime::MIN);
        match Local.from_local_datetime(&midnight).earliest() {
            Some(local) => local.to_rfc3339_opts(SecondsFormat::Secs, false),
            // Midnight skipped by a DST transition; anchor to UTC instead.
            None => Utc
                .from_utc_datetime(&midnight)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Parse a date-only selection or any timestamp the backend emits
    /// (`2024-01-08T00:00:00`, `2024-01-08T00:00:00.123`, RFC 3339 with offset)
    /// and snap it to its week.
    pub fn parse(raw: &str) -> Result<Self, WeekParseError> {
        let trimmed = raw.trim();
        let date = DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.date_naive())
            .or_else(|_| {
                NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
            })
            .or_else(|_| NaiveDate::parse_from_str(trimmed, DATE_FORMAT))
            .map_err(|_| WeekParseError(raw.to_string()))?;
        Ok(Self::normalize(date))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for WeekKey {
    type Err = WeekParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for WeekKey {
    fn from(date: NaiveDate) -> Self {
        Self::normalize(date)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.date_string())
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
