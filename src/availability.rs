//! Which weeks actually hold feedback, derived from the long-range trend feed.
use std::collections::BTreeSet;
use tracing::warn;

use crate::gateway::Fetched;
use crate::model::LongRangeTrends;
use crate::week::WeekKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityIndex {
    /// Weeks with observed feedback, oldest first.
    weeks: Vec<WeekKey>,
    /// Most recent available week, or the fallback week when nothing is known.
    default: WeekKey,
}

impl AvailabilityIndex {
    /// Build the index from a long-range trend response. Rows with zero volume
    /// never enter the index. `fallback` (normally the current week) becomes
    /// the default selection when no qualifying week exists.
    pub fn build(trends: &LongRangeTrends, fallback: WeekKey) -> Self {
        let mut weeks = BTreeSet::new();
        for row in trends.trends.iter().filter(|row| row.volume > 0) {
            match WeekKey::parse(&row.week) {
                Ok(key) => {
                    weeks.insert(key);
                }
                Err(err) => warn!(%err, week = %row.week, "skipping unparseable trend week"),
            }
        }
        let weeks: Vec<WeekKey> = weeks.into_iter().collect();
        let default = weeks.last().copied().unwrap_or(fallback);
        Self { weeks, default }
    }

    /// Index for a failed or absent long-range fetch.
    pub fn empty(fallback: WeekKey) -> Self {
        Self {
            weeks: Vec::new(),
            default: fallback,
        }
    }

    pub fn from_fetched(fetched: &Fetched<LongRangeTrends>, fallback: WeekKey) -> Self {
        match fetched.as_ready() {
            Some(trends) => Self::build(trends, fallback),
            None => Self::empty(fallback),
        }
    }

    pub fn weeks(&self) -> &[WeekKey] {
        &self.weeks
    }

    pub fn default_week(&self) -> WeekKey {
        self.default
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn contains(&self, week: WeekKey) -> bool {
        self.weeks.binary_search(&week).is_ok()
    }

    /// Oldest and newest available weeks.
    pub fn range(&self) -> Option<(WeekKey, WeekKey)> {
        Some((*self.weeks.first()?, *self.weeks.last()?))
    }
}
