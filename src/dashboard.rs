//! Dashboard orchestration: week selection, the per-week query fan-out and
//! the two-tier failure policy.
//!
//! Trends and insights are blocking: if either fails the view shows an error
//! banner and no derived data. Long-range trends and the category heatmap are
//! enhancements: a failure simply drops their section.
//!
//! A [`DashboardSession`] lives as long as the view. Each selection starts a
//! new pass tagged with a generation number; a pass whose generation is no
//! longer current when it settles is discarded, so a slow response for an
//! older selection never overwrites a newer one.
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::availability::AvailabilityIndex;
use crate::gateway::{self, AnalyticsApi, WeekFetch};
use crate::insight::{self, InsightView, PresenterLimits};
use crate::metrics::{self, ComparisonRow, DistributionSlice, HeatStop, Headline};
use crate::model::{HeatmapRow, WeekTrend};
use crate::week::WeekKey;

pub const LOAD_FAILED: &str = "Failed to load dashboard data";

/// One category row of the heatmap, ready to draw as a single stacked bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatBar {
    pub category: String,
    pub heat_score: f64,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub stops: [HeatStop; 3],
    pub css: String,
}

impl From<&HeatmapRow> for HeatBar {
    fn from(row: &HeatmapRow) -> Self {
        let stops = metrics::derive_heat_gradient(row);
        let css = metrics::gradient_css(&stops);
        Self {
            category: row.category.clone(),
            heat_score: row.heat_score,
            positive: row.positive,
            neutral: row.neutral,
            negative: row.negative,
            stops,
            css,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub week: WeekKey,
    pub headline: Headline,
    pub comparison: Vec<ComparisonRow>,
    pub distribution: Vec<DistributionSlice>,
    /// `None` when the long-range query failed or returned nothing.
    pub long_range: Option<Vec<WeekTrend>>,
    /// `None` when the heatmap query failed or returned nothing.
    pub heatmap: Option<Vec<HeatBar>>,
    pub insights: InsightView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DashboardState {
    Idle,
    Loading { week: WeekKey },
    /// A blocking query failed; nothing derived is shown.
    Failed { week: WeekKey, message: String },
    /// Queries succeeded but the week has no feedback.
    NoData { week: WeekKey },
    Ready(Box<DashboardView>),
}

impl DashboardState {
    pub fn week(&self) -> Option<WeekKey> {
        match self {
            DashboardState::Idle => None,
            DashboardState::Loading { week }
            | DashboardState::Failed { week, .. }
            | DashboardState::NoData { week } => Some(*week),
            DashboardState::Ready(view) => Some(view.week),
        }
    }
}

/// Apply the failure policy and the derivations to one settled pass.
pub fn build_state(fetch: WeekFetch, limits: &PresenterLimits) -> DashboardState {
    let week = fetch.week;
    let trends = match fetch.trends {
        Ok(t) => t,
        Err(err) => {
            warn!(?err, week = %week, "trend query failed");
            return DashboardState::Failed {
                week,
                message: err.user_message(LOAD_FAILED),
            };
        }
    };
    let insights = match fetch.insights {
        Ok(i) => i,
        Err(err) => {
            warn!(?err, week = %week, "insight query failed");
            return DashboardState::Failed {
                week,
                message: err.user_message(LOAD_FAILED),
            };
        }
    };

    if !trends.has_current() {
        info!(week = %week, "no feedback for selected week");
        return DashboardState::NoData { week };
    }

    let long_range = fetch
        .long_range
        .ready()
        .map(|lr| lr.trends)
        .filter(|rows| !rows.is_empty());
    let heatmap = fetch
        .heatmap
        .ready()
        .filter(|h| !h.heatmap.is_empty())
        .map(|h| h.heatmap.iter().map(HeatBar::from).collect());

    DashboardState::Ready(Box::new(DashboardView {
        week,
        headline: metrics::derive_headline(&trends),
        comparison: metrics::derive_comparison(&trends),
        distribution: metrics::derive_distribution(&trends),
        long_range,
        heatmap,
        insights: insight::present(&insights, limits),
    }))
}

#[derive(Debug)]
struct SessionState {
    generation: u64,
    selected: WeekKey,
    availability: AvailabilityIndex,
    state: DashboardState,
}

/// Identifies the pass a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassTicket {
    pub generation: u64,
    pub week: WeekKey,
}

pub struct DashboardSession {
    api: Arc<dyn AnalyticsApi>,
    limits: PresenterLimits,
    today: WeekKey,
    inner: Mutex<SessionState>,
}

impl DashboardSession {
    /// Fresh session selecting `today` with an empty availability index.
    pub fn new(api: Arc<dyn AnalyticsApi>, limits: PresenterLimits, today: WeekKey) -> Self {
        Self {
            api,
            limits,
            today,
            inner: Mutex::new(SessionState {
                generation: 0,
                selected: today,
                availability: AvailabilityIndex::empty(today),
                state: DashboardState::Idle,
            }),
        }
    }

    /// Build the availability index, pick the selection (`requested` or the
    /// most recent week with data) and run the first pass. A selection made
    /// while the index is loading wins over the default; the index is still
    /// stored and `false` is returned.
    #[instrument(skip_all)]
    pub async fn mount(&self, requested: Option<WeekKey>) -> bool {
        let generation = self.inner.lock().await.generation;
        let fetched = gateway::fetch_availability(self.api.as_ref(), self.today).await;
        let availability = AvailabilityIndex::from_fetched(&fetched, self.today);
        info!(
            weeks = availability.weeks().len(),
            default = %availability.default_week(),
            "availability index built"
        );
        let week = requested.unwrap_or_else(|| availability.default_week());

        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.availability = availability;
            if inner.generation != generation {
                debug!(
                    default = %week,
                    active_week = %inner.selected,
                    "selection changed during mount; keeping it"
                );
                return false;
            }
            Self::start_pass(&mut inner, week)
        };
        let fetch = gateway::fetch_week(self.api.as_ref(), ticket.week).await;
        self.complete(ticket, fetch).await
    }

    /// Select a week and run one orchestration pass. Returns whether this
    /// pass's result was applied (false when a newer selection superseded it).
    #[instrument(skip_all, fields(week = %week))]
    pub async fn select(&self, week: WeekKey) -> bool {
        let ticket = self.begin(week).await;
        let fetch = gateway::fetch_week(self.api.as_ref(), ticket.week).await;
        self.complete(ticket, fetch).await
    }

    /// Re-run the pass for the current selection.
    pub async fn refresh(&self) -> bool {
        let week = self.selected().await;
        self.select(week).await
    }

    pub async fn begin(&self, week: WeekKey) -> PassTicket {
        let mut inner = self.inner.lock().await;
        Self::start_pass(&mut inner, week)
    }

    fn start_pass(inner: &mut SessionState, week: WeekKey) -> PassTicket {
        inner.generation += 1;
        inner.selected = week;
        inner.state = DashboardState::Loading { week };
        PassTicket {
            generation: inner.generation,
            week,
        }
    }

    /// Apply a settled pass. Superseded passes are dropped before any state
    /// is derived from them.
    pub async fn complete(&self, ticket: PassTicket, fetch: WeekFetch) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.generation != ticket.generation || inner.selected != ticket.week {
            debug!(
                stale_week = %ticket.week,
                active_week = %inner.selected,
                "discarding superseded dashboard result"
            );
            return false;
        }
        inner.state = build_state(fetch, &self.limits);
        true
    }

    pub async fn selected(&self) -> WeekKey {
        self.inner.lock().await.selected
    }

    pub async fn availability(&self) -> AvailabilityIndex {
        self.inner.lock().await.availability.clone()
    }

    pub async fn state(&self) -> DashboardState {
        self.inner.lock().await.state.clone()
    }
}
