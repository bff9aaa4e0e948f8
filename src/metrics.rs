//! Derived series for the sentiment charts and the category heat bars.
use serde::Serialize;

use crate::model::{HeatmapRow, SentimentClass, TrendSnapshot};

/// One group of the current-vs-previous bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub class: SentimentClass,
    pub label: &'static str,
    pub current: f64,
    pub previous: f64,
}

/// One slice of the current-week distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSlice {
    pub class: SentimentClass,
    pub label: &'static str,
    pub value: f64,
}

/// End boundary of one colour band in a heat bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatStop {
    pub class: SentimentClass,
    pub color: &'static str,
    pub offset_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

/// Headline cards at the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub positive: f64,
    pub negative: f64,
    pub volume: u64,
    pub overall_change: Option<f64>,
    pub volume_change: Option<i64>,
}

impl Headline {
    pub fn direction(&self) -> Option<Direction> {
        self.overall_change.map(|c| {
            if c > 0.0 {
                Direction::Up
            } else if c < 0.0 {
                Direction::Down
            } else {
                Direction::Flat
            }
        })
    }
}

pub fn derive_headline(snapshot: &TrendSnapshot) -> Headline {
    Headline {
        positive: snapshot.current.positive,
        negative: snapshot.current.negative,
        volume: snapshot.current_volume,
        overall_change: snapshot.overall_change,
        volume_change: snapshot.volume_change,
    }
}

/// Current vs previous week per class. Empty when the current week has no
/// volume so callers show an empty state instead of a zero chart.
pub fn derive_comparison(snapshot: &TrendSnapshot) -> Vec<ComparisonRow> {
    if !snapshot.has_current() {
        return Vec::new();
    }
    SentimentClass::ALL
        .iter()
        .map(|&class| ComparisonRow {
            class,
            label: class.label(),
            current: snapshot.current.get(class),
            previous: snapshot.previous.get(class),
        })
        .collect()
}

/// Current-week share per class; empty for a zero-volume week.
pub fn derive_distribution(snapshot: &TrendSnapshot) -> Vec<DistributionSlice> {
    if !snapshot.has_current() {
        return Vec::new();
    }
    SentimentClass::ALL
        .iter()
        .map(|&class| DistributionSlice {
            class,
            label: class.label(),
            value: snapshot.current.get(class),
        })
        .collect()
}

/// An all-zero distribution counts as no data.
pub fn has_distribution_data(slices: &[DistributionSlice]) -> bool {
    slices.iter().any(|s| s.value > 0.0)
}

fn percent(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Three contiguous bands (negative, neutral, positive) ending at the
/// cumulative negative, negative+neutral and 100. Offsets are clamped so they
/// never decrease, whatever the row sums to.
pub fn derive_heat_gradient(row: &HeatmapRow) -> [HeatStop; 3] {
    let negative_end = percent(row.negative);
    let neutral_end = percent(negative_end + percent(row.neutral)).max(negative_end);
    [
        HeatStop {
            class: SentimentClass::Negative,
            color: SentimentClass::Negative.color(),
            offset_percent: negative_end,
        },
        HeatStop {
            class: SentimentClass::Neutral,
            color: SentimentClass::Neutral.color(),
            offset_percent: neutral_end,
        },
        HeatStop {
            class: SentimentClass::Positive,
            color: SentimentClass::Positive.color(),
            offset_percent: 100.0,
        },
    ]
}

/// CSS `linear-gradient` for a single stacked heat bar.
pub fn gradient_css(stops: &[HeatStop]) -> String {
    let mut parts = Vec::with_capacity(stops.len() * 2);
    let mut start = 0.0;
    for stop in stops {
        parts.push(format!("{} {}%", stop.color, trim_float(start)));
        parts.push(format!("{} {}%", stop.color, trim_float(stop.offset_percent)));
        start = stop.offset_percent;
    }
    format!("linear-gradient(to right, {})", parts.join(", "))
}

fn trim_float(v: f64) -> String {
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Qualitative band for a 0–100 heat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeatBand {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl HeatBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            HeatBand::Excellent
        } else if score >= 60.0 {
            HeatBand::Good
        } else if score >= 40.0 {
            HeatBand::Moderate
        } else {
            HeatBand::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeatBand::Excellent => "Excellent",
            HeatBand::Good => "Good",
            HeatBand::Moderate => "Moderate",
            HeatBand::Poor => "Poor",
        }
    }
}

pub const NO_PREVIOUS_WEEK: &str = "No previous week data";

pub fn format_point_change(change: Option<f64>) -> String {
    match change {
        Some(c) => format!("{}{:.1}% from last week", if c > 0.0 { "+" } else { "" }, c),
        None => NO_PREVIOUS_WEEK.to_string(),
    }
}

pub fn format_volume_change(change: Option<i64>) -> String {
    match change {
        Some(c) => format!("{}{} from last week", if c > 0 { "+" } else { "" }, c),
        None => NO_PREVIOUS_WEEK.to_string(),
    }
}
