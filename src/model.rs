use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::week::{WeekKey, WeekParseError};

/// Sentiment class percentages for one week. Each field is 0–100 and the three
/// sum to roughly 100 when the week has feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentMix {
    #[serde(default)]
    pub positive: f64,
    #[serde(default)]
    pub neutral: f64,
    #[serde(default)]
    pub negative: f64,
}

impl SentimentMix {
    pub fn get(&self, class: SentimentClass) -> f64 {
        match class {
            SentimentClass::Positive => self.positive,
            SentimentClass::Neutral => self.neutral,
            SentimentClass::Negative => self.negative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    /// Display order used by every chart.
    pub const ALL: [SentimentClass; 3] = [
        SentimentClass::Positive,
        SentimentClass::Neutral,
        SentimentClass::Negative,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SentimentClass::Positive => "Positive",
            SentimentClass::Neutral => "Neutral",
            SentimentClass::Negative => "Negative",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SentimentClass::Positive => "#32D74B",
            SentimentClass::Neutral => "#FF9F0A",
            SentimentClass::Negative => "#FF453A",
        }
    }
}

/// Raw `/analysis/trends` body.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendPayload {
    #[serde(default)]
    pub current_week: SentimentMix,
    #[serde(default)]
    pub previous_week: SentimentMix,
    #[serde(default)]
    pub changes: Option<SentimentMix>,
    #[serde(default)]
    pub overall_change: Option<f64>,
    #[serde(default)]
    pub current_volume: u64,
    #[serde(default)]
    pub previous_volume: u64,
    #[serde(default)]
    pub volume_change: Option<i64>,
}

/// Week-over-week sentiment comparison.
///
/// Deltas are `None` when the previous week has no feedback at all, which is
/// different from `Some(0.0)` (both weeks observed, no movement).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "TrendPayload")]
pub struct TrendSnapshot {
    pub current: SentimentMix,
    pub previous: SentimentMix,
    pub current_volume: u64,
    pub previous_volume: u64,
    /// Relative percent change per class.
    pub class_changes: Option<SentimentMix>,
    /// Percentage-point change of the positive share.
    pub overall_change: Option<f64>,
    pub volume_change: Option<i64>,
}

impl TrendSnapshot {
    pub fn has_current(&self) -> bool {
        self.current_volume > 0
    }
}

impl From<TrendPayload> for TrendSnapshot {
    fn from(p: TrendPayload) -> Self {
        let has_previous = p.previous_volume > 0;
        let overall_change = has_previous.then(|| {
            p.overall_change
                .unwrap_or(p.current_week.positive - p.previous_week.positive)
        });
        let volume_change = has_previous.then(|| {
            p.volume_change
                .unwrap_or(p.current_volume as i64 - p.previous_volume as i64)
        });
        Self {
            current: p.current_week,
            previous: p.previous_week,
            current_volume: p.current_volume,
            previous_volume: p.previous_volume,
            class_changes: p.changes.filter(|_| has_previous),
            overall_change,
            volume_change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentStress {
    pub detected: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppreciationItem {
    pub text: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub batch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppreciationTracker {
    #[serde(default)]
    pub trainer_recognition: Vec<AppreciationItem>,
    #[serde(default)]
    pub mentor_recognition: Vec<AppreciationItem>,
    #[serde(default)]
    pub general_appreciation: Vec<AppreciationItem>,
    #[serde(default)]
    pub total_positive_feedback: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedLoop {
    #[serde(default)]
    pub detected: bool,
    #[serde(default)]
    pub weeks_affected: u32,
    pub message: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub details: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentumTrend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
    #[serde(other)]
    Unknown,
}

impl MomentumTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumTrend::Increasing => "increasing",
            MomentumTrend::Decreasing => "decreasing",
            MomentumTrend::Stable => "stable",
            MomentumTrend::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PraiseMomentum {
    #[serde(default)]
    pub trend: MomentumTrend,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub current_positive_pct: f64,
    #[serde(default)]
    pub weeks_data: Vec<Value>,
    #[serde(default)]
    pub trainer_recognition_trend: MomentumTrend,
    #[serde(default)]
    pub mentor_recognition_trend: MomentumTrend,
}

/// Week-scoped insights. Every section is optional: `None` means the backend
/// did not compute it, `Some(vec![])` means it ran and found nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightBundle {
    #[serde(default)]
    pub action_items: Option<Vec<ActionItem>>,
    #[serde(default)]
    pub risk_flags: Option<Vec<RiskFlag>>,
    #[serde(default)]
    pub assessment_stress: Option<AssessmentStress>,
    #[serde(default)]
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub appreciation_tracker: Option<AppreciationTracker>,
    #[serde(default)]
    pub unresolved_loops: Option<Vec<UnresolvedLoop>>,
    #[serde(default)]
    pub praise_momentum: Option<PraiseMomentum>,
}

/// One row of `/analysis/8-week-trends`, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekTrend {
    pub week: String,
    #[serde(default)]
    pub week_label: String,
    #[serde(default)]
    pub positive: f64,
    #[serde(default)]
    pub neutral: f64,
    #[serde(default)]
    pub negative: f64,
    #[serde(default)]
    pub volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongRangeTrends {
    #[serde(default)]
    pub trends: Vec<WeekTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub category: String,
    #[serde(default)]
    pub positive: f64,
    #[serde(default)]
    pub neutral: f64,
    #[serde(default)]
    pub negative: f64,
    #[serde(default)]
    pub heat_score: f64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryHeatmap {
    #[serde(default)]
    pub heatmap: Vec<HeatmapRow>,
}

/// Persisted weekly report. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub id: i64,
    pub week_start_date: String,
    pub week_end_date: String,
    pub overall_sentiment_score: f64,
    #[serde(default)]
    pub sentiment_change: Option<f64>,
    pub heat_index: f64,
    pub total_feedback_count: u64,
    #[serde(default)]
    pub executive_summary: Option<String>,
}

impl WeeklyReport {
    /// Week the report was generated for, snapped to its Monday.
    pub fn week_key(&self) -> Result<WeekKey, WeekParseError> {
        WeekKey::parse(&self.week_start_date)
    }
}

/// Result of `POST /feedback/upload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub processed_rows: u64,
    #[serde(default)]
    pub saved_count: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trend_deltas_present_with_previous_week() {
        let snapshot: TrendSnapshot = serde_json::from_value(json!({
            "current_week": {"positive": 65.0, "neutral": 20.0, "negative": 15.0},
            "previous_week": {"positive": 60.0, "neutral": 25.0, "negative": 15.0},
            "changes": {"positive": 8.3, "neutral": -20.0, "negative": 0.0},
            "overall_change": 5.0,
            "current_volume": 120,
            "previous_volume": 100,
            "volume_change": 20
        }))
        .unwrap();
        assert_eq!(snapshot.overall_change, Some(5.0));
        assert_eq!(snapshot.volume_change, Some(20));
        assert!(snapshot.class_changes.is_some());
    }

    #[test]
    fn trend_deltas_undefined_without_previous_week() {
        let snapshot: TrendSnapshot = serde_json::from_value(json!({
            "current_week": {"positive": 50.0, "neutral": 30.0, "negative": 20.0},
            "previous_week": {"positive": 0, "neutral": 0, "negative": 0},
            "changes": {"positive": 100, "neutral": 100, "negative": 100},
            "overall_change": 50.0,
            "current_volume": 10,
            "previous_volume": 0,
            "volume_change": 10
        }))
        .unwrap();
        assert_eq!(snapshot.overall_change, None);
        assert_eq!(snapshot.volume_change, None);
        assert_eq!(snapshot.class_changes, None);
    }

    #[test]
    fn zero_change_stays_distinct_from_missing() {
        let snapshot: TrendSnapshot = serde_json::from_value(json!({
            "current_week": {"positive": 40.0, "neutral": 40.0, "negative": 20.0},
            "previous_week": {"positive": 40.0, "neutral": 40.0, "negative": 20.0},
            "current_volume": 30,
            "previous_volume": 30
        }))
        .unwrap();
        assert_eq!(snapshot.overall_change, Some(0.0));
        assert_eq!(snapshot.volume_change, Some(0));
    }

    #[test]
    fn insight_sections_absent_vs_empty() {
        let bundle: InsightBundle = serde_json::from_value(json!({
            "action_items": [],
            "risk_flags": null,
            "executive_summary": "Quiet week."
        }))
        .unwrap();
        assert_eq!(bundle.action_items, Some(vec![]));
        assert_eq!(bundle.risk_flags, None);
        assert_eq!(bundle.appreciation_tracker, None);
        assert_eq!(bundle.executive_summary.as_deref(), Some("Quiet week."));
    }

    #[test]
    fn priority_orders_by_severity() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        let p: Priority = serde_json::from_value(json!("urgent")).unwrap();
        assert_eq!(p, Priority::Urgent);
    }

    #[test]
    fn unknown_momentum_trend_is_tolerated() {
        let m: PraiseMomentum = serde_json::from_value(json!({
            "trend": "sideways",
            "change": 0.0
        }))
        .unwrap();
        assert_eq!(m.trend, MomentumTrend::Unknown);
        assert_eq!(m.trainer_recognition_trend, MomentumTrend::Stable);
    }

    #[test]
    fn report_week_key_from_backend_date() {
        let report: WeeklyReport = serde_json::from_value(json!({
            "id": 42,
            "week_start_date": "2024-01-08T00:00:00",
            "week_end_date": "2024-01-14T00:00:00",
            "overall_sentiment_score": 61.5,
            "heat_index": 72.0,
            "total_feedback_count": 88
        }))
        .unwrap();
        assert_eq!(report.week_key().unwrap().to_string(), "2024-01-08");
        assert_eq!(report.sentiment_change, None);
    }
}
