//! Flatten an [`InsightBundle`] into bounded, ranked display lists.
use serde::Serialize;
use std::cmp::Ordering;

use crate::config;
use crate::model::{
    ActionItem, AppreciationItem, InsightBundle, MomentumTrend, Priority, RiskFlag,
};

pub const LOOP_BANNER_TITLE: &str = "Unresolved Feedback Loop Detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterLimits {
    pub action_items: usize,
    pub appreciation: usize,
}

impl Default for PresenterLimits {
    fn default() -> Self {
        Self {
            action_items: 5,
            appreciation: 3,
        }
    }
}

impl From<&config::Dashboard> for PresenterLimits {
    fn from(cfg: &config::Dashboard) -> Self {
        Self {
            action_items: cfg.action_items_limit,
            appreciation: cfg.appreciation_limit,
        }
    }
}

/// Visual weight of a chip or alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Emphasis {
    Error,
    Warning,
    Info,
    Success,
    Neutral,
}

impl Emphasis {
    pub fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Urgent => Emphasis::Error,
            Priority::High => Emphasis::Warning,
            Priority::Medium => Emphasis::Info,
            Priority::Low => Emphasis::Neutral,
        }
    }

    /// Only `high` severity escalates; everything else is cautionary.
    pub fn for_severity(severity: &str) -> Self {
        if severity.trim().eq_ignore_ascii_case("high") {
            Emphasis::Error
        } else {
            Emphasis::Warning
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItemView {
    pub priority: Priority,
    pub emphasis: Emphasis,
    /// e.g. `URGENT - Trainer Feedback`
    pub heading: String,
    pub title: String,
    pub description: String,
    pub confidence_percent: Option<u32>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFlagView {
    pub emphasis: Emphasis,
    pub message: String,
    pub recommendation: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub text: String,
    pub attribution: String,
}

/// Top-N quotes of one appreciation category plus the full category count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteGroup {
    pub quotes: Vec<Quote>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppreciationView {
    pub total_positive: u64,
    pub trainer: QuoteGroup,
    pub mentor: QuoteGroup,
    pub general: QuoteGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentumChip {
    pub label: String,
    pub emphasis: Emphasis,
    /// At most two: trainer and mentor, shown only while increasing.
    pub badges: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopBanner {
    pub title: &'static str,
    pub message: String,
    pub recommendation: String,
    pub weeks_affected: u32,
    /// Further loops summarized behind the first one.
    pub more: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressView {
    pub confidence_percent: u32,
    pub message: String,
    pub recommendation: String,
}

/// Display-ready insight sections. `None` means the section is omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightView {
    pub loop_banner: Option<LoopBanner>,
    pub momentum: Option<MomentumChip>,
    pub action_items: Option<Vec<ActionItemView>>,
    pub action_items_total: usize,
    pub risk_flags: Option<Vec<RiskFlagView>>,
    pub appreciation: Option<AppreciationView>,
    pub assessment_stress: Option<StressView>,
    pub executive_summary: Option<String>,
}

pub fn present(bundle: &InsightBundle, limits: &PresenterLimits) -> InsightView {
    let action_items = bundle.action_items.as_deref();
    InsightView {
        loop_banner: loop_banner(bundle),
        momentum: bundle.praise_momentum.as_ref().map(|m| {
            let mut badges = Vec::with_capacity(2);
            if m.trainer_recognition_trend == MomentumTrend::Increasing {
                badges.push("Trainer Recognition ↑");
            }
            if m.mentor_recognition_trend == MomentumTrend::Increasing {
                badges.push("Mentor Recognition ↑");
            }
            MomentumChip {
                label: format!(
                    "Praise Momentum: {} ({}{:.1}%)",
                    m.trend.as_str().to_uppercase(),
                    if m.change > 0.0 { "+" } else { "" },
                    m.change
                ),
                emphasis: if m.trend == MomentumTrend::Increasing {
                    Emphasis::Success
                } else {
                    Emphasis::Neutral
                },
                badges,
            }
        }),
        action_items: action_items.map(|items| rank_action_items(items, limits.action_items)),
        action_items_total: action_items.map_or(0, <[ActionItem]>::len),
        risk_flags: bundle
            .risk_flags
            .as_ref()
            .map(|flags| flags.iter().map(risk_flag_view).collect()),
        appreciation: bundle.appreciation_tracker.as_ref().map(|t| AppreciationView {
            total_positive: t.total_positive_feedback,
            trainer: quote_group(&t.trainer_recognition, limits.appreciation),
            mentor: quote_group(&t.mentor_recognition, limits.appreciation),
            general: quote_group(&t.general_appreciation, limits.appreciation),
        }),
        assessment_stress: bundle
            .assessment_stress
            .as_ref()
            .filter(|s| s.detected)
            .map(|s| StressView {
                confidence_percent: whole_percent(s.confidence),
                message: s.message.clone(),
                recommendation: s.recommendation.clone(),
            }),
        executive_summary: bundle
            .executive_summary
            .as_ref()
            .filter(|s| !s.trim().is_empty())
            .cloned(),
    }
}

fn loop_banner(bundle: &InsightBundle) -> Option<LoopBanner> {
    let loops = bundle.unresolved_loops.as_deref()?;
    let first = loops.first()?;
    Some(LoopBanner {
        title: LOOP_BANNER_TITLE,
        message: first.message.clone(),
        recommendation: first.recommendation.clone(),
        weeks_affected: first.weeks_affected,
        more: loops.len() - 1,
    })
}

/// Highest priority first; ties broken by confidence (absent last), then by
/// the backend's order.
fn rank_action_items(items: &[ActionItem], limit: usize) -> Vec<ActionItemView> {
    let mut ranked: Vec<&ActionItem> = items.iter().collect();
    ranked.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| compare_confidence(a.confidence_score, b.confidence_score))
    });
    ranked
        .into_iter()
        .take(limit)
        .map(|item| ActionItemView {
            priority: item.priority,
            emphasis: Emphasis::for_priority(item.priority),
            heading: format!(
                "{} - {}",
                item.priority.as_str().to_uppercase(),
                item.category
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .map(humanize)
                    .unwrap_or_else(|| "General".to_string())
            ),
            title: item.title.clone(),
            description: item.description.clone(),
            confidence_percent: item.confidence_score.map(whole_percent),
            assigned_to: item.assigned_to.clone(),
        })
        .collect()
}

fn compare_confidence(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn risk_flag_view(flag: &RiskFlag) -> RiskFlagView {
    RiskFlagView {
        emphasis: Emphasis::for_severity(&flag.severity),
        message: flag.message.clone(),
        recommendation: flag.recommendation.clone(),
        category: flag.category.clone(),
    }
}

fn quote_group(items: &[AppreciationItem], limit: usize) -> QuoteGroup {
    QuoteGroup {
        quotes: items
            .iter()
            .take(limit)
            .map(|item| Quote {
                text: item.text.clone(),
                attribution: format!("{} - {}", item.location, item.batch),
            })
            .collect(),
        total: items.len(),
    }
}

fn whole_percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u32
}

/// `trainer_feedback` -> `Trainer Feedback`
fn humanize(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
