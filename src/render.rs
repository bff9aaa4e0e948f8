//! Plain-text rendering of the views for the terminal.
use chrono::NaiveDate;

use crate::availability::AvailabilityIndex;
use crate::dashboard::{DashboardState, DashboardView};
use crate::insight::{InsightView, QuoteGroup};
use crate::metrics::{self, HeatBand};
use crate::model::{UploadSummary, WeeklyReport};
use crate::reports::ReportDetail;
use crate::week::{WeekKey, DATE_FORMAT};

pub const NO_DATA_MESSAGE: &str = "No feedback data available for the selected week.";
const NO_REPORTS: &str = "No reports generated yet.";

fn short_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

fn leading_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// `Jan 08 - Jan 14, 2024`; falls back to the raw strings when unparseable.
pub fn period_label(start: &str, end: &str) -> String {
    match (leading_date(start), leading_date(end)) {
        (Some(s), Some(e)) => format!("{} - {}", s.format("%b %d"), short_date(e)),
        _ => format!("{} - {}", start, end),
    }
}

/// `Week of Jan 08 - Jan 14, 2024`
pub fn week_label(week: WeekKey) -> String {
    format!(
        "Week of {} - {}",
        week.monday().format("%b %d"),
        short_date(week.sunday())
    )
}

fn availability_line(index: &AvailabilityIndex) -> String {
    match index.range() {
        Some((first, last)) => format!(
            "Data available: {} to {} ({} weeks)",
            short_date(first.monday()),
            short_date(last.monday()),
            index.weeks().len()
        ),
        None => "Data available: none recorded".to_string(),
    }
}

pub fn dashboard(state: &DashboardState, availability: &AvailabilityIndex) -> String {
    let mut out = String::new();
    if let Some(week) = state.week() {
        out.push_str(&format!("{}\n", week_label(week)));
        if !availability.is_empty() && !availability.contains(week) {
            out.push_str("(no feedback recorded for this week)\n");
        }
    }
    out.push_str(&format!("{}\n\n", availability_line(availability)));

    match state {
        DashboardState::Idle => out.push_str("Nothing selected.\n"),
        DashboardState::Loading { .. } => out.push_str("Loading...\n"),
        DashboardState::Failed { message, .. } => out.push_str(&format!("Error: {}\n", message)),
        DashboardState::NoData { .. } => out.push_str(&format!("{}\n", NO_DATA_MESSAGE)),
        DashboardState::Ready(view) => dashboard_view(&mut out, view),
    }
    out
}

fn dashboard_view(out: &mut String, view: &DashboardView) {
    let h = &view.headline;
    out.push_str(&format!(
        "Positive {:.1}%   Negative {:.1}%   Feedback {}\n",
        h.positive, h.negative, h.volume
    ));
    out.push_str(&format!("  sentiment: {}\n", metrics::format_point_change(h.overall_change)));
    out.push_str(&format!("  volume:    {}\n\n", metrics::format_volume_change(h.volume_change)));

    if !view.comparison.is_empty() {
        out.push_str("This week vs last week\n");
        for row in &view.comparison {
            out.push_str(&format!(
                "  {:<8} {:>6.1}%  {:>6.1}%\n",
                row.label, row.current, row.previous
            ));
        }
        out.push('\n');
    }

    if metrics::has_distribution_data(&view.distribution) {
        out.push_str("Distribution\n");
        for slice in &view.distribution {
            out.push_str(&format!("  {:<8} {:>6.1}%\n", slice.label, slice.value));
        }
        out.push('\n');
    }

    if let Some(rows) = &view.long_range {
        out.push_str("Recent weeks\n");
        for row in rows {
            let label = if row.week_label.is_empty() { &row.week } else { &row.week_label };
            out.push_str(&format!(
                "  {:<12} +{:.1}% ~{:.1}% -{:.1}%  ({})\n",
                label, row.positive, row.neutral, row.negative, row.volume
            ));
        }
        out.push('\n');
    }

    if let Some(bars) = &view.heatmap {
        out.push_str("Category heat\n");
        for bar in bars {
            out.push_str(&format!(
                "  {:<24} {:>5.1} {:<9} [{}]\n",
                bar.category,
                bar.heat_score,
                HeatBand::from_score(bar.heat_score).label(),
                heat_bar_glyphs(&bar.stops)
            ));
        }
        out.push('\n');
    }

    insights(out, &view.insights);
}

/// Twenty cells split by the gradient's band boundaries.
fn heat_bar_glyphs(stops: &[metrics::HeatStop]) -> String {
    const CELLS: usize = 20;
    let glyphs = ['-', '~', '+'];
    let mut bar = String::with_capacity(CELLS);
    let mut start = 0usize;
    for (stop, glyph) in stops.iter().zip(glyphs) {
        let end = ((stop.offset_percent / 100.0) * CELLS as f64).round() as usize;
        let end = end.min(CELLS);
        for _ in start..end.max(start) {
            bar.push(glyph);
        }
        start = start.max(end);
    }
    while bar.len() < CELLS {
        bar.push(' ');
    }
    bar
}

fn quote_group(out: &mut String, title: &str, group: &QuoteGroup) {
    if group.total == 0 {
        return;
    }
    out.push_str(&format!("  {} ({})\n", title, group.total));
    for quote in &group.quotes {
        out.push_str(&format!("    \"{}\" ({})\n", quote.text, quote.attribution));
    }
}

pub fn insights(out: &mut String, view: &InsightView) {
    if let Some(banner) = &view.loop_banner {
        out.push_str(&format!("!! {}\n   {}\n", banner.title, banner.message));
        if !banner.recommendation.is_empty() {
            out.push_str(&format!("   {}\n", banner.recommendation));
        }
        if banner.more > 0 {
            out.push_str(&format!("   (+{} more)\n", banner.more));
        }
        out.push('\n');
    }

    if let Some(chip) = &view.momentum {
        out.push_str(&chip.label);
        for badge in &chip.badges {
            out.push_str(&format!("  [{}]", badge));
        }
        out.push_str("\n\n");
    }

    if let Some(summary) = &view.executive_summary {
        out.push_str(&format!("Summary\n  {}\n\n", summary));
    }

    if let Some(items) = &view.action_items {
        out.push_str(&format!("Action items ({} of {})\n", items.len(), view.action_items_total));
        for item in items {
            out.push_str(&format!("  {}\n    {}\n", item.heading, item.title));
            if !item.description.is_empty() {
                out.push_str(&format!("    {}\n", item.description));
            }
            if let Some(pct) = item.confidence_percent {
                out.push_str(&format!("    confidence {}%\n", pct));
            }
            if let Some(owner) = &item.assigned_to {
                out.push_str(&format!("    assigned to {}\n", owner));
            }
        }
        out.push('\n');
    }

    if let Some(flags) = &view.risk_flags {
        out.push_str("Risk flags\n");
        for flag in flags {
            out.push_str(&format!("  [{:?}] {}\n", flag.emphasis, flag.message));
            if !flag.recommendation.is_empty() {
                out.push_str(&format!("    {}\n", flag.recommendation));
            }
        }
        out.push('\n');
    }

    if let Some(stress) = &view.assessment_stress {
        out.push_str(&format!(
            "Assessment stress detected ({}% confidence)\n  {}\n",
            stress.confidence_percent, stress.message
        ));
        if !stress.recommendation.is_empty() {
            out.push_str(&format!("  {}\n", stress.recommendation));
        }
        out.push('\n');
    }

    if let Some(appreciation) = &view.appreciation {
        out.push_str(&format!("Appreciation ({} positive)\n", appreciation.total_positive));
        quote_group(out, "Trainers", &appreciation.trainer);
        quote_group(out, "Mentors", &appreciation.mentor);
        quote_group(out, "General", &appreciation.general);
        out.push('\n');
    }
}

pub fn report_list(reports: &[WeeklyReport]) -> String {
    if reports.is_empty() {
        return format!("{}\n", NO_REPORTS);
    }
    let mut out = String::new();
    for r in reports {
        out.push_str(&format!(
            "#{:<5} {:<28} score {:>5.1}  heat {:>5.1} ({})  {} feedback\n",
            r.id,
            period_label(&r.week_start_date, &r.week_end_date),
            r.overall_sentiment_score,
            r.heat_index,
            HeatBand::from_score(r.heat_index).label(),
            r.total_feedback_count
        ));
    }
    out
}

pub fn report_detail(detail: &ReportDetail, view: Option<&InsightView>) -> String {
    let r = &detail.report;
    let mut out = format!(
        "Report #{}  {}\n",
        r.id,
        period_label(&r.week_start_date, &r.week_end_date)
    );
    out.push_str(&format!("  overall sentiment {:.1}\n", r.overall_sentiment_score));
    if let Some(change) = r.sentiment_change {
        out.push_str(&format!("  {}\n", metrics::format_point_change(Some(change))));
    }
    out.push_str(&format!(
        "  heat index {:.1} ({})\n  {} feedback\n\n",
        r.heat_index,
        detail.heat_band.label(),
        r.total_feedback_count
    ));
    if let Some(summary) = &r.executive_summary {
        out.push_str(&format!("Summary\n  {}\n\n", summary));
    }
    if let Some(view) = view {
        let mut view = view.clone();
        // The report already printed its own summary.
        if r.executive_summary.is_some() {
            view.executive_summary = None;
        }
        insights(&mut out, &view);
    }
    out
}

pub fn upload_summary(summary: &UploadSummary) -> String {
    let mut out = String::new();
    if let Some(message) = &summary.message {
        out.push_str(&format!("{}\n", message));
    }
    out.push_str(&format!(
        "rows: {} total, {} processed, {} saved\n",
        summary.total_rows, summary.processed_rows, summary.saved_count
    ));
    if !summary.errors.is_empty() {
        out.push_str(&format!("{} row errors:\n", summary.errors.len()));
        for err in &summary.errors {
            out.push_str(&format!("  {}\n", err));
        }
    }
    out
}
