#![allow(dead_code)]

use async_trait::async_trait;
use pulseboard::gateway::{AnalyticsApi, ApiError};
use pulseboard::model::{
    CategoryHeatmap, HeatmapRow, InsightBundle, LongRangeTrends, TrendSnapshot, UploadSummary,
    WeekTrend, WeeklyReport,
};
use pulseboard::week::WeekKey;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

/// Scripted outcome of one backend call.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail(u16, Option<&'static str>),
}

impl<T: Clone> Reply<T> {
    fn get(&self) -> Result<T, ApiError> {
        match self {
            Reply::Ok(v) => Ok(v.clone()),
            Reply::Fail(code, detail) => Err(ApiError::Status {
                status: StatusCode::from_u16(*code).unwrap(),
                detail: detail.map(str::to_string),
            }),
        }
    }
}

fn not_found<T>() -> Reply<T> {
    Reply::Fail(404, Some("Not Found"))
}

#[derive(Debug, Clone)]
pub struct WeekScript {
    pub trends: Reply<TrendSnapshot>,
    pub insights: Reply<InsightBundle>,
    pub long_range: Reply<LongRangeTrends>,
    pub heatmap: Reply<CategoryHeatmap>,
    pub delay: Duration,
}

impl WeekScript {
    /// Every query succeeds with `volume` responses this week.
    pub fn healthy(volume: u64) -> Self {
        Self {
            trends: Reply::Ok(trends(volume, 100)),
            insights: Reply::Ok(InsightBundle::default()),
            long_range: Reply::Ok(long_range(&[("2024-01-01", 100), ("2024-01-08", volume)])),
            heatmap: Reply::Ok(heatmap()),
            delay: Duration::from_millis(5),
        }
    }

    pub fn delayed(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Trends(WeekKey),
    Insights(WeekKey),
    LongRange(WeekKey),
    Heatmap(WeekKey),
    Generate(WeekKey),
    Report(i64),
    List { skip: u32, limit: u32 },
    Export(i64),
    Upload { file_name: String, bytes: Vec<u8> },
}

#[derive(Clone, Default)]
pub struct RecordingAnalytics {
    weeks: Arc<Mutex<HashMap<WeekKey, WeekScript>>>,
    availability: Arc<Mutex<Option<Reply<LongRangeTrends>>>>,
    availability_delay: Arc<Mutex<Duration>>,
    reports: Arc<Mutex<HashMap<i64, Reply<WeeklyReport>>>>,
    list: Arc<Mutex<Option<Reply<Vec<WeeklyReport>>>>>,
    generated: Arc<Mutex<Option<Reply<WeeklyReport>>>>,
    pdf: Arc<Mutex<Option<Reply<Vec<u8>>>>>,
    upload: Arc<Mutex<Option<Reply<UploadSummary>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script_week(&self, week: WeekKey, script: WeekScript) {
        self.weeks.lock().await.insert(week, script);
    }

    /// Long-range feed returned when no week script matches the anchor.
    pub async fn script_availability(&self, reply: Reply<LongRangeTrends>) {
        *self.availability.lock().await = Some(reply);
    }

    pub async fn delay_availability(&self, ms: u64) {
        *self.availability_delay.lock().await = Duration::from_millis(ms);
    }

    pub async fn script_report(&self, id: i64, reply: Reply<WeeklyReport>) {
        self.reports.lock().await.insert(id, reply);
    }

    pub async fn script_list(&self, reply: Reply<Vec<WeeklyReport>>) {
        *self.list.lock().await = Some(reply);
    }

    pub async fn script_generate(&self, reply: Reply<WeeklyReport>) {
        *self.generated.lock().await = Some(reply);
    }

    pub async fn script_pdf(&self, reply: Reply<Vec<u8>>) {
        *self.pdf.lock().await = Some(reply);
    }

    pub async fn script_upload(&self, reply: Reply<UploadSummary>) {
        *self.upload.lock().await = Some(reply);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }

    async fn script_for(&self, week: WeekKey) -> Option<WeekScript> {
        self.weeks.lock().await.get(&week).cloned()
    }

    /// Holds the in-flight counter across the scripted delay.
    async fn week_reply<T: Clone>(
        &self,
        week: WeekKey,
        pick: impl Fn(&WeekScript) -> Reply<T>,
    ) -> Result<T, ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let script = self.script_for(week).await;
        if let Some(script) = &script {
            sleep(script.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match script {
            Some(script) => pick(&script).get(),
            None => not_found().get(),
        }
    }
}

#[async_trait]
impl AnalyticsApi for RecordingAnalytics {
    async fn trends(&self, week: WeekKey) -> Result<TrendSnapshot, ApiError> {
        self.record(Call::Trends(week)).await;
        self.week_reply(week, |s| s.trends.clone()).await
    }

    async fn insights(&self, week: WeekKey) -> Result<InsightBundle, ApiError> {
        self.record(Call::Insights(week)).await;
        self.week_reply(week, |s| s.insights.clone()).await
    }

    async fn long_range_trends(&self, week: WeekKey) -> Result<LongRangeTrends, ApiError> {
        self.record(Call::LongRange(week)).await;
        if self.script_for(week).await.is_none() {
            let reply = self.availability.lock().await.clone();
            if let Some(reply) = reply {
                let delay = *self.availability_delay.lock().await;
                sleep(delay).await;
                return reply.get();
            }
        }
        self.week_reply(week, |s| s.long_range.clone()).await
    }

    async fn category_heatmap(&self, week: WeekKey) -> Result<CategoryHeatmap, ApiError> {
        self.record(Call::Heatmap(week)).await;
        self.week_reply(week, |s| s.heatmap.clone()).await
    }

    async fn generate_report(&self, week: WeekKey) -> Result<WeeklyReport, ApiError> {
        self.record(Call::Generate(week)).await;
        self.generated.lock().await.clone().unwrap_or_else(not_found).get()
    }

    async fn report(&self, id: i64) -> Result<WeeklyReport, ApiError> {
        self.record(Call::Report(id)).await;
        self.reports
            .lock()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Reply::Fail(404, Some("Report not found")))
            .get()
    }

    async fn list_reports(&self, skip: u32, limit: u32) -> Result<Vec<WeeklyReport>, ApiError> {
        self.record(Call::List { skip, limit }).await;
        self.list
            .lock()
            .await
            .clone()
            .unwrap_or(Reply::Ok(Vec::new()))
            .get()
    }

    async fn export_pdf(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        self.record(Call::Export(id)).await;
        self.pdf.lock().await.clone().unwrap_or_else(not_found).get()
    }

    async fn upload_feedback(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadSummary, ApiError> {
        self.record(Call::Upload {
            file_name: file_name.to_string(),
            bytes: content,
        })
        .await;
        self.upload
            .lock()
            .await
            .clone()
            .unwrap_or(Reply::Fail(500, None))
            .get()
    }
}

pub fn week(raw: &str) -> WeekKey {
    WeekKey::parse(raw).unwrap()
}

/// Snapshot decoded the way the backend sends it.
pub fn trends(current_volume: u64, previous_volume: u64) -> TrendSnapshot {
    serde_json::from_value(json!({
        "current_week": {"positive": 65.0, "neutral": 20.0, "negative": 15.0},
        "previous_week": {"positive": 60.0, "neutral": 25.0, "negative": 15.0},
        "overall_change": 5.0,
        "current_volume": current_volume,
        "previous_volume": previous_volume,
    }))
    .unwrap()
}

pub fn long_range(rows: &[(&str, u64)]) -> LongRangeTrends {
    LongRangeTrends {
        trends: rows
            .iter()
            .map(|(week, volume)| WeekTrend {
                week: week.to_string(),
                week_label: String::new(),
                positive: 60.0,
                neutral: 25.0,
                negative: 15.0,
                volume: *volume,
            })
            .collect(),
    }
}

pub fn heatmap() -> CategoryHeatmap {
    CategoryHeatmap {
        heatmap: vec![HeatmapRow {
            category: "Trainer Quality".into(),
            positive: 70.0,
            neutral: 20.0,
            negative: 10.0,
            heat_score: 82.0,
            total: 25,
        }],
    }
}

pub fn report(id: i64, week_start: &str, week_end: &str) -> WeeklyReport {
    WeeklyReport {
        id,
        week_start_date: week_start.into(),
        week_end_date: week_end.into(),
        overall_sentiment_score: 72.5,
        sentiment_change: Some(3.1),
        heat_index: 64.0,
        total_feedback_count: 120,
        executive_summary: Some("Mostly positive week.".into()),
    }
}
