use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Request, Response, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::model::{
    CategoryHeatmap, InsightBundle, LongRangeTrends, TrendSnapshot, UploadSummary, WeeklyReport,
};
use crate::week::WeekKey;

pub mod error;

pub use error::ApiError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-mostly view of the analytics backend. Every call is independent; the
/// orchestration layer decides which failures block a view.
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn trends(&self, week: WeekKey) -> Result<TrendSnapshot, ApiError>;

    async fn insights(&self, week: WeekKey) -> Result<InsightBundle, ApiError>;

    async fn long_range_trends(&self, week: WeekKey) -> Result<LongRangeTrends, ApiError>;

    async fn category_heatmap(&self, week: WeekKey) -> Result<CategoryHeatmap, ApiError>;

    async fn generate_report(&self, week: WeekKey) -> Result<WeeklyReport, ApiError>;

    async fn report(&self, id: i64) -> Result<WeeklyReport, ApiError>;

    /// Most recent first.
    async fn list_reports(&self, skip: u32, limit: u32) -> Result<Vec<WeeklyReport>, ApiError>;

    async fn export_pdf(&self, id: i64) -> Result<Vec<u8>, ApiError>;

    async fn upload_feedback(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadSummary, ApiError>;
}

/// Why an enhancement query produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// The backend has nothing for this key (HTTP 404).
    NoData,
    Failed(String),
}

/// Outcome of a query whose failure is isolated from its siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Ready(T),
    Unavailable(Unavailable),
}

impl<T> Fetched<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Fetched::Ready(v) => Some(v),
            Fetched::Unavailable(_) => None,
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Fetched::Ready(v) => Some(v),
            Fetched::Unavailable(_) => None,
        }
    }
}

/// Turn an enhancement query result into a marker. Failures are logged here
/// and go no further.
pub fn settle<T>(
    query: &'static str,
    key: &dyn fmt::Display,
    res: Result<T, ApiError>,
) -> Fetched<T> {
    match res {
        Ok(v) => Fetched::Ready(v),
        Err(err) if err.is_not_found() => {
            info!(query, key = %key, "no data available; section omitted");
            Fetched::Unavailable(Unavailable::NoData)
        }
        Err(err) => {
            warn!(?err, query, key = %key, "enhancement query failed; section omitted");
            Fetched::Unavailable(Unavailable::Failed(err.to_string()))
        }
    }
}

/// Every query the dashboard issues for one week, settled.
#[derive(Debug)]
pub struct WeekFetch {
    pub week: WeekKey,
    pub trends: Result<TrendSnapshot, ApiError>,
    pub insights: Result<InsightBundle, ApiError>,
    pub long_range: Fetched<LongRangeTrends>,
    pub heatmap: Fetched<CategoryHeatmap>,
}

/// Issue the four dashboard queries concurrently and wait for all of them.
/// Trends and insights keep their errors for the caller; the long-range and
/// heatmap queries are settled into markers.
#[instrument(skip_all, fields(week = %week))]
pub async fn fetch_week(api: &dyn AnalyticsApi, week: WeekKey) -> WeekFetch {
    let (trends, insights, long_range, heatmap) = futures::join!(
        api.trends(week),
        api.insights(week),
        api.long_range_trends(week),
        api.category_heatmap(week),
    );
    debug!(
        trends_ok = trends.is_ok(),
        insights_ok = insights.is_ok(),
        long_range_ok = long_range.is_ok(),
        heatmap_ok = heatmap.is_ok(),
        "week queries settled"
    );
    WeekFetch {
        week,
        trends,
        insights,
        long_range: settle("long_range_trends", &week, long_range),
        heatmap: settle("category_heatmap", &week, heatmap),
    }
}

/// Long-range trends used to discover which weeks hold data.
#[instrument(skip_all, fields(week = %week))]
pub async fn fetch_availability(
    api: &dyn AnalyticsApi,
    week: WeekKey,
) -> Fetched<LongRangeTrends> {
    settle("long_range_trends", &week, api.long_range_trends(week).await)
}

/// Insight query for the report detail path; never blocks the report.
#[instrument(skip_all, fields(week = %week))]
pub async fn fetch_report_insight(
    api: &dyn AnalyticsApi,
    week: WeekKey,
) -> Fetched<InsightBundle> {
    settle("report_insights", &week, api.insights(week).await)
}

#[derive(Clone)]
pub struct AnalyticsClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl fmt::Debug for AnalyticsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AnalyticsClient {
    pub fn new(base_url: Url, token: Option<String>) -> Result<Self, ApiError> {
        let user_agent = format!("pulseboard/{}", env!("CARGO_PKG_VERSION"));
        Self::with_options(base_url, token, DEFAULT_TIMEOUT, &user_agent)
    }

    pub fn with_options(
        base_url: Url,
        token: Option<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
            token,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(cfg.api.base_url.trim()).map_err(|e| ApiError::Url(e.to_string()))?;
        Self::with_options(
            base_url,
            cfg.token().map(str::to_string),
            Duration::from_secs(cfg.api.timeout_seconds),
            &cfg.api.user_agent,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Url(format!("{path}: {e}")))
    }

    /// Build a request against `path` (relative to the base URL) with the
    /// bearer token and query parameters attached.
    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Request, ApiError> {
        let endpoint = self.endpoint(path)?;
        let mut builder = self
            .http
            .request(method, endpoint)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(builder.build()?)
    }

    async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "analytics request");

        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let detail = error::extract_detail(&body);
            warn!(
                %method,
                %path,
                %status,
                detail = detail.as_deref().unwrap_or(""),
                "analytics API error"
            );
            return Err(ApiError::Status { status, detail });
        }
        Ok(res)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, ApiError> {
        let res = self.execute(request).await?;
        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_week<T: DeserializeOwned>(
        &self,
        path: &str,
        week: WeekKey,
    ) -> Result<T, ApiError> {
        let request = self.build_request(Method::GET, path, &week_query(week))?;
        self.send_json(request).await
    }
}

fn week_query(week: WeekKey) -> [(&'static str, String); 1] {
    [("week_start", week.timestamp())]
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// MIME type for the accepted ingestion formats.
pub fn upload_content_type(file_name: &str) -> &'static str {
    match file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
    {
        Some(ext) if ext == "csv" => "text/csv",
        Some(ext) if ext == "xlsx" => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
        Some(ext) if ext == "xls" => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl AnalyticsApi for AnalyticsClient {
    async fn trends(&self, week: WeekKey) -> Result<TrendSnapshot, ApiError> {
        self.get_week("analysis/trends", week).await
    }

    async fn insights(&self, week: WeekKey) -> Result<InsightBundle, ApiError> {
        self.get_week("analysis/insights", week).await
    }

    async fn long_range_trends(&self, week: WeekKey) -> Result<LongRangeTrends, ApiError> {
        self.get_week("analysis/8-week-trends", week).await
    }

    async fn category_heatmap(&self, week: WeekKey) -> Result<CategoryHeatmap, ApiError> {
        self.get_week("analysis/category-heatmap", week).await
    }

    async fn generate_report(&self, week: WeekKey) -> Result<WeeklyReport, ApiError> {
        let request =
            self.build_request(Method::POST, "reports/weekly/generate", &week_query(week))?;
        let report: WeeklyReport = self.send_json(request).await?;
        info!(id = report.id, week = %week, "weekly report generated");
        Ok(report)
    }

    async fn report(&self, id: i64) -> Result<WeeklyReport, ApiError> {
        let request = self.build_request(Method::GET, &format!("reports/weekly/{}", id), &[])?;
        self.send_json(request).await
    }

    async fn list_reports(&self, skip: u32, limit: u32) -> Result<Vec<WeeklyReport>, ApiError> {
        let query = [("skip", skip.to_string()), ("limit", limit.to_string())];
        let request = self.build_request(Method::GET, "reports/weekly", &query)?;
        self.send_json(request).await
    }

    async fn export_pdf(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        let request =
            self.build_request(Method::GET, &format!("reports/export/pdf/{}", id), &[])?;
        let res = self.execute(request).await?;
        Ok(res.bytes().await?.to_vec())
    }

    async fn upload_feedback(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadSummary, ApiError> {
        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(upload_content_type(file_name))?;
        let form = Form::new().part("file", part);

        let endpoint = self.endpoint("feedback/upload")?;
        let mut builder = self.http.post(endpoint).multipart(form);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let summary: UploadSummary = self.send_json(builder.build()?).await?;
        info!(
            file_name,
            saved = summary.saved_count,
            errors = summary.errors.len(),
            "feedback file uploaded"
        );
        Ok(summary)
    }
}
