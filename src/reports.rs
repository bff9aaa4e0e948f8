//! Report list, generation, PDF export and the single-report detail path.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::gateway::{self, AnalyticsApi, Fetched, Unavailable};
use crate::insight::{self, InsightView, PresenterLimits};
use crate::metrics::HeatBand;
use crate::model::{InsightBundle, WeeklyReport};
use crate::validation::{ActionError, ValidationError};
use crate::week::WeekKey;

pub const LIST_FAILED: &str = "Failed to load reports";
pub const GENERATE_FAILED: &str = "Failed to generate report";
pub const EXPORT_FAILED: &str = "Failed to export PDF";
pub const DETAIL_FAILED: &str = "Failed to load report details";

/// Download name for an exported report.
pub fn pdf_file_name(id: i64) -> String {
    format!("report_{}.pdf", id)
}

#[instrument(skip_all, fields(skip = skip, limit = limit))]
pub async fn list(
    api: &dyn AnalyticsApi,
    skip: u32,
    limit: u32,
) -> Result<Vec<WeeklyReport>, ActionError> {
    api.list_reports(skip, limit)
        .await
        .map_err(|err| ActionError::from_api(err, LIST_FAILED))
}

/// A freshly generated report plus the reloaded first page of the list.
#[derive(Debug)]
pub struct Generated {
    pub report: WeeklyReport,
    /// `None` when the reload after generation failed.
    pub reports: Option<Vec<WeeklyReport>>,
}

/// Generate a report for `week` and reload the list. A missing week is
/// rejected before any request is made.
#[instrument(skip_all)]
pub async fn generate(
    api: &dyn AnalyticsApi,
    week: Option<WeekKey>,
    page_size: u32,
) -> Result<Generated, ActionError> {
    let week = week.ok_or(ValidationError::MissingWeek)?;
    let report = api
        .generate_report(week)
        .await
        .map_err(|err| ActionError::from_api(err, GENERATE_FAILED))?;
    info!(id = report.id, week = %week, "report generated");

    let reports = match api.list_reports(0, page_size).await {
        Ok(reports) => Some(reports),
        Err(err) => {
            warn!(?err, "failed to reload reports after generation");
            None
        }
    };
    Ok(Generated { report, reports })
}

/// Download the PDF for `id` into `dir` as `report_<id>.pdf`.
#[instrument(skip_all, fields(id = id))]
pub async fn export_pdf(
    api: &dyn AnalyticsApi,
    id: i64,
    dir: &Path,
) -> Result<PathBuf, ActionError> {
    let bytes = api
        .export_pdf(id)
        .await
        .map_err(|err| ActionError::from_api(err, EXPORT_FAILED))?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| ActionError::io(err, format!("failed to create {}", dir.display())))?;
    let path = dir.join(pdf_file_name(id));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|err| ActionError::io(err, format!("failed to write {}", path.display())))?;
    info!(id, path = %path.display(), bytes = bytes.len(), "report PDF saved");
    Ok(path)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDetail {
    pub report: WeeklyReport,
    pub heat_band: HeatBand,
    pub insight: Fetched<InsightBundle>,
}

impl ReportDetail {
    /// Insight sections for display; `None` omits every insight-dependent section.
    pub fn insight_view(&self, limits: &PresenterLimits) -> Option<InsightView> {
        self.insight
            .as_ready()
            .map(|bundle| insight::present(bundle, limits))
    }
}

/// Loads one report and then the insights for the report's own week. The
/// report fetch is blocking; the insight fetch is not.
#[derive(Clone)]
pub struct ReportCoordinator {
    api: Arc<dyn AnalyticsApi>,
}

impl ReportCoordinator {
    pub fn new(api: Arc<dyn AnalyticsApi>) -> Self {
        Self { api }
    }

    #[instrument(skip_all, fields(id = id))]
    pub async fn load(&self, id: i64) -> Result<ReportDetail, ActionError> {
        let report = self
            .api
            .report(id)
            .await
            .map_err(|err| ActionError::from_api(err, DETAIL_FAILED))?;

        let insight = match report.week_key() {
            Ok(week) => gateway::fetch_report_insight(self.api.as_ref(), week).await,
            Err(err) => {
                warn!(%err, id, "report carries an unreadable week start");
                Fetched::Unavailable(Unavailable::Failed(err.to_string()))
            }
        };
        if let Fetched::Unavailable(reason) = &insight {
            debug!(id, ?reason, "report insights omitted");
        }

        Ok(ReportDetail {
            heat_band: HeatBand::from_score(report.heat_index),
            report,
            insight,
        })
    }
}

/// View-scoped holder for the report detail screen. Navigating to another
/// report while a load is in flight discards the older load's result.
pub struct ReportDetailSession {
    coordinator: ReportCoordinator,
    inner: Mutex<DetailState>,
}

#[derive(Default)]
struct DetailState {
    generation: u64,
    id: Option<i64>,
    result: Option<Result<ReportDetail, String>>,
}

impl ReportDetailSession {
    pub fn new(coordinator: ReportCoordinator) -> Self {
        Self {
            coordinator,
            inner: Mutex::new(DetailState::default()),
        }
    }

    /// Load `id`. Returns whether the result was applied.
    pub async fn open(&self, id: i64) -> bool {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.id = Some(id);
            inner.result = None;
            inner.generation
        };
        let result = self
            .coordinator
            .load(id)
            .await
            .map_err(|err| err.to_string());
        let mut inner = self.inner.lock().await;
        if inner.generation != generation || inner.id != Some(id) {
            debug!(stale_id = id, "discarding superseded report load");
            return false;
        }
        inner.result = Some(result);
        true
    }

    pub async fn current_id(&self) -> Option<i64> {
        self.inner.lock().await.id
    }

    /// `None` while loading; `Err` carries the full-page error message.
    pub async fn result(&self) -> Option<Result<ReportDetail, String>> {
        self.inner.lock().await.result.clone()
    }
}
