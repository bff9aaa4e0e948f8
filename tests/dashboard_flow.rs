mod common;

use common::{long_range, trends, week, Call, RecordingAnalytics, Reply, WeekScript};
use pulseboard::dashboard::{DashboardSession, DashboardState, LOAD_FAILED};
use pulseboard::gateway::{ApiError, Fetched, Unavailable, WeekFetch};
use pulseboard::insight::PresenterLimits;
use pulseboard::model::{ActionItem, InsightBundle, Priority};
use pulseboard::render;
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

fn session(api: &RecordingAnalytics, today: &str) -> DashboardSession {
    DashboardSession::new(Arc::new(api.clone()), PresenterLimits::default(), week(today))
}

#[tokio::test]
async fn mount_selects_latest_week_with_data() {
    let api = RecordingAnalytics::new();
    api.script_availability(Reply::Ok(long_range(&[
        ("2024-01-01", 80),
        ("2024-01-08T00:00:00", 120),
        ("2024-01-15", 0),
    ])))
    .await;
    api.script_week(week("2024-01-08"), WeekScript::healthy(120)).await;

    let session = session(&api, "2024-01-17");
    assert!(session.mount(None).await);

    assert_eq!(session.selected().await, week("2024-01-08"));
    let availability = session.availability().await;
    assert_eq!(availability.weeks(), &[week("2024-01-01"), week("2024-01-08")]);
    assert!(!availability.contains(week("2024-01-15")));

    let calls = api.calls().await;
    assert_eq!(calls[0], Call::LongRange(week("2024-01-15")));
    assert!(calls.contains(&Call::Trends(week("2024-01-08"))));

    let DashboardState::Ready(view) = session.state().await else {
        panic!("expected ready dashboard");
    };
    assert_eq!(view.headline.volume, 120);
    assert_eq!(view.headline.volume_change, Some(20));
    assert_eq!(view.comparison.len(), 3);
    assert!(view.long_range.is_some());
    assert_eq!(view.heatmap.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn mount_falls_back_to_today_without_availability() {
    let api = RecordingAnalytics::new();
    let mut script = WeekScript::healthy(0);
    script.trends = Reply::Ok(trends(0, 0));
    script.long_range = Reply::Fail(503, None);
    api.script_week(week("2024-01-15"), script).await;

    let session = session(&api, "2024-01-17");
    assert!(session.mount(None).await);

    assert_eq!(session.selected().await, week("2024-01-15"));
    let availability = session.availability().await;
    assert!(availability.is_empty());
    let state = session.state().await;
    assert_eq!(
        state,
        DashboardState::NoData {
            week: week("2024-01-15")
        }
    );

    let text = render::dashboard(&state, &availability);
    assert!(text.contains("Data available: none recorded"));
    assert!(text.contains(render::NO_DATA_MESSAGE));
}

#[tokio::test]
async fn selection_during_mount_beats_availability_default() {
    let api = RecordingAnalytics::new();
    api.script_availability(Reply::Ok(long_range(&[("2024-01-01", 80), ("2024-01-08", 120)])))
        .await;
    api.delay_availability(80).await;
    api.script_week(week("2024-01-01"), WeekScript::healthy(80)).await;
    api.script_week(week("2024-01-08"), WeekScript::healthy(120)).await;

    let session = session(&api, "2024-01-17");
    let (mounted, picked) = tokio::join!(session.mount(None), async {
        sleep(Duration::from_millis(20)).await;
        session.select(week("2024-01-01")).await
    });

    assert!(picked);
    assert!(!mounted, "default must not replace the user's choice");
    assert_eq!(session.selected().await, week("2024-01-01"));
    assert_eq!(session.state().await.week(), Some(week("2024-01-01")));
    // The index is still recorded for the selector.
    assert!(session.availability().await.contains(week("2024-01-08")));
    assert!(!api.calls().await.contains(&Call::Trends(week("2024-01-08"))));
}

#[tokio::test]
async fn superseded_failed_pass_leaves_newer_selection_alone() {
    let api = RecordingAnalytics::new();
    let session = session(&api, "2024-01-08");

    let stale = session.begin(week("2024-01-01")).await;
    let current = session.begin(week("2024-01-08")).await;
    let failed = WeekFetch {
        week: stale.week,
        trends: Err(ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: None,
        }),
        insights: Ok(InsightBundle::default()),
        long_range: Fetched::Unavailable(Unavailable::NoData),
        heatmap: Fetched::Unavailable(Unavailable::NoData),
    };

    assert!(!session.complete(stale, failed).await);
    assert_eq!(
        session.state().await,
        DashboardState::Loading { week: current.week }
    );
}

#[tokio::test]
async fn requested_week_overrides_default() {
    let api = RecordingAnalytics::new();
    api.script_availability(Reply::Ok(long_range(&[("2024-01-08", 120)])))
        .await;
    api.script_week(week("2024-01-01"), WeekScript::healthy(40)).await;

    let session = session(&api, "2024-01-17");
    session.mount(Some(week("2024-01-03"))).await;

    assert_eq!(session.selected().await, week("2024-01-01"));
    assert_eq!(session.state().await.week(), Some(week("2024-01-01")));
}

#[tokio::test]
async fn week_queries_run_concurrently() {
    let api = RecordingAnalytics::new();
    api.script_week(week("2024-01-08"), WeekScript::healthy(120).delayed(40))
        .await;

    let session = session(&api, "2024-01-08");
    assert!(session.select(week("2024-01-08")).await);
    assert_eq!(api.max_in_flight(), 4);
}

#[tokio::test]
async fn older_selection_never_overwrites_newer() {
    let api = RecordingAnalytics::new();
    api.script_week(week("2024-01-01"), WeekScript::healthy(80).delayed(80))
        .await;
    api.script_week(week("2024-01-08"), WeekScript::healthy(120).delayed(5))
        .await;

    let session = session(&api, "2024-01-08");
    let (first, second) = tokio::join!(
        session.select(week("2024-01-01")),
        session.select(week("2024-01-08"))
    );

    assert!(!first, "slow pass for the older week must be discarded");
    assert!(second);
    assert_eq!(session.selected().await, week("2024-01-08"));
    let DashboardState::Ready(view) = session.state().await else {
        panic!("expected ready dashboard");
    };
    assert_eq!(view.week, week("2024-01-08"));
    assert_eq!(view.headline.volume, 120);
}

#[tokio::test]
async fn older_selection_is_discarded_even_when_it_settles_first() {
    let api = RecordingAnalytics::new();
    api.script_week(week("2024-01-01"), WeekScript::healthy(80).delayed(5))
        .await;
    api.script_week(week("2024-01-08"), WeekScript::healthy(120).delayed(60))
        .await;

    let session = session(&api, "2024-01-08");
    let (first, second) = tokio::join!(
        session.select(week("2024-01-01")),
        session.select(week("2024-01-08"))
    );

    assert!(!first);
    assert!(second);
    assert_eq!(session.state().await.week(), Some(week("2024-01-08")));
}

#[tokio::test]
async fn trend_failure_blocks_regardless_of_enhancements() {
    let api = RecordingAnalytics::new();
    let mut script = WeekScript::healthy(120);
    script.trends = Reply::Fail(500, None);
    api.script_week(week("2024-01-08"), script).await;

    let session = session(&api, "2024-01-08");
    session.select(week("2024-01-08")).await;

    assert_eq!(
        session.state().await,
        DashboardState::Failed {
            week: week("2024-01-08"),
            message: LOAD_FAILED.into(),
        }
    );
}

#[tokio::test]
async fn backend_detail_surfaces_in_error_banner() {
    let api = RecordingAnalytics::new();
    let mut script = WeekScript::healthy(120);
    script.insights = Reply::Fail(400, Some("Invalid week_start format"));
    api.script_week(week("2024-01-08"), script).await;

    let session = session(&api, "2024-01-08");
    session.select(week("2024-01-08")).await;

    let DashboardState::Failed { message, .. } = session.state().await else {
        panic!("expected failure");
    };
    assert_eq!(message, "Invalid week_start format");
}

#[tokio::test]
async fn zero_volume_week_shows_no_data() {
    let api = RecordingAnalytics::new();
    let mut script = WeekScript::healthy(0);
    script.trends = Reply::Ok(trends(0, 0));
    api.script_week(week("2024-01-08"), script).await;

    let session = session(&api, "2024-01-08");
    session.select(week("2024-01-08")).await;

    assert_eq!(
        session.state().await,
        DashboardState::NoData {
            week: week("2024-01-08")
        }
    );
}

#[tokio::test]
async fn enhancement_failures_keep_dashboard_usable() {
    let api = RecordingAnalytics::new();
    let mut script = WeekScript::healthy(120);
    script.long_range = Reply::Fail(500, Some("boom"));
    script.heatmap = Reply::Fail(404, None);
    api.script_week(week("2024-01-08"), script).await;

    let session = session(&api, "2024-01-08");
    session.select(week("2024-01-08")).await;

    let DashboardState::Ready(view) = session.state().await else {
        panic!("expected ready dashboard");
    };
    assert!(view.long_range.is_none());
    assert!(view.heatmap.is_none());
    assert_eq!(view.distribution.len(), 3);
}

#[tokio::test]
async fn first_week_with_data_has_no_deltas() {
    let api = RecordingAnalytics::new();
    let mut script = WeekScript::healthy(50);
    script.trends = Reply::Ok(trends(50, 0));
    api.script_week(week("2024-01-08"), script).await;

    let session = session(&api, "2024-01-08");
    session.select(week("2024-01-08")).await;

    let DashboardState::Ready(view) = session.state().await else {
        panic!("expected ready dashboard");
    };
    assert_eq!(view.headline.overall_change, None);
    assert_eq!(view.headline.volume_change, None);
}

#[tokio::test]
async fn action_items_are_ranked_and_capped() {
    let api = RecordingAnalytics::new();
    let items = (0..7)
        .map(|i| ActionItem {
            priority: if i == 6 { Priority::Urgent } else { Priority::Low },
            category: Some("trainer_feedback".into()),
            title: format!("item {i}"),
            description: String::new(),
            confidence_score: Some(0.5),
            assigned_to: None,
        })
        .collect();
    let mut script = WeekScript::healthy(120);
    script.insights = Reply::Ok(InsightBundle {
        action_items: Some(items),
        ..Default::default()
    });
    api.script_week(week("2024-01-08"), script).await;

    let session = session(&api, "2024-01-08");
    session.select(week("2024-01-08")).await;

    let DashboardState::Ready(view) = session.state().await else {
        panic!("expected ready dashboard");
    };
    let shown = view.insights.action_items.as_ref().unwrap();
    assert_eq!(shown.len(), 5);
    assert_eq!(view.insights.action_items_total, 7);
    assert_eq!(shown[0].title, "item 6");
    assert_eq!(shown[1].title, "item 0");
}

#[tokio::test]
async fn refresh_reissues_current_week() {
    let api = RecordingAnalytics::new();
    api.script_week(week("2024-01-08"), WeekScript::healthy(120)).await;

    let session = session(&api, "2024-01-08");
    session.select(week("2024-01-08")).await;
    session.refresh().await;

    let trend_calls = api
        .calls()
        .await
        .into_iter()
        .filter(|c| *c == Call::Trends(week("2024-01-08")))
        .count();
    assert_eq!(trend_calls, 2);
}
