use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use pulseboard::config;
use pulseboard::dashboard::DashboardSession;
use pulseboard::gateway::{AnalyticsApi, AnalyticsClient};
use pulseboard::insight::PresenterLimits;
use pulseboard::reports::{self, ReportCoordinator};
use pulseboard::week::WeekKey;
use pulseboard::{render, upload};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the sentiment dashboard for one week
    Dashboard {
        /// Any date inside the week; defaults to the latest week with data
        #[arg(long, value_parser = WeekKey::parse)]
        week: Option<WeekKey>,
    },
    /// Weekly report operations
    Reports {
        #[command(subcommand)]
        action: ReportAction,
    },
    /// Upload a .csv, .xlsx or .xls feedback file
    Upload { file: Option<PathBuf> },
    /// Print an example configuration file
    ExampleConfig,
}

#[derive(Debug, Subcommand)]
enum ReportAction {
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        /// Defaults to `reports.page_size`
        #[arg(long)]
        limit: Option<u32>,
    },
    Generate {
        #[arg(long, value_parser = WeekKey::parse)]
        week: Option<WeekKey>,
    },
    Show { id: i64 },
    Export {
        id: i64,
        /// Defaults to `reports.download_dir`
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::ExampleConfig = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let client = AnalyticsClient::from_config(&cfg).context("failed to build API client")?;
    info!(base_url = %client.base_url(), "analytics client ready");
    let api: Arc<dyn AnalyticsApi> = Arc::new(client);
    let limits = PresenterLimits::from(&cfg.dashboard);

    match args.command {
        Command::Dashboard { week } => {
            let session = DashboardSession::new(api, limits, WeekKey::current());
            session.mount(week).await;
            let text = render::dashboard(&session.state().await, &session.availability().await);
            print!("{}", text);
        }
        Command::Reports { action } => match action {
            ReportAction::List { skip, limit } => {
                let limit = limit.unwrap_or(cfg.reports.page_size);
                let list = reports::list(api.as_ref(), skip, limit).await?;
                print!("{}", render::report_list(&list));
            }
            ReportAction::Generate { week } => {
                let generated = reports::generate(api.as_ref(), week, cfg.reports.page_size).await?;
                println!("Generated report #{}", generated.report.id);
                if let Some(list) = generated.reports {
                    print!("\n{}", render::report_list(&list));
                }
            }
            ReportAction::Show { id } => {
                let detail = ReportCoordinator::new(api).load(id).await?;
                let view = detail.insight_view(&limits);
                print!("{}", render::report_detail(&detail, view.as_ref()));
            }
            ReportAction::Export { id, out } => {
                let dir = match out {
                    Some(dir) => dir,
                    None => {
                        cfg.ensure_dirs().context("failed to create download dir")?;
                        cfg.download_dir()
                    }
                };
                let path = reports::export_pdf(api.as_ref(), id, &dir).await?;
                println!("Saved {}", path.display());
            }
        },
        Command::Upload { file } => {
            let summary = upload::upload(api.as_ref(), file.as_deref()).await?;
            print!("{}", render::upload_summary(&summary));
        }
        Command::ExampleConfig => {}
    }

    Ok(())
}
