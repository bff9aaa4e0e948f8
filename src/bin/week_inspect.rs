use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pulseboard::availability::AvailabilityIndex;
use pulseboard::config;
use pulseboard::gateway::{self, AnalyticsClient, Fetched};
use pulseboard::week::WeekKey;

/// Print the long-range trend feed and the weeks it marks as selectable.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Anchor week for the long-range query (defaults to this week)
    #[arg(long, value_parser = WeekKey::parse)]
    week: Option<WeekKey>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = config::load(Some(&args.config))?;
    let client = AnalyticsClient::from_config(&cfg)?;
    let anchor = args.week.unwrap_or_else(WeekKey::current);

    println!("Anchor: {} ({})", anchor, anchor.timestamp());
    let fetched = gateway::fetch_availability(&client, anchor).await;
    match &fetched {
        Fetched::Ready(lr) => {
            println!("Rows:");
            for row in &lr.trends {
                println!(
                    "  {} -> {{ label: {}, volume: {}, +{:.1} ~{:.1} -{:.1} }}",
                    row.week, row.week_label, row.volume, row.positive, row.neutral, row.negative
                );
            }
        }
        Fetched::Unavailable(reason) => println!("Feed unavailable: {:?}", reason),
    }

    let index = AvailabilityIndex::from_fetched(&fetched, anchor);
    println!("Available weeks:");
    for week in index.weeks() {
        println!("  {}", week);
    }
    println!("Default selection: {}", index.default_week());
    Ok(())
}
