//! OrderHarvest CLI: harvest orders for a date range and print the summary.
//!
//! Commands:
//! - `harvest`: resolve the date window, fetch orders with their items, print the report
//! - `marketplaces`: list supported marketplace codes and their regions

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use orderharvest_core::harvest::{OrderHarvester, StdoutProgress};
use orderharvest_core::marketplace::{SpApiClient, MARKETPLACES};
use orderharvest_core::range::{self, RangeRequest};
use orderharvest_core::report::{self, RunTiming};
use orderharvest_core::throttle::Throttle;
use orderharvest_core::HarvestConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "orderharvest",
    about = "OrderHarvest CLI: collect marketplace orders for a date range"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch orders and their items, then print the summary report.
    Harvest {
        /// Orders created in the last N days.
        #[arg(short = 'd', long, short_alias = 'a', conflicts_with_all = ["year", "start"])]
        days_ago: Option<i64>,

        /// Orders created since the start of this year (or of --month in it).
        #[arg(short, long, conflicts_with = "start")]
        year: Option<i32>,

        /// Month of --year, 1-12. Defaults to January.
        #[arg(short, long, requires = "year")]
        month: Option<i32>,

        /// Start date (YYYY-MM-DD). Needs --end.
        #[arg(short, long, requires = "end")]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Needs --start.
        #[arg(short, long, requires = "start")]
        end: Option<String>,

        /// Order statuses to query. Defaults to Shipped and Unshipped.
        #[arg(short = 'S', long, num_args = 1..)]
        order_statuses: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Marketplace country code; overrides config and SP_API_STORES.
        #[arg(long)]
        marketplace: Option<String>,
    },
    /// List supported marketplaces.
    Marketplaces,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("orderharvest=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            days_ago,
            year,
            month,
            start,
            end,
            order_statuses,
            config,
            marketplace,
        } => {
            let request = RangeRequest {
                days_ago,
                year,
                month,
                start,
                end,
                statuses: order_statuses,
            };
            run_harvest(request, config, marketplace)
        }
        Commands::Marketplaces => {
            list_marketplaces();
            Ok(())
        }
    }
}

fn run_harvest(
    request: RangeRequest,
    config_path: Option<PathBuf>,
    marketplace: Option<String>,
) -> Result<()> {
    let mut config = HarvestConfig::load(config_path.as_deref())?;
    if let Some(code) = marketplace {
        config.marketplace = code;
        config.validate()?;
    }

    let filter = range::resolve(&request, Utc::now().naive_utc())?;
    let marketplace = config.marketplace()?;
    info!(
        marketplace = marketplace.country,
        created_after = %filter.created_after,
        statuses = ?filter.statuses,
        "starting harvest"
    );

    let client = SpApiClient::new(config.credentials, marketplace, config.endpoint)
        .context("failed to build marketplace client")?;
    let harvester = OrderHarvester::new(client, Throttle::new(config.pacing));

    let started = Local::now();
    let run = harvester.harvest(&filter, &StdoutProgress)?;
    let finished = Local::now();

    let summary = report::summarize(
        &run.orders,
        RunTiming::from_clock(&started, &finished),
        filter.created_after,
        &run.throttle,
    );
    print!("{summary}");
    Ok(())
}

fn list_marketplaces() {
    println!("{:<8} {:<16} REGION", "CODE", "MARKETPLACE ID");
    for marketplace in MARKETPLACES {
        println!(
            "{:<8} {:<16} {}",
            marketplace.country, marketplace.id, marketplace.region
        );
    }
}
