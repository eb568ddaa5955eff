use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod coerce;
mod db;
mod etl;
mod models;
mod summary;
mod window;

#[derive(Parser)]
#[command(name = "weather-daily-etl")]
#[command(about = "Nightly per-station daily weather summary ETL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample day of hourly observations
    Seed,
    /// Backfill hourly observations from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute yesterday's summaries and print them, without writing
    Summarize,
    /// Run the nightly job: compute yesterday's summaries and load them
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the weather Postgres instance")?;

    // The job is sequential; one connection is all it ever uses.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let result = dispatch(cli.command, &pool).await;
    pool.close().await;

    if let Err(err) = &result {
        error!("command failed: {err:#}");
    }
    result
}

async fn dispatch(command: Commands, pool: &PgPool) -> anyhow::Result<()> {
    match command {
        Commands::InitDb => {
            db::init_db(pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(pool).await?;
            println!("Sample hourly observations inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_hourly_csv(pool, &csv).await?;
            println!(
                "Inserted {inserted} hourly observations from {}.",
                csv.display()
            );
        }
        Commands::Summarize => {
            let (window, summaries) = etl::compute_yesterday_summaries(pool).await?;
            if summaries.is_empty() {
                println!("No observations found for {}.", window.local_date);
                return Ok(());
            }
            println!("Station summaries for {}:", window.local_date);
            for record in &summaries {
                println!(
                    "- station {}: temp {} (min {}, max {}), rainfall {:.1} mm, {}",
                    record.station_id,
                    fmt_value(record.temp),
                    fmt_value(record.temp_min),
                    fmt_value(record.temp_max),
                    record.rainfall,
                    record
                        .weather_description
                        .as_deref()
                        .unwrap_or("no description"),
                );
            }
        }
        Commands::Run => {
            let outcome = etl::run(pool).await?;
            println!(
                "Summarized {} stations for {}: {} inserted, {} failed.",
                outcome.fetched, outcome.local_date, outcome.inserted, outcome.failed
            );
        }
    }

    Ok(())
}

fn fmt_value(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.1}"))
        .unwrap_or_else(|| "n/a".to_string())
}
