use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

use crate::models::{RunOutcome, StationDaySummary};
use crate::window::{self, DailyWindow};
use crate::{db, summary};

/// Resolve yesterday's window and compute its station summaries.
///
/// Window resolution failure is fatal and surfaces as an error. A failing
/// hourly query is degraded, not fatal: it is logged and the result is
/// simply empty, so the rest of the run becomes a no-op.
pub async fn compute_yesterday_summaries(
    pool: &PgPool,
) -> anyhow::Result<(DailyWindow, Vec<StationDaySummary>)> {
    let window = window::resolve_yesterday(Utc::now())
        .context("failed to resolve yesterday's local day window")?;
    info!(
        "summarizing weather for {} (utc range {} to {})",
        window.local_date, window.start_utc, window.end_utc
    );

    let observations = match db::fetch_hourly_observations(pool, &window).await {
        Ok(observations) => observations,
        Err(err) => {
            error!("hourly observation query failed: {err:#}");
            Vec::new()
        }
    };

    let summaries = summary::summarize_stations(window.local_date, &observations);
    info!("fetched {} station summaries", summaries.len());
    Ok((window, summaries))
}

/// The nightly job: compute yesterday's summaries and load them.
pub async fn run(pool: &PgPool) -> anyhow::Result<RunOutcome> {
    info!("starting daily weather summary run");

    let (window, summaries) = compute_yesterday_summaries(pool).await?;
    let report = db::insert_daily_summaries(pool, &summaries).await?;

    let outcome = RunOutcome {
        local_date: window.local_date,
        fetched: summaries.len(),
        inserted: report.inserted,
        failed: report.failed,
    };
    info!("daily weather summary run completed");
    info!(
        "run outcome: {}",
        serde_json::to_string(&outcome).context("failed to serialize run outcome")?
    );
    Ok(outcome)
}
