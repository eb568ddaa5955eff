use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Acquire, PgPool, Postgres, Row, Transaction};
use tracing::{error, info};
use uuid::Uuid;

use crate::coerce;
use crate::models::{HourlyObservation, LoadReport, StationDaySummary};
use crate::window::{self, DailyWindow};

/// Fixed audit identity stamped on every row this job writes.
const JOB_IDENTITY: &str = "weather-daily-etl";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let window = window::resolve_yesterday(Utc::now())?;
    for obs in sample_day(&window) {
        insert_hourly(pool, &obs).await?;
    }
    Ok(())
}

/// A plausible day of readings for two stations, spread across yesterday's
/// local hours so `run` straight after `seed` has something to summarize.
fn sample_day(window: &DailyWindow) -> Vec<HourlyObservation> {
    let samples: [(i64, i64, f64, f64, Option<f64>, &str); 8] = [
        (1001, 1, 24.9, 88.0, None, "clear sky"),
        (1001, 7, 27.3, 79.0, None, "few clouds"),
        (1001, 13, 32.1, 58.0, Some(0.4), "light rain"),
        (1001, 19, 28.6, 72.0, Some(1.1), "moderate rain"),
        (1002, 1, 23.4, 91.0, None, "clear sky"),
        (1002, 7, 26.0, 84.0, None, "scattered clouds"),
        (1002, 13, 30.8, 61.0, None, "broken clouds"),
        (1002, 19, 27.2, 76.0, Some(0.2), "light rain"),
    ];

    samples
        .into_iter()
        .map(|(station_id, hour, temp, humidity, rain_1h, description)| {
            HourlyObservation {
                station_id,
                observed_at: window.start_utc + Duration::hours(hour),
                temp: Some(temp),
                temp_max: Some(temp + 0.8),
                temp_min: Some(temp - 0.6),
                feels_like: Some(temp + 2.1),
                humidity: Some(humidity),
                pressure: Some(1008.5),
                rain_1h,
                wind_speed: Some(2.8),
                wind_gust: Some(5.6),
                cloud_cover: Some(if rain_1h.is_some() { 85.0 } else { 30.0 }),
                weather_description: Some(description.to_string()),
            }
        })
        .collect()
}

async fn insert_hourly(pool: &PgPool, obs: &HourlyObservation) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO weather.hourly_observations
        (id, station_id, observed_at, temp, temp_max, temp_min, feels_like,
         humidity, pressure, rain_1h, wind_speed, wind_gust, cloud_cover,
         weather_description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (station_id, observed_at) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(obs.station_id)
    .bind(obs.observed_at)
    .bind(obs.temp)
    .bind(obs.temp_max)
    .bind(obs.temp_min)
    .bind(obs.feels_like)
    .bind(obs.humidity)
    .bind(obs.pressure)
    .bind(obs.rain_1h)
    .bind(obs.wind_speed)
    .bind(obs.wind_gust)
    .bind(obs.cloud_cover)
    .bind(&obs.weather_description)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Backfill hourly observations from a CSV export. Numeric fields are
/// parsed leniently: an unparseable value lands as null, it does not skip
/// the row. Hours already present are skipped via the natural key.
pub async fn import_hourly_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        station_id: i64,
        observed_at: DateTime<Utc>,
        temp: Option<String>,
        temp_max: Option<String>,
        temp_min: Option<String>,
        feels_like: Option<String>,
        humidity: Option<String>,
        pressure: Option<String>,
        rain_1h: Option<String>,
        wind_speed: Option<String>,
        wind_gust: Option<String>,
        cloud_cover: Option<String>,
        weather_description: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let obs = HourlyObservation {
            station_id: row.station_id,
            observed_at: row.observed_at,
            temp: coerce::safe_cast(row.temp.as_deref()),
            temp_max: coerce::safe_cast(row.temp_max.as_deref()),
            temp_min: coerce::safe_cast(row.temp_min.as_deref()),
            feels_like: coerce::safe_cast(row.feels_like.as_deref()),
            humidity: coerce::safe_cast(row.humidity.as_deref()),
            pressure: coerce::safe_cast(row.pressure.as_deref()),
            rain_1h: coerce::safe_cast(row.rain_1h.as_deref()),
            wind_speed: coerce::safe_cast(row.wind_speed.as_deref()),
            wind_gust: coerce::safe_cast(row.wind_gust.as_deref()),
            cloud_cover: coerce::safe_cast(row.cloud_cover.as_deref()),
            weather_description: row
                .weather_description
                .filter(|desc| !desc.trim().is_empty()),
        };

        if insert_hourly(pool, &obs).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// One range query over the window, inclusive on both bounds, ordered so
/// downstream grouping sees rows in store order per station.
pub async fn fetch_hourly_observations(
    pool: &PgPool,
    window: &DailyWindow,
) -> anyhow::Result<Vec<HourlyObservation>> {
    let rows = sqlx::query(
        r#"
        SELECT station_id, observed_at, temp, temp_max, temp_min, feels_like,
               humidity, pressure, rain_1h, wind_speed, wind_gust, cloud_cover,
               weather_description
        FROM weather.hourly_observations
        WHERE observed_at >= $1 AND observed_at <= $2
        ORDER BY station_id, observed_at
        "#,
    )
    .bind(window.start_utc)
    .bind(window.end_utc)
    .fetch_all(pool)
    .await
    .context("hourly observation query failed")?;

    let mut observations = Vec::with_capacity(rows.len());
    for row in rows {
        observations.push(HourlyObservation {
            station_id: row.try_get("station_id")?,
            observed_at: row.try_get("observed_at")?,
            temp: coerce::safe_get(&row, "temp"),
            temp_max: coerce::safe_get(&row, "temp_max"),
            temp_min: coerce::safe_get(&row, "temp_min"),
            feels_like: coerce::safe_get(&row, "feels_like"),
            humidity: coerce::safe_get(&row, "humidity"),
            pressure: coerce::safe_get(&row, "pressure"),
            rain_1h: coerce::safe_get(&row, "rain_1h"),
            wind_speed: coerce::safe_get(&row, "wind_speed"),
            wind_gust: coerce::safe_get(&row, "wind_gust"),
            cloud_cover: coerce::safe_get(&row, "cloud_cover"),
            weather_description: coerce::safe_get(&row, "weather_description"),
        });
    }

    Ok(observations)
}

/// Insert one row per summary under a single outer transaction, with a
/// savepoint around each record: a failing insert rolls back that record
/// alone and the loop continues. One final commit covers the survivors.
pub async fn insert_daily_summaries(
    pool: &PgPool,
    summaries: &[StationDaySummary],
) -> anyhow::Result<LoadReport> {
    let stamped_at = Utc::now();
    let mut tx = pool
        .begin()
        .await
        .context("failed to open load transaction")?;
    let mut inserted = 0usize;
    let mut failed = 0usize;

    for summary in summaries {
        let savepoint = tx.begin().await.context("failed to open savepoint")?;
        match insert_daily_row(savepoint, summary, stamped_at).await {
            Ok(()) => {
                inserted += 1;
                info!(
                    "inserted daily summary (station {}, date {})",
                    summary.station_id, summary.observed_on
                );
            }
            Err(err) => {
                failed += 1;
                error!("insert failed (station {}): {err:#}", summary.station_id);
            }
        }
    }

    tx.commit()
        .await
        .context("failed to commit daily summaries")?;
    info!("total successful inserts: {inserted}");

    Ok(LoadReport { inserted, failed })
}

async fn insert_daily_row(
    mut savepoint: Transaction<'_, Postgres>,
    summary: &StationDaySummary,
    stamped_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    let insert = sqlx::query(
        r#"
        INSERT INTO weather.daily_summaries
        (id, station_id, observed_on, temp, temp_max, temp_min, feels_like,
         humidity, pressure, rainfall, wind_speed, wind_gust_max, cloud_cover,
         weather_description, created_by, created_at, updated_by, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(summary.station_id)
    .bind(summary.observed_on)
    .bind(summary.temp)
    .bind(summary.temp_max)
    .bind(summary.temp_min)
    .bind(summary.feels_like)
    .bind(summary.humidity)
    .bind(summary.pressure)
    .bind(summary.rainfall)
    .bind(summary.wind_speed)
    .bind(summary.wind_gust_max)
    .bind(summary.cloud_cover)
    .bind(&summary.weather_description)
    .bind(JOB_IDENTITY)
    .bind(stamped_at)
    .bind(JOB_IDENTITY)
    .bind(stamped_at)
    .execute(&mut *savepoint)
    .await;

    match insert {
        Ok(_) => {
            savepoint.commit().await.context("failed to release savepoint")?;
            Ok(())
        }
        Err(err) => {
            savepoint
                .rollback()
                .await
                .context("failed to roll back savepoint")?;
            Err(err.into())
        }
    }
}
