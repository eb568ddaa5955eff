use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One raw measurement row per station per hour, as stored upstream.
/// Every measurement is optional; collectors drop fields they could not
/// read, and rainfall in particular is absent for dry hours.
#[derive(Debug, Clone)]
pub struct HourlyObservation {
    pub station_id: i64,
    pub observed_at: DateTime<Utc>,
    pub temp: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub rain_1h: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub weather_description: Option<String>,
}

/// One aggregated row per station per local calendar day.
/// `observed_on` carries the resolved local date at midnight UTC, not any
/// of the per-hour timestamps that produced it.
#[derive(Debug, Clone)]
pub struct StationDaySummary {
    pub station_id: i64,
    pub observed_on: DateTime<Utc>,
    pub temp: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub rainfall: f64,
    pub wind_speed: Option<f64>,
    pub wind_gust_max: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub weather_description: Option<String>,
}

/// Counts from one insert pass over the summary records.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub failed: usize,
}

/// Structured outcome of a full run, emitted as one JSON log line so a
/// monitor does not have to scrape per-record lines.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub local_date: NaiveDate,
    pub fetched: usize,
    pub inserted: usize,
    pub failed: usize,
}
