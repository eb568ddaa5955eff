use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{HourlyObservation, StationDaySummary};

#[derive(Debug, Default)]
struct MeanAcc {
    sum: f64,
    count: u32,
}

impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

#[derive(Debug, Default)]
struct StationAcc {
    temp: MeanAcc,
    feels_like: MeanAcc,
    humidity: MeanAcc,
    pressure: MeanAcc,
    wind_speed: MeanAcc,
    cloud_cover: MeanAcc,
    temp_max: Option<f64>,
    temp_min: Option<f64>,
    wind_gust_max: Option<f64>,
    rainfall: f64,
    description: Option<(DateTime<Utc>, String)>,
}

impl StationAcc {
    fn push(&mut self, obs: &HourlyObservation) {
        self.temp.push(obs.temp);
        self.feels_like.push(obs.feels_like);
        self.humidity.push(obs.humidity);
        self.pressure.push(obs.pressure);
        self.wind_speed.push(obs.wind_speed);
        self.cloud_cover.push(obs.cloud_cover);

        self.temp_max = fold_max(self.temp_max, obs.temp_max);
        self.temp_min = fold_min(self.temp_min, obs.temp_min);
        self.wind_gust_max = fold_max(self.wind_gust_max, obs.wind_gust);

        // A dry hour reports no rainfall at all; it still counts as zero.
        self.rainfall += obs.rain_1h.unwrap_or(0.0);

        // Latest non-null description wins. On a timestamp tie the first
        // row returned is kept; which row that is depends on store order.
        if let Some(desc) = &obs.weather_description {
            let newer = match &self.description {
                Some((held_at, _)) => obs.observed_at > *held_at,
                None => true,
            };
            if newer {
                self.description = Some((obs.observed_at, desc.clone()));
            }
        }
    }
}

fn fold_max(held: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (held, value) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (held, value) => held.or(value),
    }
}

fn fold_min(held: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (held, value) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (held, value) => held.or(value),
    }
}

/// Fold hourly observations into one summary per station, tagged with the
/// resolved local date (at midnight UTC) rather than any per-hour
/// timestamp. Output is sorted by station id so record processing order
/// and logs are deterministic.
pub fn summarize_stations(
    local_date: NaiveDate,
    rows: &[HourlyObservation],
) -> Vec<StationDaySummary> {
    let observed_on = Utc.from_utc_datetime(&local_date.and_time(NaiveTime::MIN));

    let mut stations: HashMap<i64, StationAcc> = HashMap::new();
    for obs in rows {
        stations.entry(obs.station_id).or_default().push(obs);
    }

    let mut summaries: Vec<StationDaySummary> = stations
        .into_iter()
        .map(|(station_id, acc)| StationDaySummary {
            station_id,
            observed_on,
            temp: acc.temp.mean(),
            temp_max: acc.temp_max,
            temp_min: acc.temp_min,
            feels_like: acc.feels_like.mean(),
            humidity: acc.humidity.mean(),
            pressure: acc.pressure.mean(),
            rainfall: acc.rainfall,
            wind_speed: acc.wind_speed.mean(),
            wind_gust_max: acc.wind_gust_max,
            cloud_cover: acc.cloud_cover.mean(),
            weather_description: acc.description.map(|(_, desc)| desc),
        })
        .collect();

    summaries.sort_by_key(|summary| summary.station_id);
    summaries
}
