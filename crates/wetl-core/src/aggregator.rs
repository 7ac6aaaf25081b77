//! Daily aggregation of hourly weather series
//!
//! Hourly samples are bucketed by UTC calendar date, reduced into 24h and
//! daylight-window averages/totals, converted to metric units, and
//! assembled into one [`DailyRecord`] per day.

use crate::rollups::{daylight_average, daylight_sum, reduce_at, Reduction};
use crate::types::{DailyRecord, DailySeries, ForecastResponse, HourlyChannel, HourlySeries, Timestamp};
use crate::units::{round, seconds_to_hours, unix_to_iso_utc, Conversion, OUTPUT_DECIMALS};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Aggregation error
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransformError {
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
}

pub type TransformResult<T> = Result<T, TransformError>;

/// UTC calendar date of a Unix timestamp
pub fn utc_date(timestamp: Timestamp) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

/// Hourly sample positions grouped by UTC calendar date
#[derive(Debug, Default)]
pub struct DayBuckets {
    order: Vec<NaiveDate>,
    indices: HashMap<NaiveDate, Vec<usize>>,
}

impl DayBuckets {
    /// Bucket every timestamp in one pass
    ///
    /// Days keep the order in which they first appear; timestamps may be
    /// unsorted or have gaps.
    pub fn from_timestamps(timestamps: &[Timestamp]) -> Self {
        let mut buckets = Self::default();
        for (i, &ts) in timestamps.iter().enumerate() {
            let Some(date) = utc_date(ts) else {
                warn!(timestamp = ts, "skipping unrepresentable hourly timestamp");
                continue;
            };
            buckets
                .indices
                .entry(date)
                .or_insert_with(|| {
                    buckets.order.push(date);
                    Vec::new()
                })
                .push(i);
        }
        buckets
    }

    /// Distinct days in first-occurrence order
    pub fn days(&self) -> &[NaiveDate] {
        &self.order
    }

    /// Positions of the samples falling on `date`
    pub fn indices(&self, date: NaiveDate) -> &[usize] {
        self.indices.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One day to emit, with its astronomical data when known
#[derive(Debug, Clone, Copy)]
struct DayPlan {
    date: NaiveDate,
    sunrise: Option<Timestamp>,
    sunset: Option<Timestamp>,
    daylight_duration: Option<f64>,
}

impl DayPlan {
    fn hourly_only(date: NaiveDate) -> Self {
        Self {
            date,
            sunrise: None,
            sunset: None,
            daylight_duration: None,
        }
    }
}

fn plan_days(daily: Option<&DailySeries>, buckets: &DayBuckets) -> Vec<DayPlan> {
    match daily.filter(|d| !d.timestamps.is_empty()) {
        Some(daily) => daily
            .timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = utc_date(ts)?;
                Some(DayPlan {
                    date,
                    sunrise: daily.sunrise_at(i),
                    sunset: daily.sunset_at(i),
                    daylight_duration: daily.daylight_duration_at(i),
                })
            })
            .collect(),
        None => {
            warn!("Missing daily data, processing only hourly data");
            buckets.days().iter().copied().map(DayPlan::hourly_only).collect()
        }
    }
}

fn rounded(value: Option<f64>) -> Option<f64> {
    value.map(|v| round(v, OUTPUT_DECIMALS))
}

/// Aggregate a full payload using its own coordinates
pub fn transform_response(response: &ForecastResponse) -> TransformResult<Vec<DailyRecord>> {
    aggregate(
        response.latitude,
        response.longitude,
        response.hourly.as_ref(),
        response.daily.as_ref(),
    )
}

/// Aggregate hourly series into daily records, stamped with the current time
pub fn aggregate(
    latitude: f64,
    longitude: f64,
    hourly: Option<&HourlySeries>,
    daily: Option<&DailySeries>,
) -> TransformResult<Vec<DailyRecord>> {
    aggregate_at(latitude, longitude, hourly, daily, Utc::now())
}

/// Aggregate hourly series into daily records
///
/// With a non-empty `daily` series the emitted days follow
/// `daily.timestamps`, and days without hourly samples are skipped.
/// Otherwise every distinct hourly day is emitted, without daylight data.
pub fn aggregate_at(
    latitude: f64,
    longitude: f64,
    hourly: Option<&HourlySeries>,
    daily: Option<&DailySeries>,
    created_at: DateTime<Utc>,
) -> TransformResult<Vec<DailyRecord>> {
    let hourly = hourly.ok_or(TransformError::InvalidInput("hourly series is required"))?;

    info!(latitude, longitude, "Transforming weather data");

    if hourly.timestamps.is_empty() {
        warn!("Hourly series has no timestamps");
        return Ok(Vec::new());
    }

    let buckets = DayBuckets::from_timestamps(&hourly.timestamps);
    let plans = plan_days(daily, &buckets);

    let mut records = Vec::with_capacity(plans.len());
    for plan in plans {
        let indices = buckets.indices(plan.date);
        if indices.is_empty() {
            warn!(date = %plan.date, "No hourly data found for date");
            continue;
        }
        debug!(date = %plan.date, samples = indices.len(), "Aggregating day");
        records.push(build_record(
            latitude, longitude, hourly, &plan, indices, created_at,
        ));
    }

    info!(records = records.len(), "Transformed weather records");
    Ok(records)
}

fn build_record(
    latitude: f64,
    longitude: f64,
    hourly: &HourlySeries,
    plan: &DayPlan,
    indices: &[usize],
    created_at: DateTime<Utc>,
) -> DailyRecord {
    use HourlyChannel::*;

    let day = |reduction: Reduction, channel: HourlyChannel| {
        hourly
            .channel(channel)
            .and_then(|values| reduce_at(reduction, values, indices))
    };

    // Unrounded 24h values; rounding happens once per stored field
    let temperature_2m = day(Reduction::Avg, Temperature2m);
    let apparent_temperature = day(Reduction::Avg, ApparentTemperature);
    let temperature_80m = day(Reduction::Avg, Temperature80m);
    let temperature_120m = day(Reduction::Avg, Temperature120m);
    let wind_speed_10m = day(Reduction::Avg, WindSpeed10m);
    let wind_speed_80m = day(Reduction::Avg, WindSpeed80m);
    let rain = day(Reduction::Sum, Rain);
    let showers = day(Reduction::Sum, Showers);
    let snowfall = day(Reduction::Sum, Snowfall);

    let mut record = DailyRecord::new(plan.date, latitude, longitude, created_at);

    record.avg_temperature_2m_24h = rounded(temperature_2m);
    record.avg_relative_humidity_2m_24h = rounded(day(Reduction::Avg, RelativeHumidity2m));
    record.avg_dew_point_2m_24h = rounded(day(Reduction::Avg, DewPoint2m));
    record.avg_apparent_temperature_24h = rounded(apparent_temperature);
    record.avg_temperature_80m_24h = rounded(temperature_80m);
    record.avg_temperature_120m_24h = rounded(temperature_120m);
    record.avg_wind_speed_10m_24h = rounded(wind_speed_10m);
    record.avg_wind_speed_80m_24h = rounded(wind_speed_80m);
    record.avg_visibility_24h = rounded(day(Reduction::Avg, Visibility));
    record.total_rain_24h = rounded(rain);
    record.total_showers_24h = rounded(showers);
    record.total_snowfall_24h = rounded(snowfall);

    record.wind_speed_10m_m_per_s = Conversion::KnotsToMetersPerSecond.apply(wind_speed_10m);
    record.wind_speed_80m_m_per_s = Conversion::KnotsToMetersPerSecond.apply(wind_speed_80m);
    record.temperature_2m_celsius = Conversion::FahrenheitToCelsius.apply(temperature_2m);
    record.apparent_temperature_celsius =
        Conversion::FahrenheitToCelsius.apply(apparent_temperature);
    record.temperature_80m_celsius = Conversion::FahrenheitToCelsius.apply(temperature_80m);
    record.temperature_120m_celsius = Conversion::FahrenheitToCelsius.apply(temperature_120m);
    record.soil_temperature_0cm_celsius =
        Conversion::FahrenheitToCelsius.apply(day(Reduction::Avg, SoilTemperature0cm));
    record.soil_temperature_6cm_celsius =
        Conversion::FahrenheitToCelsius.apply(day(Reduction::Avg, SoilTemperature6cm));
    record.rain_mm = Conversion::InchesToMillimeters.apply(rain);
    record.showers_mm = Conversion::InchesToMillimeters.apply(showers);
    record.snowfall_mm = Conversion::InchesToMillimeters.apply(snowfall);

    if let (Some(sunrise), Some(sunset)) = (plan.sunrise, plan.sunset) {
        // The window is checked against the whole series, not just this
        // day's bucket.
        let light = |reduction: Reduction, channel: HourlyChannel| {
            let values = hourly.channel(channel)?;
            let value = match reduction {
                Reduction::Avg => {
                    daylight_average(values, &hourly.timestamps, Some(sunrise), Some(sunset))
                }
                Reduction::Sum => {
                    daylight_sum(values, &hourly.timestamps, Some(sunrise), Some(sunset))
                }
            };
            rounded(value)
        };

        record.avg_temperature_2m_daylight = light(Reduction::Avg, Temperature2m);
        record.avg_relative_humidity_2m_daylight = light(Reduction::Avg, RelativeHumidity2m);
        record.avg_dew_point_2m_daylight = light(Reduction::Avg, DewPoint2m);
        record.avg_apparent_temperature_daylight = light(Reduction::Avg, ApparentTemperature);
        record.avg_temperature_80m_daylight = light(Reduction::Avg, Temperature80m);
        record.avg_temperature_120m_daylight = light(Reduction::Avg, Temperature120m);
        record.avg_wind_speed_10m_daylight = light(Reduction::Avg, WindSpeed10m);
        record.avg_wind_speed_80m_daylight = light(Reduction::Avg, WindSpeed80m);
        record.avg_visibility_daylight = light(Reduction::Avg, Visibility);
        record.total_rain_daylight = light(Reduction::Sum, Rain);
        record.total_showers_daylight = light(Reduction::Sum, Showers);
        record.total_snowfall_daylight = light(Reduction::Sum, Snowfall);
    }

    record.sunrise_iso = plan.sunrise.and_then(unix_to_iso_utc);
    record.sunset_iso = plan.sunset.and_then(unix_to_iso_utc);
    record.daylight_hours = plan
        .daylight_duration
        .filter(|s| s.is_finite())
        .map(|s| round(seconds_to_hours(s), OUTPUT_DECIMALS));

    record
}
