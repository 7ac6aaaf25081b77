//! Core data types for weather time series and daily records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timestamp type (Unix epoch seconds, UTC)
pub type Timestamp = i64;

/// One hourly channel: absent entirely, or a list of nullable samples
pub type Channel = Option<Vec<Option<f64>>>;

/// Full payload returned by the forecast/archive API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generationtime_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone_abbreviation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,

    /// Channel name -> unit label, as reported by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_units: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<HourlySeries>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_units: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<DailySeries>,
}

/// Hourly samples; every channel is aligned to `timestamps` by index
///
/// Channels may be shorter or longer than `timestamps`, so every lookup
/// must be bounds-checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HourlySeries {
    #[serde(rename = "time", default)]
    pub timestamps: Vec<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_2m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_humidity_2m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dew_point_2m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apparent_temperature: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_80m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_120m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_10m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_80m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction_10m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction_80m: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evapotranspiration: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_code: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_temperature_0cm: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_temperature_6cm: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showers: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowfall: Channel,
}

/// Named hourly channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HourlyChannel {
    Temperature2m,
    RelativeHumidity2m,
    DewPoint2m,
    ApparentTemperature,
    Temperature80m,
    Temperature120m,
    WindSpeed10m,
    WindSpeed80m,
    WindDirection10m,
    WindDirection80m,
    Visibility,
    Evapotranspiration,
    WeatherCode,
    SoilTemperature0cm,
    SoilTemperature6cm,
    Rain,
    Showers,
    Snowfall,
}

impl HourlyChannel {
    /// Every channel, in the order the API is asked for them
    pub const ALL: [HourlyChannel; 18] = [
        HourlyChannel::Temperature2m,
        HourlyChannel::RelativeHumidity2m,
        HourlyChannel::DewPoint2m,
        HourlyChannel::ApparentTemperature,
        HourlyChannel::Temperature80m,
        HourlyChannel::Temperature120m,
        HourlyChannel::WindSpeed10m,
        HourlyChannel::WindSpeed80m,
        HourlyChannel::WindDirection10m,
        HourlyChannel::WindDirection80m,
        HourlyChannel::Visibility,
        HourlyChannel::Evapotranspiration,
        HourlyChannel::WeatherCode,
        HourlyChannel::SoilTemperature0cm,
        HourlyChannel::SoilTemperature6cm,
        HourlyChannel::Rain,
        HourlyChannel::Showers,
        HourlyChannel::Snowfall,
    ];

    /// Wire name used by the API
    pub fn key(self) -> &'static str {
        match self {
            HourlyChannel::Temperature2m => "temperature_2m",
            HourlyChannel::RelativeHumidity2m => "relative_humidity_2m",
            HourlyChannel::DewPoint2m => "dew_point_2m",
            HourlyChannel::ApparentTemperature => "apparent_temperature",
            HourlyChannel::Temperature80m => "temperature_80m",
            HourlyChannel::Temperature120m => "temperature_120m",
            HourlyChannel::WindSpeed10m => "wind_speed_10m",
            HourlyChannel::WindSpeed80m => "wind_speed_80m",
            HourlyChannel::WindDirection10m => "wind_direction_10m",
            HourlyChannel::WindDirection80m => "wind_direction_80m",
            HourlyChannel::Visibility => "visibility",
            HourlyChannel::Evapotranspiration => "evapotranspiration",
            HourlyChannel::WeatherCode => "weather_code",
            HourlyChannel::SoilTemperature0cm => "soil_temperature_0cm",
            HourlyChannel::SoilTemperature6cm => "soil_temperature_6cm",
            HourlyChannel::Rain => "rain",
            HourlyChannel::Showers => "showers",
            HourlyChannel::Snowfall => "snowfall",
        }
    }
}

impl HourlySeries {
    /// Samples of one channel, if the API returned it
    pub fn channel(&self, channel: HourlyChannel) -> Option<&[Option<f64>]> {
        let values = match channel {
            HourlyChannel::Temperature2m => &self.temperature_2m,
            HourlyChannel::RelativeHumidity2m => &self.relative_humidity_2m,
            HourlyChannel::DewPoint2m => &self.dew_point_2m,
            HourlyChannel::ApparentTemperature => &self.apparent_temperature,
            HourlyChannel::Temperature80m => &self.temperature_80m,
            HourlyChannel::Temperature120m => &self.temperature_120m,
            HourlyChannel::WindSpeed10m => &self.wind_speed_10m,
            HourlyChannel::WindSpeed80m => &self.wind_speed_80m,
            HourlyChannel::WindDirection10m => &self.wind_direction_10m,
            HourlyChannel::WindDirection80m => &self.wind_direction_80m,
            HourlyChannel::Visibility => &self.visibility,
            HourlyChannel::Evapotranspiration => &self.evapotranspiration,
            HourlyChannel::WeatherCode => &self.weather_code,
            HourlyChannel::SoilTemperature0cm => &self.soil_temperature_0cm,
            HourlyChannel::SoilTemperature6cm => &self.soil_temperature_6cm,
            HourlyChannel::Rain => &self.rain,
            HourlyChannel::Showers => &self.showers,
            HourlyChannel::Snowfall => &self.snowfall,
        };
        values.as_deref()
    }
}

/// Per-day astronomical data, indexed by day
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailySeries {
    /// Midnight UTC of each day
    #[serde(rename = "time", default)]
    pub timestamps: Vec<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<Vec<Option<Timestamp>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<Vec<Option<Timestamp>>>,

    /// Seconds of daylight; the API reports fractional seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daylight_duration: Option<Vec<Option<f64>>>,
}

impl DailySeries {
    pub fn sunrise_at(&self, day: usize) -> Option<Timestamp> {
        self.sunrise.as_ref()?.get(day).copied().flatten()
    }

    pub fn sunset_at(&self, day: usize) -> Option<Timestamp> {
        self.sunset.as_ref()?.get(day).copied().flatten()
    }

    pub fn daylight_duration_at(&self, day: usize) -> Option<f64> {
        self.daylight_duration.as_ref()?.get(day).copied().flatten()
    }
}

/// Aggregated weather for one calendar day at one location
///
/// Field order is the column order of the CSV export and the database row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,

    // 24h averages and totals (source units)
    pub avg_temperature_2m_24h: Option<f64>,
    pub avg_relative_humidity_2m_24h: Option<f64>,
    pub avg_dew_point_2m_24h: Option<f64>,
    pub avg_apparent_temperature_24h: Option<f64>,
    pub avg_temperature_80m_24h: Option<f64>,
    pub avg_temperature_120m_24h: Option<f64>,
    pub avg_wind_speed_10m_24h: Option<f64>,
    pub avg_wind_speed_80m_24h: Option<f64>,
    pub avg_visibility_24h: Option<f64>,
    pub total_rain_24h: Option<f64>,
    pub total_showers_24h: Option<f64>,
    pub total_snowfall_24h: Option<f64>,

    // Daylight averages and totals (source units)
    pub avg_temperature_2m_daylight: Option<f64>,
    pub avg_relative_humidity_2m_daylight: Option<f64>,
    pub avg_dew_point_2m_daylight: Option<f64>,
    pub avg_apparent_temperature_daylight: Option<f64>,
    pub avg_temperature_80m_daylight: Option<f64>,
    pub avg_temperature_120m_daylight: Option<f64>,
    pub avg_wind_speed_10m_daylight: Option<f64>,
    pub avg_wind_speed_80m_daylight: Option<f64>,
    pub avg_visibility_daylight: Option<f64>,
    pub total_rain_daylight: Option<f64>,
    pub total_showers_daylight: Option<f64>,
    pub total_snowfall_daylight: Option<f64>,

    // Metric conversions of the 24h values
    pub wind_speed_10m_m_per_s: Option<f64>,
    pub wind_speed_80m_m_per_s: Option<f64>,
    pub temperature_2m_celsius: Option<f64>,
    pub apparent_temperature_celsius: Option<f64>,
    pub temperature_80m_celsius: Option<f64>,
    pub temperature_120m_celsius: Option<f64>,
    pub soil_temperature_0cm_celsius: Option<f64>,
    pub soil_temperature_6cm_celsius: Option<f64>,
    pub rain_mm: Option<f64>,
    pub showers_mm: Option<f64>,
    pub snowfall_mm: Option<f64>,

    pub daylight_hours: Option<f64>,
    pub sunrise_iso: Option<String>,
    pub sunset_iso: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl DailyRecord {
    /// Empty record for a day; every aggregate absent
    pub fn new(date: NaiveDate, latitude: f64, longitude: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            date,
            latitude,
            longitude,
            avg_temperature_2m_24h: None,
            avg_relative_humidity_2m_24h: None,
            avg_dew_point_2m_24h: None,
            avg_apparent_temperature_24h: None,
            avg_temperature_80m_24h: None,
            avg_temperature_120m_24h: None,
            avg_wind_speed_10m_24h: None,
            avg_wind_speed_80m_24h: None,
            avg_visibility_24h: None,
            total_rain_24h: None,
            total_showers_24h: None,
            total_snowfall_24h: None,
            avg_temperature_2m_daylight: None,
            avg_relative_humidity_2m_daylight: None,
            avg_dew_point_2m_daylight: None,
            avg_apparent_temperature_daylight: None,
            avg_temperature_80m_daylight: None,
            avg_temperature_120m_daylight: None,
            avg_wind_speed_10m_daylight: None,
            avg_wind_speed_80m_daylight: None,
            avg_visibility_daylight: None,
            total_rain_daylight: None,
            total_showers_daylight: None,
            total_snowfall_daylight: None,
            wind_speed_10m_m_per_s: None,
            wind_speed_80m_m_per_s: None,
            temperature_2m_celsius: None,
            apparent_temperature_celsius: None,
            temperature_80m_celsius: None,
            temperature_120m_celsius: None,
            soil_temperature_0cm_celsius: None,
            soil_temperature_6cm_celsius: None,
            rain_mm: None,
            showers_mm: None,
            snowfall_mm: None,
            daylight_hours: None,
            sunrise_iso: None,
            sunset_iso: None,
            created_at,
        }
    }

    /// Upsert key: one row per (date, latitude, longitude)
    pub fn key(&self) -> (NaiveDate, f64, f64) {
        (self.date, self.latitude, self.longitude)
    }
}

/// A distinct stored location
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
}

/// Summary of what the record store holds
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_records: i64,
    pub unique_locations: usize,
    pub locations: Vec<LocationInfo>,
}
