//! `daily_weather` table layout
//!
//! Column names and order match the fields of [`DailyRecord`] so that a
//! row maps one-to-one onto a record and onto a CSV line.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wetl_core::DailyRecord;

/// Table names
pub mod tables {
    pub const DAILY_WEATHER: &str = "daily_weather";
}

/// Upsert key; at most one row per combination
pub const KEY_COLUMNS: [&str; 3] = ["date", "latitude", "longitude"];

/// Non-key columns in record field order
pub const VALUE_COLUMNS: [&str; 39] = [
    "avg_temperature_2m_24h",
    "avg_relative_humidity_2m_24h",
    "avg_dew_point_2m_24h",
    "avg_apparent_temperature_24h",
    "avg_temperature_80m_24h",
    "avg_temperature_120m_24h",
    "avg_wind_speed_10m_24h",
    "avg_wind_speed_80m_24h",
    "avg_visibility_24h",
    "total_rain_24h",
    "total_showers_24h",
    "total_snowfall_24h",
    "avg_temperature_2m_daylight",
    "avg_relative_humidity_2m_daylight",
    "avg_dew_point_2m_daylight",
    "avg_apparent_temperature_daylight",
    "avg_temperature_80m_daylight",
    "avg_temperature_120m_daylight",
    "avg_wind_speed_10m_daylight",
    "avg_wind_speed_80m_daylight",
    "avg_visibility_daylight",
    "total_rain_daylight",
    "total_showers_daylight",
    "total_snowfall_daylight",
    "wind_speed_10m_m_per_s",
    "wind_speed_80m_m_per_s",
    "temperature_2m_celsius",
    "apparent_temperature_celsius",
    "temperature_80m_celsius",
    "temperature_120m_celsius",
    "soil_temperature_0cm_celsius",
    "soil_temperature_6cm_celsius",
    "rain_mm",
    "showers_mm",
    "snowfall_mm",
    "daylight_hours",
    "sunrise_iso",
    "sunset_iso",
    "created_at",
];

/// Columns kept from the first insert when a row is upserted again
pub const INSERT_ONLY_COLUMNS: [&str; 1] = ["created_at"];

/// Column type in the DDL
fn column_type(column: &str) -> &'static str {
    match column {
        "sunrise_iso" | "sunset_iso" => "VARCHAR(32) NULL",
        "created_at" => "DATETIME(3) NOT NULL",
        _ => "DOUBLE NULL",
    }
}

/// `CREATE TABLE IF NOT EXISTS` statement for the daily table
pub fn create_table_sql() -> String {
    let columns = VALUE_COLUMNS
        .iter()
        .map(|c| format!("    {c} {}", column_type(c)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    \
         id BIGINT AUTO_INCREMENT PRIMARY KEY,\n    \
         date DATE NOT NULL,\n    \
         latitude DOUBLE NOT NULL,\n    \
         longitude DOUBLE NOT NULL,\n\
         {columns},\n    \
         UNIQUE KEY uk_date_location (date, latitude, longitude),\n    \
         KEY idx_date (date)\n\
         )",
        table = tables::DAILY_WEATHER,
    )
}

/// One stored day
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DailyWeatherRow {
    pub id: i64,
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,

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

impl From<DailyWeatherRow> for DailyRecord {
    fn from(row: DailyWeatherRow) -> Self {
        DailyRecord {
            date: row.date,
            latitude: row.latitude,
            longitude: row.longitude,
            avg_temperature_2m_24h: row.avg_temperature_2m_24h,
            avg_relative_humidity_2m_24h: row.avg_relative_humidity_2m_24h,
            avg_dew_point_2m_24h: row.avg_dew_point_2m_24h,
            avg_apparent_temperature_24h: row.avg_apparent_temperature_24h,
            avg_temperature_80m_24h: row.avg_temperature_80m_24h,
            avg_temperature_120m_24h: row.avg_temperature_120m_24h,
            avg_wind_speed_10m_24h: row.avg_wind_speed_10m_24h,
            avg_wind_speed_80m_24h: row.avg_wind_speed_80m_24h,
            avg_visibility_24h: row.avg_visibility_24h,
            total_rain_24h: row.total_rain_24h,
            total_showers_24h: row.total_showers_24h,
            total_snowfall_24h: row.total_snowfall_24h,
            avg_temperature_2m_daylight: row.avg_temperature_2m_daylight,
            avg_relative_humidity_2m_daylight: row.avg_relative_humidity_2m_daylight,
            avg_dew_point_2m_daylight: row.avg_dew_point_2m_daylight,
            avg_apparent_temperature_daylight: row.avg_apparent_temperature_daylight,
            avg_temperature_80m_daylight: row.avg_temperature_80m_daylight,
            avg_temperature_120m_daylight: row.avg_temperature_120m_daylight,
            avg_wind_speed_10m_daylight: row.avg_wind_speed_10m_daylight,
            avg_wind_speed_80m_daylight: row.avg_wind_speed_80m_daylight,
            avg_visibility_daylight: row.avg_visibility_daylight,
            total_rain_daylight: row.total_rain_daylight,
            total_showers_daylight: row.total_showers_daylight,
            total_snowfall_daylight: row.total_snowfall_daylight,
            wind_speed_10m_m_per_s: row.wind_speed_10m_m_per_s,
            wind_speed_80m_m_per_s: row.wind_speed_80m_m_per_s,
            temperature_2m_celsius: row.temperature_2m_celsius,
            apparent_temperature_celsius: row.apparent_temperature_celsius,
            temperature_80m_celsius: row.temperature_80m_celsius,
            temperature_120m_celsius: row.temperature_120m_celsius,
            soil_temperature_0cm_celsius: row.soil_temperature_0cm_celsius,
            soil_temperature_6cm_celsius: row.soil_temperature_6cm_celsius,
            rain_mm: row.rain_mm,
            showers_mm: row.showers_mm,
            snowfall_mm: row.snowfall_mm,
            daylight_hours: row.daylight_hours,
            sunrise_iso: row.sunrise_iso,
            sunset_iso: row.sunset_iso,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_match_record_fields() {
        let record = DailyRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            1.0,
            2.0,
            DateTime::from_timestamp(0, 0).unwrap(),
        );
        let value = serde_json::to_value(&record).unwrap();
        let fields: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        let mut columns: Vec<&str> = KEY_COLUMNS.iter().chain(VALUE_COLUMNS.iter()).copied().collect();
        let mut fields_sorted = fields.clone();
        columns.sort_unstable();
        fields_sorted.sort_unstable();
        assert_eq!(columns, fields_sorted);
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS daily_weather ("));
        assert!(sql.contains("UNIQUE KEY uk_date_location (date, latitude, longitude)"));
        assert!(sql.contains("    avg_temperature_2m_24h DOUBLE NULL,"));
        assert!(sql.contains("    sunrise_iso VARCHAR(32) NULL,"));
        assert!(sql.contains("    created_at DATETIME(3) NOT NULL,"));
        assert!(sql.ends_with(")"));
    }

    #[test]
    fn test_insert_only_columns_are_value_columns() {
        for column in INSERT_ONLY_COLUMNS {
            assert!(VALUE_COLUMNS.contains(&column));
        }
    }
}
