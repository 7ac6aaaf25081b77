//! Query operations on the daily weather table

use crate::schema::{
    create_table_sql, tables, DailyWeatherRow, INSERT_ONLY_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS,
};
use crate::{DbClient, DbResult};
use chrono::NaiveDate;
use sqlx::{Executor, MySql};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};
use wetl_core::{DailyRecord, LocationInfo, StoreStats};

/// `INSERT ... ON DUPLICATE KEY UPDATE` for one record
pub fn upsert_sql() -> &'static str {
    static SQL: OnceLock<String> = OnceLock::new();
    SQL.get_or_init(|| {
        let columns: Vec<&str> = KEY_COLUMNS.iter().chain(VALUE_COLUMNS.iter()).copied().collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let updates = VALUE_COLUMNS
            .iter()
            .filter(|c| !INSERT_ONLY_COLUMNS.contains(*c))
            .map(|c| format!("{c} = VALUES({c})"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {}",
            tables::DAILY_WEATHER,
            columns.join(", "),
            placeholders,
            updates
        )
    })
}

async fn upsert_with<'e, E>(executor: E, record: &DailyRecord) -> DbResult<()>
where
    E: Executor<'e, Database = MySql>,
{
    // Bind order must follow KEY_COLUMNS then VALUE_COLUMNS
    sqlx::query(upsert_sql())
        .bind(record.date)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.avg_temperature_2m_24h)
        .bind(record.avg_relative_humidity_2m_24h)
        .bind(record.avg_dew_point_2m_24h)
        .bind(record.avg_apparent_temperature_24h)
        .bind(record.avg_temperature_80m_24h)
        .bind(record.avg_temperature_120m_24h)
        .bind(record.avg_wind_speed_10m_24h)
        .bind(record.avg_wind_speed_80m_24h)
        .bind(record.avg_visibility_24h)
        .bind(record.total_rain_24h)
        .bind(record.total_showers_24h)
        .bind(record.total_snowfall_24h)
        .bind(record.avg_temperature_2m_daylight)
        .bind(record.avg_relative_humidity_2m_daylight)
        .bind(record.avg_dew_point_2m_daylight)
        .bind(record.avg_apparent_temperature_daylight)
        .bind(record.avg_temperature_80m_daylight)
        .bind(record.avg_temperature_120m_daylight)
        .bind(record.avg_wind_speed_10m_daylight)
        .bind(record.avg_wind_speed_80m_daylight)
        .bind(record.avg_visibility_daylight)
        .bind(record.total_rain_daylight)
        .bind(record.total_showers_daylight)
        .bind(record.total_snowfall_daylight)
        .bind(record.wind_speed_10m_m_per_s)
        .bind(record.wind_speed_80m_m_per_s)
        .bind(record.temperature_2m_celsius)
        .bind(record.apparent_temperature_celsius)
        .bind(record.temperature_80m_celsius)
        .bind(record.temperature_120m_celsius)
        .bind(record.soil_temperature_0cm_celsius)
        .bind(record.soil_temperature_6cm_celsius)
        .bind(record.rain_mm)
        .bind(record.showers_mm)
        .bind(record.snowfall_mm)
        .bind(record.daylight_hours)
        .bind(record.sunrise_iso.as_deref())
        .bind(record.sunset_iso.as_deref())
        .bind(record.created_at)
        .execute(executor)
        .await?;
    Ok(())
}

impl DbClient {
    /// Create the daily table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> DbResult<()> {
        sqlx::query(&create_table_sql()).execute(self.pool()).await?;
        debug!("Schema ready");
        Ok(())
    }

    /// Insert a record, or overwrite the stored values for its key
    #[instrument(skip(self, record), fields(date = %record.date, latitude = record.latitude, longitude = record.longitude))]
    pub async fn upsert_record(&self, record: &DailyRecord) -> DbResult<()> {
        upsert_with(self.pool(), record).await?;
        debug!("Upserted daily record");
        Ok(())
    }

    /// Upsert records in batches of `batch_size`, one transaction per batch
    ///
    /// A record that fails is logged and skipped; the return value is the
    /// number of records actually saved.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn save_records(&self, records: &[DailyRecord], batch_size: usize) -> DbResult<usize> {
        if records.is_empty() {
            warn!("No records to save to database");
            return Ok(0);
        }

        info!(records = records.len(), "Saving weather records to database");
        let mut processed = 0;
        for batch in records.chunks(batch_size.max(1)) {
            let mut tx = self.pool().begin().await?;
            let mut saved_in_batch = 0;
            for record in batch {
                match upsert_with(&mut *tx, record).await {
                    Ok(()) => saved_in_batch += 1,
                    Err(e) => warn!(
                        date = %record.date,
                        latitude = record.latitude,
                        longitude = record.longitude,
                        error = %e,
                        "Failed to save weather record"
                    ),
                }
            }
            tx.commit().await?;
            processed += saved_in_batch;
            debug!(processed, total = records.len(), "Processed batch");
        }

        info!(processed, "Saved weather records to database");
        Ok(processed)
    }

    #[instrument(skip(self))]
    pub async fn find_record(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> DbResult<Option<DailyRecord>> {
        let row = sqlx::query_as::<_, DailyWeatherRow>(
            r#"
            SELECT * FROM daily_weather
            WHERE date = ? AND latitude = ? AND longitude = ?
            "#,
        )
        .bind(date)
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(DailyRecord::from))
    }

    /// Records with `start <= date <= end`, all locations
    #[instrument(skip(self))]
    pub async fn records_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<DailyRecord>> {
        let rows = sqlx::query_as::<_, DailyWeatherRow>(
            r#"
            SELECT * FROM daily_weather
            WHERE date BETWEEN ? AND ?
            ORDER BY date ASC, latitude ASC, longitude ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;

        debug!("Retrieved {} records between {} and {}", rows.len(), start, end);
        Ok(rows.into_iter().map(DailyRecord::from).collect())
    }

    /// Records with `start <= date <= end` at one location
    #[instrument(skip(self))]
    pub async fn records_between_at(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> DbResult<Vec<DailyRecord>> {
        let rows = sqlx::query_as::<_, DailyWeatherRow>(
            r#"
            SELECT * FROM daily_weather
            WHERE date BETWEEN ? AND ? AND latitude = ? AND longitude = ?
            ORDER BY date ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(latitude)
        .bind(longitude)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(DailyRecord::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn record_exists(
        &self,
        date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM daily_weather
            WHERE date = ? AND latitude = ? AND longitude = ?
            "#,
        )
        .bind(date)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(self.pool())
        .await?;

        Ok(count > 0)
    }

    #[instrument(skip(self))]
    pub async fn count_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM daily_weather WHERE date BETWEEN ? AND ?")
            .bind(start)
            .bind(end)
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn count_records(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM daily_weather")
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn distinct_locations(&self) -> DbResult<Vec<LocationInfo>> {
        let rows: Vec<(f64, f64)> = sqlx::query_as(
            r#"
            SELECT DISTINCT latitude, longitude FROM daily_weather
            ORDER BY latitude, longitude
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(latitude, longitude)| LocationInfo {
                latitude,
                longitude,
            })
            .collect())
    }

    /// Delete records with `start <= date <= end`; returns rows removed
    #[instrument(skip(self))]
    pub async fn delete_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM daily_weather WHERE date BETWEEN ? AND ?")
            .bind(start)
            .bind(end)
            .execute(self.pool())
            .await?;

        let deleted = result.rows_affected();
        info!(deleted, %start, %end, "Deleted weather records");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> DbResult<StoreStats> {
        let total_records = self.count_records().await?;
        let locations = self.distinct_locations().await?;
        Ok(StoreStats {
            total_records,
            unique_locations: locations.len(),
            locations,
        })
    }
}
