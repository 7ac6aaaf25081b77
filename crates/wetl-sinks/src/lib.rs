use anyhow::Result;
pub mod file_info;

pub use file_info::*;

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use wetl_core::{DailyRecord, RecordExporter};

pub const DEFAULT_CSV_PATH: &str = "./output/weather_data.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Writes daily records to a CSV file, one row per record
///
/// Columns follow the field order of [`DailyRecord`]; absent values are
/// written as empty cells.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    default_path: PathBuf,
}

impl CsvExporter {
    pub fn new<P: AsRef<Path>>(default_path: P) -> Self {
        Self {
            default_path: default_path.as_ref().to_path_buf(),
        }
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Write `records` to `path`, replacing any existing file
    ///
    /// An empty slice writes nothing and returns `Ok(false)`.
    pub fn write_records(&self, records: &[DailyRecord], path: &Path) -> ExportResult<bool> {
        if records.is_empty() {
            info!("No records to export");
            return Ok(false);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), rows = records.len(), "CSV written");
        info!(records = records.len(), path = %path.display(), "Exported records to CSV");
        Ok(true)
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(DEFAULT_CSV_PATH)
    }
}

#[async_trait::async_trait]
impl RecordExporter for CsvExporter {
    async fn export(&self, records: &[DailyRecord], path: Option<&Path>) -> Result<Option<PathBuf>> {
        let path = path.unwrap_or(&self.default_path);
        let written = self.write_records(records, path)?;
        Ok(written.then(|| path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};

    fn record(day: u32, temperature: Option<f64>) -> DailyRecord {
        let created_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut r = DailyRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            55.0344,
            82.9434,
            created_at,
        );
        r.avg_temperature_2m_24h = temperature;
        r.temperature_2m_celsius = temperature.map(|_| -3.5);
        r.sunrise_iso = Some("2024-01-01T03:12:00Z".into());
        r
    }

    #[test]
    fn header_lists_record_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.csv");
        CsvExporter::default()
            .write_records(&[record(1, Some(25.7))], &path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap().replace(',', "\n");
        insta::assert_snapshot!(header, @r###"
        date
        latitude
        longitude
        avg_temperature_2m_24h
        avg_relative_humidity_2m_24h
        avg_dew_point_2m_24h
        avg_apparent_temperature_24h
        avg_temperature_80m_24h
        avg_temperature_120m_24h
        avg_wind_speed_10m_24h
        avg_wind_speed_80m_24h
        avg_visibility_24h
        total_rain_24h
        total_showers_24h
        total_snowfall_24h
        avg_temperature_2m_daylight
        avg_relative_humidity_2m_daylight
        avg_dew_point_2m_daylight
        avg_apparent_temperature_daylight
        avg_temperature_80m_daylight
        avg_temperature_120m_daylight
        avg_wind_speed_10m_daylight
        avg_wind_speed_80m_daylight
        avg_visibility_daylight
        total_rain_daylight
        total_showers_daylight
        total_snowfall_daylight
        wind_speed_10m_m_per_s
        wind_speed_80m_m_per_s
        temperature_2m_celsius
        apparent_temperature_celsius
        temperature_80m_celsius
        temperature_120m_celsius
        soil_temperature_0cm_celsius
        soil_temperature_6cm_celsius
        rain_mm
        showers_mm
        snowfall_mm
        daylight_hours
        sunrise_iso
        sunset_iso
        created_at
        "###);
    }

    #[test]
    fn writes_one_row_per_record_with_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/weather.csv");
        let written = CsvExporter::default()
            .write_records(&[record(1, Some(25.7)), record(2, None)], &path)
            .unwrap();
        assert!(written);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);

        let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
        assert_eq!(&rows[0][column("date")], "2024-01-01");
        assert_eq!(&rows[0][column("avg_temperature_2m_24h")], "25.7");
        assert_eq!(&rows[0][column("temperature_2m_celsius")], "-3.5");
        assert_eq!(&rows[0][column("sunrise_iso")], "2024-01-01T03:12:00Z");
        assert_eq!(&rows[0][column("sunset_iso")], "");
        assert_eq!(&rows[1][column("avg_temperature_2m_24h")], "");
        assert_eq!(&rows[1][column("total_rain_24h")], "");
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.csv");
        let written = CsvExporter::default().write_records(&[], &path).unwrap();
        assert!(!written);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn export_uses_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("default.csv");
        let exporter = CsvExporter::new(&default);

        let path = exporter.export(&[record(3, Some(1.0))], None).await.unwrap();
        assert_eq!(path.as_deref(), Some(default.as_path()));

        let other = dir.path().join("other.csv");
        let path = exporter
            .export(&[record(3, Some(1.0))], Some(&other))
            .await
            .unwrap();
        assert_eq!(path, Some(other));

        assert_eq!(exporter.export(&[], None).await.unwrap(), None);
    }
}
