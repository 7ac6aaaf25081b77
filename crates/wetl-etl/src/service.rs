//! ETL run coordination

use crate::{EtlResult, EtlStats, Output};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use wetl_core::{
    transform_response, DailyRecord, FetchRequest, ForecastResponse, LocationInfo, RecordExporter,
    RecordStore, WeatherSource,
};

const NO_API_RECORDS: &str = "No records were transformed from API response";
const NO_JSON_RECORDS: &str = "No records were transformed from JSON data";

pub struct EtlService {
    source: Arc<dyn WeatherSource>,
    exporter: Arc<dyn RecordExporter>,
    store: Option<Arc<dyn RecordStore>>,
    location: LocationInfo,
}

impl EtlService {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        exporter: Arc<dyn RecordExporter>,
        location: LocationInfo,
    ) -> Self {
        Self {
            source,
            exporter,
            store: None,
            location,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Location used when a request does not name one
    pub fn location(&self) -> LocationInfo {
        self.location
    }

    pub fn request(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> FetchRequest {
        FetchRequest::new(
            latitude.unwrap_or(self.location.latitude),
            longitude.unwrap_or(self.location.longitude),
            start_date,
            end_date,
        )
    }

    /// Fetch, transform and load one date range
    ///
    /// `Csv` and `Database` succeed only when their sink succeeded; `All`
    /// succeeds when at least one sink did.
    pub async fn run(
        &self,
        request: &FetchRequest,
        output: Output,
        csv_path: Option<&Path>,
    ) -> EtlResult {
        info!(
            %output,
            start_date = %request.start_date,
            end_date = %request.end_date,
            "Starting ETL process"
        );
        let mut result = EtlResult::for_range(request.start_date, request.end_date);

        if !request.is_valid_range() {
            warn!("Rejected request with start date after end date");
            result.push_error(format!(
                "Start date {} is after end date {}",
                request.start_date, request.end_date
            ));
            return result;
        }

        let response = match self.source.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %format!("{e:#}"), "ETL process failed at API stage");
                result.push_error(format!("API error: {e:#}"));
                return result;
            }
        };
        result.api_response_received = true;

        let Some(records) = transform(&response, &mut result, NO_API_RECORDS) else {
            return result;
        };

        match output {
            Output::Csv => {
                match self.export(&records, csv_path).await {
                    Ok(()) => result.csv_exported = true,
                    Err(e) => result.push_error(format!("CSV export error: {e:#}")),
                }
                result.success = result.csv_exported;
            }
            Output::Database => {
                match self.save(&records).await {
                    Ok(()) => result.database_saved = true,
                    Err(e) => result.push_error(format!("Database error: {e:#}")),
                }
                result.success = result.database_saved;
            }
            Output::All => {
                self.load_all(&records, csv_path, &mut result).await;
                result.success = result.csv_exported || result.database_saved;
            }
        }

        if result.success {
            info!(
                records = records.len(),
                csv = result.csv_exported,
                database = result.database_saved,
                "ETL process completed"
            );
        }
        result
    }

    /// Transform and load a payload that was fetched elsewhere
    ///
    /// Succeeds only when every requested sink succeeded.
    pub async fn process_response(
        &self,
        response: &ForecastResponse,
        output: Output,
        csv_path: Option<&Path>,
    ) -> EtlResult {
        info!(%output, "Processing JSON data");
        let mut result = EtlResult {
            api_response_received: true,
            ..Default::default()
        };

        let Some(records) = transform(response, &mut result, NO_JSON_RECORDS) else {
            return result;
        };
        result.start_date = records.iter().map(|r| r.date).min();
        result.end_date = records.iter().map(|r| r.date).max();

        match output {
            Output::Csv => {
                if let Err(e) = self.export(&records, csv_path).await {
                    result.push_error(format!("CSV export failed: {e:#}"));
                } else {
                    result.csv_exported = true;
                }
            }
            Output::Database => {
                if let Err(e) = self.save(&records).await {
                    result.push_error(format!("Database save failed: {e:#}"));
                } else {
                    result.database_saved = true;
                }
            }
            Output::All => self.load_all(&records, csv_path, &mut result).await,
        }

        let csv_ok = !output.wants_csv() || result.csv_exported;
        let database_ok = !output.wants_database() || result.database_saved;
        result.success = csv_ok && database_ok;

        if result.success {
            info!(records = records.len(), "JSON processing completed");
        }
        result
    }

    pub async fn stats(&self) -> Result<EtlStats> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| anyhow!("database is not configured"))?;
        Ok(store.stats().await?.into())
    }

    async fn load_all(&self, records: &[DailyRecord], csv_path: Option<&Path>, result: &mut EtlResult) {
        match self.export(records, csv_path).await {
            Ok(()) => result.csv_exported = true,
            Err(e) => {
                error!(error = %format!("{e:#}"), "CSV export failed, continuing with database save");
                result.push_error(format!("CSV export failed: {e:#}"));
            }
        }

        match self.save(records).await {
            Ok(()) => result.database_saved = true,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Database save failed");
                result.push_error(format!("Database save failed: {e:#}"));
            }
        }
    }

    async fn export(&self, records: &[DailyRecord], csv_path: Option<&Path>) -> Result<()> {
        let written = self.exporter.export(records, csv_path).await?;
        if let Some(path) = written {
            info!(path = %path.display(), "CSV export done");
        }
        Ok(())
    }

    async fn save(&self, records: &[DailyRecord]) -> Result<()> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| anyhow!("database is not configured"))?;
        let saved = store.save(records).await?;
        info!(saved, "Database save done");
        Ok(())
    }
}

fn transform(
    response: &ForecastResponse,
    result: &mut EtlResult,
    empty_message: &str,
) -> Option<Vec<DailyRecord>> {
    match transform_response(response) {
        Ok(records) if records.is_empty() => {
            warn!("{empty_message}");
            result.push_error(empty_message);
            None
        }
        Ok(records) => {
            result.records_transformed = records.len();
            Some(records)
        }
        Err(e) => {
            error!(error = %e, "ETL process failed at transform stage");
            result.push_error(format!("Transformation error: {e}"));
            None
        }
    }
}
