use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use wetl_core::{LocationInfo, StoreStats};

/// Outcome of one ETL run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlResult {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub success: bool,
    pub error_message: Option<String>,
    pub api_response_received: bool,
    pub records_transformed: usize,
    pub csv_exported: bool,
    pub database_saved: bool,
}

impl EtlResult {
    pub fn for_range(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        }
    }

    /// Append to the error message, `"; "`-separated
    pub fn push_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error_message = Some(match self.error_message.take() {
            Some(existing) => format!("{existing}; {message}"),
            None => message,
        });
    }
}

/// Store totals as reported over HTTP
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlStats {
    pub total_records_in_database: i64,
    pub unique_locations: usize,
    pub locations: Vec<LocationInfo>,
}

impl From<StoreStats> for EtlStats {
    fn from(stats: StoreStats) -> Self {
        Self {
            total_records_in_database: stats.total_records,
            unique_locations: stats.unique_locations,
            locations: stats.locations,
        }
    }
}
