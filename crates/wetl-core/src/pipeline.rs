use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{DailyRecord, ForecastResponse, StoreStats};

/// Location and inclusive date range to fetch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FetchRequest {
    pub fn new(latitude: f64, longitude: f64, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            latitude,
            longitude,
            start_date,
            end_date,
        }
    }

    pub fn is_valid_range(&self) -> bool {
        self.start_date <= self.end_date
    }
}

#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<ForecastResponse>;
}

#[async_trait::async_trait]
pub trait RecordExporter: Send + Sync {
    /// Write records to `path` (or the exporter's default); returns the
    /// written path, or `None` when there was nothing to write.
    async fn export(&self, records: &[DailyRecord], path: Option<&Path>) -> Result<Option<PathBuf>>;
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Upsert records; returns how many were saved
    async fn save(&self, records: &[DailyRecord]) -> Result<usize>;

    async fn stats(&self) -> Result<StoreStats>;
}
