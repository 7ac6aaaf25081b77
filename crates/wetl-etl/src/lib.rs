//! ETL orchestration
//!
//! Fetches a payload, aggregates it into daily records, and hands the
//! records to the CSV exporter and/or the record store. Every run produces
//! an [`EtlResult`] describing how far it got; failures are reported in the
//! result rather than returned as errors.

pub mod report;
pub mod service;

pub use report::*;
pub use service::*;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EtlError {
    #[error("Unknown output '{0}', expected csv, database or all")]
    UnknownOutput(String),
}

/// Where transformed records go
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Output {
    Csv,
    Database,
    All,
}

impl Output {
    pub fn wants_csv(self) -> bool {
        matches!(self, Output::Csv | Output::All)
    }

    pub fn wants_database(self) -> bool {
        matches!(self, Output::Database | Output::All)
    }
}

impl FromStr for Output {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Output::Csv),
            "database" | "db" => Ok(Output::Database),
            "all" => Ok(Output::All),
            _ => Err(EtlError::UnknownOutput(s.to_string())),
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Output::Csv => "csv",
            Output::Database => "database",
            Output::All => "all",
        };
        f.write_str(name)
    }
}
