//! One-shot `wetl run`

use std::fmt::Write as _;
use std::path::Path;

use wetl_etl::{EtlResult, EtlService, Output};
use wetl_fetch::JsonFileSource;

use crate::args::RunPlan;

pub async fn execute(
    service: &EtlService,
    plan: &RunPlan,
    output: Output,
    csv_path: Option<&Path>,
) -> EtlResult {
    match plan {
        RunPlan::Api {
            start_date,
            end_date,
            latitude,
            longitude,
        } => {
            let request = service.request(*start_date, *end_date, *latitude, *longitude);
            service.run(&request, output, csv_path).await
        }
        RunPlan::Json { path } => {
            let source = JsonFileSource::new(path);
            match source.load().await {
                Ok(response) => service.process_response(&response, output, csv_path).await,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to read JSON payload");
                    let mut result = EtlResult::default();
                    result.push_error(format!("JSON read error: {e}"));
                    result
                }
            }
        }
    }
}

/// Human-readable report printed after a run
pub fn render_summary(result: &EtlResult) -> String {
    let mut out = String::new();
    let status = if result.success { "SUCCESS" } else { "FAILED" };
    let _ = writeln!(out, "ETL run: {status}");
    if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
        let _ = writeln!(out, "  Date range:           {start} .. {end}");
    }
    let _ = writeln!(out, "  API response:         {}", yes_no(result.api_response_received));
    let _ = writeln!(out, "  Records transformed:  {}", result.records_transformed);
    let _ = writeln!(out, "  CSV exported:         {}", yes_no(result.csv_exported));
    let _ = writeln!(out, "  Database saved:       {}", yes_no(result.database_saved));
    if let Some(message) = &result.error_message {
        let _ = writeln!(out, "  Error:                {message}");
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
