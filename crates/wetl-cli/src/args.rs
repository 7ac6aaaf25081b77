use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use argh::FromArgs;
use chrono::NaiveDate;
use wetl_etl::Output;

#[derive(FromArgs, Debug)]
/// Weather ETL: fetch Open-Meteo forecasts, aggregate them per day, export to CSV/MySQL
pub struct Args {
    /// path to the TOML config file (overrides WETL_CONFIG)
    #[argh(option, short = 'c')]
    pub config: Option<String>,

    #[argh(subcommand)]
    pub command: Option<Command>,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum Command {
    Serve(ServeArgs),
    Run(RunArgs),
}

#[derive(FromArgs, Debug)]
/// Start the HTTP API (the default when no subcommand is given)
#[argh(subcommand, name = "serve")]
pub struct ServeArgs {
    /// address to listen on, e.g. 127.0.0.1:8080
    #[argh(option)]
    pub bind: Option<String>,
}

/// Where a one-shot run reads its forecast from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Api,
    Json,
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Source::Api),
            "json" => Ok(Source::Json),
            other => Err(format!("unknown source '{other}', expected api or json")),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Api => "api",
            Source::Json => "json",
        })
    }
}

#[derive(FromArgs, Debug)]
/// Run a single ETL pass and exit
#[argh(subcommand, name = "run")]
pub struct RunArgs {
    /// api or json
    #[argh(option, default = "Source::Api")]
    pub source: Source,

    /// csv, database or all
    #[argh(option, default = "Output::Csv")]
    pub output: Output,

    /// first day to fetch (YYYY-MM-DD)
    #[argh(option)]
    pub start_date: Option<NaiveDate>,

    /// last day to fetch, inclusive (YYYY-MM-DD)
    #[argh(option)]
    pub end_date: Option<NaiveDate>,

    /// forecast JSON file, required with --source json
    #[argh(option)]
    pub json_path: Option<PathBuf>,

    /// CSV file to write instead of the configured one
    #[argh(option)]
    pub csv_path: Option<PathBuf>,

    /// latitude override
    #[argh(option)]
    pub latitude: Option<f64>,

    /// longitude override
    #[argh(option)]
    pub longitude: Option<f64>,
}

/// A validated one-shot run
#[derive(Debug, Clone, PartialEq)]
pub enum RunPlan {
    Api {
        start_date: NaiveDate,
        end_date: NaiveDate,
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
    Json {
        path: PathBuf,
    },
}

impl RunArgs {
    pub fn plan(&self) -> Result<RunPlan, String> {
        match self.source {
            Source::Api => {
                let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
                    return Err("Start date and end date are required for API source".into());
                };
                if start_date > end_date {
                    return Err("Start date must be before or equal to end date".into());
                }
                Ok(RunPlan::Api {
                    start_date,
                    end_date,
                    latitude: self.latitude,
                    longitude: self.longitude,
                })
            }
            Source::Json => match &self.json_path {
                Some(path) => Ok(RunPlan::Json { path: path.clone() }),
                None => Err("JSON path is required for JSON source".into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        let mut full = vec!["run"];
        full.extend_from_slice(args);
        match Args::from_args(&["wetl"], &full).unwrap().command {
            Some(Command::Run(run)) => run,
            other => panic!("expected run subcommand, got {other:?}"),
        }
    }

    #[test]
    fn source_parsing() {
        assert_eq!("API".parse::<Source>().unwrap(), Source::Api);
        assert_eq!(" json ".parse::<Source>().unwrap(), Source::Json);
        assert!("ftp".parse::<Source>().is_err());
        assert_eq!(Source::Json.to_string(), "json");
    }

    #[test]
    fn api_plan_needs_both_dates() {
        let run = run_args(&["--start-date", "2024-01-01"]);
        assert_eq!(
            run.plan().unwrap_err(),
            "Start date and end date are required for API source"
        );
    }

    #[test]
    fn api_plan_rejects_inverted_range() {
        let run = run_args(&["--start-date", "2024-01-05", "--end-date", "2024-01-01"]);
        assert_eq!(
            run.plan().unwrap_err(),
            "Start date must be before or equal to end date"
        );
    }

    #[test]
    fn json_plan_needs_path() {
        let run = run_args(&["--source", "json"]);
        assert!(run.plan().is_err());

        let run = run_args(&["--source", "json", "--json-path", "payload.json"]);
        assert_eq!(
            run.plan().unwrap(),
            RunPlan::Json {
                path: PathBuf::from("payload.json")
            }
        );
    }
}
