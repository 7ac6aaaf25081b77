use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use wetl_config::AppConfig;
use wetl_core::{ForecastResponse, LocationInfo};
use wetl_db::{DatabaseStore, DbClient};
use wetl_etl::{EtlResult, EtlService, Output};
use wetl_fetch::{OpenMeteoClient, RetryPolicy};
use wetl_sinks::CsvExporter;

pub mod args;
pub mod run;

pub struct AppState {
    ready: AtomicBool,
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    etl_runs_total: Counter<u64>,
    service: Arc<EtlService>,
}

pub fn build_app(service: Arc<EtlService>) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter()
        .with_registry(registry.clone())
        .build()
        .context("building prometheus exporter")?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("wetl-cli");

    let requests_total = meter
        .u64_counter("wetl_requests_total")
        .with_description("Total HTTP requests served")
        .init();
    let etl_runs_total = meter
        .u64_counter("wetl_etl_runs_total")
        .with_description("ETL runs by output and outcome")
        .init();

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        registry,
        provider,
        requests_total,
        etl_runs_total,
        service,
    });

    let etl = Router::new()
        .route("/execute/api-to-csv", post(execute_api_to_csv))
        .route("/execute/api-to-database", post(execute_api_to_database))
        .route("/execute/api-to-all", post(execute_api_to_all))
        .route("/process/json", post(process_json))
        .route("/stats", get(stats))
        .route("/health", get(health));

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .nest("/api/v1/weather-etl", etl)
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

/// Wire the API client, CSV exporter and (when configured) the database
pub async fn build_service(cfg: &AppConfig) -> Result<EtlService> {
    let retry = cfg.retry();
    let client = OpenMeteoClient::new(
        &cfg.api_base_url(),
        cfg.api_timeout(),
        RetryPolicy {
            max_attempts: retry.max_attempts,
            delay: retry.delay,
            multiplier: retry.multiplier,
        },
    )
    .context("building weather API client")?;

    let location = cfg.location();
    let mut service = EtlService::new(
        Arc::new(client),
        Arc::new(CsvExporter::new(cfg.csv_path())),
        LocationInfo {
            latitude: location.latitude,
            longitude: location.longitude,
        },
    );

    match cfg.database_url() {
        Some(url) => {
            let db = DbClient::new(&url).await.context("connecting to database")?;
            db.ensure_schema().await.context("creating database schema")?;
            service = service.with_store(Arc::new(DatabaseStore::new(db, cfg.batch_size())));
            tracing::info!("Database store enabled");
        }
        None => tracing::warn!("No database configured; database outputs will fail"),
    }

    Ok(service)
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

async fn healthz(State(state): State<Arc<AppState>>) -> StatusCode {
    state.requests_total.add(1, &[]);
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, axum::http::HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
    csv_path: Option<PathBuf>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessQuery {
    output: Option<Output>,
    csv_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

fn record_run(state: &AppState, output: Output, result: &EtlResult) {
    state.etl_runs_total.add(
        1,
        &[
            KeyValue::new("output", output.to_string()),
            KeyValue::new("success", result.success),
        ],
    );
}

fn respond(result: EtlResult) -> (StatusCode, Json<EtlResult>) {
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(result))
}

async fn execute(state: Arc<AppState>, q: ExecuteQuery, output: Output) -> (StatusCode, Json<EtlResult>) {
    state.requests_total.add(1, &[]);
    let request = state
        .service
        .request(q.start_date, q.end_date, q.latitude, q.longitude);
    let result = state.service.run(&request, output, q.csv_path.as_deref()).await;
    record_run(&state, output, &result);
    respond(result)
}

async fn execute_api_to_csv(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExecuteQuery>,
) -> impl IntoResponse {
    execute(state, q, Output::Csv).await
}

async fn execute_api_to_database(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExecuteQuery>,
) -> impl IntoResponse {
    execute(state, q, Output::Database).await
}

async fn execute_api_to_all(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExecuteQuery>,
) -> impl IntoResponse {
    execute(state, q, Output::All).await
}

async fn process_json(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ProcessQuery>,
    Json(response): Json<ForecastResponse>,
) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    let output = q.output.unwrap_or(Output::Csv);
    let result = state
        .service
        .process_response(&response, output, q.csv_path.as_deref())
        .await;
    record_run(&state, output, &result);
    respond(result)
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.requests_total.add(1, &[]);
    match state.service.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to read stats");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "UP",
        timestamp: Utc::now(),
    })
}
