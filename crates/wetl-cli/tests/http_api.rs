use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wetl_core::{
    DailyRecord, DailySeries, FetchRequest, ForecastResponse, HourlySeries, LocationInfo,
    RecordStore, StoreStats, WeatherSource,
};
use wetl_etl::EtlService;
use wetl_sinks::CsvExporter;

const JAN1: i64 = 1704067200;
const HOUR: i64 = 3_600;

fn payload() -> ForecastResponse {
    ForecastResponse {
        latitude: 52.52,
        longitude: 13.41,
        hourly: Some(HourlySeries {
            timestamps: vec![JAN1 + 9 * HOUR, JAN1 + 12 * HOUR],
            temperature_2m: Some(vec![Some(41.0), Some(50.0)]),
            ..Default::default()
        }),
        daily: Some(DailySeries {
            timestamps: vec![JAN1],
            sunrise: Some(vec![Some(JAN1 + 8 * HOUR)]),
            sunset: Some(vec![Some(JAN1 + 16 * HOUR)]),
            daylight_duration: Some(vec![Some(28_800.0)]),
        }),
        ..Default::default()
    }
}

struct StaticSource;

#[async_trait::async_trait]
impl WeatherSource for StaticSource {
    async fn fetch(&self, _request: &FetchRequest) -> anyhow::Result<ForecastResponse> {
        Ok(payload())
    }
}

#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<DailyRecord>>,
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn save(&self, records: &[DailyRecord]) -> anyhow::Result<usize> {
        let mut stored = self.records.lock().unwrap();
        for record in records {
            stored.retain(|r| r.key() != record.key());
            stored.push(record.clone());
        }
        Ok(records.len())
    }

    async fn stats(&self) -> anyhow::Result<StoreStats> {
        let stored = self.records.lock().unwrap();
        let mut locations = Vec::new();
        for r in stored.iter() {
            let location = LocationInfo {
                latitude: r.latitude,
                longitude: r.longitude,
            };
            if !locations.contains(&location) {
                locations.push(location);
            }
        }
        Ok(StoreStats {
            total_records: stored.len() as i64,
            unique_locations: locations.len(),
            locations,
        })
    }
}

fn app(dir: &tempfile::TempDir, store: Option<Arc<MemoryStore>>) -> Router {
    let mut service = EtlService::new(
        Arc::new(StaticSource),
        Arc::new(CsvExporter::new(dir.path().join("default.csv"))),
        LocationInfo {
            latitude: 55.0344,
            longitude: 82.9434,
        },
    );
    if let Some(store) = store {
        service = service.with_store(store);
    }
    let (router, _state) = wetl_cli::build_app(Arc::new(service)).unwrap();
    router
}

async fn post(app: Router, uri: &str, body: Body) -> (StatusCode, Value) {
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn api_to_csv_writes_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("run.csv");
    let uri = format!(
        "/api/v1/weather-etl/execute/api-to-csv?startDate=2024-01-01&endDate=2024-01-01&csvPath={}",
        csv.display()
    );

    let (status, json) = post(app(&dir, None), &uri, Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["recordsTransformed"], 1);
    assert_eq!(json["csvExported"], true);
    assert_eq!(json["databaseSaved"], false);
    assert_eq!(json["startDate"], "2024-01-01");
    assert!(csv.exists());
    assert!(!dir.path().join("default.csv").exists());
}

#[tokio::test]
async fn api_to_database_without_store_fails() {
    let dir = tempfile::tempdir().unwrap();

    let (status, json) = post(
        app(&dir, None),
        "/api/v1/weather-etl/execute/api-to-database?startDate=2024-01-01&endDate=2024-01-01",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["errorMessage"], "Database error: database is not configured");
}

#[tokio::test]
async fn api_to_all_then_stats() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::default());
    let app = app(&dir, Some(store.clone()));

    let (status, json) = post(
        app.clone(),
        "/api/v1/weather-etl/execute/api-to-all?startDate=2024-01-01&endDate=2024-01-01",
        Body::empty(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["csvExported"], true);
    assert_eq!(json["databaseSaved"], true);
    assert!(dir.path().join("default.csv").exists());

    let (status, json) = get(app, "/api/v1/weather-etl/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalRecordsInDatabase"], 1);
    assert_eq!(json["uniqueLocations"], 1);
    assert_eq!(json["locations"][0]["latitude"], 52.52);
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let (status, json) = post(
        app(&dir, None),
        "/api/v1/weather-etl/execute/api-to-csv?startDate=2024-01-05&endDate=2024-01-01",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["apiResponseReceived"], false);
    assert_eq!(
        json["errorMessage"],
        "Start date 2024-01-05 is after end date 2024-01-01"
    );
}

#[tokio::test]
async fn missing_dates_are_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();

    let (status, _) = post(
        app(&dir, None),
        "/api/v1/weather-etl/execute/api-to-csv?startDate=2024-01-01",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn process_json_defaults_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let body = serde_json::to_vec(&payload()).unwrap();

    let (status, json) = post(
        app(&dir, None),
        "/api/v1/weather-etl/process/json",
        Body::from(body),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["csvExported"], true);
    assert_eq!(json["startDate"], "2024-01-01");
    assert_eq!(json["endDate"], "2024-01-01");
    let content = std::fs::read_to_string(dir.path().join("default.csv")).unwrap();
    assert!(content.lines().nth(1).unwrap().starts_with("2024-01-01,52.52,13.41,45.5,"));
}

#[tokio::test]
async fn process_json_to_database() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::default());
    let body = json!({
        "latitude": 52.52,
        "longitude": 13.41,
        "hourly": {
            "time": [JAN1, JAN1 + HOUR],
            "temperature_2m": [32.0, null]
        }
    });

    let (status, json) = post(
        app(&dir, Some(store.clone())),
        "/api/v1/weather-etl/process/json?output=database",
        Body::from(body.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["databaseSaved"], true);
    assert_eq!(json["csvExported"], false);
    let stored = store.records.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].temperature_2m_celsius, Some(0.0));
}

#[tokio::test]
async fn process_json_without_hourly_fails() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({ "latitude": 52.52, "longitude": 13.41 });

    let (status, json) = post(
        app(&dir, None),
        "/api/v1/weather-etl/process/json?output=csv",
        Body::from(body.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["errorMessage"]
        .as_str()
        .unwrap()
        .starts_with("Transformation error: "));
}

#[tokio::test]
async fn stats_without_store_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let (status, json) = get(app(&dir, None), "/api/v1/weather-etl/stats").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "database is not configured");
}
