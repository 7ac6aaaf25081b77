use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt;
use wetl_core::{FetchRequest, ForecastResponse, LocationInfo, WeatherSource};
use wetl_etl::EtlService;
use wetl_sinks::CsvExporter;

struct OfflineSource;

#[async_trait::async_trait]
impl WeatherSource for OfflineSource {
    async fn fetch(&self, _request: &FetchRequest) -> anyhow::Result<ForecastResponse> {
        anyhow::bail!("offline")
    }
}

fn offline_service() -> Arc<EtlService> {
    Arc::new(EtlService::new(
        Arc::new(OfflineSource),
        Arc::new(CsvExporter::default()),
        LocationInfo {
            latitude: 55.0344,
            longitude: 82.9434,
        },
    ))
}

#[tokio::test]
async fn health_ready_metrics_endpoints() {
    let (app, state) = wetl_cli::build_app(offline_service()).unwrap();

    // /healthz returns 200 and increments a counter
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // /readyz initially 503
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    wetl_cli::set_ready(&state, true);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // /metrics returns prometheus text and contains our counter
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ct = res.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/plain"));
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("wetl_requests"));
}

#[tokio::test]
async fn weather_etl_health_reports_up() {
    let (app, _state) = wetl_cli::build_app(offline_service()).unwrap();

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/weather-etl/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "UP");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn failed_run_is_counted() {
    let (app, _state) = wetl_cli::build_app(offline_service()).unwrap();

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/weather-etl/execute/api-to-csv?startDate=2024-01-01&endDate=2024-01-02")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["errorMessage"], "API error: offline");

    let res = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("wetl_etl_runs"));
}
