use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sourcer::error::AppError;
use sourcer::workflows::estimation::{DealConfig, DealEstimate, SubjectProperty};
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct EstimateRequest {
    pub(crate) property: SubjectProperty,
    #[serde(default)]
    pub(crate) config: Option<DealConfig>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EstimateResponse {
    pub(crate) estimate: DealEstimate,
    pub(crate) text_summary: String,
    pub(crate) document_bytes: Option<usize>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/markets", get(markets_endpoint))
        .route("/api/v1/estimate", post(estimate_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn markets_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({ "markets": state.engine.available_markets() }))
}

pub(crate) async fn estimate_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let EstimateRequest { property, config } = payload;
    let artifacts = state.engine.estimate(&property, config.as_ref())?;

    info!(
        market = %artifacts.estimate.property.market_key(),
        mao = artifacts.estimate.insight.mao,
        "estimate served"
    );

    Ok(Json(EstimateResponse {
        document_bytes: artifacts.document.as_ref().map(Vec::len),
        estimate: artifacts.estimate,
        text_summary: artifacts.text_summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::load_engine;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use sourcer::config::DataConfig;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            engine: Arc::new(load_engine(&DataConfig::default()).expect("bundled engine")),
        };
        router().layer(Extension(state))
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 4 * 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    fn estimate_request(city: &str, state: &str) -> Request<Body> {
        let body = json!({
            "property": {
                "address": "123 Demo St",
                "city": city,
                "state": state,
                "postal_code": "78704",
                "square_feet": 1850,
                "beds": 3,
                "baths": 2
            },
            "config": { "risk_profile": "balanced", "include_report": false }
        });
        Request::builder()
            .method("POST")
            .uri("/api/v1/estimate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize request")))
            .expect("request")
    }

    #[tokio::test]
    async fn estimate_returns_offer_packet() {
        let response = app(true)
            .oneshot(estimate_request("Austin", "TX"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = read_json(response).await;
        assert_eq!(payload["estimate"]["offers"].as_array().map(Vec::len), Some(3));
        assert_eq!(payload["estimate"]["repairs"].as_array().map(Vec::len), Some(8));
        assert!(payload["text_summary"]
            .as_str()
            .is_some_and(|text| text.contains("SOURCER OFFER SUMMARY")));
        assert_eq!(payload["document_bytes"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_market_is_not_found() {
        let response = app(true)
            .oneshot(estimate_request("Nowhere", "ZZ"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let payload = read_json(response).await;
        assert!(payload["error"]
            .as_str()
            .is_some_and(|error| error.contains("Known markets: Atlanta, GA")));
    }

    #[tokio::test]
    async fn non_positive_dimensions_are_unprocessable() {
        let body = json!({
            "property": {
                "address": "1 Main",
                "city": "Austin",
                "state": "TX",
                "postal_code": "78704",
                "square_feet": 0,
                "beds": 3,
                "baths": 2
            }
        });
        let response = app(true)
            .oneshot(
                Request::post("/api/v1/estimate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn markets_lists_bundled_keys() {
        let response = app(true)
            .oneshot(
                Request::get("/api/v1/markets")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["markets"][1], "Austin, TX");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        assert_eq!(read_json(response).await, json!({ "status": "ok" }));
    }
}
