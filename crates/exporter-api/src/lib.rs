//! exporter-api — HTTP surface of the Transmission exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition |
//!
//! The handler only reads the registry, so scrapes never wait on the
//! collection loop.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use exporter_metrics::MetricsRegistry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: MetricsRegistry,
}

/// Build the exporter router.
pub fn build_router(registry: MetricsRegistry) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(ApiState { registry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use exporter_core::SessionStats;
    use exporter_metrics::TransmissionMetrics;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn metrics_route_serves_exposition() {
        let registry = MetricsRegistry::new();
        let metrics = TransmissionMetrics::new(&registry, "transmission").unwrap();
        let stats = SessionStats {
            upload_speed: 512,
            ..Default::default()
        };
        metrics.project(&Default::default(), &stats);

        let req = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let resp = build_router(registry).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            handlers::EXPOSITION_CONTENT_TYPE
        );

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("transmission_session_stats_upload_speed_bytes 512"));
    }

    #[tokio::test]
    async fn metrics_route_rejects_post() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let resp = build_router(MetricsRegistry::new())
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let req = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = build_router(MetricsRegistry::new())
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
