//! Prometheus scrape endpoint.
//!
//! `GET /metrics` returns the text exposition of the telemetry registry.
//! The server stops with the queue service's shutdown signal.

use std::net::SocketAddr;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use shared_queue::ShutdownSignal;
use tokio::net::TcpListener;
use tracing::{error, info};
use vc_telemetry::gather_metrics;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub fn router() -> Router {
    Router::new().route("/metrics", get(scrape))
}

async fn scrape() -> Response {
    match gather_metrics() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "[metrics] Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve the scrape endpoint on `port` until `shutdown` turns `true`.
pub async fn serve(port: u16, mut shutdown: ShutdownSignal) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "[metrics] Serving Prometheus metrics");

    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use vc_telemetry::{register_metrics, TASKS_ENQUEUED};

    use super::*;

    #[tokio::test]
    async fn test_scrape_returns_registered_metrics() {
        register_metrics().unwrap();
        TASKS_ENQUEUED.with_label_values(&["metrics_test"]).inc();

        let response = router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("vc_queue_tasks_enqueued_total"));
        assert!(text.contains("metrics_test"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
