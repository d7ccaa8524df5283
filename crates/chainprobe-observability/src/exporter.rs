//! HTTP exposition of the metric registry.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chainprobe_core::PrometheusSink;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::ObservabilityError;

/// Content type of the Prometheus text exposition format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Turn a Go-style `:9060` into a bindable `0.0.0.0:9060`.
pub fn normalize_listen_address(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// `GET /metrics`; every other path is 404.
pub fn router(sink: Arc<PrometheusSink>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .with_state(sink)
}

async fn metrics(State(sink): State<Arc<PrometheusSink>>) -> Response {
    match sink.gather_text() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub async fn bind(addr: &str) -> Result<TcpListener, ObservabilityError> {
    let addr = normalize_listen_address(addr);
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ObservabilityError::Bind { addr, source })
}

/// Serve until `cancel` fires; in-flight scrapes are allowed to finish.
pub async fn serve(
    listener: TcpListener,
    sink: Arc<PrometheusSink>,
    cancel: CancellationToken,
) -> Result<(), ObservabilityError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "metrics server listening");
    }
    axum::serve(listener, router(sink))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    tracing::info!("metrics server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainprobe_core::{MetricSink, Series};

    #[test]
    fn go_style_address() {
        assert_eq!(normalize_listen_address(":9060"), "0.0.0.0:9060");
        assert_eq!(normalize_listen_address("127.0.0.1:9100"), "127.0.0.1:9100");
    }

    #[tokio::test]
    async fn serves_metrics_and_404s_elsewhere() {
        let sink = Arc::new(PrometheusSink::new().unwrap());
        sink.set(
            Series::AccountBalance,
            &["eth-goerli", "http://main", "treasury", "0xabc"],
            1.5,
        )
        .unwrap();

        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(listener, sink, cancel.clone()));

        let http = reqwest::Client::new();
        let resp = http.get(format!("http://{addr}/metrics")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body = resp.text().await.unwrap();
        assert!(body.contains("chain_accountbalance"));
        assert!(body.contains(r#"accountName="treasury""#));

        let resp = http.get(format!("http://{addr}/")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        cancel.cancel();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bind_error_names_address() {
        let first = bind("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().unwrap().to_string();
        let err = bind(&taken).await.unwrap_err();
        assert!(err.to_string().contains(&taken));
    }
}
