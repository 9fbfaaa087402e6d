use crate::domain::Collector;
use crate::metrics::util::encode;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub async fn health_check() -> &'static str {
    "OK"
}

/// Samples every business metric and renders them in the text exposition
/// format. A failed collection turns the scrape into a 500.
pub async fn metrics(State(collector): State<Arc<dyn Collector>>) -> Response {
    let rendered = collector
        .collect()
        .await
        .and_then(|families| encode(&families));

    match rendered {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),

        Err(error) => {
            tracing::error!("Failed to collect business metrics: {:#}", error);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to collect business metrics",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::collector::{BusinessMetricsCollector, Config};
    use crate::metrics::registry::BusinessMetrics;
    use crate::metrics::util::sample_value;

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read the response body");
        String::from_utf8(bytes.to_vec()).expect("The response body is not UTF-8")
    }

    fn collector(registry: BusinessMetrics) -> Arc<dyn Collector> {
        Arc::new(BusinessMetricsCollector::new(
            Config::default(),
            Arc::new(registry),
        ))
    }

    #[tokio::test]
    async fn test_metrics_response() {
        let mut registry = BusinessMetrics::new();
        registry.register("users_total", "Total users", || Ok(42));

        let response = metrics(State(collector(registry))).await;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            prometheus::TEXT_FORMAT,
            response.headers()[header::CONTENT_TYPE].to_str().unwrap()
        );

        let body = body_of(response).await;
        assert!(body.contains("# HELP users_total Total users"));
        assert!(body.contains("# TYPE users_total gauge"));
        assert_eq!(Some(42.0), sample_value(&body, "users_total"));
    }

    #[tokio::test]
    async fn test_failed_collection_is_a_server_error() {
        let mut registry = BusinessMetrics::new();
        registry.register("a", "", || Ok(1));
        registry.register("b", "", || -> anyhow::Result<i32> {
            anyhow::bail!("boom")
        });

        let response = metrics(State(collector(registry))).await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());

        let body = body_of(response).await;
        assert!(!body.contains("# TYPE"));
        assert_eq!(None, sample_value(&body, "a"));
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!("OK", health_check().await);
    }
}
