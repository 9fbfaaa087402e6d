use crate::config::Http;
use crate::server::shutdown::shutdown_signal;
use crate::server::state::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use std::error::Error;
use std::net::ToSocketAddrs;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::LatencyUnit;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod handler;
pub mod shutdown;
pub mod state;

const HEALTH_PATH: &str = "/health";

pub async fn start_server(state: AppState) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = state.configuration.clone();
    check_metrics_path(&config.http)?;

    let listeners = bind_listeners(&config.http).await?;
    let router = create_router(state);

    let handles = listeners
        .into_iter()
        .map(|listener| {
            let router = router.clone();
            tokio::task::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        match handle.await {
            Ok(Ok(())) => (),
            Ok(Err(e)) => return Err(format!("Server failed: {}", e).into()),
            Err(e) => return Err(format!("Server task panicked: {}", e).into()),
        }
    }

    Ok(())
}

/// The metrics route must be absolute, must not collide with the health
/// route and must not end in `/` (request paths are trimmed before routing).
fn check_metrics_path(http: &Http) -> Result<(), String> {
    let path = http.metrics_path.as_str();

    if !path.starts_with('/') {
        return Err(format!("The metrics path [{}] must start with '/'", path));
    }

    if path.len() > 1 && path.ends_with('/') {
        return Err(format!("The metrics path [{}] must not end with '/'", path));
    }

    if path == HEALTH_PATH {
        return Err(format!(
            "The metrics path [{}] is reserved for the health check",
            path
        ));
    }

    Ok(())
}

async fn bind_listeners(http: &Http) -> Result<Vec<TcpListener>, Box<dyn Error + Send + Sync>> {
    let mut listeners = Vec::new();
    for addr in (http.address.as_str(), http.port).to_socket_addrs()? {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| format!("Could not bind to {}: {}", addr, e))?;

        tracing::info!(
            "Serving business metrics on http://{}{}",
            listener.local_addr()?,
            http.metrics_path
        );
        listeners.push(listener);
    }

    if listeners.is_empty() {
        return Err(format!(
            "The bind address [{}:{}] did not resolve to any IP addresses",
            http.address, http.port
        )
        .into());
    }

    Ok(listeners)
}

fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route(&state.configuration.http.metrics_path, get(handler::metrics))
        .route(HEALTH_PATH, get(handler::health_check))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::INTERNAL_SERVER_ERROR,
            Duration::from_millis(state.configuration.http.timeout),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or("unknown"))
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state);

    Router::new().fallback_service(NormalizePathLayer::trim_trailing_slash().layer(router))
}
