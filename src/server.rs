//! HTTP front end for the sliding window

use crate::ingest::{Event, ParseError};
use crate::stats::{AggregateStats, SlidingWindow, SumOverflow};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Serves `/event` and `/stats` over one shared window
pub struct StatsServer {
    window: Arc<SlidingWindow>,
    address: String,
}

impl StatsServer {
    pub fn new(window: Arc<SlidingWindow>, address: impl Into<String>) -> Self {
        Self {
            window,
            address: address.into(),
        }
    }

    /// Bind and serve until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(&self.address).await?;
        info!(
            "Starting stats server on {} ({} window)",
            listener.local_addr()?,
            self.window.policy()
        );

        serve(listener, self.window, shutdown_signal()).await
    }
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, window: Arc<SlidingWindow>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(window))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Stats server stopped");
    Ok(())
}

/// Build the API router
pub fn router(window: Arc<SlidingWindow>) -> Router {
    let shared_state = Arc::new(ApiState { window });

    Router::new()
        .route("/health", get(health_check))
        .route("/event", post(record_event))
        .route("/stats", get(get_stats))
        .layer(middleware::map_response(close_connection))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Shared API state
struct ApiState {
    window: Arc<SlidingWindow>,
}

/// Stats output format query parameter
#[derive(Debug, Deserialize)]
struct StatsQuery {
    format: Option<String>,
}

/// API response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Media type accepted by `POST /event`
const EVENT_CONTENT_TYPE: &str = "text/csv";

/// Why an event was not recorded
enum EventRejection {
    UnsupportedMediaType(Option<String>),
    Malformed(ParseError),
    OutOfRange(SumOverflow),
}

impl IntoResponse for EventRejection {
    fn into_response(self) -> Response {
        match self {
            EventRejection::UnsupportedMediaType(found) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!(
                    "expected Content-Type {EVENT_CONTENT_TYPE}, found {}",
                    found.as_deref().unwrap_or("none")
                ),
            )
                .into_response(),
            EventRejection::Malformed(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            EventRejection::OutOfRange(e) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response()
            }
        }
    }
}

/// Accept `text/csv`, with or without parameters such as `charset`
fn check_content_type(headers: &HeaderMap) -> Result<(), EventRejection> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let accepted = content_type.as_deref().is_some_and(|value| {
        value
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(EVENT_CONTENT_TYPE))
    });

    if accepted {
        Ok(())
    } else {
        Err(EventRejection::UnsupportedMediaType(content_type))
    }
}

async fn close_connection(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

// API Handlers

async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

async fn record_event(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, EventRejection> {
    check_content_type(&headers).inspect_err(|_| {
        warn!(
            "Rejected event with Content-Type {:?}",
            headers.get(header::CONTENT_TYPE)
        );
    })?;

    let event: Event = body.parse().map_err(|e: ParseError| {
        warn!("Rejected event {:?}: {}", body.trim(), e);
        EventRejection::Malformed(e)
    })?;

    state
        .window
        .update(event.x, event.y, event.timestamp)
        .map_err(|e| {
            warn!("Rejected event {:?}: {}", body.trim(), e);
            EventRejection::OutOfRange(e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_stats(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<StatsQuery>,
) -> Result<Response, StatusCode> {
    let format = params.format.as_deref().unwrap_or("text");
    let stats: AggregateStats = state.window.snapshot();

    match format {
        "text" => Ok(stats.to_wire_line().into_response()),
        "json" => Ok(Json(stats).into_response()),
        _ => Err(StatusCode::BAD_REQUEST),
    }
}
