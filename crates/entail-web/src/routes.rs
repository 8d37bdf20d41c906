use std::sync::atomic::Ordering;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::event::HandlerEvent;
use crate::state::AppState;

/// `GET /` and `POST /` become handler events; `/events` takes raw events.
pub fn router(st: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(predict))
        .route("/events", post(event))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(st.clone(), track_requests))
        .with_state(st)
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics_handler(State(st): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, st.handler.metrics().render())
}

pub async fn index(State(st): State<AppState>) -> Response {
    st.handler.handle(HandlerEvent::get()).await.into_response()
}

pub async fn predict(State(st): State<AppState>, body: String) -> Response {
    st.handler.handle(HandlerEvent::post(body)).await.into_response()
}

/// Raw event delivery for external schedulers, e.g. `{"CheckStatus": true}`.
/// The handler's own response is returned as the JSON body.
pub async fn event(State(st): State<AppState>, Json(event): Json<HandlerEvent>) -> Response {
    let resp = st.handler.handle(event).await;
    (StatusCode::OK, Json(resp)).into_response()
}

pub async fn track_requests(
    State(st): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, std::convert::Infallible> {
    let metrics = st.handler.metrics().clone();
    let request_id = uuid::Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = std::time::Instant::now();

    metrics.requests_inflight.fetch_add(1, Ordering::Relaxed);
    let resp = next.run(req).await;
    metrics.requests_inflight.fetch_sub(1, Ordering::Relaxed);
    metrics.inc(&metrics.requests_total);
    metrics.record_status(resp.status().as_u16());

    tracing::info!(
        %request_id,
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    Ok(resp)
}
