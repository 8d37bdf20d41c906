use std::sync::atomic::Ordering;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::model::ModelError;
use crate::predictor::InvocationRequest;
use crate::state::AppState;

pub fn router(st: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/invocations", post(invocations))
        .route("/metrics", get(metrics_handler))
        .with_state(st)
}

/// 200 when the model is loaded, 400 otherwise.
pub async fn ping(State(st): State<AppState>) -> Response {
    st.metrics.pings_total.fetch_add(1, Ordering::Relaxed);
    let status = if st.predictor.is_some() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(" ")).into_response()
}

#[tracing::instrument(name = "invocation", skip_all)]
pub async fn invocations(State(st): State<AppState>, body: String) -> Response {
    st.metrics.invocations_total.fetch_add(1, Ordering::Relaxed);

    let req: InvocationRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => {
            st.metrics.invocation_errors_total.fetch_add(1, Ordering::Relaxed);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("invalid request: {e}")})),
            )
                .into_response();
        }
    };

    let Some(predictor) = st.predictor.as_ref() else {
        st.metrics.invocation_errors_total.fetch_add(1, Ordering::Relaxed);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "model not loaded"})),
        )
            .into_response();
    };

    match predictor.predict(&req.sentence1, &req.sentence2) {
        Ok(pred) => {
            tracing::debug!(label=%pred.label, probability=%pred.probability, "inference");
            (StatusCode::OK, Json(pred)).into_response()
        }
        Err(e) => {
            st.metrics.invocation_errors_total.fetch_add(1, Ordering::Relaxed);
            tracing::error!(error=%e, "inference failed");
            let status = match e {
                ModelError::Load(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

pub async fn metrics_handler(State(st): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, st.metrics.render())
}
