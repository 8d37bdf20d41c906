use std::sync::Arc;
use std::time::Duration;

use entail_common::{Clock, PredictionRequest, PredictionResult, SuccessStatus};

use crate::invocation::InvocationTracker;
use crate::metrics::Metrics;
use crate::platform::InferenceClient;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("prediction timed out after {0:?}")]
    Timeout(Duration),
    #[error("inference endpoint failed: {0}")]
    Upstream(String),
    #[error("failed to encode prediction payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PredictError {
    /// Short text shown to the user in place of the endpoint's answer.
    pub fn feedback(&self) -> &'static str {
        match self {
            PredictError::Timeout(_) => "prediction timed out",
            PredictError::Upstream(_) | PredictError::Encode(_) => "prediction failed",
        }
    }
}

/// Forwards (premise, hypothesis) pairs to the inference endpoint under a
/// hard deadline. No retries.
pub struct PredictionProxy {
    client: Arc<dyn InferenceClient>,
    tracker: Arc<InvocationTracker>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    endpoint_name: String,
    deadline: Duration,
}

impl PredictionProxy {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        tracker: Arc<InvocationTracker>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        endpoint_name: impl Into<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            client,
            tracker,
            clock,
            metrics,
            endpoint_name: endpoint_name.into(),
            deadline,
        }
    }

    /// Raw endpoint text, or why there is none. A call that outlives the
    /// deadline is dropped; the invocation timestamp is only touched on success.
    #[tracing::instrument(name = "invoke_endpoint", skip_all, fields(endpoint = %self.endpoint_name))]
    pub async fn invoke(&self, req: &PredictionRequest) -> Result<String, PredictError> {
        let body = serde_json::to_vec(&req.endpoint_payload())?;
        let call = self
            .client
            .invoke_endpoint(&self.endpoint_name, body, "application/json");

        let raw = match tokio::time::timeout(self.deadline, call).await {
            Err(_) => return Err(PredictError::Timeout(self.deadline)),
            Ok(Err(e)) => return Err(PredictError::Upstream(e.to_string())),
            Ok(Ok(raw)) => raw,
        };

        self.tracker.touch(self.clock.now()).await;
        Ok(raw)
    }

    pub async fn predict(&self, req: &PredictionRequest) -> PredictionResult {
        self.metrics.inc(&self.metrics.predictions_total);
        let started = std::time::Instant::now();

        let result = match self.invoke(req).await {
            Ok(raw) => PredictionResult::classify(raw, &req.expected_label),
            Err(e) => {
                match e {
                    PredictError::Timeout(_) => self.metrics.inc(&self.metrics.prediction_timeouts_total),
                    _ => self.metrics.inc(&self.metrics.prediction_errors_total),
                }
                tracing::warn!(error=%e, endpoint=%self.endpoint_name, "prediction failed");
                PredictionResult::failed(e.feedback())
            }
        };

        if result.success_status == SuccessStatus::Success {
            self.metrics.inc(&self.metrics.prediction_success_total);
        }
        tracing::info!(
            expected=%req.expected_label,
            status=?result.success_status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction served"
        );
        result
    }
}
