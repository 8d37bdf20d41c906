use std::sync::Arc;

use serde_json::json;

use entail_common::{EndpointState, PredictionRequest, PredictionResult};

use crate::controller::EndpointController;
use crate::event::{HandlerEvent, HandlerResponse};
use crate::metrics::Metrics;
use crate::pages;
use crate::predict::PredictionProxy;

/// Entry point for every event: user GET/POST and scheduled status checks.
pub struct Handler {
    controller: EndpointController,
    proxy: PredictionProxy,
    metrics: Arc<Metrics>,
    premise: String,
}

impl Handler {
    pub fn new(
        controller: EndpointController,
        proxy: PredictionProxy,
        metrics: Arc<Metrics>,
        premise: impl Into<String>,
    ) -> Self {
        Self {
            controller,
            proxy,
            metrics,
            premise: premise.into(),
        }
    }

    pub fn controller(&self) -> &EndpointController {
        &self.controller
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    #[tracing::instrument(
        name = "handle_event",
        skip_all,
        fields(method = event.http_method.as_deref().unwrap_or("-"), check_status = event.check_status)
    )]
    pub async fn handle(&self, event: HandlerEvent) -> HandlerResponse {
        let state = self.controller.status().await;

        if event.check_status {
            self.metrics.inc(&self.metrics.status_checks_total);
            let outcome = self.controller.check_idle(&state).await;
            tracing::info!(state=%state, ?outcome, "status check");
            return HandlerResponse::bare_ok();
        }

        if state == EndpointState::Absent {
            self.controller.ensure_endpoint().await;
        }

        match event.http_method.as_deref() {
            Some("GET") => HandlerResponse::html(pages::page_for(&state, &self.premise)),
            Some("POST") => self.handle_post(&state, event.body.as_deref()).await,
            other => {
                tracing::debug!(method=?other, "unsupported method");
                HandlerResponse::json(405, &json!({"error": "method not allowed"}))
            }
        }
    }

    async fn handle_post(&self, state: &EndpointState, body: Option<&str>) -> HandlerResponse {
        let req = match PredictionRequest::from_body(body) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error=%e, "rejecting prediction request");
                return HandlerResponse::json(400, &json!({"error": e.to_string()}));
            }
        };

        let result = if state.is_in_service() {
            self.proxy.predict(&req).await
        } else {
            tracing::info!(state=%state, "prediction requested before endpoint is in service");
            PredictionResult::failed("endpoint is not in service")
        };

        match serde_json::to_value(&result) {
            Ok(v) => HandlerResponse::json(200, &v),
            Err(e) => {
                tracing::error!(error=%e, "failed to encode prediction result");
                HandlerResponse::json(500, &json!({"error": "internal error"}))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    use entail_common::ManualClock;
    use entail_meta::MemoryMetaStore;

    use crate::controller::ControllerConfig;
    use crate::invocation::tests::{t0, temp_log_path};
    use crate::invocation::{InvocationStore, InvocationTracker, LocalInvocationFile};
    use crate::platform::MemoryEndpointPlatform;
    use crate::predict::DEFAULT_DEADLINE;
    use crate::trigger::{IntervalTrigger, StatusTrigger};

    pub(crate) const BODY: &str = r#"{"hypothesis":{"0":"A man is asleep"},"premise":{"0":"A man is awake"},"task":{"0":"Contradiction"}}"#;

    pub(crate) struct Fixture {
        pub(crate) platform: Arc<MemoryEndpointPlatform>,
        pub(crate) trigger: Arc<IntervalTrigger>,
        pub(crate) clock: Arc<ManualClock>,
        pub(crate) store: InvocationStore,
        pub(crate) handler: Arc<Handler>,
    }

    pub(crate) fn fixture(platform: MemoryEndpointPlatform) -> Fixture {
        let platform = Arc::new(platform);
        let trigger = Arc::new(IntervalTrigger::new(false));
        let clock = Arc::new(ManualClock::new(t0()));
        let metrics = Arc::new(Metrics::default());
        let store = InvocationStore::new(Arc::new(MemoryMetaStore::new()), "textual-entailment");
        let tracker = Arc::new(InvocationTracker::new(
            store.clone(),
            LocalInvocationFile::new(temp_log_path()),
            5.0,
        ));
        let controller = EndpointController::new(
            platform.clone(),
            trigger.clone(),
            tracker.clone(),
            clock.clone(),
            metrics.clone(),
            ControllerConfig {
                endpoint_name: "textual-entailment-endpoint".to_string(),
                endpoint_config_name: "textual-entailment-endpoint-configuration".to_string(),
                idle_threshold_minutes: 40.0,
            },
        );
        let proxy = PredictionProxy::new(
            platform.clone(),
            tracker,
            clock.clone(),
            metrics.clone(),
            "textual-entailment-endpoint",
            DEFAULT_DEADLINE,
        );
        Fixture {
            platform,
            trigger,
            clock,
            store,
            handler: Arc::new(Handler::new(controller, proxy, metrics, pages::DEFAULT_PREMISE)),
        }
    }

    fn body_json(resp: &HandlerResponse) -> serde_json::Value {
        serde_json::from_str(resp.body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_get_in_service_serves_interactive_page() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        let resp = f.handler.handle(HandlerEvent::get()).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(
            resp.body.as_deref(),
            Some(pages::render_index(pages::DEFAULT_PREMISE).as_str())
        );
        assert_eq!(f.platform.creates(), 0);
    }

    #[tokio::test]
    async fn test_get_while_creating_serves_loading_page() {
        let f = fixture(MemoryEndpointPlatform::with_status("Creating"));
        let resp = f.handler.handle(HandlerEvent::get()).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.body.as_deref(),
            Some(pages::page_for(&EndpointState::Creating, pages::DEFAULT_PREMISE).as_str())
        );
        assert_eq!(f.platform.creates(), 0);
    }

    #[tokio::test]
    async fn test_get_when_absent_creates_endpoint() {
        let f = fixture(MemoryEndpointPlatform::new());
        let resp = f.handler.handle(HandlerEvent::get()).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.body.as_deref(),
            Some(pages::page_for(&EndpointState::Absent, pages::DEFAULT_PREMISE).as_str())
        );
        assert_eq!(f.platform.creates(), 1);
        assert!(f.trigger.is_enabled());
        assert_eq!(f.store.last_invocation().await.unwrap(), Some(t0()));
    }

    #[tokio::test]
    async fn test_unreadable_status_is_treated_as_absent() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.platform.fail_describe(true);
        let resp = f.handler.handle(HandlerEvent::get()).await;
        assert_eq!(
            resp.body.as_deref(),
            Some(pages::page_for(&EndpointState::Absent, pages::DEFAULT_PREMISE).as_str())
        );
        assert_eq!(f.platform.creates(), 1);
    }

    #[tokio::test]
    async fn test_post_success_when_label_in_endpoint_text() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        let raw = r#"{"label": "Contradiction", "probability": "97.12%"}"#;
        f.platform.respond_with(raw);

        let resp = f.handler.handle(HandlerEvent::post(BODY)).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(
            body_json(&resp),
            json!({"jsonFeedback": raw, "successStatus": "Success"})
        );
    }

    #[tokio::test]
    async fn test_post_fail_when_label_absent_from_endpoint_text() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.platform.respond_with(r#"{"label": "Entailment", "probability": "64.00%"}"#);

        let resp = f.handler.handle(HandlerEvent::post(BODY)).await;
        assert_eq!(body_json(&resp)["successStatus"], "Fail");
    }

    #[tokio::test]
    async fn test_post_malformed_body_is_400() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        let resp = f
            .handler
            .handle(HandlerEvent::post(r#"{"hypothesis":{"0":"x"}}"#))
            .await;
        assert_eq!(resp.status_code, 400);
        assert!(body_json(&resp)["error"].as_str().unwrap().contains("malformed"));
        assert!(f.platform.invocations().is_empty());

        let resp = f
            .handler
            .handle(HandlerEvent {
                http_method: Some("POST".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(resp.status_code, 400);
    }

    #[tokio::test]
    async fn test_post_before_in_service_does_not_invoke() {
        let f = fixture(MemoryEndpointPlatform::with_status("Creating"));
        let resp = f.handler.handle(HandlerEvent::post(BODY)).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(body_json(&resp)["successStatus"], "Fail");
        assert!(f.platform.invocations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_timeout_is_well_defined_failure() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.platform.respond_with("Contradiction");
        f.platform.set_latency(Duration::from_secs(11));

        let resp = f.handler.handle(HandlerEvent::post(BODY)).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(
            body_json(&resp),
            json!({"jsonFeedback": "prediction timed out", "successStatus": "Fail"})
        );
    }

    #[tokio::test]
    async fn test_other_methods_are_405() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        let resp = f
            .handler
            .handle(HandlerEvent {
                http_method: Some("PUT".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(resp.status_code, 405);
    }

    #[tokio::test]
    async fn test_check_status_deletes_idle_endpoint() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.store.record_invocation(t0()).await.unwrap();
        f.trigger.enable().await.unwrap();
        f.clock.advance_minutes(45);

        let resp = f.handler.handle(HandlerEvent::check_status()).await;
        assert_eq!(resp, HandlerResponse::bare_ok());
        assert_eq!(f.platform.deletes(), 1);
        assert!(!f.trigger.is_enabled());
    }

    #[tokio::test]
    async fn test_check_status_keeps_recent_endpoint() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.store.record_invocation(t0()).await.unwrap();
        f.trigger.enable().await.unwrap();
        f.clock.advance_minutes(39);

        let resp = f.handler.handle(HandlerEvent::check_status()).await;
        assert_eq!(resp, HandlerResponse::bare_ok());
        assert_eq!(f.platform.deletes(), 0);
        assert!(f.trigger.is_enabled());
    }

    #[tokio::test]
    async fn test_check_status_never_creates() {
        let f = fixture(MemoryEndpointPlatform::new());
        let resp = f.handler.handle(HandlerEvent::check_status()).await;
        assert_eq!(resp, HandlerResponse::bare_ok());
        assert_eq!(f.platform.creates(), 0);
    }

    #[tokio::test]
    async fn test_predictions_keep_endpoint_alive() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.platform.respond_with("Contradiction");
        f.store.record_invocation(t0()).await.unwrap();

        // A prediction every 10 minutes; the idle clock keeps resetting.
        for _ in 0..6 {
            f.clock.advance_minutes(10);
            f.handler.handle(HandlerEvent::post(BODY)).await;
            let resp = f.handler.handle(HandlerEvent::check_status()).await;
            assert_eq!(resp, HandlerResponse::bare_ok());
        }
        assert_eq!(f.platform.deletes(), 0);

        f.clock.advance_minutes(41);
        f.handler.handle(HandlerEvent::check_status()).await;
        assert_eq!(f.platform.deletes(), 1);
    }
}
