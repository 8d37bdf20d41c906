use std::sync::Arc;

use entail_common::{minutes_between, Clock, EndpointState};

use crate::invocation::InvocationTracker;
use crate::metrics::Metrics;
use crate::platform::EndpointPlatform;
use crate::trigger::StatusTrigger;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub endpoint_name: String,
    pub endpoint_config_name: String,
    /// Minutes without predictions after which an in-service endpoint is deleted.
    pub idle_threshold_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleCheckOutcome {
    Terminated,
    StillActive,
    NotInService,
    NoRecord,
}

/// Drives the endpoint through Absent → Creating → InService → Absent.
///
/// Nothing here is linearizable: two processes may both observe `Absent` and
/// both issue a create. The platform is expected to reject the second one.
pub struct EndpointController {
    platform: Arc<dyn EndpointPlatform>,
    trigger: Arc<dyn StatusTrigger>,
    tracker: Arc<InvocationTracker>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    config: ControllerConfig,
}

impl EndpointController {
    pub fn new(
        platform: Arc<dyn EndpointPlatform>,
        trigger: Arc<dyn StatusTrigger>,
        tracker: Arc<InvocationTracker>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            platform,
            trigger,
            tracker,
            clock,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Any failure to read status counts as `Absent`.
    pub async fn status(&self) -> EndpointState {
        match self.platform.describe_endpoint(&self.config.endpoint_name).await {
            Ok(status) => EndpointState::from_platform_status(status.as_deref()),
            Err(e) => {
                tracing::warn!(error=%e, endpoint=%self.config.endpoint_name, "failed to read endpoint status, assuming absent");
                EndpointState::Absent
            }
        }
    }

    /// Creates the endpoint, seeds the invocation record and enables the
    /// idle-check trigger. Returns whether the create call succeeded.
    #[tracing::instrument(skip_all, fields(endpoint = %self.config.endpoint_name))]
    pub async fn ensure_endpoint(&self) -> bool {
        let name = &self.config.endpoint_name;
        if let Err(e) = self
            .platform
            .create_endpoint(name, &self.config.endpoint_config_name)
            .await
        {
            tracing::error!(error=%e, endpoint=%name, "failed to create endpoint");
            return false;
        }
        self.metrics.inc(&self.metrics.endpoint_creates_total);
        tracing::info!(endpoint=%name, config=%self.config.endpoint_config_name, "endpoint creation requested");

        self.tracker.start_fresh(self.clock.now()).await;

        if let Err(e) = self.trigger.enable().await {
            tracing::error!(error=%e, "failed to enable status trigger");
        }
        true
    }

    /// Deletes an in-service endpoint that has been idle for longer than the
    /// threshold, and disables the trigger along with it.
    #[tracing::instrument(skip_all, fields(endpoint = %self.config.endpoint_name, state = %state))]
    pub async fn check_idle(&self, state: &EndpointState) -> IdleCheckOutcome {
        let last = match self.tracker.store().last_invocation().await {
            Ok(Some(ts)) => ts,
            Ok(None) => {
                tracing::warn!(project_id=%self.tracker.store().project_id(), "no invocation record, skipping idle check");
                return IdleCheckOutcome::NoRecord;
            }
            Err(e) => {
                tracing::warn!(error=%e, "failed to read invocation record, skipping idle check");
                return IdleCheckOutcome::NoRecord;
            }
        };

        let idle_minutes = minutes_between(&last, &self.clock.now());
        if idle_minutes <= self.config.idle_threshold_minutes {
            tracing::debug!(idle_minutes, state=%state, "endpoint still active");
            return IdleCheckOutcome::StillActive;
        }
        if !state.is_in_service() {
            tracing::debug!(idle_minutes, state=%state, "idle but not in service, nothing to delete");
            return IdleCheckOutcome::NotInService;
        }

        let name = &self.config.endpoint_name;
        if let Err(e) = self.platform.delete_endpoint(name).await {
            tracing::error!(error=%e, endpoint=%name, "failed to delete idle endpoint");
            return IdleCheckOutcome::StillActive;
        }
        self.metrics.inc(&self.metrics.endpoint_deletes_total);
        tracing::info!(endpoint=%name, idle_minutes, "deleted idle endpoint");

        if let Err(e) = self.trigger.disable().await {
            tracing::error!(error=%e, "failed to disable status trigger");
        }
        IdleCheckOutcome::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::tests::{t0, temp_log_path};
    use crate::invocation::{InvocationStore, LocalInvocationFile};
    use crate::platform::MemoryEndpointPlatform;
    use crate::trigger::IntervalTrigger;
    use entail_common::ManualClock;
    use entail_meta::MemoryMetaStore;

    struct Fixture {
        platform: Arc<MemoryEndpointPlatform>,
        trigger: Arc<IntervalTrigger>,
        clock: Arc<ManualClock>,
        store: InvocationStore,
        controller: EndpointController,
    }

    fn fixture(platform: MemoryEndpointPlatform) -> Fixture {
        let platform = Arc::new(platform);
        let trigger = Arc::new(IntervalTrigger::new(false));
        let clock = Arc::new(ManualClock::new(t0()));
        let store = InvocationStore::new(Arc::new(MemoryMetaStore::new()), "textual-entailment");
        let tracker = Arc::new(InvocationTracker::new(
            store.clone(),
            LocalInvocationFile::new(temp_log_path()),
            5.0,
        ));
        let controller = EndpointController::new(
            platform.clone(),
            trigger.clone(),
            tracker,
            clock.clone(),
            Arc::new(Metrics::default()),
            ControllerConfig {
                endpoint_name: "textual-entailment-endpoint".to_string(),
                endpoint_config_name: "textual-entailment-endpoint-configuration".to_string(),
                idle_threshold_minutes: 40.0,
            },
        );
        Fixture {
            platform,
            trigger,
            clock,
            store,
            controller,
        }
    }

    #[tokio::test]
    async fn test_status_fails_open_to_absent() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        assert_eq!(f.controller.status().await, EndpointState::InService);
        f.platform.fail_describe(true);
        assert_eq!(f.controller.status().await, EndpointState::Absent);
    }

    #[tokio::test]
    async fn test_ensure_endpoint_creates_records_and_enables_trigger() {
        let f = fixture(MemoryEndpointPlatform::new());
        assert!(f.controller.ensure_endpoint().await);
        assert_eq!(f.platform.creates(), 1);
        assert_eq!(f.controller.status().await, EndpointState::Creating);
        assert_eq!(f.store.last_invocation().await.unwrap(), Some(t0()));
        assert!(f.trigger.is_enabled());
    }

    #[tokio::test]
    async fn test_idle_endpoint_is_deleted_after_threshold() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.store.record_invocation(t0()).await.unwrap();
        f.trigger.enable().await.unwrap();

        f.clock.advance_minutes(41);
        let outcome = f.controller.check_idle(&EndpointState::InService).await;
        assert_eq!(outcome, IdleCheckOutcome::Terminated);
        assert_eq!(f.platform.deletes(), 1);
        assert!(!f.trigger.is_enabled());
        assert_eq!(f.controller.status().await, EndpointState::Absent);
    }

    #[tokio::test]
    async fn test_endpoint_within_threshold_is_kept() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.store.record_invocation(t0()).await.unwrap();
        f.trigger.enable().await.unwrap();

        f.clock.advance_minutes(40);
        let outcome = f.controller.check_idle(&EndpointState::InService).await;
        assert_eq!(outcome, IdleCheckOutcome::StillActive);
        assert_eq!(f.platform.deletes(), 0);
        assert!(f.trigger.is_enabled());
    }

    #[tokio::test]
    async fn test_idle_but_creating_is_left_alone() {
        let f = fixture(MemoryEndpointPlatform::with_status("Creating"));
        f.store.record_invocation(t0()).await.unwrap();
        f.clock.advance_minutes(90);
        let outcome = f.controller.check_idle(&EndpointState::Creating).await;
        assert_eq!(outcome, IdleCheckOutcome::NotInService);
        assert_eq!(f.platform.deletes(), 0);
    }

    #[tokio::test]
    async fn test_missing_record_skips_idle_check() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        let outcome = f.controller.check_idle(&EndpointState::InService).await;
        assert_eq!(outcome, IdleCheckOutcome::NoRecord);
        assert_eq!(f.platform.deletes(), 0);
    }
}
