use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::event::HandlerEvent;
use crate::handler::Handler;

/// Periodic trigger that asks the handler to check endpoint idle time.
#[async_trait]
pub trait StatusTrigger: Send + Sync {
    async fn enable(&self) -> Result<()>;
    async fn disable(&self) -> Result<()>;
    fn is_enabled(&self) -> bool;
}

/// In-process scheduled trigger: while enabled, delivers a `CheckStatus`
/// event to the handler once per interval.
#[derive(Debug, Default)]
pub struct IntervalTrigger {
    enabled: AtomicBool,
    changed: Notify,
}

impl IntervalTrigger {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            changed: Notify::new(),
        }
    }

    /// Runs until the handler is dropped. The trigger is owned by the
    /// handler's controller, so only a weak reference is held here.
    pub async fn run(self: Arc<Self>, every: Duration, handler: Weak<Handler>) {
        tracing::info!(interval_secs = every.as_secs(), enabled = self.is_enabled(), "status trigger started");
        loop {
            if !self.is_enabled() {
                self.changed.notified().await;
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(every) => {
                    if !self.is_enabled() {
                        continue;
                    }
                    let Some(handler) = handler.upgrade() else {
                        break;
                    };
                    let resp = handler.handle(HandlerEvent::check_status()).await;
                    tracing::debug!(status = resp.status_code, "scheduled status check delivered");
                }
                // Restart the wait whenever the trigger is toggled.
                _ = self.changed.notified() => {}
            }
        }
        tracing::info!("status trigger stopped");
    }
}

#[async_trait]
impl StatusTrigger for IntervalTrigger {
    async fn enable(&self) -> Result<()> {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            tracing::info!("status trigger enabled");
        }
        self.changed.notify_one();
        Ok(())
    }

    async fn disable(&self) -> Result<()> {
        if self.enabled.swap(false, Ordering::SeqCst) {
            tracing::info!("status trigger disabled");
        }
        self.changed.notify_one();
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::handler::tests::fixture;
    use crate::invocation::tests::t0;
    use crate::platform::MemoryEndpointPlatform;

    const EVERY: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn test_idle_endpoint_is_deleted_without_traffic() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.store.record_invocation(t0()).await.unwrap();
        f.clock.advance_minutes(45);

        tokio::spawn(f.trigger.clone().run(EVERY, Arc::downgrade(&f.handler)));
        f.trigger.enable().await.unwrap();

        tokio::time::sleep(EVERY + Duration::from_secs(1)).await;
        let checks = &f.handler.metrics().status_checks_total;
        assert_eq!(f.platform.deletes(), 1);
        assert!(!f.trigger.is_enabled());
        assert_eq!(checks.load(Ordering::Relaxed), 1);

        // Disabled: no further checks are delivered.
        tokio::time::sleep(EVERY * 5).await;
        assert_eq!(checks.load(Ordering::Relaxed), 1);
        assert_eq!(f.platform.deletes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_endpoint_is_checked_every_interval() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.store.record_invocation(t0()).await.unwrap();

        tokio::spawn(f.trigger.clone().run(EVERY, Arc::downgrade(&f.handler)));
        f.trigger.enable().await.unwrap();

        tokio::time::sleep(EVERY * 3 + Duration::from_secs(1)).await;
        let checks = f.handler.metrics().status_checks_total.load(Ordering::Relaxed);
        assert_eq!(checks, 3);
        assert_eq!(f.platform.deletes(), 0);
        assert!(f.trigger.is_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_trigger_waits_until_enabled() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        f.store.record_invocation(t0()).await.unwrap();

        tokio::spawn(f.trigger.clone().run(EVERY, Arc::downgrade(&f.handler)));
        tokio::time::sleep(EVERY * 2).await;
        let checks = &f.handler.metrics().status_checks_total;
        assert_eq!(checks.load(Ordering::Relaxed), 0);

        f.trigger.enable().await.unwrap();
        tokio::time::sleep(EVERY + Duration::from_secs(1)).await;
        assert_eq!(checks.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_once_handler_is_dropped() {
        let f = fixture(MemoryEndpointPlatform::with_status("InService"));
        let trigger = f.trigger.clone();
        trigger.enable().await.unwrap();

        let task = tokio::spawn(trigger.run(EVERY, Arc::downgrade(&f.handler)));
        drop(f);

        tokio::time::timeout(EVERY * 2, task).await.unwrap().unwrap();
    }
}
