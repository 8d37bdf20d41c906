use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use entail_common::{minutes_between, InvocationRecord};
use entail_meta::MetaStore;

/// Accessor for the shared last-invocation row.
#[derive(Clone)]
pub struct InvocationStore {
    store: Arc<dyn MetaStore>,
    project_id: String,
}

impl InvocationStore {
    pub fn new(store: Arc<dyn MetaStore>, project_id: impl Into<String>) -> Self {
        Self {
            store,
            project_id: project_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub async fn last_invocation(&self) -> Result<Option<NaiveDateTime>> {
        let key = InvocationRecord::store_key(&self.project_id);
        let Some(bytes) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let record: InvocationRecord = serde_json::from_slice(&bytes)?;
        Ok(Some(record.last_invocation))
    }

    pub async fn record_invocation(&self, at: NaiveDateTime) -> Result<()> {
        let record = InvocationRecord {
            project_id: self.project_id.clone(),
            last_invocation: at,
        };
        let key = InvocationRecord::store_key(&self.project_id);
        self.store.put(&key, serde_json::to_vec(&record)?).await?;
        Ok(())
    }
}

/// On-disk duplicate of the last-invocation bookkeeping. Only meaningful for
/// the lifetime of one warm process; it throttles store writes and is never
/// used as the source of truth for idle time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalInvocationLog {
    #[serde(rename = "lastInvocation", with = "entail_common::timestamp::serde_format")]
    pub last_invocation: NaiveDateTime,
    #[serde(rename = "lastStoreUpdate", with = "entail_common::timestamp::serde_format")]
    pub last_store_update: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct LocalInvocationFile {
    path: PathBuf,
}

impl LocalInvocationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file is treated as absent.
    pub async fn load(&self) -> Option<LocalInvocationLog> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str(raw.trim()) {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::warn!(error=%e, path=%self.path.display(), "discarding unreadable local invocation log");
                None
            }
        }
    }

    pub async fn save(&self, log: &LocalInvocationLog) -> Result<()> {
        let mut line = serde_json::to_string(log)?;
        line.push('\n');
        tokio::fs::write(&self.path, line).await?;
        Ok(())
    }
}

/// Rate-limited propagation of invocation timestamps to the shared store.
pub struct InvocationTracker {
    store: InvocationStore,
    local: LocalInvocationFile,
    write_interval_minutes: f64,
    // Serializes read-modify-write of the local file across concurrent requests.
    lock: Mutex<()>,
}

impl InvocationTracker {
    pub fn new(store: InvocationStore, local: LocalInvocationFile, write_interval_minutes: f64) -> Self {
        Self {
            store,
            local,
            write_interval_minutes,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &InvocationStore {
        &self.store
    }

    /// Writes `now` to the shared store and resets the local log. Used when
    /// the endpoint is created and on the first prediction of a process.
    /// Returns whether the store write succeeded.
    pub async fn start_fresh(&self, now: NaiveDateTime) -> bool {
        let _guard = self.lock.lock().await;
        self.start_fresh_locked(now).await
    }

    async fn start_fresh_locked(&self, now: NaiveDateTime) -> bool {
        if let Err(e) = self.store.record_invocation(now).await {
            // Leave the local log untouched so the next call retries the write.
            tracing::warn!(error=%e, project_id=%self.store.project_id(), "failed to record invocation");
            return false;
        }
        let log = LocalInvocationLog {
            last_invocation: now,
            last_store_update: now,
        };
        if let Err(e) = self.local.save(&log).await {
            tracing::warn!(error=%e, path=%self.local.path().display(), "failed to write local invocation log");
        }
        true
    }

    /// Records a prediction at `now`. The shared store is written at most once
    /// per write interval; the local log always advances. Returns whether the
    /// shared store was written.
    pub async fn touch(&self, now: NaiveDateTime) -> bool {
        let _guard = self.lock.lock().await;

        let Some(mut log) = self.local.load().await else {
            return self.start_fresh_locked(now).await;
        };

        log.last_invocation = now;
        let since_update = minutes_between(&log.last_store_update, &now);
        let mut wrote = false;
        if since_update > self.write_interval_minutes {
            match self.store.record_invocation(now).await {
                Ok(()) => {
                    log.last_store_update = now;
                    wrote = true;
                }
                Err(e) => {
                    tracing::warn!(error=%e, project_id=%self.store.project_id(), "failed to propagate invocation");
                }
            }
        }

        if let Err(e) = self.local.save(&log).await {
            tracing::warn!(error=%e, path=%self.local.path().display(), "failed to write local invocation log");
        }
        tracing::debug!(since_update, wrote, "invocation recorded");
        wrote
    }
}
