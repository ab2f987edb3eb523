use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use qryvanta_domain::AuditLog;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, warn};

use super::ports::AuditRepository;

/// Default bound on the in-process audit queue before callers start
/// receiving backpressure via a dropped entry (§4.6: "bounded, never
/// unbounded growth").
pub const DEFAULT_QUEUE_CAPACITY: usize = 1_024;

/// Counters surfaced as `authz.audit.dropped`/`authz.audit.enqueued` (§6).
#[derive(Debug, Default)]
pub struct AuditRecorderStats {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    written: AtomicU64,
}

impl AuditRecorderStats {
    /// Entries accepted onto the queue.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Entries that could not be written even after one retry, and were
    /// discarded.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Entries successfully persisted.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

/// Asynchronous audit recorder: accepts entries on a bounded channel and
/// persists them from a background worker pool so the request hot path
/// never waits on storage (§4.6). A write failure is retried exactly once;
/// a second failure increments the drop counter and the entry is lost.
#[derive(Clone)]
pub struct AuditRecorder {
    sender: mpsc::Sender<AuditLog>,
    stats: Arc<AuditRecorderStats>,
}

impl AuditRecorder {
    /// Spawns `worker_count` background workers pulling from a bounded
    /// channel of capacity `DEFAULT_QUEUE_CAPACITY`, each writing through
    /// `repository`.
    #[must_use]
    pub fn spawn(repository: Arc<dyn AuditRepository>, worker_count: usize) -> Self {
        Self::spawn_with_capacity(repository, worker_count, DEFAULT_QUEUE_CAPACITY)
    }

    /// Same as [`AuditRecorder::spawn`] with an explicit channel capacity,
    /// exposed for tests that need a small, fast-filling queue.
    #[must_use]
    pub fn spawn_with_capacity(
        repository: Arc<dyn AuditRepository>,
        worker_count: usize,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(AuditRecorderStats::default());

        for worker_id in 0..worker_count.max(1) {
            let receiver = receiver.clone();
            let repository = repository.clone();
            let stats = stats.clone();
            tokio::spawn(async move {
                loop {
                    let entry = {
                        let mut receiver = receiver.lock().await;
                        receiver.recv().await
                    };
                    let Some(entry) = entry else {
                        break;
                    };
                    Self::write_with_retry(&repository, &stats, entry, worker_id).await;
                }
            });
        }

        Self { sender, stats }
    }

    /// Returns the recorder's counters.
    #[must_use]
    pub fn stats(&self) -> Arc<AuditRecorderStats> {
        self.stats.clone()
    }

    /// Enqueues `entry` for asynchronous persistence. Never blocks on
    /// storage; if the queue is full the entry is dropped immediately and
    /// counted, rather than applying backpressure to the caller.
    pub fn enqueue(&self, entry: AuditLog) {
        match self.sender.try_send(entry) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                warn!("audit queue full, dropping entry");
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    async fn write_with_retry(
        repository: &Arc<dyn AuditRepository>,
        stats: &Arc<AuditRecorderStats>,
        entry: AuditLog,
        worker_id: usize,
    ) {
        if repository.append(entry.clone()).await.is_ok() {
            stats.written.fetch_add(1, Ordering::Relaxed);
            return;
        }
        warn!(worker_id, "audit write failed, retrying once");
        match repository.append(entry).await {
            Ok(()) => stats.written.fetch_add(1, Ordering::Relaxed),
            Err(error) => {
                error!(%error, worker_id, "audit write failed twice, dropping entry");
                stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering as StdOrdering};

    use async_trait::async_trait;
    use chrono::Utc;
    use qryvanta_core::{AppError, AppResult, TenantId};
    use qryvanta_domain::{AuditEventType, AuditLogId};
    use serde_json::Value;
    use tokio::sync::Mutex as TokioMutex;

    use super::super::ports::AuditLogQuery;
    use super::*;

    fn sample() -> AuditLog {
        AuditLog::new(
            AuditLogId::new(),
            TenantId::new(),
            Utc::now(),
            AuditEventType::Decision,
            Some("u-1".to_owned()),
            None,
            Some("document".to_owned()),
            Some("doc-1".to_owned()),
            "read".to_owned(),
            Some("allow".to_owned()),
            Some("viewer: document:read".to_owned()),
            Value::Null,
            Value::Null,
            None,
            None,
        )
    }

    #[derive(Default)]
    struct RecordingRepository {
        written: TokioMutex<Vec<AuditLog>>,
    }

    #[async_trait]
    impl AuditRepository for RecordingRepository {
        async fn append(&self, entry: AuditLog) -> AppResult<()> {
            self.written.lock().await.push(entry);
            Ok(())
        }

        async fn list_recent_entries(
            &self,
            _tenant_id: TenantId,
            _query: AuditLogQuery,
        ) -> AppResult<Vec<AuditLog>> {
            Ok(self.written.lock().await.clone())
        }

        async fn export_entries(
            &self,
            _tenant_id: TenantId,
            _query: AuditLogQuery,
        ) -> AppResult<Vec<AuditLog>> {
            Ok(self.written.lock().await.clone())
        }

        async fn purge_entries_older_than(
            &self,
            _tenant_id: TenantId,
            _cutoff: chrono::DateTime<Utc>,
        ) -> AppResult<u64> {
            Ok(0)
        }
    }

    struct FailTwiceRepository {
        calls: AtomicU32,
    }

    #[async_trait]
    impl AuditRepository for FailTwiceRepository {
        async fn append(&self, _entry: AuditLog) -> AppResult<()> {
            let call = self.calls.fetch_add(1, StdOrdering::SeqCst);
            if call < 2 {
                Err(AppError::StorageError("db unavailable".to_owned()))
            } else {
                Ok(())
            }
        }

        async fn list_recent_entries(
            &self,
            _tenant_id: TenantId,
            _query: AuditLogQuery,
        ) -> AppResult<Vec<AuditLog>> {
            Ok(Vec::new())
        }

        async fn export_entries(
            &self,
            _tenant_id: TenantId,
            _query: AuditLogQuery,
        ) -> AppResult<Vec<AuditLog>> {
            Ok(Vec::new())
        }

        async fn purge_entries_older_than(
            &self,
            _tenant_id: TenantId,
            _cutoff: chrono::DateTime<Utc>,
        ) -> AppResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn enqueued_entry_is_eventually_written() {
        let repository = Arc::new(RecordingRepository::default());
        let recorder = AuditRecorder::spawn(repository.clone(), 2);
        recorder.enqueue(sample());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(recorder.stats().written(), 1);
        assert_eq!(repository.written.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn permanent_failure_is_retried_once_then_dropped() {
        let repository = Arc::new(FailTwiceRepository {
            calls: AtomicU32::new(0),
        });
        let recorder = AuditRecorder::spawn(repository.clone(), 1);
        recorder.enqueue(sample());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(recorder.stats().dropped(), 1);
        assert_eq!(repository.calls.load(StdOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn every_enqueue_is_either_accepted_or_dropped_but_never_lost_silently() {
        let repository = Arc::new(RecordingRepository::default());
        let recorder = AuditRecorder::spawn_with_capacity(repository, 1, 1);
        for _ in 0..5 {
            recorder.enqueue(sample());
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(recorder.stats().enqueued() + recorder.stats().dropped(), 5);
        assert_eq!(recorder.stats().written(), recorder.stats().enqueued());
    }
}
