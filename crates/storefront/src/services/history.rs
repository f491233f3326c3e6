//! Debounced chat history sync.
//!
//! [`HistorySync`] holds one pending write per account and restarts its
//! timer on every save: a burst of saves ends up as a single write of the
//! latest transcript. Writes for one account never overlap: a write waits
//! for the previous one to land, and [`HistorySync::cancel`] returns only
//! once no write for the account is in flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use petsgo_core::{BearerToken, ChatTurn, UserId};

use crate::api::{ApiClient, ApiError};

/// Destination of account transcripts.
pub trait HistorySink: Send + Sync + 'static {
    /// Replace the stored transcript of the account owning `token`.
    fn save_history(
        &self,
        token: &BearerToken,
        turns: &[ChatTurn],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl HistorySink for ApiClient {
    async fn save_history(&self, token: &BearerToken, turns: &[ChatTurn]) -> Result<(), ApiError> {
        self.save_chat_history(token, turns).await
    }
}

/// Debounced transcript writer.
pub struct HistorySync<S> {
    inner: Arc<HistorySyncInner<S>>,
}

impl<S> Clone for HistorySync<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct HistorySyncInner<S> {
    sink: S,
    delay: Duration,
    next_generation: AtomicU64,
    pending: Mutex<HashMap<UserId, PendingWrite>>,
    writers: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl<S> HistorySyncInner<S> {
    /// Lock serializing the writes of `user`.
    async fn writer(&self, user: UserId) -> Arc<Mutex<()>> {
        Arc::clone(self.writers.lock().await.entry(user).or_default())
    }
}

struct PendingWrite {
    generation: u64,
    handle: JoinHandle<()>,
}

impl<S: HistorySink> HistorySync<S> {
    /// Create a writer that waits `delay` after the last save.
    #[must_use]
    pub fn new(sink: S, delay: Duration) -> Self {
        Self {
            inner: Arc::new(HistorySyncInner {
                sink,
                delay,
                next_generation: AtomicU64::new(0),
                pending: Mutex::new(HashMap::new()),
                writers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Schedule a write of `turns`, replacing any pending write for `user`.
    pub async fn schedule(&self, user: UserId, token: BearerToken, turns: Vec<ChatTurn>) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);

        let mut pending = self.inner.pending.lock().await;
        if let Some(previous) = pending.remove(&user) {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            let _writing = inner.writer(user).await.lock_owned().await;

            // Once claimed, a newer schedule can no longer abort this write.
            {
                let mut pending = inner.pending.lock().await;
                match pending.get(&user) {
                    Some(entry) if entry.generation == generation => {
                        pending.remove(&user);
                    }
                    _ => return,
                }
            }

            match inner.sink.save_history(&token, &turns).await {
                Ok(()) => tracing::debug!(user_id = %user, turns = turns.len(), "Chat history saved"),
                Err(e) => tracing::warn!(user_id = %user, error = %e, "Failed to save chat history"),
            }
        });

        pending.insert(user, PendingWrite { generation, handle });
    }

    /// Drop the pending write for `user`, if any, and wait out a write
    /// already in flight.
    pub async fn cancel(&self, user: UserId) {
        if let Some(previous) = self.inner.pending.lock().await.remove(&user) {
            previous.handle.abort();
        }
        drop(self.inner.writer(user).await.lock().await);
    }

    /// Number of accounts with a write waiting.
    pub async fn pending(&self) -> usize {
        self.inner.pending.lock().await.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        writes: StdMutex<Vec<(String, Vec<ChatTurn>)>>,
    }

    impl HistorySink for Arc<RecordingSink> {
        async fn save_history(
            &self,
            token: &BearerToken,
            turns: &[ChatTurn],
        ) -> Result<(), ApiError> {
            self.writes
                .lock()
                .unwrap()
                .push((token.expose().to_string(), turns.to_vec()));
            Ok(())
        }
    }

    fn turns(n: usize) -> Vec<ChatTurn> {
        (0..n).map(|i| ChatTurn::user(format!("m{i}"))).collect()
    }

    #[tokio::test]
    async fn test_burst_collapses_into_latest_write() {
        let sink = Arc::new(RecordingSink::default());
        let sync = HistorySync::new(Arc::clone(&sink), Duration::from_millis(50));
        let user = UserId::new(1);

        for n in 1..=3 {
            sync.schedule(user, BearerToken::new("t"), turns(n)).await;
        }
        assert_eq!(sync.pending().await, 1);

        tokio::time::sleep(Duration::from_millis(300)).await;

        let writes = sink.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes.first().map(|(_, t)| t.len()), Some(3));
        assert_eq!(sync.pending().await, 0);
    }

    #[tokio::test]
    async fn test_users_are_debounced_independently() {
        let sink = Arc::new(RecordingSink::default());
        let sync = HistorySync::new(Arc::clone(&sink), Duration::from_millis(30));

        sync.schedule(UserId::new(1), BearerToken::new("a"), turns(1))
            .await;
        sync.schedule(UserId::new(2), BearerToken::new("b"), turns(2))
            .await;

        tokio::time::sleep(Duration::from_millis(250)).await;

        let mut tokens: Vec<String> = sink
            .writes
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect();
        tokens.sort();
        assert_eq!(tokens, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_drops_pending_write() {
        let sink = Arc::new(RecordingSink::default());
        let sync = HistorySync::new(Arc::clone(&sink), Duration::from_millis(30));
        let user = UserId::new(5);

        sync.schedule(user, BearerToken::new("t"), turns(2)).await;
        sync.cancel(user).await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    /// Sink whose writes take a while; one turn per 10ms of latency.
    #[derive(Default)]
    struct SlowSink {
        events: StdMutex<Vec<String>>,
    }

    impl HistorySink for Arc<SlowSink> {
        async fn save_history(
            &self,
            _token: &BearerToken,
            turns: &[ChatTurn],
        ) -> Result<(), ApiError> {
            let n = turns.len();
            self.events.lock().unwrap().push(format!("start {n}"));
            tokio::time::sleep(Duration::from_millis(10 * n as u64)).await;
            self.events.lock().unwrap().push(format!("end {n}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cancel_waits_for_write_in_flight() {
        let sink = Arc::new(SlowSink::default());
        let sync = HistorySync::new(Arc::clone(&sink), Duration::from_millis(20));
        let user = UserId::new(7);

        sync.schedule(user, BearerToken::new("t"), turns(15)).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.events.lock().unwrap().clone(), vec!["start 15"]);

        sync.cancel(user).await;
        assert_eq!(
            sink.events.lock().unwrap().clone(),
            vec!["start 15", "end 15"]
        );
    }

    #[tokio::test]
    async fn test_newer_write_lands_after_older_one() {
        let sink = Arc::new(SlowSink::default());
        let sync = HistorySync::new(Arc::clone(&sink), Duration::from_millis(20));
        let user = UserId::new(8);

        sync.schedule(user, BearerToken::new("t"), turns(15)).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        sync.schedule(user, BearerToken::new("t"), turns(1)).await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(
            sink.events.lock().unwrap().clone(),
            vec!["start 15", "end 15", "start 1", "end 1"]
        );
    }
}
