use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};

use super::CallTranscript;

/// Maps campaign-issued correlation ids to the attempt tasks waiting on a
/// webhook push for that call. Cloning shares the underlying table.
#[derive(Clone, Default)]
pub struct CorrelationRegistry {
    waiters: Arc<Mutex<HashMap<String, oneshot::Sender<CallTranscript>>>>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a correlation id. The returned receiver fires
    /// when a push for that id arrives.
    pub async fn register(&self, correlation_id: &str) -> oneshot::Receiver<CallTranscript> {
        let (tx, rx) = oneshot::channel();
        self.waiters
            .lock()
            .await
            .insert(correlation_id.to_string(), tx);
        rx
    }

    /// Deliver a pushed transcript. Returns false when nothing is waiting on
    /// the id, which covers late pushes and ids from other deployments.
    pub async fn resolve(&self, correlation_id: &str, transcript: CallTranscript) -> bool {
        match self.waiters.lock().await.remove(correlation_id) {
            Some(tx) => tx.send(transcript).is_ok(),
            None => false,
        }
    }

    /// Drop a registration that is no longer awaited.
    pub async fn forget(&self, correlation_id: &str) {
        self.waiters.lock().await.remove(correlation_id);
    }

    pub async fn waiting(&self) -> usize {
        self.waiters.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_delivers_to_registered_waiter() {
        let registry = CorrelationRegistry::new();
        let rx = registry.register("corr-1").await;
        let delivered = registry
            .resolve(
                "corr-1",
                CallTranscript {
                    transcript: "yes".to_string(),
                    duration_seconds: 10,
                    completed: true,
                },
            )
            .await;
        assert!(delivered);
        let pushed = rx.await.unwrap();
        assert_eq!(pushed.transcript, "yes");
        assert_eq!(registry.waiting().await, 0);
    }

    #[tokio::test]
    async fn resolve_unknown_id_is_a_noop() {
        let registry = CorrelationRegistry::new();
        assert!(!registry.resolve("nobody", CallTranscript::default()).await);
    }

    #[tokio::test]
    async fn forget_removes_the_waiter() {
        let registry = CorrelationRegistry::new();
        let _rx = registry.register("corr-2").await;
        registry.forget("corr-2").await;
        assert_eq!(registry.waiting().await, 0);
        assert!(!registry.resolve("corr-2", CallTranscript::default()).await);
    }

    #[tokio::test]
    async fn resolve_reports_dropped_receiver() {
        let registry = CorrelationRegistry::new();
        let rx = registry.register("corr-3").await;
        drop(rx);
        assert!(!registry.resolve("corr-3", CallTranscript::default()).await);
    }
}
