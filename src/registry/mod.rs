//! Client registry
//!
//! Shared, lock-protected map of connected clients plus the coordinator
//! tracker. Workers hold a cloned [`Registry`] handle; every operation takes
//! the single lock. Membership notices are queued under it; chat traffic is
//! relayed from a snapshot taken under the lock and sent after releasing it.

pub mod coordinator;
pub mod results;
pub mod state;

pub use coordinator::CoordinatorTracker;
pub use results::{JoinResult, LeaveResult};
pub use state::ChatState;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::connection::{Outbox, deliver_all};
use crate::error::RegistryError;

/// Cloneable handle to the shared chat state.
#[derive(Debug, Clone)]
pub struct Registry {
    state: Arc<Mutex<ChatState>>,
}

impl Registry {
    pub fn new(max_clients: usize, max_id_length: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState::new(max_clients, max_id_length))),
        }
    }

    /// Registers `id`, queueing its greeting on `outbox`. See [`ChatState::register`].
    pub async fn register(&self, id: &str, outbox: Outbox) -> Result<JoinResult, RegistryError> {
        self.state.lock().await.register(id, outbox)
    }

    /// Removes `id` if still registered under `session_id`.
    pub async fn remove(&self, id: &str, session_id: u64) -> Option<LeaveResult> {
        self.state.lock().await.remove(id, session_id)
    }

    pub async fn lookup(&self, id: &str) -> Option<Outbox> {
        self.state.lock().await.lookup(id).cloned()
    }

    /// Point-in-time list of registered identifiers, in join order.
    pub async fn snapshot(&self) -> Vec<String> {
        self.state.lock().await.snapshot()
    }

    /// Point-in-time copy of every registered client's outbox.
    pub async fn recipients(&self) -> Vec<Outbox> {
        self.state.lock().await.outboxes()
    }

    /// Delivers `line` to every registered client, sender included.
    pub async fn broadcast(&self, line: &str) {
        let recipients = self.recipients().await;
        deliver_all(&recipients, line);
    }

    pub async fn coordinator(&self) -> Option<String> {
        self.state.lock().await.coordinator().map(str::to_string)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }

    pub async fn is_full(&self) -> bool {
        self.state.lock().await.is_full()
    }

    pub async fn coordinator_is_consistent(&self) -> bool {
        self.state.lock().await.coordinator_is_consistent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::connection::outbox;

    #[tokio::test]
    async fn registering_then_removing_everyone_empties_the_registry() {
        let registry = Registry::new(16, 16);
        let mut sessions = Vec::new();
        let mut receivers = Vec::new();

        for i in 0..5 {
            let (tx, rx) = outbox(8);
            let id = format!("client{}", i);
            let joined = registry.register(&id, tx).await.unwrap();
            sessions.push((id, joined.session_id));
            receivers.push(rx);
            assert!(registry.coordinator_is_consistent().await);
        }
        assert_eq!(registry.len().await, 5);

        for (id, session) in &sessions {
            registry.remove(id, *session).await.unwrap();
            assert!(registry.coordinator_is_consistent().await);
        }
        assert!(registry.is_empty().await);
        assert_eq!(registry.coordinator().await, None);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_client() {
        let registry = Registry::new(4, 16);
        let (a, mut rx_a) = outbox(8);
        let (b, mut rx_b) = outbox(8);
        registry.register("a", a).await.unwrap();
        registry.register("b", b).await.unwrap();

        // Skip greetings
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        registry.broadcast("hello all").await;
        assert_eq!(rx_a.try_recv().unwrap(), "hello all");
        assert_eq!(rx_b.try_recv().unwrap(), "hello all");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_joins_and_quits_keep_state_consistent() {
        let registry = Registry::new(64, 16);
        let mut workers = Vec::new();

        for i in 0..32 {
            let registry = registry.clone();
            workers.push(tokio::spawn(async move {
                let id = format!("client{}", i);
                for _ in 0..10 {
                    let (tx, _rx) = outbox(4);
                    let joined = registry.register(&id, tx).await.unwrap();
                    assert!(registry.coordinator_is_consistent().await);
                    tokio::task::yield_now().await;

                    registry.remove(&id, joined.session_id).await.unwrap();
                    assert!(registry.coordinator_is_consistent().await);
                }
            }));
        }

        for worker in workers {
            worker.await.unwrap();
        }

        assert!(registry.is_empty().await);
        assert_eq!(registry.coordinator().await, None);
        assert!(registry.coordinator_is_consistent().await);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let registry = Registry::new(4, 16);
        let other = registry.clone();
        let (tx, _rx) = outbox(8);
        registry.register("a", tx).await.unwrap();

        assert!(other.lookup("a").await.is_some());
        assert_eq!(other.snapshot().await, vec!["a".to_string()]);
    }
}
