//! Polling change feed over a [`RemoteBackend`].
//!
//! Each watched resource gets its own tokio task. The task reloads the
//! resource on an interval and forwards the full set whenever it differs from
//! the previous snapshot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::{Construction, HistoryEntry, Machine};

use super::{RemoteBackend, DEFAULT_HISTORY_LIMIT};

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedResource {
    Machines,
    Constructions,
    History,
}

impl WatchedResource {
    pub const ALL: [Self; 3] = [Self::Machines, Self::Constructions, Self::History];

    async fn snapshot(self, backend: &dyn RemoteBackend) -> Result<RemoteChange> {
        Ok(match self {
            Self::Machines => RemoteChange::Machines(backend.load_machines().await?),
            Self::Constructions => {
                RemoteChange::Constructions(backend.load_constructions().await?)
            }
            Self::History => {
                RemoteChange::History(backend.load_history(DEFAULT_HISTORY_LIMIT).await?)
            }
        })
    }
}

impl fmt::Display for WatchedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Machines => "machines",
            Self::Constructions => "constructions",
            Self::History => "history",
        })
    }
}

/// Full reloaded set of a resource that changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteChange {
    Machines(Vec<Machine>),
    Constructions(Vec<Construction>),
    History(Vec<HistoryEntry>),
}

pub struct ChangeWatcher {
    backend: Arc<dyn RemoteBackend>,
    interval: Duration,
    sender: mpsc::Sender<RemoteChange>,
    tasks: HashMap<WatchedResource, JoinHandle<()>>,
}

impl ChangeWatcher {
    pub fn new(
        backend: Arc<dyn RemoteBackend>,
        interval: Duration,
    ) -> (Self, mpsc::Receiver<RemoteChange>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                backend,
                interval,
                sender,
                tasks: HashMap::new(),
            },
            receiver,
        )
    }

    /// Start watching `resource`, replacing any earlier subscription.
    ///
    /// The current state is loaded before the task starts and is not
    /// emitted; only later differences are.
    pub async fn subscribe(&mut self, resource: WatchedResource) {
        if let Some(previous) = self.tasks.remove(&resource) {
            previous.abort();
        }

        let baseline = match resource.snapshot(self.backend.as_ref()).await {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                tracing::warn!("Initial {} load failed: {}", resource, error);
                None
            }
        };

        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            poll_resource(resource, backend, sender, interval, baseline).await;
        });

        self.tasks.insert(resource, handle);
        tracing::info!("Watching remote {} every {:?}", resource, self.interval);
    }

    pub async fn subscribe_all(&mut self) {
        for resource in WatchedResource::ALL {
            self.subscribe(resource).await;
        }
    }

    pub fn is_subscribed(&self, resource: WatchedResource) -> bool {
        self.tasks.contains_key(&resource)
    }

    /// Stop every subscription.
    pub fn cleanup(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.cleanup();
    }
}

async fn poll_resource(
    resource: WatchedResource,
    backend: Arc<dyn RemoteBackend>,
    sender: mpsc::Sender<RemoteChange>,
    period: Duration,
    mut previous: Option<RemoteChange>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let snapshot = match resource.snapshot(backend.as_ref()).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!("Reloading remote {} failed: {}", resource, error);
                continue;
            }
        };

        if previous.as_ref() == Some(&snapshot) {
            continue;
        }

        tracing::info!("Remote {} changed", resource);
        if sender.send(snapshot.clone()).await.is_err() {
            tracing::debug!("Change receiver dropped; stopping {} watch", resource);
            break;
        }
        previous = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MachineChange;
    use crate::remote::MemoryBackend;
    use pretty_assertions::assert_eq;

    const TICK: Duration = Duration::from_millis(20);

    #[tokio::test(flavor = "multi_thread")]
    async fn emits_after_remote_change() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut watcher, mut changes) = ChangeWatcher::new(backend.clone(), TICK);
        watcher.subscribe(WatchedResource::Machines).await;

        backend
            .save_machine(&MachineChange {
                machine_id: 42,
                construct_id: Some("C7".to_string()),
                previous_construct_id: None,
                user_id: Some("indra".to_string()),
            })
            .await
            .unwrap();

        let change = tokio::time::timeout(Duration::from_secs(5), changes.recv())
            .await
            .unwrap()
            .unwrap();
        match change {
            RemoteChange::Machines(machines) => {
                assert_eq!(machines.len(), 1);
                assert_eq!(machines[0].id, 42);
            }
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unchanged_snapshot_is_not_emitted() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut watcher, mut changes) = ChangeWatcher::new(backend, TICK);
        watcher.subscribe(WatchedResource::Constructions).await;

        let waited = tokio::time::timeout(TICK * 6, changes.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resubscribe_replaces_and_cleanup_stops() {
        let backend = Arc::new(MemoryBackend::new());
        let (mut watcher, _changes) = ChangeWatcher::new(backend, TICK);

        watcher.subscribe(WatchedResource::History).await;
        watcher.subscribe(WatchedResource::History).await;
        assert_eq!(watcher.tasks.len(), 1);

        watcher.subscribe_all().await;
        assert!(WatchedResource::ALL
            .iter()
            .all(|resource| watcher.is_subscribed(*resource)));

        watcher.cleanup();
        assert!(!watcher.is_subscribed(WatchedResource::History));
    }
}
