//! Synchronization engine for recurring tasks.
//!
//! This module provides the [`SyncEngine`] struct which keeps the local
//! entity store consistent with a remote task store under user-driven
//! mutation. It owns the optimistic edit path, the debounced commit
//! pipeline, attachment reconciliation, and bulk deletion, surfacing
//! state changes to UI collaborators through an event channel.
//!
//! The engine acts as the main data layer for its callers, offering:
//! - Synchronous, optimistic local mutation for every user intent
//! - Debounced background commits to the remote store
//! - Per-field-group failure isolation with dirty-state retry
//! - Attachment upload/delete flows with the local list as source of truth

pub mod attachments;
pub mod deletion;
pub mod edits;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::entities::{LocalId, RecurringTask, SortKey, TaskSeed};
use crate::events::EngineEvent;
use crate::gateway::{BlobUploader, RemoteGateway};
use crate::scheduler::{CommitDelays, CommitRequest, CommitScheduler};
use crate::store::EntityStore;

/// Engine that keeps local recurring-task state consistent with a remote
/// store.
///
/// The engine is the primary data access layer for its UI collaborators:
/// every user intent enters through one of its methods, mutates the
/// entity store optimistically, and is committed to the remote gateway in
/// the background. Cloning is cheap; clones share all state.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use recurrist::config::Config;
/// use recurrist::entities::TaskSeed;
/// use recurrist::sync::SyncEngine;
///
/// # fn gateway() -> Arc<dyn recurrist::gateway::RemoteGateway> { unimplemented!() }
/// # fn uploader() -> Arc<dyn recurrist::gateway::BlobUploader> { unimplemented!() }
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let (engine, mut events) = SyncEngine::new(gateway(), uploader(), &config);
///
/// let id = engine.create_task(TaskSeed::default());
/// engine.on_field_edit(&id, recurrist::entities::FieldEdit::Name("Standup".into()))?;
///
/// while let Some(event) = events.recv().await {
///     // rebind UI rows here
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<Mutex<EntityStore>>,
    gateway: Arc<dyn RemoteGateway>,
    uploader: Arc<dyn BlobUploader>,
    scheduler: CommitScheduler,
    /// Per-entity locks serializing attachment-affecting operations.
    attachment_locks: Arc<Mutex<HashMap<LocalId, Arc<tokio::sync::Mutex<()>>>>>,
    events: mpsc::UnboundedSender<EngineEvent>,
    default_sort: SortKey,
}

impl SyncEngine {
    /// Create an engine and the event stream UI collaborators observe.
    ///
    /// Spawns the background worker that drains scheduled commits; the
    /// call must happen inside a tokio runtime.
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        uploader: Arc<dyn BlobUploader>,
        config: &Config,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (scheduler, commit_rx) = CommitScheduler::new(CommitDelays::from_config(&config.commit));

        let engine = Self {
            store: Arc::new(Mutex::new(EntityStore::new())),
            gateway,
            uploader,
            scheduler,
            attachment_locks: Arc::new(Mutex::new(HashMap::new())),
            events: events_tx,
            default_sort: config.listing.default_sort,
        };

        engine.spawn_commit_worker(commit_rx);
        (engine, events_rx)
    }

    /// Drain scheduled commits, processing each concurrently. Per-pair
    /// ordering is already enforced by the scheduler, so requests for
    /// different pairs may overlap freely.
    fn spawn_commit_worker(&self, mut commit_rx: mpsc::UnboundedReceiver<CommitRequest>) {
        let engine = self.clone();
        tokio::spawn(async move {
            while let Some(request) = commit_rx.recv().await {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine.process_commit(request).await;
                });
            }
        });
    }

    pub(crate) fn store(&self) -> MutexGuard<'_, EntityStore> {
        // Lock is held only for synchronous store mutation, never across
        // an await point.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn scheduler(&self) -> &CommitScheduler {
        &self.scheduler
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn RemoteGateway> {
        &self.gateway
    }

    pub(crate) fn uploader(&self) -> &Arc<dyn BlobUploader> {
        &self.uploader
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    /// The lock serializing attachment-affecting operations for one
    /// entity. A confirmed attachment delete finishes updating the local
    /// list before any upload or description save may proceed.
    pub(crate) fn attachment_lock(&self, local_id: &LocalId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.attachment_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(local_id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub(crate) fn drop_attachment_lock(&self, local_id: &LocalId) {
        let mut locks = self.attachment_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.remove(local_id);
    }

    /// Create a new draft locally. No network traffic; the first
    /// structural edit (or an explicit flush) triggers the remote create.
    pub fn create_task(&self, seed: TaskSeed) -> LocalId {
        let local_id = self.store().create(seed);
        info!("📝 Created local draft {}", local_id);
        self.emit(EngineEvent::EntityChanged(local_id.clone()));
        local_id
    }

    /// Fetch a copy of one record.
    pub fn get_task(&self, local_id: &LocalId) -> Option<RecurringTask> {
        self.store().snapshot(local_id)
    }

    /// All records in presentation order; `sort` falls back to the
    /// configured default ordering.
    pub fn list_tasks(&self, sort: Option<SortKey>) -> Vec<RecurringTask> {
        let sort = sort.unwrap_or(self.default_sort);
        self.store()
            .list_ordered(sort)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Number of records currently in the store.
    pub fn task_count(&self) -> usize {
        self.store().len()
    }

    /// Fire all pending commit timers for an entity immediately.
    ///
    /// Must be called before the owning panel tears down; otherwise a
    /// debounced edit still sitting in a timer would be lost with it.
    pub fn flush_entity(&self, local_id: &LocalId) {
        self.scheduler.flush_entity(local_id);
    }

    /// Tear down an entity's panel state.
    ///
    /// A draft being discarded unsaved has its timers cancelled outright
    /// and leaves the store without any network call. For anything
    /// already persisted the pending timers are flushed instead, so no
    /// edit is silently dropped.
    pub fn discard_entity(&self, local_id: &LocalId) {
        let is_draft = {
            let store = self.store();
            store
                .get(local_id)
                .map(|t| t.lifecycle == crate::entities::Lifecycle::Draft)
                .unwrap_or(false)
        };

        if is_draft {
            self.scheduler.discard_entity(local_id);
            self.store().remove(local_id);
            self.drop_attachment_lock(local_id);
            self.emit(EngineEvent::EntityRemoved(local_id.clone()));
        } else {
            self.scheduler.flush_entity(local_id);
        }
    }
}
