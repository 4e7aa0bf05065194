//! Commit scheduling and debouncing.
//!
//! Each `(entity, field group)` pair owns one timer slot here; bursts of
//! edits to the same pair collapse into a single remote write carrying
//! the latest value at fire time. The timer map is instance state, not
//! ambient module state, so two engines never share timers.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::CommitConfig;
use crate::entities::{FieldGroup, LocalId};

/// One debounced commit to perform. The receiver looks up the latest
/// local value itself; requests never carry payloads.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub local_id: LocalId,
    pub group: FieldGroup,
}

/// Debounce delays per field-group class.
#[derive(Clone, Copy, Debug)]
pub struct CommitDelays {
    name: Duration,
    description: Duration,
    allocated_hours: Duration,
}

impl CommitDelays {
    pub fn from_config(config: &CommitConfig) -> Self {
        Self {
            name: Duration::from_millis(config.name_ms),
            description: Duration::from_millis(config.description_ms),
            allocated_hours: Duration::from_millis(config.allocated_hours_ms),
        }
    }

    /// Structural groups commit immediately; they come from discrete
    /// control interactions, not continuous typing.
    fn for_group(self, group: FieldGroup) -> Duration {
        match group {
            FieldGroup::Name => self.name,
            FieldGroup::Description => self.description,
            FieldGroup::AllocatedHours => self.allocated_hours,
            _ => Duration::ZERO,
        }
    }
}

enum PairState {
    /// A timer is pending; superseding edits abort and restart it.
    Debouncing { generation: u64, handle: JoinHandle<()> },
    /// A commit for this pair is on the wire. An edit arriving now sets
    /// `rerun` and is sent, with the then-latest value, once the
    /// in-flight call resolves. Never reordered, never dropped.
    InFlight { rerun: bool },
}

#[derive(Default)]
struct SchedulerInner {
    pairs: HashMap<(LocalId, FieldGroup), PairState>,
    pending_creates: HashSet<LocalId>,
    next_generation: u64,
}

/// Per-engine debounce timer map.
#[derive(Clone)]
pub struct CommitScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    tx: mpsc::UnboundedSender<CommitRequest>,
    delays: CommitDelays,
}

impl CommitScheduler {
    /// Create a scheduler and the request stream its timers feed.
    pub fn new(delays: CommitDelays) -> (Self, mpsc::UnboundedReceiver<CommitRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                inner: Arc::new(Mutex::new(SchedulerInner::default())),
                tx,
                delays,
            },
            rx,
        )
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule a commit for a pair, restarting any pending timer
    /// (trailing debounce). Structural groups fire immediately. If a
    /// commit for the pair is already in flight the edit is buffered and
    /// resent after it resolves.
    pub fn schedule(&self, local_id: LocalId, group: FieldGroup) {
        let delay = self.delays.for_group(group);
        let key = (local_id.clone(), group);
        let mut inner = self.lock();

        match inner.pairs.get_mut(&key) {
            Some(PairState::InFlight { rerun }) => {
                *rerun = true;
                return;
            }
            Some(PairState::Debouncing { handle, .. }) => handle.abort(),
            None => {}
        }

        if delay.is_zero() {
            inner.pairs.insert(key, PairState::InFlight { rerun: false });
            let _ = self.tx.send(CommitRequest { local_id, group });
            return;
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        let inner_arc = Arc::clone(&self.inner);
        let tx = self.tx.clone();
        let timer_key = key.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = inner_arc.lock().unwrap_or_else(PoisonError::into_inner);
            // A superseding edit or cancellation invalidates this timer.
            let current = matches!(
                inner.pairs.get(&timer_key),
                Some(PairState::Debouncing { generation: g, .. }) if *g == generation
            );
            if current {
                inner.pairs.insert(timer_key.clone(), PairState::InFlight { rerun: false });
                let _ = tx.send(CommitRequest {
                    local_id: timer_key.0.clone(),
                    group: timer_key.1,
                });
            }
        });

        inner.pairs.insert(key, PairState::Debouncing { generation, handle });
    }

    /// Mark a pair's in-flight commit as resolved. When an edit was
    /// buffered mid-flight and `allow_rerun` holds, the pair is sent
    /// again right away with the latest value.
    pub fn resolve(&self, local_id: &LocalId, group: FieldGroup, allow_rerun: bool) {
        let key = (local_id.clone(), group);
        let mut inner = self.lock();

        match inner.pairs.remove(&key) {
            Some(PairState::InFlight { rerun }) if rerun && allow_rerun => {
                inner.pairs.insert(key, PairState::InFlight { rerun: false });
                let _ = self.tx.send(CommitRequest {
                    local_id: local_id.clone(),
                    group,
                });
            }
            Some(PairState::Debouncing { handle, .. }) => handle.abort(),
            _ => {}
        }
    }

    /// Fire every pending timer for an entity immediately. Called before
    /// the owning panel tears down so no buffered edit is lost.
    pub fn flush_entity(&self, local_id: &LocalId) {
        let mut inner = self.lock();
        let keys: Vec<_> = inner.pairs.keys().filter(|(id, _)| id == local_id).cloned().collect();

        for key in keys {
            match inner.pairs.remove(&key) {
                Some(PairState::Debouncing { handle, .. }) => {
                    handle.abort();
                    inner.pairs.insert(key.clone(), PairState::InFlight { rerun: false });
                    let _ = self.tx.send(CommitRequest {
                        local_id: key.0,
                        group: key.1,
                    });
                }
                Some(other) => {
                    inner.pairs.insert(key, other);
                }
                None => {}
            }
        }
    }

    /// Drop every timer and guard for an entity without firing anything.
    /// Only valid when the entity is being discarded or deleted.
    pub fn discard_entity(&self, local_id: &LocalId) {
        let mut inner = self.lock();
        let keys: Vec<_> = inner.pairs.keys().filter(|(id, _)| id == local_id).cloned().collect();

        for key in keys {
            if let Some(PairState::Debouncing { handle, .. }) = inner.pairs.remove(&key) {
                handle.abort();
            }
        }
        inner.pending_creates.remove(local_id);
    }

    /// Claim the one create slot for an entity. Returns false when a
    /// create is already in flight, in which case the caller backs off;
    /// the pending create reads the latest local state at send time.
    pub fn begin_create(&self, local_id: &LocalId) -> bool {
        self.lock().pending_creates.insert(local_id.clone())
    }

    pub fn finish_create(&self, local_id: &LocalId) {
        self.lock().pending_creates.remove(local_id);
    }

    pub fn create_pending(&self, local_id: &LocalId) -> bool {
        self.lock().pending_creates.contains(local_id)
    }

    /// Number of live timer slots, pending or in flight.
    pub fn active_pairs(&self) -> usize {
        self.lock().pairs.len()
    }
}
