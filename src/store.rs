//! In-memory entity store.
//!
//! The store is the engine's single mutable resource: every entity
//! mutation, local or reconciled from a remote result, passes through the
//! methods here. It owns no transport logic and never blocks on the
//! network; remote outcomes are applied to it after the fact.

use std::collections::HashMap;

use crate::entities::{
    Attachment, FieldEdit, FieldGroup, Lifecycle, LifecycleEvent, LocalId, RecurringTask, SortKey, TaskSeed,
};
use crate::error::EngineError;
use crate::gateway::RemoteTask;

/// What an applied local edit means for the caller.
pub struct EditOutcome {
    pub group: FieldGroup,
    /// Revision of the group after this edit; a commit built from this
    /// edit carries it so success can tell whether newer edits landed.
    pub revision: u64,
    /// The edit forced the end date forward to keep the range valid;
    /// the derived change ships with the same date-range commit.
    pub date_corrected: bool,
    /// False when validation withholds the commit (empty name); the edit
    /// is still applied locally.
    pub schedulable: bool,
}

/// In-memory collection of recurring task records.
#[derive(Default)]
pub struct EntityStore {
    entities: HashMap<LocalId, RecurringTask>,
    /// Insertion order, oldest first; the ordering tie-breaker.
    insertion: Vec<LocalId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new draft locally. Does not contact the network.
    pub fn create(&mut self, seed: TaskSeed) -> LocalId {
        let task = RecurringTask::draft(seed);
        let local_id = task.local_id.clone();
        self.insertion.push(local_id.clone());
        self.entities.insert(local_id.clone(), task);
        local_id
    }

    pub fn get(&self, local_id: &LocalId) -> Option<&RecurringTask> {
        self.entities.get(local_id)
    }

    /// Clone of a record, for building commit payloads outside the lock.
    pub fn snapshot(&self, local_id: &LocalId) -> Option<RecurringTask> {
        self.entities.get(local_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn get_mut(&mut self, local_id: &LocalId) -> Result<&mut RecurringTask, EngineError> {
        self.entities
            .get_mut(local_id)
            .ok_or_else(|| EngineError::UnknownEntity(local_id.clone()))
    }

    /// Apply a field edit to the local copy, synchronously and
    /// optimistically. Commit scheduling is the caller's concern.
    pub fn apply_local_edit(&mut self, local_id: &LocalId, edit: FieldEdit) -> Result<EditOutcome, EngineError> {
        let task = self.get_mut(local_id)?;

        if !task.lifecycle.accepts_commits() {
            return Err(EngineError::Validation(format!(
                "task {} is being deleted and no longer accepts edits",
                local_id
            )));
        }

        let group = edit.group();
        let date_corrected = task.apply_edit(edit);
        let schedulable = !(group == FieldGroup::Name && task.name.trim().is_empty());

        Ok(EditOutcome {
            group,
            revision: task.revision(group),
            date_corrected,
            schedulable,
        })
    }

    /// Reconcile a successful first create.
    ///
    /// Assigns the remote id, flips the draft to persisted, and clears
    /// every dirty group whose revision still matches the snapshot taken
    /// when the create was sent. Groups edited while the create was in
    /// flight stay dirty and are returned so the caller can reschedule
    /// them.
    pub fn apply_create_success(
        &mut self,
        local_id: &LocalId,
        remote: &RemoteTask,
        sent_revisions: &[(FieldGroup, u64)],
    ) -> Result<Vec<FieldGroup>, EngineError> {
        let task = self.get_mut(local_id)?;

        if task.remote_id.is_none() {
            task.remote_id = Some(remote.remote_id.clone());
        }
        task.lifecycle = task.lifecycle.next(LifecycleEvent::CreateSucceeded);
        task.sync_error = false;

        for (group, revision) in sent_revisions {
            if task.revision(*group) == *revision {
                task.dirty_groups.remove(group);
            }
        }

        Ok(task.dirty_groups.iter().copied().collect())
    }

    /// Record a failed create. The record stays a draft; its dirty groups
    /// are untouched so the next scheduled attempt resends everything.
    pub fn apply_create_failure(&mut self, local_id: &LocalId) -> Result<(), EngineError> {
        let task = self.get_mut(local_id)?;
        task.sync_error = true;
        Ok(())
    }

    /// Reconcile a successful field-group commit. Dirt clears only when
    /// no newer local edit landed after the commit was sent.
    pub fn apply_commit_success(
        &mut self,
        local_id: &LocalId,
        group: FieldGroup,
        sent_revision: u64,
    ) -> Result<(), EngineError> {
        let task = self.get_mut(local_id)?;

        if task.revision(group) == sent_revision {
            task.dirty_groups.remove(&group);
        }
        let still_dirty = !task.dirty_groups.is_empty();
        task.lifecycle = task.lifecycle.next(LifecycleEvent::CommitSucceeded { still_dirty });
        task.sync_error = false;
        Ok(())
    }

    /// Record a failed commit: the group stays dirty, the optimistic
    /// value is retained, and the record is flagged for the UI.
    pub fn apply_commit_failure(&mut self, local_id: &LocalId, group: FieldGroup) -> Result<(), EngineError> {
        let task = self.get_mut(local_id)?;
        task.dirty_groups.insert(group);
        task.lifecycle = task.lifecycle.next(LifecycleEvent::CommitFailed);
        task.sync_error = true;
        Ok(())
    }

    /// Enter the deleting state. Returns the resulting lifecycle so the
    /// caller can tell a purely-local draft deletion (already `Deleted`)
    /// from one that needs remote confirmation.
    pub fn mark_deleting(&mut self, local_id: &LocalId) -> Result<Lifecycle, EngineError> {
        let task = self.get_mut(local_id)?;
        task.lifecycle = task.lifecycle.next(LifecycleEvent::DeleteRequested);
        Ok(task.lifecycle)
    }

    /// Record a failed remote delete; the record becomes persisted again
    /// so the delete stays retryable.
    pub fn apply_delete_failure(&mut self, local_id: &LocalId) -> Result<(), EngineError> {
        let task = self.get_mut(local_id)?;
        task.lifecycle = task.lifecycle.next(LifecycleEvent::DeleteFailed);
        task.sync_error = true;
        Ok(())
    }

    /// Drop a record from the store.
    pub fn remove(&mut self, local_id: &LocalId) -> Option<RecurringTask> {
        self.insertion.retain(|id| id != local_id);
        self.entities.remove(local_id)
    }

    /// All records in presentation order: drafts first (newest draft on
    /// top), then the rest in the selected order. The sort is stable, so
    /// records with equal keys keep their insertion order and rows do not
    /// jitter as unrelated fields change.
    pub fn list_ordered(&self, sort: SortKey) -> Vec<&RecurringTask> {
        let mut drafts: Vec<&RecurringTask> = Vec::new();
        let mut rest: Vec<&RecurringTask> = Vec::new();

        for id in &self.insertion {
            if let Some(task) = self.entities.get(id) {
                if task.lifecycle == Lifecycle::Draft {
                    drafts.push(task);
                } else {
                    rest.push(task);
                }
            }
        }

        drafts.reverse();
        rest.sort_by_key(|task| task.sort_rank(sort));

        drafts.extend(rest);
        drafts
    }

    /// Append a server-acknowledged attachment to the local list.
    pub fn add_attachment(&mut self, local_id: &LocalId, attachment: Attachment) -> Result<(), EngineError> {
        self.get_mut(local_id)?.attachments.push(attachment);
        Ok(())
    }

    /// Strip an attachment from the local list by its server id. Callers
    /// only do this after the remote store confirmed the removal; the
    /// local list is what renders, so a removed item can never reappear
    /// from a stale fetch.
    pub fn remove_attachment(&mut self, local_id: &LocalId, attachment_id: &str) -> Result<Option<Attachment>, EngineError> {
        let task = self.get_mut(local_id)?;
        let pos = task
            .attachments
            .iter()
            .position(|a| a.id.as_deref() == Some(attachment_id));
        Ok(pos.map(|i| task.attachments.remove(i)))
    }

    /// Set the active flag (optimistically or from a remote result).
    pub fn set_active(&mut self, local_id: &LocalId, is_active: bool) -> Result<(), EngineError> {
        self.get_mut(local_id)?.is_active = is_active;
        Ok(())
    }

    /// Flag the record's last remote operation as failed.
    pub fn flag_sync_error(&mut self, local_id: &LocalId) -> Result<(), EngineError> {
        self.get_mut(local_id)?.sync_error = true;
        Ok(())
    }

    /// Toggle the selection flag; returns the new value.
    pub fn toggle_selected(&mut self, local_id: &LocalId) -> Result<bool, EngineError> {
        let task = self.get_mut(local_id)?;
        task.selected = !task.selected;
        Ok(task.selected)
    }

    /// Select or deselect every record currently in the store.
    pub fn set_all_selected(&mut self, selected: bool) {
        for task in self.entities.values_mut() {
            task.selected = selected;
        }
    }

    pub fn set_selected(&mut self, local_id: &LocalId, selected: bool) -> Result<(), EngineError> {
        self.get_mut(local_id)?.selected = selected;
        Ok(())
    }

    /// Ids of all currently-selected records, in insertion order.
    pub fn selected_ids(&self) -> Vec<LocalId> {
        self.insertion
            .iter()
            .filter(|id| self.entities.get(id).map(|t| t.selected).unwrap_or(false))
            .cloned()
            .collect()
    }
}
