//! Field edits and the commit pipeline.
//!
//! User intents land here, mutate the store optimistically, and leave a
//! debounced commit behind. The commit pipeline picks those up, builds
//! the remote payload from the latest local values at fire time, and
//! reconciles the outcome back into the store.

use log::{debug, error, info};

use crate::constants::{LOG_COMMIT_FAILED, LOG_COMMIT_OK, LOG_CREATE_FAILED, LOG_CREATE_OK};
use crate::entities::{FieldEdit, FieldGroup, FrequencyRule, Lifecycle, LocalId, RecurringTask};
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::gateway::{CreateTaskArgs, RemoteFrequency, TaskPatch};
use crate::scheduler::CommitRequest;
use crate::sync::SyncEngine;
use crate::utils::datetime;

impl SyncEngine {
    /// Apply a field edit optimistically and schedule its commit.
    ///
    /// The local copy always changes synchronously; the remote write is
    /// debounced per field group and carries whatever value is current
    /// when the timer fires. An empty name is applied locally but never
    /// committed; the error tells the UI to prompt for a usable name.
    pub fn on_field_edit(&self, local_id: &LocalId, edit: FieldEdit) -> Result<(), EngineError> {
        let is_description = matches!(&edit, FieldEdit::Description(_));
        let outcome = self.store().apply_local_edit(local_id, edit)?;

        self.emit(EngineEvent::EntityChanged(local_id.clone()));

        if outcome.date_corrected {
            debug!("📅 End date advanced to keep range valid for {}", local_id);
        }

        if is_description {
            // Inline media no longer referenced by the new content is
            // swept out in the background.
            let engine = self.clone();
            let id = local_id.clone();
            let content = self
                .store()
                .get(&id)
                .map(|t| t.description.clone())
                .unwrap_or_default();
            tokio::spawn(async move {
                engine.reconcile_description(&id, &content).await;
            });
        }

        if !outcome.schedulable {
            return Err(EngineError::Validation("task name cannot be empty".to_string()));
        }

        self.scheduler().schedule(local_id.clone(), outcome.group);
        Ok(())
    }

    /// Change the recurrence rule. Structural: commits immediately.
    pub fn on_frequency_change(&self, local_id: &LocalId, rule: FrequencyRule) -> Result<(), EngineError> {
        self.on_field_edit(local_id, FieldEdit::Frequency(rule))
    }

    /// Move either end of the date range. If the edit inverts the range
    /// the end date is advanced to one month past the start and that
    /// correction ships with the same commit.
    pub fn on_date_range_change(
        &self,
        local_id: &LocalId,
        start: Option<chrono::NaiveDate>,
        end: Option<chrono::NaiveDate>,
    ) -> Result<(), EngineError> {
        self.on_field_edit(local_id, FieldEdit::DateRange { start, end })
    }

    /// Flip the active flag, optimistically, then confirm remotely.
    ///
    /// Drafts only flip locally; the flag rides along with the eventual
    /// create. On remote failure the optimistic flip is retained and a
    /// failure notice is surfaced.
    pub async fn on_toggle_active(&self, local_id: &LocalId) -> Result<(), EngineError> {
        let (remote_id, flipped) = {
            let mut store = self.store();
            let task = store
                .get(local_id)
                .ok_or_else(|| EngineError::UnknownEntity(local_id.clone()))?;
            if !task.lifecycle.accepts_commits() {
                return Err(EngineError::Validation(format!(
                    "task {} is being deleted and no longer accepts edits",
                    local_id
                )));
            }
            let flipped = !task.is_active;
            let remote_id = task.remote_id.clone();
            store.set_active(local_id, flipped)?;
            (remote_id, flipped)
        };
        self.emit(EngineEvent::EntityChanged(local_id.clone()));

        let Some(remote_id) = remote_id else {
            return Ok(());
        };

        match self.gateway().toggle_active(&remote_id).await {
            Ok(server_active) => {
                if server_active != flipped {
                    self.store().set_active(local_id, server_active)?;
                    self.emit(EngineEvent::EntityChanged(local_id.clone()));
                }
                Ok(())
            }
            Err(e) => {
                error!("❌ Failed to toggle active flag for {}: {e}", local_id);
                self.store().flag_sync_error(local_id)?;
                self.emit(EngineEvent::OperationFailed {
                    local_id: local_id.clone(),
                    operation: "toggle active".to_string(),
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Handle one scheduled commit: a create for drafts, a field-group
    /// patch for everything else.
    pub(crate) async fn process_commit(&self, request: CommitRequest) {
        let lifecycle = self.store().get(&request.local_id).map(|t| t.lifecycle);

        match lifecycle {
            // The record left the store (discarded draft, confirmed
            // delete); nothing to send.
            None => self.scheduler().resolve(&request.local_id, request.group, false),
            Some(lifecycle) if !lifecycle.accepts_commits() => {
                self.scheduler().resolve(&request.local_id, request.group, false);
            }
            Some(Lifecycle::Draft) => self.run_create(request).await,
            Some(_) => self.run_patch(request).await,
        }
    }

    /// First remote create for a draft. Carries every locally-set field;
    /// at most one create is in flight per record, and a timer firing
    /// while one is pending is ignored since the pending call already
    /// reads the latest state at send time.
    async fn run_create(&self, request: CommitRequest) {
        let local_id = request.local_id.clone();

        if !self.scheduler().begin_create(&local_id) {
            self.scheduler().resolve(&local_id, request.group, false);
            return;
        }

        // Read at send time so the create carries the newest values.
        let Some(task) = self.store().snapshot(&local_id) else {
            self.scheduler().finish_create(&local_id);
            self.scheduler().resolve(&local_id, request.group, false);
            return;
        };

        if task.name.trim().is_empty() {
            // Withheld by validation; the next name edit reschedules.
            debug!("Create withheld for {}: empty name", local_id);
            self.scheduler().finish_create(&local_id);
            self.scheduler().resolve(&local_id, request.group, false);
            return;
        }

        let sent_revisions: Vec<(FieldGroup, u64)> =
            task.dirty_groups.iter().map(|g| (*g, task.revision(*g))).collect();
        let args = build_create_args(&task);

        let result = self.gateway().create_task(args).await;
        self.scheduler().finish_create(&local_id);

        match result {
            Ok(remote) => {
                info!("{}: {} -> {}", LOG_CREATE_OK, local_id, remote.remote_id);
                let leftover = self
                    .store()
                    .apply_create_success(&local_id, &remote, &sent_revisions)
                    .unwrap_or_default();
                self.emit(EngineEvent::EntityChanged(local_id.clone()));
                self.scheduler().resolve(&local_id, request.group, false);
                // Edits that landed while the create was in flight were
                // not carried by it; send them as ordinary patches now.
                for group in leftover {
                    self.scheduler().schedule(local_id.clone(), group);
                }
            }
            Err(e) => {
                error!("{} {}: {e}", LOG_CREATE_FAILED, local_id);
                let _ = self.store().apply_create_failure(&local_id);
                self.emit(EngineEvent::CommitFailed {
                    local_id: local_id.clone(),
                    group: request.group,
                    message: e.to_string(),
                });
                self.scheduler().resolve(&local_id, request.group, false);
            }
        }
    }

    /// One field-group patch, built from the latest local values.
    async fn run_patch(&self, request: CommitRequest) {
        let local_id = request.local_id.clone();
        let group = request.group;

        // A description save is attachment-affecting: it must wait for
        // any in-progress attachment delete to finish updating the local
        // list, and only then read the (possibly stripped) content.
        let gate = (group == FieldGroup::Description).then(|| self.attachment_lock(&local_id));
        let _guard = match &gate {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        // Read at send time, behind the gate, so the payload carries the
        // latest local values.
        let Some(task) = self.store().snapshot(&local_id) else {
            self.scheduler().resolve(&local_id, group, false);
            return;
        };
        if !task.lifecycle.accepts_commits() {
            self.scheduler().resolve(&local_id, group, false);
            return;
        }
        let Some(remote_id) = task.remote_id.clone() else {
            self.scheduler().resolve(&local_id, group, false);
            return;
        };
        let sent_revision = task.revision(group);
        let patch = build_patch(&task, group);

        match self.gateway().patch_task(&remote_id, patch).await {
            Ok(_server_task) => {
                debug!("{}: {} {}", LOG_COMMIT_OK, local_id, group);
                let _ = self.store().apply_commit_success(&local_id, group, sent_revision);
                self.emit(EngineEvent::EntityChanged(local_id.clone()));
                self.scheduler().resolve(&local_id, group, true);
            }
            Err(e) => {
                error!("{} {} {}: {e}", LOG_COMMIT_FAILED, local_id, group);
                let _ = self.store().apply_commit_failure(&local_id, group);
                self.emit(EngineEvent::CommitFailed {
                    local_id: local_id.clone(),
                    group,
                    message: e.to_string(),
                });
                // A buffered edit is newer user input, not a retry; let
                // it go out with the latest value.
                self.scheduler().resolve(&local_id, group, true);
            }
        }
    }
}

fn remote_frequency(rule: FrequencyRule) -> RemoteFrequency {
    RemoteFrequency {
        kind: rule.kind.as_str().to_string(),
        interval: rule.interval,
    }
}

/// The full-field payload for a first create.
fn build_create_args(task: &RecurringTask) -> CreateTaskArgs {
    CreateTaskArgs {
        name: task.name.clone(),
        description: (!task.description.is_empty()).then(|| task.description.clone()),
        frequency: Some(remote_frequency(task.frequency)),
        start_date: Some(datetime::format_ymd(task.start_date)),
        end_date: Some(datetime::format_ymd(task.end_date)),
        priority: Some(task.priority),
        status: Some(task.status.as_str().to_string()),
        project_ref: task.project_ref.clone(),
        assignees: task.assignees.iter().cloned().collect(),
        allocated_hours: Some(task.allocated_hours),
        is_active: Some(task.is_active),
    }
}

/// The single-group payload for a patch; every other field stays unset
/// so the remote store leaves it untouched.
fn build_patch(task: &RecurringTask, group: FieldGroup) -> TaskPatch {
    let mut patch = TaskPatch::default();
    match group {
        FieldGroup::Name => patch.name = Some(task.name.clone()),
        FieldGroup::Description => patch.description = Some(task.description.clone()),
        FieldGroup::Frequency => patch.frequency = Some(remote_frequency(task.frequency)),
        FieldGroup::DateRange => {
            patch.start_date = Some(datetime::format_ymd(task.start_date));
            patch.end_date = Some(datetime::format_ymd(task.end_date));
        }
        FieldGroup::Priority => patch.priority = Some(task.priority),
        FieldGroup::Status => patch.status = Some(task.status.as_str().to_string()),
        FieldGroup::Assignees => patch.assignees = Some(task.assignees.iter().cloned().collect()),
        FieldGroup::Project => patch.project_ref = Some(task.project_ref.clone()),
        FieldGroup::AllocatedHours => patch.allocated_hours = Some(task.allocated_hours),
    }
    patch
}
