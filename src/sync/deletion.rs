//! Deletion, selection, and bulk operations.

use std::collections::HashMap;

use log::{error, info, warn};

use crate::constants::{LOG_DELETE_FAILED, LOG_DELETE_OK};
use crate::entities::{Lifecycle, LocalId};
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::sync::SyncEngine;

/// Per-id outcome of a bulk delete, in local-id terms.
#[derive(Clone, Debug, Default)]
pub struct BulkDeleteReport {
    pub succeeded: Vec<LocalId>,
    pub failed: Vec<LocalId>,
}

impl SyncEngine {
    /// Delete one record.
    ///
    /// Drafts are removed locally with zero gateway calls. Persisted
    /// records enter `Deleting` (which stops all further commits for
    /// them), are confirmed remotely, and only then leave the store. A
    /// failed remote delete returns the record to `Persisted`, flagged,
    /// so the user can retry.
    pub async fn on_delete_request(&self, local_id: &LocalId) -> Result<(), EngineError> {
        let (lifecycle, remote_id) = {
            let mut store = self.store();
            let remote_id = store.get(local_id).and_then(|t| t.remote_id.clone());
            (store.mark_deleting(local_id)?, remote_id)
        };

        // Deletion stops the commit pipeline for this record either way.
        self.scheduler().discard_entity(local_id);

        if lifecycle == Lifecycle::Deleted {
            // Was still a draft; purely local.
            self.store().remove(local_id);
            self.drop_attachment_lock(local_id);
            info!("🗑️ Discarded local draft {}", local_id);
            self.emit(EngineEvent::EntityRemoved(local_id.clone()));
            return Ok(());
        }

        let Some(remote_id) = remote_id else {
            // Lifecycle said persisted but no remote id; treat as local.
            self.store().remove(local_id);
            self.drop_attachment_lock(local_id);
            self.emit(EngineEvent::EntityRemoved(local_id.clone()));
            return Ok(());
        };

        match self.gateway().delete_task(&remote_id).await {
            Ok(()) => {
                info!("{}: {}", LOG_DELETE_OK, local_id);
                self.store().remove(local_id);
                self.drop_attachment_lock(local_id);
                self.emit(EngineEvent::EntityRemoved(local_id.clone()));
                Ok(())
            }
            Err(e) => {
                error!("{} {}: {e}", LOG_DELETE_FAILED, local_id);
                self.store().apply_delete_failure(local_id)?;
                self.emit(EngineEvent::OperationFailed {
                    local_id: local_id.clone(),
                    operation: "delete".to_string(),
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Delete everything currently selected.
    ///
    /// Selected drafts are removed locally; the rest go out as a single
    /// bulk call. Partial failure is the expected shape: succeeded ids
    /// leave the store and the selection, failed ids stay, flagged and
    /// still selected, and the aggregate outcome is both emitted and
    /// returned. There is no all-or-nothing rollback.
    pub async fn on_bulk_delete_request(&self) -> Result<BulkDeleteReport, EngineError> {
        let mut report = BulkDeleteReport::default();
        // remote id -> local id, for mapping the gateway's outcome back
        let mut remote_map: HashMap<String, LocalId> = HashMap::new();

        {
            let mut store = self.store();
            for local_id in store.selected_ids() {
                let Some(task) = store.get(&local_id) else { continue };
                match (task.lifecycle, task.remote_id.clone()) {
                    (Lifecycle::Draft, _) | (_, None) => {
                        store.remove(&local_id);
                        report.succeeded.push(local_id);
                    }
                    (_, Some(remote_id)) => {
                        store.mark_deleting(&local_id)?;
                        remote_map.insert(remote_id, local_id);
                    }
                }
            }
        }

        for local_id in &report.succeeded {
            self.scheduler().discard_entity(local_id);
            self.drop_attachment_lock(local_id);
            self.emit(EngineEvent::EntityRemoved(local_id.clone()));
        }
        for local_id in remote_map.values() {
            self.scheduler().discard_entity(local_id);
        }

        if remote_map.is_empty() {
            self.emit(EngineEvent::BulkDeleteCompleted {
                succeeded: report.succeeded.clone(),
                failed: Vec::new(),
            });
            return Ok(report);
        }

        let remote_ids: Vec<String> = remote_map.keys().cloned().collect();
        info!("🗑️ Bulk deleting {} tasks", remote_ids.len());

        match self.gateway().bulk_delete_tasks(&remote_ids).await {
            Ok(outcome) => {
                for remote_id in &outcome.succeeded {
                    if let Some(local_id) = remote_map.remove(remote_id) {
                        self.store().remove(&local_id);
                        self.drop_attachment_lock(&local_id);
                        self.emit(EngineEvent::EntityRemoved(local_id.clone()));
                        report.succeeded.push(local_id);
                    }
                }
                // Everything not confirmed deleted stays local: the ids
                // the gateway reported failed plus any it never named.
                for (_, local_id) in remote_map {
                    self.store().apply_delete_failure(&local_id)?;
                    self.emit(EngineEvent::EntityChanged(local_id.clone()));
                    report.failed.push(local_id);
                }
            }
            Err(e) => {
                error!("❌ Bulk delete failed outright: {e}");
                for (_, local_id) in remote_map {
                    self.store().apply_delete_failure(&local_id)?;
                    self.emit(EngineEvent::EntityChanged(local_id.clone()));
                    report.failed.push(local_id);
                }
            }
        }

        if !report.failed.is_empty() {
            warn!("⚠️ Bulk delete left {} tasks behind", report.failed.len());
        }

        self.emit(EngineEvent::BulkDeleteCompleted {
            succeeded: report.succeeded.clone(),
            failed: report.failed.clone(),
        });
        Ok(report)
    }

    /// Toggle one record's selection flag; returns the new value.
    pub fn on_selection_toggle(&self, local_id: &LocalId) -> Result<bool, EngineError> {
        let selected = self.store().toggle_selected(local_id)?;
        self.emit(EngineEvent::EntityChanged(local_id.clone()));
        Ok(selected)
    }

    /// Select or deselect every record currently listed.
    pub fn on_select_all(&self, selected: bool) {
        self.store().set_all_selected(selected);
    }

    /// Ids of all currently-selected records.
    pub fn selected_ids(&self) -> Vec<LocalId> {
        self.store().selected_ids()
    }
}
