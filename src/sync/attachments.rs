//! Attachment reconciliation.
//!
//! The local attachment list is the single source of truth for what
//! renders. Everything here keeps that list consistent with the remote
//! store: uploads only land in the list once registered, deletes only
//! strip it after remote confirmation, and inline media orphaned by a
//! description edit is swept out automatically.

use log::{error, info, warn};

use crate::entities::{Attachment, AttachmentFolder, FieldEdit, LocalId};
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::gateway::AttachmentMeta;
use crate::sync::SyncEngine;
use crate::utils::richtext;

impl SyncEngine {
    /// Upload a binary and register it as an attachment.
    ///
    /// The blob goes to the upload collaborator first; the returned URL
    /// is then registered with the remote store. Only after that call
    /// succeeds is the attachment, now carrying its server id, appended
    /// to the local list. Any failure leaves the list (and the
    /// description) untouched; no placeholder ever appears that could be
    /// mistaken for a persisted attachment.
    pub async fn on_attachment_upload(
        &self,
        local_id: &LocalId,
        name: &str,
        kind: &str,
        bytes: &[u8],
        folder: AttachmentFolder,
    ) -> Result<Attachment, EngineError> {
        let remote_id = {
            let store = self.store();
            let task = store
                .get(local_id)
                .ok_or_else(|| EngineError::UnknownEntity(local_id.clone()))?;
            task.remote_id.clone().ok_or_else(|| {
                EngineError::Validation("task must be saved before attaching files".to_string())
            })?
        };

        let entity_lock = self.attachment_lock(local_id);
        let _guard = entity_lock.lock().await;

        let url = match self.uploader().upload(name, bytes).await {
            Ok(url) => url,
            Err(e) => {
                error!("❌ Attachment upload failed for {}: {e}", local_id);
                self.emit(EngineEvent::OperationFailed {
                    local_id: local_id.clone(),
                    operation: "attachment upload".to_string(),
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let meta = AttachmentMeta {
            url: url.clone(),
            kind: kind.to_string(),
            name: name.to_string(),
            folder,
        };

        let server_list = match self.gateway().register_attachment(&remote_id, meta).await {
            Ok(list) => list,
            Err(e) => {
                error!("❌ Attachment registration failed for {}: {e}", local_id);
                self.emit(EngineEvent::OperationFailed {
                    local_id: local_id.clone(),
                    operation: "attachment upload".to_string(),
                    message: e.to_string(),
                });
                return Err(e.into());
            }
        };

        // The server's list tells us the id it assigned to our URL; the
        // rest of that list is not merged, the local list stays
        // authoritative.
        let registered = server_list.into_iter().find(|a| a.url == url).ok_or_else(|| {
            EngineError::Gateway(crate::gateway::GatewayError::InvalidData(format!(
                "registered attachment {} missing from server list",
                url
            )))
        })?;

        let attachment = Attachment {
            id: Some(registered.id),
            url,
            kind: kind.to_string(),
            name: name.to_string(),
            folder,
        };
        self.store().add_attachment(local_id, attachment.clone())?;
        info!("📎 Attached {} to {}", attachment.name, local_id);
        self.emit(EngineEvent::EntityChanged(local_id.clone()));
        Ok(attachment)
    }

    /// Delete one attachment by its server id.
    ///
    /// The remote call must succeed before the item is stripped from the
    /// local list. For inline media the corresponding reference is also
    /// removed from the rich-text description and a description commit is
    /// rescheduled.
    pub async fn on_attachment_delete(&self, local_id: &LocalId, attachment_id: &str) -> Result<(), EngineError> {
        let remote_id = {
            let store = self.store();
            let task = store
                .get(local_id)
                .ok_or_else(|| EngineError::UnknownEntity(local_id.clone()))?;
            task.remote_id
                .clone()
                .ok_or_else(|| EngineError::Validation("task has no saved attachments".to_string()))?
        };

        let entity_lock = self.attachment_lock(local_id);
        let _guard = entity_lock.lock().await;

        if let Err(e) = self.gateway().remove_attachment(&remote_id, attachment_id).await {
            error!("❌ Attachment delete failed for {}: {e}", local_id);
            self.emit(EngineEvent::OperationFailed {
                local_id: local_id.clone(),
                operation: "attachment delete".to_string(),
                message: e.to_string(),
            });
            return Err(e.into());
        }

        let removed = self.store().remove_attachment(local_id, attachment_id)?;
        let Some(removed) = removed else {
            warn!("⚠️ Deleted attachment {} was not in the local list", attachment_id);
            return Ok(());
        };
        info!("🗑️ Removed attachment {} from {}", removed.name, local_id);
        self.emit(EngineEvent::EntityChanged(local_id.clone()));

        if removed.folder == AttachmentFolder::Description {
            let stripped = {
                let store = self.store();
                store
                    .get(local_id)
                    .filter(|t| richtext::references_media(&t.description, &removed.url))
                    .map(|t| richtext::strip_media_reference(&t.description, &removed.url))
            };
            if let Some(stripped) = stripped {
                // Reschedules a description commit through the normal
                // edit path.
                let _ = self.on_field_edit(local_id, FieldEdit::Description(stripped));
            }
        }

        Ok(())
    }

    /// Sweep out inline media the description no longer references.
    ///
    /// Runs after every description edit. Only `Description`-folder
    /// attachments participate; explicit file attachments are never
    /// auto-deleted, whatever the content says.
    pub(crate) async fn reconcile_description(&self, local_id: &LocalId, content: &str) {
        let orphans: Vec<String> = {
            let store = self.store();
            let Some(task) = store.get(local_id) else { return };
            task.attachments
                .iter()
                .filter(|a| a.folder == AttachmentFolder::Description)
                .filter(|a| !richtext::references_media(content, &a.url))
                .filter_map(|a| a.id.clone())
                .collect()
        };

        for attachment_id in orphans {
            info!("🧹 Sweeping orphaned inline media {} on {}", attachment_id, local_id);
            // Failures are surfaced as events inside the delete flow; a
            // later description edit retries the sweep.
            let _ = self.on_attachment_delete(local_id, &attachment_id).await;
        }
    }
}
