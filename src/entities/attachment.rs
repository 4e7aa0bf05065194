//! Attachment metadata attached to a task record.

use serde::{Deserialize, Serialize};

/// Which bucket an attachment lives in.
///
/// Inline media embedded in the rich-text description is reconciled
/// against the description content; explicit file attachments are only
/// ever removed by direct user action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentFolder {
    Attachments,
    Description,
}

/// One attachment as held in the local list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Server-assigned identifier; set only once the remote store has
    /// acknowledged registration.
    pub id: Option<String>,
    pub url: String,
    /// MIME type or coarse kind string as reported by the uploader.
    pub kind: String,
    pub name: String,
    pub folder: AttachmentFolder,
}
