//! Remote gateway abstraction.
//!
//! This module defines the interface the surrounding application implements
//! to reach the remote task store, along with the request/response data
//! types and error handling. The engine consumes these traits and is
//! agnostic to transport and encoding; every network concern lives behind
//! this seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::attachment::AttachmentFolder;

/// Common error types for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Gateway error: {0}")]
    Other(String),
}

/// Wire representation of a recurrence rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteFrequency {
    pub kind: String,
    pub interval: u32,
}

/// A task as reported back by the remote store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteTask {
    pub remote_id: String,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Option<RemoteFrequency>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub priority: i32,
    pub status: Option<String>,
    pub project_ref: Option<String>,
    pub assignees: Vec<String>,
    pub allocated_hours: f64,
    pub is_active: bool,
    pub attachments: Vec<RemoteAttachment>,
}

/// An attachment as reported back by the remote store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteAttachment {
    pub id: String,
    pub url: String,
    pub kind: String,
    pub name: String,
    pub folder: AttachmentFolder,
}

/// Arguments for creating a new task. The first create carries every
/// locally-set field at once.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CreateTaskArgs {
    pub name: String,
    pub description: Option<String>,
    pub frequency: Option<RemoteFrequency>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub priority: Option<i32>,
    pub status: Option<String>,
    pub project_ref: Option<String>,
    pub assignees: Vec<String>,
    pub allocated_hours: Option<f64>,
    pub is_active: Option<bool>,
}

/// A partial update carrying exactly one field group's worth of values.
/// Unset fields are left untouched by the remote store.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<RemoteFrequency>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub priority: Option<i32>,
    pub status: Option<String>,
    pub project_ref: Option<Option<String>>,
    pub assignees: Option<Vec<String>>,
    pub allocated_hours: Option<f64>,
    /// Transport-specific extras, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// Metadata for registering an uploaded attachment.
#[derive(Clone, Debug, Serialize)]
pub struct AttachmentMeta {
    pub url: String,
    pub kind: String,
    pub name: String,
    pub folder: AttachmentFolder,
}

/// Per-id outcome of a bulk delete. Partial success is the normal case,
/// not an error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BulkDeleteOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Gateway trait the surrounding application implements to connect the
/// engine to its remote store.
///
/// All operations are safe to retry except `create_task`; the engine
/// guarantees at most one create call is in flight per local record.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn create_task(&self, args: CreateTaskArgs) -> Result<RemoteTask, GatewayError>;
    async fn patch_task(&self, remote_id: &str, patch: TaskPatch) -> Result<RemoteTask, GatewayError>;
    async fn delete_task(&self, remote_id: &str) -> Result<(), GatewayError>;
    async fn bulk_delete_tasks(&self, remote_ids: &[String]) -> Result<BulkDeleteOutcome, GatewayError>;
    async fn toggle_active(&self, remote_id: &str) -> Result<bool, GatewayError>;

    /// Register an already-uploaded blob as an attachment. Returns the
    /// server's full attachment list for the task.
    async fn register_attachment(
        &self,
        remote_id: &str,
        meta: AttachmentMeta,
    ) -> Result<Vec<RemoteAttachment>, GatewayError>;
    async fn remove_attachment(&self, remote_id: &str, attachment_id: &str) -> Result<(), GatewayError>;
}

/// External blob-upload collaborator. Hands bytes to wherever binaries
/// live and returns the resulting URL; registration with the task store
/// is a separate gateway call.
#[async_trait]
pub trait BlobUploader: Send + Sync {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<String, GatewayError>;
}
