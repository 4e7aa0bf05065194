//! Shared test support: a scripted in-memory gateway and engine setup.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use recurrist::config::Config;
use recurrist::entities::{FieldEdit, FrequencyKind, FrequencyRule, LocalId, TaskSeed};
use recurrist::events::EngineEvent;
use recurrist::gateway::{
    AttachmentMeta, BlobUploader, BulkDeleteOutcome, CreateTaskArgs, GatewayError, RemoteAttachment, RemoteGateway,
    RemoteTask, TaskPatch,
};
use recurrist::sync::SyncEngine;

/// Every call the engine makes, in order.
#[derive(Clone, Debug)]
pub enum RecordedCall {
    Create { name: String },
    Patch { remote_id: String, patch: TaskPatch },
    Delete { remote_id: String },
    BulkDelete { remote_ids: Vec<String> },
    Toggle { remote_id: String },
    Register { remote_id: String, url: String },
    RemoveAttachment { remote_id: String, attachment_id: String },
    Upload { name: String },
}

/// Scripted gateway: records calls, assigns ids, and fails on demand.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<RecordedCall>>,
    next_id: AtomicU64,
    pub fail_create: AtomicBool,
    pub fail_patch: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_upload: AtomicBool,
    pub fail_register: AtomicBool,
    pub fail_remove_attachment: AtomicBool,
    /// Remote ids to report as failed from bulk deletes.
    pub bulk_failures: Mutex<Vec<String>>,
    /// Artificial latency applied to create and patch calls.
    pub latency: Mutex<Option<Duration>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn create_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RecordedCall::Create { .. }))
            .count()
    }

    pub fn patch_calls(&self) -> Vec<TaskPatch> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Patch { patch, .. } => Some(patch),
                _ => None,
            })
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn echo_task(&self, remote_id: String, args: &CreateTaskArgs) -> RemoteTask {
        RemoteTask {
            remote_id,
            name: args.name.clone(),
            description: args.description.clone(),
            frequency: args.frequency.clone(),
            start_date: args.start_date.clone(),
            end_date: args.end_date.clone(),
            priority: args.priority.unwrap_or(1),
            status: args.status.clone(),
            project_ref: args.project_ref.clone(),
            assignees: args.assignees.clone(),
            allocated_hours: args.allocated_hours.unwrap_or(0.0),
            is_active: args.is_active.unwrap_or(true),
            attachments: Vec::new(),
        }
    }
}

#[async_trait]
impl RemoteGateway for RecordingGateway {
    async fn create_task(&self, args: CreateTaskArgs) -> Result<RemoteTask, GatewayError> {
        self.record(RecordedCall::Create { name: args.name.clone() });
        self.simulate_latency().await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("create refused".into()));
        }
        let remote_id = self.fresh_id("task");
        Ok(self.echo_task(remote_id, &args))
    }

    async fn patch_task(&self, remote_id: &str, patch: TaskPatch) -> Result<RemoteTask, GatewayError> {
        self.record(RecordedCall::Patch {
            remote_id: remote_id.to_string(),
            patch: patch.clone(),
        });
        self.simulate_latency().await;
        if self.fail_patch.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("patch refused".into()));
        }
        Ok(self.echo_task(remote_id.to_string(), &CreateTaskArgs::default()))
    }

    async fn delete_task(&self, remote_id: &str) -> Result<(), GatewayError> {
        self.record(RecordedCall::Delete {
            remote_id: remote_id.to_string(),
        });
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("delete refused".into()));
        }
        Ok(())
    }

    async fn bulk_delete_tasks(&self, remote_ids: &[String]) -> Result<BulkDeleteOutcome, GatewayError> {
        self.record(RecordedCall::BulkDelete {
            remote_ids: remote_ids.to_vec(),
        });
        let failures = self.bulk_failures.lock().unwrap().clone();
        let (failed, succeeded): (Vec<String>, Vec<String>) =
            remote_ids.iter().cloned().partition(|id| failures.contains(id));
        Ok(BulkDeleteOutcome { succeeded, failed })
    }

    async fn toggle_active(&self, remote_id: &str) -> Result<bool, GatewayError> {
        self.record(RecordedCall::Toggle {
            remote_id: remote_id.to_string(),
        });
        // Records start active, so the first toggle lands on inactive.
        Ok(false)
    }

    async fn register_attachment(
        &self,
        remote_id: &str,
        meta: AttachmentMeta,
    ) -> Result<Vec<RemoteAttachment>, GatewayError> {
        self.record(RecordedCall::Register {
            remote_id: remote_id.to_string(),
            url: meta.url.clone(),
        });
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("register refused".into()));
        }
        Ok(vec![RemoteAttachment {
            id: self.fresh_id("att"),
            url: meta.url,
            kind: meta.kind,
            name: meta.name,
            folder: meta.folder,
        }])
    }

    async fn remove_attachment(&self, remote_id: &str, attachment_id: &str) -> Result<(), GatewayError> {
        self.record(RecordedCall::RemoveAttachment {
            remote_id: remote_id.to_string(),
            attachment_id: attachment_id.to_string(),
        });
        if self.fail_remove_attachment.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("remove refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobUploader for RecordingGateway {
    async fn upload(&self, name: &str, _bytes: &[u8]) -> Result<String, GatewayError> {
        self.record(RecordedCall::Upload { name: name.to_string() });
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("upload refused".into()));
        }
        Ok(format!("https://blobs.test/{}", name))
    }
}

/// Engine wired to a fresh recording gateway with default config.
pub fn engine() -> (SyncEngine, UnboundedReceiver<EngineEvent>, Arc<RecordingGateway>) {
    let gateway = RecordingGateway::new();
    let config = Config::default();
    let (engine, events) = SyncEngine::new(gateway.clone(), gateway.clone(), &config);
    (engine, events, gateway)
}

pub fn seed(name: &str) -> TaskSeed {
    TaskSeed {
        name: name.to_string(),
        ..TaskSeed::default()
    }
}

pub fn daily() -> FrequencyRule {
    FrequencyRule::new(FrequencyKind::Daily, 1)
}

/// Let spawned tasks run without advancing the paused clock.
pub async fn drain() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Create a task and drive it through its first remote create.
pub async fn persisted_task(engine: &SyncEngine, name: &str) -> LocalId {
    let id = engine.create_task(seed(name));
    // A structural edit triggers the create immediately.
    engine
        .on_field_edit(&id, FieldEdit::Priority(2))
        .expect("edit should apply");
    drain().await;
    assert!(
        engine.get_task(&id).and_then(|t| t.remote_id).is_some(),
        "task should be persisted after its create resolved"
    );
    id
}

/// Collect everything currently sitting in the event channel.
pub fn drain_events(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
