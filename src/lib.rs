//! Recurrist - a synchronization engine for recurring tasks
//!
//! This library keeps an in-memory collection of recurring-task records
//! consistent with a remote store under unreliable, latent, user-driven
//! mutation. Local edits apply optimistically and are committed in the
//! background with per-field-group debouncing; attachments and bulk
//! deletion reconcile against the remote store without ever losing an
//! edit, duplicating a create, or resurrecting a deleted attachment.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Engine configuration management
//! * [`entities`] - Task records, lifecycle states, and field groups
//! * [`store`] - The in-memory entity store
//! * [`scheduler`] - Debounced commit scheduling
//! * [`gateway`] - The remote store interface the application implements
//! * [`sync`] - The synchronization engine itself
//! * [`events`] - Events emitted for UI binding
//! * [`utils`] - Date and rich-text helpers

/// Engine configuration management
pub mod config;

/// Constants and default values
pub mod constants;

/// Task records, lifecycle states, field groups, and attachments
pub mod entities;

/// Engine error taxonomy
pub mod error;

/// Observable events for UI binding
pub mod events;

/// Remote gateway traits and data types
pub mod gateway;

/// File logging setup
pub mod logger;

/// Debounced commit scheduling
pub mod scheduler;

/// The in-memory entity store
pub mod store;

/// The synchronization engine
pub mod sync;

/// Date and rich-text helpers
pub mod utils;

// Re-export the types most callers touch
pub use entities::{Attachment, AttachmentFolder, FieldEdit, FieldGroup, FrequencyKind, FrequencyRule, Lifecycle,
    LocalId, RecurringTask, SortKey, TaskSeed, TaskStatus};
pub use error::EngineError;
pub use events::EngineEvent;
pub use sync::deletion::BulkDeleteReport;
pub use sync::SyncEngine;
