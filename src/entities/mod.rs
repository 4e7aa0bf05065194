//! Domain model for recurring task entities.
//!
//! This module holds the plain data types the engine operates on:
//! the recurring task record itself, its lifecycle state machine,
//! attachment metadata, and the field-group partitioning used by
//! the commit scheduler.

pub mod attachment;
pub mod field_group;
pub mod task;

pub use attachment::{Attachment, AttachmentFolder};
pub use field_group::{FieldEdit, FieldGroup};
pub use task::{
    FrequencyKind, FrequencyRule, Lifecycle, LifecycleEvent, LocalId, RecurringTask, SortKey, TaskSeed, TaskStatus,
};
