//! Observable events emitted for UI binding.

use crate::entities::{FieldGroup, LocalId};

/// Events the engine pushes over its unbounded channel as local state
/// changes or remote operations resolve.
///
/// Presenters rebind rows on `EntityChanged`, drop rows on
/// `EntityRemoved`, and show a dismissible notice on the failure
/// variants. After `BulkDeleteCompleted`, a detail panel showing one of
/// the succeeded ids must be closed by its presenter; panels over failed
/// ids stay open.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    /// The record changed locally or was reconciled with a remote result.
    EntityChanged(LocalId),
    /// The record left the store.
    EntityRemoved(LocalId),
    /// A field-group commit failed; the group stays dirty and the
    /// optimistic value is retained.
    CommitFailed {
        local_id: LocalId,
        group: FieldGroup,
        message: String,
    },
    /// A non-commit remote operation failed (delete, active toggle,
    /// attachment upload or delete). `operation` is a short label fit
    /// for a user-visible notice.
    OperationFailed {
        local_id: LocalId,
        operation: String,
        message: String,
    },
    /// Bulk delete finished; partial failure is reported per id, not
    /// collapsed into a single boolean.
    BulkDeleteCompleted {
        succeeded: Vec<LocalId>,
        failed: Vec<LocalId>,
    },
}
