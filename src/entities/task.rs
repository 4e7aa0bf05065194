//! The recurring task record and its lifecycle state machine.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::LOCAL_ID_PREFIX;
use crate::entities::attachment::Attachment;
use crate::entities::field_group::{FieldEdit, FieldGroup};
use crate::utils::datetime;

/// Identifier of a task record in the local store.
///
/// Generated once when the record is created and stable for the record's
/// whole local lifetime, including after the record is persisted remotely.
/// The distinct prefix makes a not-yet-persisted token recognizable in
/// logs; tokens are never reused.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalId(String);

impl LocalId {
    /// Generate a fresh local identifier.
    pub fn generate() -> Self {
        Self(format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a task record stands between local edits and remote persistence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Exists only locally, never successfully created remotely.
    Draft,
    /// Remote copy matches the local copy.
    Persisted,
    /// Local edits exist that the remote copy has not confirmed yet.
    Dirty,
    /// A delete has been requested and is awaiting remote confirmation.
    Deleting,
    /// Remote deletion confirmed; the record is about to leave the store.
    Deleted,
}

/// Events that drive lifecycle transitions.
///
/// Transitions are a pure function of (state, event) so the state machine
/// can be tested without a store, a scheduler, or a network.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    LocalEdit,
    CreateSucceeded,
    /// A field-group commit resolved successfully. `still_dirty` reports
    /// whether other groups remain uncommitted afterwards.
    CommitSucceeded { still_dirty: bool },
    CommitFailed,
    DeleteRequested,
    DeleteConfirmed,
    DeleteFailed,
}

impl Lifecycle {
    /// Compute the next state for an event.
    ///
    /// Events that make no sense in the current state leave it unchanged;
    /// callers refuse the operation before getting here.
    pub fn next(self, event: LifecycleEvent) -> Lifecycle {
        use Lifecycle::*;
        use LifecycleEvent::*;

        match (self, event) {
            (Draft, LocalEdit) => Draft,
            (Draft, CreateSucceeded) => Persisted,
            // Deleting a draft never touches the network.
            (Draft, DeleteRequested) => Deleted,

            (Persisted, LocalEdit) => Dirty,
            (Dirty, LocalEdit) => Dirty,
            (Dirty, CommitSucceeded { still_dirty: false }) => Persisted,
            (Dirty, CommitSucceeded { still_dirty: true }) => Dirty,
            (Dirty, CommitFailed) => Dirty,

            (Persisted, DeleteRequested) | (Dirty, DeleteRequested) => Deleting,
            (Deleting, DeleteConfirmed) => Deleted,
            // Falling back to Persisted keeps the delete retryable.
            (Deleting, DeleteFailed) => Persisted,

            (state, _) => state,
        }
    }

    /// Whether the record has a remote counterpart.
    pub fn has_remote(self) -> bool {
        matches!(self, Lifecycle::Persisted | Lifecycle::Dirty | Lifecycle::Deleting)
    }

    /// Whether field edits may still be scheduled and flushed.
    ///
    /// Deletion is terminal: once a delete is requested nothing more is
    /// committed for the record.
    pub fn accepts_commits(self) -> bool {
        !matches!(self, Lifecycle::Deleting | Lifecycle::Deleted)
    }
}

/// How often a task recurs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyKind {
    None,
    Daily,
    Weekly,
    Monthly,
    Weekday,
}

impl FrequencyKind {
    /// Wire name of the rule kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FrequencyKind::None => "none",
            FrequencyKind::Daily => "daily",
            FrequencyKind::Weekly => "weekly",
            FrequencyKind::Monthly => "monthly",
            FrequencyKind::Weekday => "weekday",
        }
    }

    /// Rank used for frequency sorting, ascending by recurrence period.
    pub fn rank(self) -> u8 {
        match self {
            FrequencyKind::None => 0,
            FrequencyKind::Daily => 1,
            FrequencyKind::Weekday => 2,
            FrequencyKind::Weekly => 3,
            FrequencyKind::Monthly => 4,
        }
    }
}

/// A recurrence rule. Expansion into concrete occurrence dates is the
/// remote store's job; locally this is an opaque pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRule {
    pub kind: FrequencyKind,
    /// Every `interval` periods; always at least 1.
    pub interval: u32,
}

impl Default for FrequencyRule {
    fn default() -> Self {
        Self {
            kind: FrequencyKind::None,
            interval: 1,
        }
    }
}

impl FrequencyRule {
    pub fn new(kind: FrequencyKind, interval: u32) -> Self {
        Self {
            kind,
            interval: interval.max(1),
        }
    }
}

/// Workflow status of a task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

impl TaskStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::OnHold => "on_hold",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NotStarted
    }
}

/// User-selectable ordering for task listings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    StartDate,
    EndDate,
    Frequency,
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::StartDate
    }
}

/// Initial values for a freshly created draft.
#[derive(Clone, Debug, Default)]
pub struct TaskSeed {
    pub name: String,
    pub project_ref: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A recurring task record as held by the local store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecurringTask {
    pub local_id: LocalId,
    /// Present only after the first successful remote create; never
    /// changes afterwards.
    pub remote_id: Option<String>,
    pub lifecycle: Lifecycle,

    pub name: String,
    pub frequency: FrequencyRule,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub priority: i32,
    pub status: TaskStatus,
    /// Rich text content; may embed media by URL.
    pub description: String,
    pub project_ref: Option<String>,
    pub assignees: BTreeSet<String>,
    pub allocated_hours: f64,
    pub is_active: bool,

    /// Local attachment list. This list, not any remote fetch, is what
    /// renders; reconciliation keeps it authoritative.
    pub attachments: Vec<Attachment>,

    /// Field groups with local edits not yet confirmed remotely.
    pub dirty_groups: BTreeSet<FieldGroup>,
    /// Monotonic edit counter per group; lets a commit success clear dirt
    /// only when no newer edit landed while the commit was in flight.
    #[serde(skip)]
    pub revisions: HashMap<FieldGroup, u64>,

    /// Multi-select flag, never persisted remotely.
    #[serde(skip)]
    pub selected: bool,
    /// Set when the record's last remote operation failed.
    #[serde(skip)]
    pub sync_error: bool,
}

impl RecurringTask {
    /// Build a new draft from seed values. Dates default to today and one
    /// month out, mirroring what the date invariant would enforce anyway.
    pub fn draft(seed: TaskSeed) -> Self {
        let start = seed.start_date.unwrap_or_else(datetime::today);
        let end = seed.end_date.unwrap_or_else(|| datetime::one_month_after(start));
        let (start, end) = datetime::clamp_range(start, end);

        Self {
            local_id: LocalId::generate(),
            remote_id: None,
            lifecycle: Lifecycle::Draft,
            name: seed.name,
            frequency: FrequencyRule::default(),
            start_date: start,
            end_date: end,
            priority: 1,
            status: TaskStatus::default(),
            description: String::new(),
            project_ref: seed.project_ref,
            assignees: BTreeSet::new(),
            allocated_hours: 0.0,
            is_active: true,
            attachments: Vec::new(),
            dirty_groups: BTreeSet::new(),
            revisions: HashMap::new(),
            selected: false,
            sync_error: false,
        }
    }

    /// Apply a field edit to the local copy.
    ///
    /// Always mutates synchronously; marks the group dirty, bumps its
    /// revision, and advances the lifecycle. Returns `true` if the edit
    /// forced the end date forward to keep `end_date >= start_date`.
    pub fn apply_edit(&mut self, edit: FieldEdit) -> bool {
        let group = edit.group();
        let mut date_corrected = false;

        match edit {
            FieldEdit::Name(name) => self.name = name,
            FieldEdit::Description(text) => self.description = text,
            FieldEdit::Frequency(rule) => self.frequency = rule,
            FieldEdit::DateRange { start, end } => {
                if let Some(start) = start {
                    self.start_date = start;
                }
                if let Some(end) = end {
                    self.end_date = end;
                }
                let (start, end) = datetime::clamp_range(self.start_date, self.end_date);
                date_corrected = end != self.end_date;
                self.start_date = start;
                self.end_date = end;
            }
            FieldEdit::Priority(priority) => self.priority = priority,
            FieldEdit::Status(status) => self.status = status,
            FieldEdit::Assignees(assignees) => self.assignees = assignees,
            FieldEdit::Project(project_ref) => self.project_ref = project_ref,
            FieldEdit::AllocatedHours(hours) => self.allocated_hours = hours,
        }

        self.mark_dirty(group);
        self.lifecycle = self.lifecycle.next(LifecycleEvent::LocalEdit);
        date_corrected
    }

    /// Mark a group dirty and bump its revision.
    pub fn mark_dirty(&mut self, group: FieldGroup) {
        self.dirty_groups.insert(group);
        *self.revisions.entry(group).or_insert(0) += 1;
    }

    /// Current revision of a group (0 if never edited).
    pub fn revision(&self, group: FieldGroup) -> u64 {
        self.revisions.get(&group).copied().unwrap_or(0)
    }

    /// Sort key tuple for a given ordering; callers pair this with a
    /// stable sort so equal keys keep their relative order.
    pub fn sort_rank(&self, key: SortKey) -> (i64, i64) {
        match key {
            SortKey::StartDate => (datetime::epoch_days(self.start_date), 0),
            SortKey::EndDate => (datetime::epoch_days(self.end_date), 0),
            SortKey::Frequency => (i64::from(self.frequency.kind.rank()), i64::from(self.frequency.interval)),
        }
    }
}
