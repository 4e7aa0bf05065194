//! Field groups: the unit of debouncing and remote writes.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::task::{FrequencyRule, TaskStatus};

/// A named cluster of task fields committed together as one remote write.
///
/// Each `(entity, group)` pair gets its own debounce timer; groups are
/// disjoint server fields, so commits for different groups of the same
/// entity may resolve in any order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Name,
    Description,
    Frequency,
    DateRange,
    Priority,
    Status,
    Assignees,
    Project,
    AllocatedHours,
}

impl FieldGroup {
    /// Structural groups come from discrete control interactions rather
    /// than continuous typing and commit without a debounce delay.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            FieldGroup::Frequency
                | FieldGroup::DateRange
                | FieldGroup::Assignees
                | FieldGroup::Project
                | FieldGroup::Status
                | FieldGroup::Priority
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldGroup::Name => "name",
            FieldGroup::Description => "description",
            FieldGroup::Frequency => "frequency",
            FieldGroup::DateRange => "date_range",
            FieldGroup::Priority => "priority",
            FieldGroup::Status => "status",
            FieldGroup::Assignees => "assignees",
            FieldGroup::Project => "project",
            FieldGroup::AllocatedHours => "allocated_hours",
        }
    }
}

impl std::fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user edit to one field group, carrying the new value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldEdit {
    Name(String),
    Description(String),
    Frequency(FrequencyRule),
    /// Either bound may be edited alone; the other is left as is and the
    /// range invariant is re-checked afterwards.
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Priority(i32),
    Status(TaskStatus),
    Assignees(BTreeSet<String>),
    Project(Option<String>),
    AllocatedHours(f64),
}

impl FieldEdit {
    /// The group this edit belongs to.
    pub fn group(&self) -> FieldGroup {
        match self {
            FieldEdit::Name(_) => FieldGroup::Name,
            FieldEdit::Description(_) => FieldGroup::Description,
            FieldEdit::Frequency(_) => FieldGroup::Frequency,
            FieldEdit::DateRange { .. } => FieldGroup::DateRange,
            FieldEdit::Priority(_) => FieldGroup::Priority,
            FieldEdit::Status(_) => FieldGroup::Status,
            FieldEdit::Assignees(_) => FieldGroup::Assignees,
            FieldEdit::Project(_) => FieldGroup::Project,
            FieldEdit::AllocatedHours(_) => FieldGroup::AllocatedHours,
        }
    }
}
