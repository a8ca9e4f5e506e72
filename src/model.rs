//! Core data model.
//!
//! Dedup policies, task identity, and the admission outcomes reported back
//! to submitters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ---------------------------------------------------------------------------
// Equal Task Action
// ---------------------------------------------------------------------------

/// What `submit` does when an equal task is already pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqualTaskAction {
    /// No dedup. Every submission gets its own entry.
    #[default]
    KeepBoth,
    /// Attach to the pending entry and leave it where it is.
    KeepOld,
    /// Move the pending entry to the tail, keeping its completion handle.
    KeepNew,
}

impl EqualTaskAction {
    pub fn as_str(self) -> &'static str {
        match self {
            EqualTaskAction::KeepBoth => "keep-both",
            EqualTaskAction::KeepOld => "keep-old",
            EqualTaskAction::KeepNew => "keep-new",
        }
    }
}

impl std::fmt::Display for EqualTaskAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EqualTaskAction {
    type Err = Error;

    /// Accepts `keep-new`, `keep_new` and `KEEP_NEW` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "keep-both" => Ok(EqualTaskAction::KeepBoth),
            "keep-old" => Ok(EqualTaskAction::KeepOld),
            "keep-new" => Ok(EqualTaskAction::KeepNew),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Task identity
// ---------------------------------------------------------------------------

/// Identifies one completion handle. Merged submissions share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// What happened when a task was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New entry appended at the tail.
    Created(TaskId),
    /// Attached to an equal pending entry, which kept its position.
    Attached { canonical_id: TaskId },
    /// An equal pending entry was moved to the tail with this descriptor.
    Requeued { canonical_id: TaskId },
}

impl Admission {
    /// The id of the completion handle this submission awaits.
    pub fn task_id(self) -> TaskId {
        match self {
            Admission::Created(id) => id,
            Admission::Attached { canonical_id } | Admission::Requeued { canonical_id } => {
                canonical_id
            }
        }
    }

    pub fn is_merged(self) -> bool {
        !matches!(self, Admission::Created(_))
    }

    /// Metric label for this admission.
    pub fn label(self) -> &'static str {
        match self {
            Admission::Created(_) => "created",
            Admission::Attached { .. } => "attached",
            Admission::Requeued { .. } => "requeued",
        }
    }
}

// ---------------------------------------------------------------------------
// Runner state
// ---------------------------------------------------------------------------

/// Lifecycle state of a runner loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    /// Idle, waiting for the queue to become non-empty.
    Waiting,
    /// Handler running for the dequeued head entry.
    Processing,
    /// Loop exited. Terminal.
    Stopped,
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunnerState::Waiting => "waiting",
            RunnerState::Processing => "processing",
            RunnerState::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}
