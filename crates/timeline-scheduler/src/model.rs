//! Domain types: workflows and their task history

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of one execution attempt of a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Enqueued for a future instant, not yet run
    Scheduled,

    /// Ran and recorded its result
    Completed,

    /// Reserved: ran and failed (nothing writes this yet; the engine's
    /// failure path leaves the scheduled task untouched)
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// The one pending delayed invocation of a workflow.
///
/// The run instant and the invocation id always travel together: a workflow
/// either has exactly one pending execution (both fields) or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRun {
    /// Instant the pending invocation is due
    pub run_at: DateTime<Utc>,

    /// Identifier the delayed executor assigned to the invocation; also the
    /// id of the `SCHEDULED` task that tracks it
    pub invocation_id: Uuid,
}

/// A recurring unit of scheduled work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Assigned by the store on creation
    pub workflow_id: Uuid,
    pub owner_id: Uuid,

    pub name: String,

    /// Opaque query passed to the workflow's action on every run
    pub query: String,

    /// First grid instant; all run times are `start_time_utc + k * interval`
    pub start_time_utc: DateTime<Utc>,
    pub interval_seconds: NonZeroU32,

    /// When false the engine declines to re-enqueue at the next invocation
    pub active: bool,

    /// The pending execution, if any. Must be `None` when `active` is false.
    pub next_run: Option<PendingRun>,

    pub last_result: Option<String>,
    pub last_run_at_utc: Option<DateTime<Utc>>,

    /// Set by the store at creation, immutable thereafter
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a workflow.
///
/// `interval_seconds` is non-zero by construction; a zero interval is
/// rejected where the request is deserialized or built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkflow {
    pub name: String,
    pub query: String,
    pub start_time_utc: DateTime<Utc>,
    pub interval_seconds: NonZeroU32,
}

/// Partial update of a workflow document.
///
/// `None` fields are left untouched. `next_run` is doubly optional:
/// `Some(None)` clears the pending-run pointer, `Some(Some(_))` replaces it.
#[derive(Debug, Clone, Default)]
pub struct WorkflowUpdate {
    pub active: Option<bool>,
    pub last_result: Option<String>,
    pub last_run_at_utc: Option<DateTime<Utc>>,
    pub next_run: Option<Option<PendingRun>>,
}

/// One concrete execution attempt (past or pending) of a workflow.
///
/// `task_id` equals the delayed-invocation identifier that will or did
/// execute it. Owner and workflow ids are denormalized for independent
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub workflow_id: Uuid,
    pub owner_id: Uuid,

    pub status: TaskStatus,

    /// Present only once the task is completed
    pub result: Option<String>,

    /// Instant this task is or was due
    pub scheduled_run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,

    /// Present only when the task is terminal
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A task recorded for a future invocation
    pub fn scheduled(
        task_id: Uuid,
        workflow_id: Uuid,
        owner_id: Uuid,
        scheduled_run_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            workflow_id,
            owner_id,
            status: TaskStatus::Scheduled,
            result: None,
            scheduled_run_at,
            created_at,
            completed_at: None,
        }
    }

    /// A task recorded directly in its terminal state (immediate first run)
    pub fn completed(
        task_id: Uuid,
        workflow_id: Uuid,
        owner_id: Uuid,
        result: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            workflow_id,
            owner_id,
            status: TaskStatus::Completed,
            result: Some(result),
            scheduled_run_at: at,
            created_at: at,
            completed_at: Some(at),
        }
    }

    /// Whether the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Partial update of a task document; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub result: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    /// The transition a run applies to its own `SCHEDULED` task
    pub fn completion(result: String, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            result: Some(result),
            completed_at: Some(at),
        }
    }
}
