//! # Recurring Workflow Scheduling Core
//!
//! A self-rescheduling execution engine for recurring workflows. A workflow
//! defines a query, a start time, and a repeat interval; the engine executes
//! the workflow's action at each due time, records a task outcome, and
//! arranges its own next invocation, indefinitely, until the workflow is
//! paused or deleted.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     LifecycleManager                         │
//! │  (creates, pauses, deletes workflows and their task history) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RecordStore                            │
//! │  (workflow and task documents, per-owner counters)           │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SchedulingEngine                         │
//! │  (runs the action, records the task, re-enqueues itself      │
//! │   through the DelayedExecutor for the next grid instant)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Run times always lie on the grid `start_time + k * interval_seconds`;
//! repeated re-scheduling relative to "now" never drifts from the original
//! start time. Pause and delete never cancel an already-enqueued delayed
//! invocation: the engine observes the inactive or missing workflow at
//! invocation time and declines to re-enqueue.
//!
//! ## Example
//!
//! ```ignore
//! use timeline_scheduler::prelude::*;
//!
//! let store = Arc::new(InMemoryRecordStore::new());
//! let executor = Arc::new(InProcessExecutor::new(InProcessExecutorConfig::default()));
//! let engine = Arc::new(SchedulingEngine::new(
//!     store.clone(),
//!     executor.clone(),
//!     Arc::new(CannedQueryAction::default()),
//! ));
//! executor.bind(engine.clone());
//!
//! let lifecycle = LifecycleManager::new(store.clone());
//! let workflow_id = lifecycle.create(owner_id, new_workflow).await?;
//! ```

pub mod action;
pub mod engine;
pub mod executor;
pub mod lifecycle;
pub mod model;
pub mod persistence;
pub mod schedule;

/// Prelude for common imports
pub mod prelude {
    pub use crate::action::{ActionError, CannedQueryAction, QueryAction};
    pub use crate::engine::{RunOutcome, SchedulingEngine};
    pub use crate::executor::{
        DelayedExecutor, ExecutorError, InProcessExecutor, InProcessExecutorConfig,
        InvocationHandler, ScheduleJob,
    };
    pub use crate::lifecycle::{LifecycleError, LifecycleManager};
    pub use crate::model::{NewWorkflow, PendingRun, Task, TaskStatus, Workflow};
    pub use crate::persistence::{InMemoryRecordStore, RecordStore, StoreError};
    pub use crate::schedule::{next_run_after, next_run_from_now};
}

// Re-export key types at crate root
pub use action::{ActionError, CannedQueryAction, QueryAction};
pub use engine::{RunOutcome, SchedulingEngine};
pub use executor::{
    DelayedExecutor, ExecutorError, InProcessExecutor, InProcessExecutorConfig, InvocationHandler,
    ScheduleJob,
};
pub use lifecycle::{LifecycleError, LifecycleManager};
pub use model::{NewWorkflow, PendingRun, Task, TaskStatus, Workflow};
pub use persistence::{InMemoryRecordStore, RecordStore, StoreError};
pub use schedule::{next_run_after, next_run_from_now};
