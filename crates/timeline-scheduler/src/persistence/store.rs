//! RecordStore trait definition

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{NewWorkflow, Task, TaskUpdate, Workflow, WorkflowUpdate};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Workflow not found under the owner
    #[error("workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    /// Task not found under the workflow
    #[error("task not found: {0}")]
    TaskNotFound(Uuid),

    /// Backend failure (I/O, serialization, quota)
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Document store for workflows and their task history.
///
/// Workflow documents live under an owner's namespace; task documents are
/// children of their workflow, keyed by the delayed-invocation id that
/// executes them. Each operation is atomic per document; no multi-document
/// transactions are assumed, so callers maintain cross-document invariants
/// by ordering their writes.
///
/// Implementations must be thread-safe and must treat task completion as
/// idempotent: re-applying a completion to an already-terminal task is a
/// no-op, which makes at-least-once redelivery of the same invocation id
/// harmless.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    // =========================================================================
    // Workflow documents
    // =========================================================================

    /// Persist a new workflow; the store assigns the id and `created_at`
    async fn create_workflow(
        &self,
        owner_id: Uuid,
        workflow: NewWorkflow,
    ) -> Result<Uuid, StoreError>;

    /// Fetch a workflow under the owner's namespace
    async fn get_workflow(&self, owner_id: Uuid, workflow_id: Uuid)
        -> Result<Workflow, StoreError>;

    /// Apply a partial update to a workflow document
    async fn update_workflow(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
        update: WorkflowUpdate,
    ) -> Result<(), StoreError>;

    /// Delete the workflow document only; task documents are deleted
    /// separately via [`delete_tasks`](Self::delete_tasks)
    async fn delete_workflow(&self, owner_id: Uuid, workflow_id: Uuid) -> Result<(), StoreError>;

    // =========================================================================
    // Task documents
    // =========================================================================

    /// Upsert a task document keyed by its invocation id
    async fn put_task(&self, task: Task) -> Result<(), StoreError>;

    /// Fetch one task under the workflow
    async fn get_task(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
        task_id: Uuid,
    ) -> Result<Task, StoreError>;

    /// Apply a partial update to a task document.
    ///
    /// Re-completing an already-terminal task is a no-op.
    async fn update_task(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> Result<(), StoreError>;

    /// All tasks under a workflow, pending and historical
    async fn list_tasks(&self, owner_id: Uuid, workflow_id: Uuid)
        -> Result<Vec<Task>, StoreError>;

    /// Remove every task document under a workflow
    async fn delete_tasks(&self, owner_id: Uuid, workflow_id: Uuid) -> Result<(), StoreError>;

    // =========================================================================
    // Owner counters
    // =========================================================================

    /// Atomically adjust the owner's created-workflow counter, returning
    /// the new value
    async fn adjust_workflow_count(&self, owner_id: Uuid, delta: i64) -> Result<i64, StoreError>;
}
