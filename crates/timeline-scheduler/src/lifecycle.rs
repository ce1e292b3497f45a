//! Workflow lifecycle: create, pause, delete
//!
//! Pause and delete never cancel an already-enqueued delayed invocation;
//! the scheduling engine observes the inactive or missing workflow at
//! invocation time and declines to re-enqueue. Typical delayed executors
//! offer no revocation primitive, so inactivity is enforced cooperatively
//! at the next invocation instead of preemptively.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::model::{NewWorkflow, PendingRun, WorkflowUpdate};
use crate::persistence::{RecordStore, StoreError};

/// Errors surfaced to the lifecycle caller
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The workflow does not exist under this owner
    #[error("workflow not found: {0}")]
    NotFound(Uuid),

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LifecycleError {
    fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::WorkflowNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Creates, pauses, and deletes workflows and their task history.
///
/// Consumed by the embedding API layer, which is responsible for having
/// authorized `owner_id` against the authenticated principal before
/// calling in.
pub struct LifecycleManager {
    store: Arc<dyn RecordStore>,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Persist a new workflow and bump the owner's created-workflow
    /// counter, returning the generated id.
    ///
    /// The caller performs the first enqueue into the delayed executor and
    /// then records the pending run via
    /// [`record_first_enqueue`](Self::record_first_enqueue).
    #[instrument(skip(self, workflow), fields(%owner_id))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        workflow: NewWorkflow,
    ) -> Result<Uuid, LifecycleError> {
        let workflow_id = self.store.create_workflow(owner_id, workflow).await?;
        let count = self.store.adjust_workflow_count(owner_id, 1).await?;
        info!(%workflow_id, workflows_created = count, "created workflow");
        Ok(workflow_id)
    }

    /// Record the pending run produced by the caller's first enqueue
    pub async fn record_first_enqueue(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
        run_at: DateTime<Utc>,
        invocation_id: Uuid,
    ) -> Result<(), LifecycleError> {
        self.store
            .update_workflow(
                owner_id,
                workflow_id,
                WorkflowUpdate {
                    next_run: Some(Some(PendingRun {
                        run_at,
                        invocation_id,
                    })),
                    ..Default::default()
                },
            )
            .await
            .map_err(LifecycleError::from_store)
    }

    /// Deactivate a workflow and clear its pending-run pointer.
    ///
    /// Idempotent: pausing an already-inactive workflow is a no-op. The
    /// already-enqueued invocation still fires once; it completes its task
    /// and stops the chain when it sees `active == false`.
    #[instrument(skip(self), fields(%owner_id, %workflow_id))]
    pub async fn pause(&self, owner_id: Uuid, workflow_id: Uuid) -> Result<(), LifecycleError> {
        let workflow = self
            .store
            .get_workflow(owner_id, workflow_id)
            .await
            .map_err(LifecycleError::from_store)?;

        if !workflow.active {
            info!("workflow already inactive");
            return Ok(());
        }

        self.store
            .update_workflow(
                owner_id,
                workflow_id,
                WorkflowUpdate {
                    active: Some(false),
                    next_run: Some(None),
                    ..Default::default()
                },
            )
            .await
            .map_err(LifecycleError::from_store)?;

        info!("workflow paused");
        Ok(())
    }

    /// Delete a workflow and its entire task history, then decrement the
    /// owner's counter.
    ///
    /// A still-pending invocation is left in the executor; it no-ops when
    /// the engine finds the workflow gone.
    #[instrument(skip(self), fields(%owner_id, %workflow_id))]
    pub async fn delete(&self, owner_id: Uuid, workflow_id: Uuid) -> Result<(), LifecycleError> {
        // Existence check up front so a missing workflow surfaces as
        // NotFound before any destructive write.
        self.store
            .get_workflow(owner_id, workflow_id)
            .await
            .map_err(LifecycleError::from_store)?;

        self.store.delete_tasks(owner_id, workflow_id).await?;
        self.store
            .delete_workflow(owner_id, workflow_id)
            .await
            .map_err(LifecycleError::from_store)?;
        let count = self.store.adjust_workflow_count(owner_id, -1).await?;

        info!(workflows_created = count, "workflow and task history deleted");
        Ok(())
    }
}
