//! The self-rescheduling execution unit
//!
//! Each invocation runs the workflow's action, records the task outcome,
//! computes the next grid instant, and re-enqueues itself through the
//! delayed executor while the workflow stays active. The invocation it
//! enqueues is the only authority for the one after that, which keeps at
//! most one invocation in flight per workflow.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::action::{ActionError, QueryAction};
use crate::executor::{DelayedExecutor, ExecutorError, InvocationHandler, ScheduleJob};
use crate::model::{PendingRun, Task, TaskUpdate, Workflow, WorkflowUpdate};
use crate::persistence::{RecordStore, StoreError};
use crate::schedule::next_run_after;

/// Internal failure of one scheduled run
#[derive(Debug, thiserror::Error)]
enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Structured outcome of one invocation.
///
/// Invocations run asynchronously relative to any request that started the
/// chain, so this is the only synchronous signal the engine produces;
/// everything else is visible through the task history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run completed; `next_task_id` is absent when the workflow was
    /// inactive and the chain stopped
    Completed {
        workflow_id: Uuid,
        owner_id: Uuid,
        completed_task_id: Uuid,
        next_task_id: Option<Uuid>,
    },

    /// The workflow was deleted while this invocation was pending; the
    /// invocation is a harmless no-op, not a failure
    WorkflowMissing { workflow_id: Uuid },

    /// The run failed. The chain stops here: the error is recorded, not
    /// re-raised, so the executor's own retry machinery never re-runs the
    /// action under the same invocation id.
    Failed { workflow_id: Uuid, error: String },
}

/// Executes scheduled workflow runs and arranges their successors.
///
/// Invoked by the delayed executor with the job it was enqueued with and
/// the invocation id the executor assigned at enqueue time. That id keys
/// the task document for the run.
pub struct SchedulingEngine {
    store: Arc<dyn RecordStore>,
    executor: Arc<dyn DelayedExecutor>,
    action: Arc<dyn QueryAction>,
}

impl SchedulingEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        executor: Arc<dyn DelayedExecutor>,
        action: Arc<dyn QueryAction>,
    ) -> Self {
        Self {
            store,
            executor,
            action,
        }
    }

    /// Run one due invocation to completion.
    ///
    /// Never returns an error: a missing workflow terminates as
    /// [`RunOutcome::WorkflowMissing`], and any failure in the run itself
    /// is logged and folded into [`RunOutcome::Failed`].
    #[instrument(skip(self), fields(workflow_id = %job.workflow_id, %invocation_id))]
    pub async fn execute(&self, job: ScheduleJob, invocation_id: Uuid) -> RunOutcome {
        let workflow = match self.store.get_workflow(job.owner_id, job.workflow_id).await {
            Ok(workflow) => workflow,
            Err(StoreError::WorkflowNotFound(workflow_id)) => {
                info!("workflow deleted while invocation was pending; dropping");
                return RunOutcome::WorkflowMissing { workflow_id };
            }
            Err(err) => {
                error!(%err, "failed to load workflow; chain stops");
                return RunOutcome::Failed {
                    workflow_id: job.workflow_id,
                    error: err.to_string(),
                };
            }
        };

        match self.run(workflow, job, invocation_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(%err, "scheduled run failed; chain stops");
                RunOutcome::Failed {
                    workflow_id: job.workflow_id,
                    error: err.to_string(),
                }
            }
        }
    }

    async fn run(
        &self,
        workflow: Workflow,
        job: ScheduleJob,
        invocation_id: Uuid,
    ) -> Result<RunOutcome, EngineError> {
        let result = self.action.run(&workflow.query).await?;
        let now = Utc::now();

        // First-ever run: the task was not pre-created at enqueue time, so
        // record it directly in its terminal state. Subsequent runs complete
        // the SCHEDULED task written when this invocation was enqueued.
        let prior_next_run_at: DateTime<Utc> = if workflow.last_result.is_none() {
            self.store
                .put_task(Task::completed(
                    invocation_id,
                    workflow.workflow_id,
                    workflow.owner_id,
                    result.clone(),
                    now,
                ))
                .await?;
            now
        } else {
            self.store
                .update_task(
                    workflow.owner_id,
                    workflow.workflow_id,
                    invocation_id,
                    TaskUpdate::completion(result.clone(), now),
                )
                .await?;
            workflow.next_run.map(|p| p.run_at).unwrap_or(now)
        };

        let next_run_time = next_run_after(workflow.start_time_utc, workflow.interval_seconds, now);

        // Enqueue before writing the workflow pointer: without multi-document
        // transactions, a crash in between leaves an orphaned invocation
        // (which runs harmlessly) rather than a pointer to nothing.
        let next_run = if workflow.active {
            let new_invocation_id = self.executor.enqueue(job, next_run_time).await?;
            self.store
                .put_task(Task::scheduled(
                    new_invocation_id,
                    workflow.workflow_id,
                    workflow.owner_id,
                    next_run_time,
                    now,
                ))
                .await?;
            Some(PendingRun {
                run_at: next_run_time,
                invocation_id: new_invocation_id,
            })
        } else {
            info!("workflow inactive; not re-enqueueing");
            None
        };

        self.store
            .update_workflow(
                workflow.owner_id,
                workflow.workflow_id,
                WorkflowUpdate {
                    last_result: Some(result),
                    last_run_at_utc: Some(prior_next_run_at),
                    next_run: Some(next_run),
                    ..Default::default()
                },
            )
            .await?;

        match next_run {
            Some(pending) => info!(next_run_at = %pending.run_at, "scheduled run completed"),
            None => info!("scheduled run completed; chain stopped"),
        }

        Ok(RunOutcome::Completed {
            workflow_id: workflow.workflow_id,
            owner_id: workflow.owner_id,
            completed_task_id: invocation_id,
            next_task_id: next_run.map(|p| p.invocation_id),
        })
    }
}

#[async_trait]
impl InvocationHandler for SchedulingEngine {
    async fn handle(&self, job: ScheduleJob, invocation_id: Uuid) {
        self.execute(job, invocation_id).await;
    }
}
