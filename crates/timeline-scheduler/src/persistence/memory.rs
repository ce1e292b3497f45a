//! In-memory implementation of RecordStore

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::store::{RecordStore, StoreError};
use crate::model::{NewWorkflow, Task, TaskUpdate, Workflow, WorkflowUpdate};

/// In-memory implementation of [`RecordStore`].
///
/// Backs tests and single-process deployments. Documents live in
/// lock-guarded maps; per-document atomicity falls out of taking the write
/// lock for the duration of each mutation, matching the semantics a real
/// document store provides.
///
/// # Example
///
/// ```
/// use timeline_scheduler::InMemoryRecordStore;
///
/// let store = InMemoryRecordStore::new();
/// ```
#[derive(Default)]
pub struct InMemoryRecordStore {
    workflows: RwLock<HashMap<(Uuid, Uuid), Workflow>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    counters: RwLock<HashMap<Uuid, i64>>,
}

impl InMemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workflow documents across all owners
    pub fn workflow_count(&self) -> usize {
        self.workflows.read().len()
    }

    /// Number of task documents across all workflows
    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    /// Current value of an owner's created-workflow counter
    pub fn workflows_created(&self, owner_id: Uuid) -> i64 {
        self.counters.read().get(&owner_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_workflow(
        &self,
        owner_id: Uuid,
        workflow: NewWorkflow,
    ) -> Result<Uuid, StoreError> {
        let workflow_id = Uuid::now_v7();
        let doc = Workflow {
            workflow_id,
            owner_id,
            name: workflow.name,
            query: workflow.query,
            start_time_utc: workflow.start_time_utc,
            interval_seconds: workflow.interval_seconds,
            active: true,
            next_run: None,
            last_result: None,
            last_run_at_utc: None,
            created_at: Utc::now(),
        };
        self.workflows.write().insert((owner_id, workflow_id), doc);
        Ok(workflow_id)
    }

    async fn get_workflow(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
    ) -> Result<Workflow, StoreError> {
        self.workflows
            .read()
            .get(&(owner_id, workflow_id))
            .cloned()
            .ok_or(StoreError::WorkflowNotFound(workflow_id))
    }

    async fn update_workflow(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
        update: WorkflowUpdate,
    ) -> Result<(), StoreError> {
        let mut workflows = self.workflows.write();
        let workflow = workflows
            .get_mut(&(owner_id, workflow_id))
            .ok_or(StoreError::WorkflowNotFound(workflow_id))?;

        if let Some(active) = update.active {
            workflow.active = active;
        }
        if let Some(last_result) = update.last_result {
            workflow.last_result = Some(last_result);
        }
        if let Some(last_run_at) = update.last_run_at_utc {
            workflow.last_run_at_utc = Some(last_run_at);
        }
        if let Some(next_run) = update.next_run {
            workflow.next_run = next_run;
        }
        Ok(())
    }

    async fn delete_workflow(&self, owner_id: Uuid, workflow_id: Uuid) -> Result<(), StoreError> {
        self.workflows
            .write()
            .remove(&(owner_id, workflow_id))
            .map(|_| ())
            .ok_or(StoreError::WorkflowNotFound(workflow_id))
    }

    async fn put_task(&self, task: Task) -> Result<(), StoreError> {
        self.tasks.write().insert(task.task_id, task);
        Ok(())
    }

    async fn get_task(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
        task_id: Uuid,
    ) -> Result<Task, StoreError> {
        self.tasks
            .read()
            .get(&task_id)
            .filter(|t| t.owner_id == owner_id && t.workflow_id == workflow_id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(task_id))
    }

    async fn update_task(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(&task_id)
            .filter(|t| t.owner_id == owner_id && t.workflow_id == workflow_id)
            .ok_or(StoreError::TaskNotFound(task_id))?;

        // At-least-once delivery: a redelivered completion must not rewrite
        // a task that already reached its terminal state.
        if task.is_terminal() {
            return Ok(());
        }

        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(result) = update.result {
            task.result = Some(result);
        }
        if let Some(completed_at) = update.completed_at {
            task.completed_at = Some(completed_at);
        }
        Ok(())
    }

    async fn list_tasks(
        &self,
        owner_id: Uuid,
        workflow_id: Uuid,
    ) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read();
        let mut found: Vec<_> = tasks
            .values()
            .filter(|t| t.owner_id == owner_id && t.workflow_id == workflow_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created_at);
        Ok(found)
    }

    async fn delete_tasks(&self, owner_id: Uuid, workflow_id: Uuid) -> Result<(), StoreError> {
        self.tasks
            .write()
            .retain(|_, t| !(t.owner_id == owner_id && t.workflow_id == workflow_id));
        Ok(())
    }

    async fn adjust_workflow_count(&self, owner_id: Uuid, delta: i64) -> Result<i64, StoreError> {
        let mut counters = self.counters.write();
        let counter = counters.entry(owner_id).or_insert(0);
        *counter += delta;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::model::TaskStatus;

    fn new_workflow() -> NewWorkflow {
        NewWorkflow {
            name: "hourly".to_string(),
            query: "latest news".to_string(),
            start_time_utc: Utc::now(),
            interval_seconds: NonZeroU32::new(3600).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_and_get_workflow() {
        let store = InMemoryRecordStore::new();
        let owner_id = Uuid::now_v7();

        let workflow_id = store.create_workflow(owner_id, new_workflow()).await.unwrap();
        let workflow = store.get_workflow(owner_id, workflow_id).await.unwrap();

        assert_eq!(workflow.workflow_id, workflow_id);
        assert_eq!(workflow.owner_id, owner_id);
        assert!(workflow.active);
        assert!(workflow.next_run.is_none());
        assert!(workflow.last_result.is_none());
    }

    #[tokio::test]
    async fn workflow_is_scoped_to_its_owner() {
        let store = InMemoryRecordStore::new();
        let owner_id = Uuid::now_v7();
        let workflow_id = store.create_workflow(owner_id, new_workflow()).await.unwrap();

        let other_owner = Uuid::now_v7();
        let result = store.get_workflow(other_owner, workflow_id).await;
        assert!(matches!(result, Err(StoreError::WorkflowNotFound(id)) if id == workflow_id));
    }

    #[tokio::test]
    async fn partial_update_clears_next_run() {
        let store = InMemoryRecordStore::new();
        let owner_id = Uuid::now_v7();
        let workflow_id = store.create_workflow(owner_id, new_workflow()).await.unwrap();

        let pending = crate::model::PendingRun {
            run_at: Utc::now(),
            invocation_id: Uuid::now_v7(),
        };
        store
            .update_workflow(
                owner_id,
                workflow_id,
                WorkflowUpdate {
                    next_run: Some(Some(pending)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            store.get_workflow(owner_id, workflow_id).await.unwrap().next_run,
            Some(pending)
        );

        // Outer Some, inner None clears the pointer; untouched fields survive.
        store
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
            .unwrap();
        let workflow = store.get_workflow(owner_id, workflow_id).await.unwrap();
        assert!(!workflow.active);
        assert!(workflow.next_run.is_none());
        assert_eq!(workflow.name, "hourly");
    }

    #[tokio::test]
    async fn task_completion_is_idempotent() {
        let store = InMemoryRecordStore::new();
        let owner_id = Uuid::now_v7();
        let workflow_id = Uuid::now_v7();
        let task_id = Uuid::now_v7();
        let now = Utc::now();

        store
            .put_task(Task::scheduled(task_id, workflow_id, owner_id, now, now))
            .await
            .unwrap();

        store
            .update_task(
                owner_id,
                workflow_id,
                task_id,
                TaskUpdate::completion("first".to_string(), now),
            )
            .await
            .unwrap();

        // Redelivered completion: safe no-op, first write wins.
        let later = Utc::now();
        store
            .update_task(
                owner_id,
                workflow_id,
                task_id,
                TaskUpdate::completion("second".to_string(), later),
            )
            .await
            .unwrap();

        let task = store.get_task(owner_id, workflow_id, task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("first"));
        assert_eq!(task.completed_at, Some(now));
    }

    #[tokio::test]
    async fn delete_tasks_removes_only_the_workflows_tasks() {
        let store = InMemoryRecordStore::new();
        let owner_id = Uuid::now_v7();
        let workflow_a = Uuid::now_v7();
        let workflow_b = Uuid::now_v7();
        let now = Utc::now();

        for workflow_id in [workflow_a, workflow_b] {
            store
                .put_task(Task::scheduled(Uuid::now_v7(), workflow_id, owner_id, now, now))
                .await
                .unwrap();
        }
        assert_eq!(store.task_count(), 2);

        store.delete_tasks(owner_id, workflow_a).await.unwrap();
        assert_eq!(store.task_count(), 1);
        assert_eq!(store.list_tasks(owner_id, workflow_b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn counter_adjusts_by_delta() {
        let store = InMemoryRecordStore::new();
        let owner_id = Uuid::now_v7();

        assert_eq!(store.adjust_workflow_count(owner_id, 1).await.unwrap(), 1);
        assert_eq!(store.adjust_workflow_count(owner_id, 1).await.unwrap(), 2);
        assert_eq!(store.adjust_workflow_count(owner_id, -1).await.unwrap(), 1);
        assert_eq!(store.workflows_created(owner_id), 1);
        assert_eq!(store.workflows_created(Uuid::now_v7()), 0);
    }
}
