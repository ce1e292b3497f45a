//! Delayed executor seam
//!
//! The scheduling chain runs on top of an executor that accepts a job plus
//! a target instant (ETA) and guarantees at-least-once invocation at or
//! after that instant. Production deployments put a real broker behind
//! this trait; [`InProcessExecutor`] is the in-process tokio stand-in.

mod in_process;

pub use in_process::{InProcessExecutor, InProcessExecutorConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The payload of one delayed invocation: which workflow to run, for whom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleJob {
    pub owner_id: Uuid,
    pub workflow_id: Uuid,
}

/// Error type for executor operations
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The executor refused or failed to accept the job
    #[error("enqueue failed: {0}")]
    Enqueue(String),
}

/// Accepts work for execution at or after a target instant.
///
/// Delivery is at-least-once; there is no ordering guarantee between
/// different workflows and no cancellation primitive for already-enqueued
/// invocations. Pause and delete are enforced cooperatively by the handler
/// at invocation time instead.
#[async_trait]
pub trait DelayedExecutor: Send + Sync + 'static {
    /// Enqueue `job` for invocation at or after `eta`, returning the
    /// identifier assigned to the invocation
    async fn enqueue(&self, job: ScheduleJob, eta: DateTime<Utc>) -> Result<Uuid, ExecutorError>;
}

/// The receiving side of a delayed invocation.
///
/// Implemented by the scheduling engine; the executor calls `handle` when
/// an invocation comes due. The handler owns its outcome entirely: it never
/// returns an error, so the executor's delivery machinery has nothing to
/// retry.
#[async_trait]
pub trait InvocationHandler: Send + Sync + 'static {
    async fn handle(&self, job: ScheduleJob, invocation_id: Uuid);
}
