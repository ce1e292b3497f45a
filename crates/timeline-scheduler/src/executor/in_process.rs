//! In-process delayed execution on tokio timers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DelayedExecutor, ExecutorError, InvocationHandler, ScheduleJob};

/// Configuration for [`InProcessExecutor`]
#[derive(Debug, Clone)]
pub struct InProcessExecutorConfig {
    /// Upper bound on a single timer sleep; pending invocations re-check
    /// for shutdown at this granularity
    pub tick: Duration,
}

impl Default for InProcessExecutorConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
        }
    }
}

impl InProcessExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown-check granularity
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }
}

type HandlerSlot = Arc<RwLock<Option<Arc<dyn InvocationHandler>>>>;

/// In-process [`DelayedExecutor`] backed by tokio timers.
///
/// Each enqueue spawns a task that sleeps until the ETA and then invokes
/// the bound handler. The handler is bound after construction because the
/// engine and the executor reference each other; an invocation coming due
/// before a handler is bound is logged and dropped, the same way an
/// orphaned invocation against a deleted workflow is dropped.
///
/// Pending invocations do not survive process restarts. Durable delivery
/// is the responsibility of whatever broker-backed implementation replaces
/// this one in production.
pub struct InProcessExecutor {
    config: InProcessExecutorConfig,
    handler: HandlerSlot,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl InProcessExecutor {
    pub fn new(config: InProcessExecutorConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            handler: Arc::new(RwLock::new(None)),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Bind the handler that receives due invocations
    pub fn bind(&self, handler: Arc<dyn InvocationHandler>) {
        *self.handler.write() = Some(handler);
    }

    /// Stop delivering: pending invocations are dropped at their next tick
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Default for InProcessExecutor {
    fn default() -> Self {
        Self::new(InProcessExecutorConfig::default())
    }
}

#[async_trait]
impl DelayedExecutor for InProcessExecutor {
    async fn enqueue(&self, job: ScheduleJob, eta: DateTime<Utc>) -> Result<Uuid, ExecutorError> {
        if *self.shutdown_rx.borrow() {
            return Err(ExecutorError::Enqueue("executor is shut down".to_string()));
        }

        let invocation_id = Uuid::now_v7();
        let handler = Arc::clone(&self.handler);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let tick = self.config.tick;

        debug!(
            workflow_id = %job.workflow_id,
            %invocation_id,
            %eta,
            "enqueued delayed invocation"
        );

        tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow() {
                    debug!(%invocation_id, "dropping invocation: executor shut down");
                    return;
                }
                let remaining = (eta - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                if remaining.is_zero() {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(remaining.min(tick)) => {}
                    _ = shutdown_rx.changed() => {}
                }
            }

            let bound = handler.read().clone();
            match bound {
                Some(handler) => handler.handle(job, invocation_id).await,
                None => warn!(
                    workflow_id = %job.workflow_id,
                    %invocation_id,
                    "invocation came due with no handler bound; dropping"
                ),
            }
        });

        Ok(invocation_id)
    }
}
