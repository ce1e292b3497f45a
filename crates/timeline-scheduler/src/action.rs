//! The opaque query action seam
//!
//! Each run of a workflow executes its `query` through this trait and
//! records the returned string. What the query means is entirely the
//! embedding platform's concern.

use async_trait::async_trait;

/// Error type for action failures.
///
/// An action failure terminates the current scheduling chain (the engine
/// reports it as a failed run and does not re-enqueue); it is never
/// retried inside the same invocation.
#[derive(Debug, thiserror::Error)]
#[error("query action failed: {message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes a workflow's query against whatever backs it
#[async_trait]
pub trait QueryAction: Send + Sync + 'static {
    async fn run(&self, query: &str) -> Result<String, ActionError>;
}

/// Canned action that echoes the query back behind a fixed prefix.
///
/// Stands in for the real query backend in tests and demos.
#[derive(Debug, Clone)]
pub struct CannedQueryAction {
    prefix: String,
}

impl CannedQueryAction {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for CannedQueryAction {
    fn default() -> Self {
        Self::new("response for query: ")
    }
}

#[async_trait]
impl QueryAction for CannedQueryAction {
    async fn run(&self, query: &str) -> Result<String, ActionError> {
        Ok(format!("{}{}", self.prefix, query))
    }
}
