//! Request-scoped context
//!
//! Every resource operation receives a Context. It carries a log id that ties
//! together all log lines of one operation, and an optional deadline.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    log_id: String,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::with_log_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_log_id(log_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                log_id: log_id.into(),
                deadline: None,
            }),
        }
    }

    /// Returns a copy of this context that expires after `timeout`
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                log_id: self.inner.log_id.clone(),
                deadline: Some(Instant::now() + timeout),
            }),
        }
    }

    pub fn log_id(&self) -> &str {
        &self.inner.log_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline; None when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Caps `timeout` at whatever is left of this context's deadline
    pub fn bound(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => timeout.min(remaining),
            None => timeout,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log_id", &self.inner.log_id)
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}
