//! Completion polling for asynchronous vendor operations
//!
//! Many mutating API calls return immediately with an operation handle (an
//! async request id, a flow id, an activity id) while the real work finishes
//! later on the vendor side. [`await_completion`] waits for such an operation
//! to reach a terminal status.
//!
//! The poller only reads. It never re-issues the mutating call, and callers
//! must commit state only after it returns `Ok`.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Progress of an operation, reduced to what a caller can act on.
/// Vendor status codes are mapped into this enum by the service that owns them;
/// codes a service does not recognize must map to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Success,
    Failed,
}

/// One observation of an operation's progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: TaskStatus,
    pub message: Option<String>,
}

impl StatusSnapshot {
    pub fn new(status: TaskStatus, message: Option<String>) -> Self {
        Self { status, message }
    }

    pub fn pending() -> Self {
        Self::new(TaskStatus::Pending, None)
    }

    pub fn success() -> Self {
        Self::new(TaskStatus::Success, None)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(TaskStatus::Failed, Some(message.into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Overall budget for one poll session
    pub timeout: Duration,
    /// Fixed wait between two status fetches
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(180),
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("could not fetch status of operation {handle}: {detail}")]
    TransientFetchError { handle: String, detail: String },

    #[error("operation {handle} failed: {message}")]
    OperationFailed { handle: String, message: String },

    #[error(
        "timed out after {timeout:?} waiting for operation {handle}{}; it may still complete, check its status before retrying",
        .last_message.as_deref().map(|m| format!(" (last status: {})", m)).unwrap_or_default()
    )]
    Timeout {
        handle: String,
        timeout: Duration,
        last_message: Option<String>,
    },
}

impl PollError {
    pub fn handle(&self) -> &str {
        match self {
            PollError::TransientFetchError { handle, .. }
            | PollError::OperationFailed { handle, .. }
            | PollError::Timeout { handle, .. } => handle,
        }
    }
}

/// Waits until `fetch` reports a terminal status or `config.timeout` elapses.
///
/// * `Success` returns `Ok(())` at once.
/// * `Failed` returns `OperationFailed` at once with the snapshot's message.
/// * `Pending` and fetch errors are retried every `config.interval`. When the
///   budget runs out the outcome of the last fetch decides the error:
///   `Timeout` after a pending status, `TransientFetchError` after a failed fetch.
///
/// Each fetch only gets what is left of the budget. A fetch that does not
/// answer in time ends the session with the previous observation, or with
/// `TransientFetchError` when there was none.
///
/// `fetch` is called at least once and never after a terminal status.
pub async fn await_completion<H, F, Fut, E>(
    handle: H,
    mut fetch: F,
    config: PollConfig,
) -> Result<(), PollError>
where
    H: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<StatusSnapshot, E>>,
    E: fmt::Display,
{
    let handle = handle.to_string();
    let started = Instant::now();
    let mut attempt: u32 = 0;
    let mut previous: Option<PollError> = None;

    loop {
        attempt += 1;

        let window = config.timeout.saturating_sub(started.elapsed());
        let outcome = match tokio::time::timeout(window, fetch()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let last = previous.unwrap_or_else(|| PollError::TransientFetchError {
                    handle: handle.clone(),
                    detail: format!("status check did not answer within {:?}", window),
                });
                tracing::error!("{}", last);
                return Err(last);
            }
        };

        let last = match outcome {
            Ok(snapshot) => match snapshot.status {
                TaskStatus::Success => {
                    tracing::debug!(
                        "operation {} succeeded after {} status checks",
                        handle,
                        attempt
                    );
                    return Ok(());
                }
                TaskStatus::Failed => {
                    let message = snapshot
                        .message
                        .unwrap_or_else(|| "no message from vendor".to_string());
                    tracing::error!("operation {} failed: {}", handle, message);
                    return Err(PollError::OperationFailed { handle, message });
                }
                TaskStatus::Pending => {
                    tracing::debug!(
                        "operation {} still pending (check {}){}",
                        handle,
                        attempt,
                        snapshot
                            .message
                            .as_deref()
                            .map(|m| format!(": {}", m))
                            .unwrap_or_default()
                    );
                    PollError::Timeout {
                        handle: handle.clone(),
                        timeout: config.timeout,
                        last_message: snapshot.message,
                    }
                }
            },
            Err(e) => {
                tracing::warn!(
                    "status check {} for operation {} failed: {}",
                    attempt,
                    handle,
                    e
                );
                PollError::TransientFetchError {
                    handle: handle.clone(),
                    detail: e.to_string(),
                }
            }
        };

        let remaining = config.timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            tracing::error!("{}", last);
            return Err(last);
        }

        tokio::time::sleep(config.interval.min(remaining)).await;

        if started.elapsed() >= config.timeout {
            tracing::error!("{}", last);
            return Err(last);
        }
        previous = Some(last);
    }
}
