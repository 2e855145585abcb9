//! Provider data structure passed to resources

use crate::api::Client;
use std::time::Duration;
use tfplug::{Context, PollConfig, RetryConfig};

/// Waiting budgets shared by all resources of one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Budget for describe calls and read-side polls
    pub read: Duration,
    /// Budget for mutating calls
    pub write: Duration,
    /// Wait between two status checks of an asynchronous task
    pub poll_interval: Duration,
    /// Wait between two attempts of a retryable call
    pub retry_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: tfplug::retry::READ_RETRY_TIMEOUT,
            write: tfplug::retry::WRITE_RETRY_TIMEOUT,
            poll_interval: Duration::from_secs(5),
            retry_interval: Duration::from_secs(1),
        }
    }
}

impl Timeouts {
    /// Retry budget for mutating calls, capped by the context deadline
    pub fn write_retry(&self, ctx: &Context) -> RetryConfig {
        RetryConfig::new(ctx.bound(self.write), self.retry_interval)
    }

    /// Retry budget for describe calls, capped by the context deadline
    pub fn read_retry(&self, ctx: &Context) -> RetryConfig {
        RetryConfig::new(ctx.bound(self.read), self.retry_interval)
    }

    pub fn poll(&self, timeout: Duration) -> PollConfig {
        PollConfig::new(timeout, self.poll_interval)
    }
}

#[derive(Clone)]
pub struct TencentCloudProviderData {
    pub client: Client,
    pub timeouts: Timeouts,
}

impl TencentCloudProviderData {
    pub fn new(client: Client, timeouts: Timeouts) -> Self {
        Self { client, timeouts }
    }
}
