//! TencentDB for MySQL (cdb) API

use super::common::Service;
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};
use tfplug::{StatusSnapshot, TaskStatus};

pub const SERVICE: Service = Service::new("cdb", "2017-03-20");

pub const TASK_STATUS_INITIAL: &str = "INITIAL";
pub const TASK_STATUS_RUNNING: &str = "RUNNING";
pub const TASK_STATUS_SUCCESS: &str = "SUCCESS";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeAsyncRequestInfoRequest<'a> {
    async_request_id: &'a str,
}

/// Progress of an asynchronous MySQL task
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AsyncRequestInfo {
    /// INITIAL, RUNNING, SUCCESS, FAILED, KILLED, REMOVED or PAUSED
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

impl AsyncRequestInfo {
    pub fn snapshot(&self) -> StatusSnapshot {
        let status = self.status.as_deref().unwrap_or_default();
        let task_status = match status {
            TASK_STATUS_SUCCESS => TaskStatus::Success,
            TASK_STATUS_INITIAL | TASK_STATUS_RUNNING => TaskStatus::Pending,
            _ => TaskStatus::Failed,
        };
        let message = match (status, self.info.as_deref()) {
            (_, Some(info)) if !info.is_empty() => format!("status {}: {}", status, info),
            _ => format!("status {}", status),
        };
        StatusSnapshot::new(task_status, Some(message))
    }
}

pub struct MysqlApi<'a> {
    client: &'a Client,
}

impl<'a> MysqlApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn describe_async_request_info(
        &self,
        async_request_id: &str,
    ) -> Result<AsyncRequestInfo, ApiError> {
        self.client
            .call(
                &SERVICE,
                "DescribeAsyncRequestInfo",
                &DescribeAsyncRequestInfoRequest { async_request_id },
            )
            .await
    }
}
