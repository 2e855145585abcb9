//! TencentDB for SQL Server API

use super::common::{deserialize_string_or_number_option, Service};
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};
use tfplug::{StatusSnapshot, TaskStatus};

pub const SERVICE: Service = Service::new("sqlserver", "2018-03-28");

pub const TASK_SUCCESS: i64 = 0;
pub const TASK_FAIL: i64 = 1;
pub const TASK_RUNNING: i64 = 2;

/// Enables or disables change tracking on databases of one instance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyDatabaseCtRequest {
    #[serde(rename = "DBNames")]
    pub db_names: Vec<String>,
    /// "enable" or "disable"
    pub modify_type: String,
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_retention_day: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FlowIdResponse {
    flow_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeFlowStatusRequest {
    flow_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeFlowStatusResponse {
    status: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDbsNormalRequest<'a> {
    instance_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DescribeDbsNormalResponse {
    #[serde(rename = "DBList", default)]
    db_list: Option<Vec<DbNormalDetail>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DbNormalDetail {
    pub name: String,
    /// "0" when change tracking is off
    #[serde(default, deserialize_with = "deserialize_string_or_number_option")]
    pub is_db_chaining_on: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number_option")]
    pub retention_period: Option<String>,
}

/// Maps a DescribeFlowStatus code. Unknown codes fail.
pub fn flow_snapshot(status: i64) -> StatusSnapshot {
    match status {
        TASK_SUCCESS => StatusSnapshot::success(),
        TASK_RUNNING => StatusSnapshot::new(TaskStatus::Pending, Some("flow running".to_string())),
        TASK_FAIL => StatusSnapshot::failed("flow status is fail"),
        other => StatusSnapshot::failed(format!("flow status {} is illegal", other)),
    }
}

pub struct SqlserverApi<'a> {
    client: &'a Client,
}

impl<'a> SqlserverApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Returns the flow id of the started change
    pub async fn modify_database_ct(&self, request: &ModifyDatabaseCtRequest) -> Result<i64, ApiError> {
        let response: FlowIdResponse = self
            .client
            .call(&SERVICE, "ModifyDatabaseCT", request)
            .await?;
        response.flow_id.ok_or_else(|| ApiError::MissingField {
            action: "ModifyDatabaseCT".to_string(),
            field: "FlowId".to_string(),
        })
    }

    pub async fn describe_flow_status(&self, flow_id: i64) -> Result<StatusSnapshot, ApiError> {
        let response: DescribeFlowStatusResponse = self
            .client
            .call(&SERVICE, "DescribeFlowStatus", &DescribeFlowStatusRequest { flow_id })
            .await?;
        Ok(flow_snapshot(response.status))
    }

    /// None when the instance reports no database list at all
    pub async fn describe_dbs_normal(
        &self,
        instance_id: &str,
    ) -> Result<Option<Vec<DbNormalDetail>>, ApiError> {
        let response: DescribeDbsNormalResponse = self
            .client
            .call(
                &SERVICE,
                "DescribeDBsNormal",
                &DescribeDbsNormalRequest { instance_id },
            )
            .await?;
        Ok(response.db_list)
    }
}
