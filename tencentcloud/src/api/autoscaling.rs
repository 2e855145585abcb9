//! Auto Scaling (as) API

use super::common::Service;
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};
use tfplug::{StatusSnapshot, TaskStatus};

pub const SERVICE: Service = Service::new("as", "2018-04-19");

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeAutoScalingActivitiesRequest<'a> {
    activity_ids: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeAutoScalingActivitiesResponse {
    #[serde(default)]
    activity_set: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Activity {
    pub activity_id: String,
    /// INIT, RUNNING, SUCCESSFUL, PARTIALLY_SUCCESSFUL, FAILED or CANCELLED
    pub status_code: String,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub status_message_simplified: Option<String>,
}

impl Activity {
    pub fn snapshot(&self) -> StatusSnapshot {
        let status = match self.status_code.as_str() {
            "INIT" | "RUNNING" => TaskStatus::Pending,
            "SUCCESSFUL" => TaskStatus::Success,
            _ => TaskStatus::Failed,
        };
        let detail = self
            .status_message_simplified
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(self.status_message.as_deref().filter(|m| !m.is_empty()));
        let message = match detail {
            Some(detail) => format!("activity {}: {}", self.status_code, detail),
            None => format!("activity {}", self.status_code),
        };
        StatusSnapshot::new(status, Some(message))
    }
}

pub struct AutoScalingApi<'a> {
    client: &'a Client,
}

impl<'a> AutoScalingApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Looks up a single scaling activity. An activity that is not listed yet
    /// is reported as an error so that pollers retry.
    pub async fn describe_activity(&self, activity_id: &str) -> Result<Activity, ApiError> {
        let response: DescribeAutoScalingActivitiesResponse = self
            .client
            .call(
                &SERVICE,
                "DescribeAutoScalingActivities",
                &DescribeAutoScalingActivitiesRequest {
                    activity_ids: [activity_id],
                },
            )
            .await?;

        response
            .activity_set
            .into_iter()
            .find(|a| a.activity_id == activity_id)
            .ok_or_else(|| ApiError::MissingField {
                action: "DescribeAutoScalingActivities".to_string(),
                field: format!("ActivitySet entry for {}", activity_id),
            })
    }
}
