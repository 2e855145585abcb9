//! Cloud Virtual Machine (cvm) API

use super::common::Service;
use super::error::ApiError;
use super::Client;
use serde::{Deserialize, Serialize};

pub const SERVICE: Service = Service::new("cvm", "2017-03-12");

pub const IMAGE_SHARE_PERMISSION_SHARE: &str = "SHARE";
pub const IMAGE_SHARE_PERMISSION_CANCEL: &str = "CANCEL";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyImageSharePermissionRequest<'a> {
    image_id: &'a str,
    account_ids: &'a [String],
    permission: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeImageSharePermissionRequest<'a> {
    image_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeImageSharePermissionResponse {
    #[serde(default)]
    share_permission_set: Vec<SharePermission>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SharePermission {
    pub account_id: String,
    #[serde(default)]
    pub created_time: Option<String>,
}

/// Ignored response body
#[derive(Debug, Deserialize)]
struct Empty {}

pub struct CvmApi<'a> {
    client: &'a Client,
}

impl<'a> CvmApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `permission` is [`IMAGE_SHARE_PERMISSION_SHARE`] or [`IMAGE_SHARE_PERMISSION_CANCEL`]
    pub async fn modify_image_share_permission(
        &self,
        image_id: &str,
        account_ids: &[String],
        permission: &str,
    ) -> Result<(), ApiError> {
        let _: Empty = self
            .client
            .call(
                &SERVICE,
                "ModifyImageSharePermission",
                &ModifyImageSharePermissionRequest {
                    image_id,
                    account_ids,
                    permission,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn describe_image_share_permission(
        &self,
        image_id: &str,
    ) -> Result<Vec<SharePermission>, ApiError> {
        let response: DescribeImageSharePermissionResponse = self
            .client
            .call(
                &SERVICE,
                "DescribeImageSharePermission",
                &DescribeImageSharePermissionRequest { image_id },
            )
            .await?;
        Ok(response.share_permission_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Credentials;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn shares_and_lists_accounts() {
        let mut server = Server::new_async().await;
        let modify = server
            .mock("POST", "/")
            .match_header("x-tc-action", "ModifyImageSharePermission")
            .match_body(Matcher::Json(json!({
                "ImageId": "img-1",
                "AccountIds": ["100001", "100002"],
                "Permission": "SHARE"
            })))
            .with_body(r#"{"Response":{"RequestId":"r-1"}}"#)
            .create_async()
            .await;
        let describe = server
            .mock("POST", "/")
            .match_header("x-tc-action", "DescribeImageSharePermission")
            .with_body(
                r#"{"Response":{"SharePermissionSet":[{"CreatedTime":"2023-01-01 00:00:00","AccountId":"100001"}],"RequestId":"r-2"}}"#,
            )
            .create_async()
            .await;

        let client = Client::new(
            Credentials::new("id", "key"),
            "ap-guangzhou",
            Some(&server.url()),
        )
        .unwrap();
        let cvm = client.cvm();

        cvm.modify_image_share_permission(
            "img-1",
            &["100001".to_string(), "100002".to_string()],
            IMAGE_SHARE_PERMISSION_SHARE,
        )
        .await
        .unwrap();
        let shares = cvm.describe_image_share_permission("img-1").await.unwrap();

        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].account_id, "100001");
        modify.assert_async().await;
        describe.assert_async().await;
    }
}
