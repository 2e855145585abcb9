//! Accounts a custom CVM image is shared with

use super::{retry_error, OperationError};
use crate::api::cvm::{IMAGE_SHARE_PERMISSION_CANCEL, IMAGE_SHARE_PERMISSION_SHARE};
use crate::logging::{self, Elapsed};
use crate::provider_data::TencentCloudProviderData;
use async_trait::async_trait;
use tfplug::resource::*;
use tfplug::types::has_errors;
use tfplug::validator::ListLength;
use tfplug::{
    import_state_passthrough_id, retry, AttributeBuilder, AttributePath, AttributeType, Context,
    Diagnostic, DynamicValue, Schema, SchemaBuilder,
};
use tracing::Instrument;

pub const TYPE_NAME: &str = "tencentcloud_cvm_image_share_permission";

pub struct CvmImageSharePermissionResource {
    provider_data: TencentCloudProviderData,
}

impl CvmImageSharePermissionResource {
    pub fn new(provider_data: TencentCloudProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .description("Shares a custom CVM image with other accounts")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .description("Same as image_id")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("image_id", AttributeType::String)
                    .required()
                    .force_new()
                    .description("Image ID such as `img-gvbnzy6f`. You can only specify an image in the NORMAL state.")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "account_ids",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .required()
                .description("List of account IDs with which an image is shared.")
                .validator(ListLength::at_least(1))
                .build(),
            )
            .build()
    }

    async fn modify(
        &self,
        ctx: &Context,
        image_id: &str,
        account_ids: &[String],
        permission: &str,
    ) -> Result<(), OperationError> {
        if account_ids.is_empty() {
            return Ok(());
        }
        tracing::info!(
            "{} image {} for {} account(s)",
            permission,
            image_id,
            account_ids.len()
        );

        let api = self.provider_data.client.cvm();
        retry(self.provider_data.timeouts.write_retry(ctx), || async {
            api.modify_image_share_permission(image_id, account_ids, permission)
                .await
                .map_err(retry_error)
        })
        .await?;
        Ok(())
    }

    /// Accounts the image is currently shared with; None when the image is gone
    async fn shared_accounts(
        &self,
        ctx: &Context,
        image_id: &str,
    ) -> Result<Option<Vec<String>>, OperationError> {
        let api = self.provider_data.client.cvm();
        let result = retry(self.provider_data.timeouts.read_retry(ctx), || async {
            api.describe_image_share_permission(image_id)
                .await
                .map_err(retry_error)
        })
        .await;

        match result {
            Ok(shares) => Ok(Some(shares.into_iter().map(|s| s.account_id).collect())),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "resource `{}` [{}] not found, please check if it has been deleted.",
                    TYPE_NAME,
                    image_id
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_remote(
        &self,
        ctx: &Context,
        image_id: &str,
    ) -> Result<Option<DynamicValue>, OperationError> {
        let Some(account_ids) = self.shared_accounts(ctx, image_id).await? else {
            return Ok(None);
        };

        let mut state = DynamicValue::object();
        state.set_string(&AttributePath::new("id"), image_id)?;
        state.set_string(&AttributePath::new("image_id"), image_id)?;
        state.set_string_list(&AttributePath::new("account_ids"), account_ids)?;
        Ok(Some(state))
    }

    async fn read_back(&self, ctx: &Context, image_id: &str) -> Result<DynamicValue, OperationError> {
        self.read_remote(ctx, image_id)
            .await?
            .ok_or_else(|| OperationError::Vanished(image_id.to_string()))
    }
}

/// Entries of `left` missing from `right`, in `left`'s order
fn difference(left: &[String], right: &[String]) -> Vec<String> {
    left.iter()
        .filter(|account| !right.contains(account))
        .cloned()
        .collect()
}

#[async_trait]
impl Resource for CvmImageSharePermissionResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let span = logging::operation_span(TYPE_NAME, "create", &ctx);
        let _elapsed = Elapsed::start(TYPE_NAME, "create");

        async {
            let diagnostics = Self::schema_static().validate(&request.config);
            if has_errors(&diagnostics) {
                return CreateResourceResponse::failed(diagnostics);
            }

            let result = async {
                let image_id = request.config.get_string(&AttributePath::new("image_id"))?;
                let account_ids = request
                    .config
                    .get_string_list(&AttributePath::new("account_ids"))?;
                self.modify(&ctx, &image_id, &account_ids, IMAGE_SHARE_PERMISSION_SHARE)
                    .await?;
                self.read_back(&ctx, &image_id).await
            }
            .await;

            match result {
                Ok(state) => CreateResourceResponse {
                    new_state: state,
                    diagnostics,
                },
                Err(e) => {
                    tracing::error!("operate cvm modifyImageSharePermission failed, reason: {}", e);
                    CreateResourceResponse::failed(vec![e.into_diagnostic("Failed to share image")])
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let span = logging::operation_span(TYPE_NAME, "read", &ctx);
        let _elapsed = Elapsed::start(TYPE_NAME, "read");

        async {
            let image_id = match request.current_state.get_string(&AttributePath::new("id")) {
                Ok(id) => id,
                Err(e) => {
                    return ReadResourceResponse {
                        new_state: None,
                        diagnostics: vec![Diagnostic::error("Invalid state", e.to_string())],
                    }
                }
            };

            match self.read_remote(&ctx, &image_id).await {
                Ok(state) => ReadResourceResponse {
                    new_state: state,
                    diagnostics: vec![],
                },
                Err(e) => ReadResourceResponse {
                    new_state: Some(request.current_state.clone()),
                    diagnostics: vec![e.into_diagnostic("Failed to read image share permission")],
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let span = logging::operation_span(TYPE_NAME, "update", &ctx);
        let _elapsed = Elapsed::start(TYPE_NAME, "update");

        async {
            let diagnostics = Self::schema_static().validate(&request.config);
            if has_errors(&diagnostics) {
                return UpdateResourceResponse::failed(request.prior_state.clone(), diagnostics);
            }

            let result = async {
                let image_id = request.prior_state.get_string(&AttributePath::new("id"))?;
                let old = request
                    .prior_state
                    .get_string_list(&AttributePath::new("account_ids"))
                    .unwrap_or_default();
                let new = request
                    .config
                    .get_string_list(&AttributePath::new("account_ids"))?;

                let add = difference(&new, &old);
                let remove = difference(&old, &new);
                self.modify(&ctx, &image_id, &add, IMAGE_SHARE_PERMISSION_SHARE)
                    .await?;
                self.modify(&ctx, &image_id, &remove, IMAGE_SHARE_PERMISSION_CANCEL)
                    .await?;
                self.read_back(&ctx, &image_id).await
            }
            .await;

            match result {
                Ok(state) => UpdateResourceResponse {
                    new_state: state,
                    diagnostics,
                },
                Err(e) => UpdateResourceResponse::failed(
                    request.prior_state.clone(),
                    vec![e.into_diagnostic("Failed to update image share permission")],
                ),
            }
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let span = logging::operation_span(TYPE_NAME, "delete", &ctx);
        let _elapsed = Elapsed::start(TYPE_NAME, "delete");

        async {
            let result = async {
                let image_id = request.prior_state.get_string(&AttributePath::new("id"))?;
                let accounts = self.shared_accounts(&ctx, &image_id).await?.unwrap_or_default();
                self.modify(&ctx, &image_id, &accounts, IMAGE_SHARE_PERMISSION_CANCEL)
                    .await
            }
            .await;

            DeleteResourceResponse {
                diagnostics: match result {
                    Ok(()) => vec![],
                    Err(e) => vec![e.into_diagnostic("Failed to cancel image sharing")],
                },
            }
        }
        .instrument(span)
        .await
    }

    fn importer(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for CvmImageSharePermissionResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        import_state_passthrough_id(AttributePath::new("image_id"), &request, &mut response);
        for imported in &mut response.imported_resources {
            if let Err(e) = imported
                .state
                .set_string(&AttributePath::new("id"), request.id.clone())
            {
                response
                    .diagnostics
                    .push(Diagnostic::error("Failed to set import ID", e.to_string()));
            }
        }
        response
    }
}
