pub mod api;
pub mod logging;
pub mod provider_data;
pub mod resources;

use async_trait::async_trait;
use provider_data::{TencentCloudProviderData, Timeouts};
use resources::{
    operation, CvmImageSharePermissionResource, OperationResource,
    SqlserverConfigDatabaseCtResource, OPERATIONS,
};
use std::collections::HashMap;
use tfplug::provider::{ConfigureProviderRequest, ConfigureProviderResponse, Provider};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, Context, Diagnostic, DynamicValue, Resource,
    Schema, SchemaBuilder,
};

pub struct TencentCloudProvider {
    provider_data: Option<TencentCloudProviderData>,
    timeouts: Timeouts,
}

impl Default for TencentCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TencentCloudProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
            timeouts: Timeouts::default(),
        }
    }

    /// Replaces the default waiting budgets handed to every resource
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .description("Tencent Cloud provider")
            .attribute(
                AttributeBuilder::new("secret_id", AttributeType::String)
                    .optional()
                    .description("SecretId of the API key. Falls back to TENCENTCLOUD_SECRET_ID.")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("secret_key", AttributeType::String)
                    .optional()
                    .sensitive()
                    .description("SecretKey of the API key. Falls back to TENCENTCLOUD_SECRET_KEY.")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("security_token", AttributeType::String)
                    .optional()
                    .sensitive()
                    .description("Token of temporary credentials. Falls back to TENCENTCLOUD_SECURITY_TOKEN.")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("region", AttributeType::String)
                    .optional()
                    .description("Region such as ap-guangzhou. Falls back to TENCENTCLOUD_REGION.")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .optional()
                    .description("Overrides the API host of every service. Falls back to TENCENTCLOUD_ENDPOINT.")
                    .build(),
            )
            .build()
    }
}

/// Provider block value, then the environment. Empty strings count as unset.
fn setting(config: &DynamicValue, attribute: &str, env: &str) -> Option<String> {
    config
        .get_opt_string(&AttributePath::new(attribute))
        .ok()
        .flatten()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
}

fn required_error(attribute: &str, env: &str) -> Diagnostic {
    Diagnostic::error(
        format!(
            "{} is required (set in provider config or {} env var)",
            attribute, env
        ),
        "",
    )
}

#[async_trait]
impl Provider for TencentCloudProvider {
    fn type_name(&self) -> &str {
        "tencentcloud"
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = &request.config;

        let secret_id = setting(config, "secret_id", "TENCENTCLOUD_SECRET_ID");
        let secret_key = setting(config, "secret_key", "TENCENTCLOUD_SECRET_KEY");
        let region = setting(config, "region", "TENCENTCLOUD_REGION");
        let token = setting(config, "security_token", "TENCENTCLOUD_SECURITY_TOKEN");
        let endpoint = setting(config, "endpoint", "TENCENTCLOUD_ENDPOINT");

        let mut diagnostics = Vec::new();

        match (secret_id, secret_key, region) {
            (Some(secret_id), Some(secret_key), Some(region)) => {
                let credentials = api::Credentials::new(secret_id, secret_key).with_token(token);
                match api::Client::new(credentials, &region, endpoint.as_deref()) {
                    Ok(client) => {
                        tracing::info!(log_id = %ctx.log_id(), "configured for region {}", region);
                        self.provider_data =
                            Some(TencentCloudProviderData::new(client, self.timeouts));
                    }
                    Err(e) => diagnostics.push(Diagnostic::error(
                        format!("Failed to create API client: {}", e),
                        "",
                    )),
                }
            }
            (None, _, _) => {
                diagnostics.push(required_error("secret_id", "TENCENTCLOUD_SECRET_ID"))
            }
            (_, None, _) => {
                diagnostics.push(required_error("secret_key", "TENCENTCLOUD_SECRET_KEY"))
            }
            (_, _, None) => diagnostics.push(required_error("region", "TENCENTCLOUD_REGION")),
        }

        ConfigureProviderResponse { diagnostics }
    }

    async fn create_resource(&self, name: &str) -> tfplug::Result<Box<dyn Resource>> {
        let provider_data = self
            .provider_data
            .as_ref()
            .ok_or("Provider not configured")?
            .clone();

        if let Some(descriptor) = operation::find(name) {
            return Ok(Box::new(OperationResource::new(descriptor, provider_data)));
        }

        match name {
            resources::sqlserver_config_database_ct::TYPE_NAME => Ok(Box::new(
                SqlserverConfigDatabaseCtResource::new(provider_data),
            )),
            resources::cvm_image_share_permission::TYPE_NAME => Ok(Box::new(
                CvmImageSharePermissionResource::new(provider_data),
            )),
            _ => Err(format!("Unknown resource: {}", name).into()),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, Schema> {
        let mut schemas: HashMap<String, Schema> = OPERATIONS
            .iter()
            .map(|d| (d.type_name.to_string(), d.schema()))
            .collect();
        schemas.insert(
            resources::sqlserver_config_database_ct::TYPE_NAME.to_string(),
            SqlserverConfigDatabaseCtResource::schema_static(),
        );
        schemas.insert(
            resources::cvm_image_share_permission::TYPE_NAME.to_string(),
            CvmImageSharePermissionResource::schema_static(),
        );
        schemas
    }
}
