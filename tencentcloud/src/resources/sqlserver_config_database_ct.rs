//! Change tracking (CT) switch of a SQL Server database

use super::{retry_error, OperationError};
use crate::api::sqlserver::ModifyDatabaseCtRequest;
use crate::logging::{self, Elapsed};
use crate::provider_data::TencentCloudProviderData;
use async_trait::async_trait;
use tfplug::resource::*;
use tfplug::types::has_errors;
use tfplug::validator::{NumberRange, OneOf};
use tfplug::{
    await_completion, retry, split_composite_id, AttributeBuilder, AttributePath, AttributeType,
    Context, Diagnostic, DynamicValue, Schema, SchemaBuilder,
};
use tracing::Instrument;

pub const TYPE_NAME: &str = "tencentcloud_sqlserver_config_database_ct";
const ID_SEPARATOR: &str = "#";
const ID_SHAPE: &str = "instance_id#db_name";

/// Flows of ModifyDatabaseCT can run far longer than a single API call
const FLOW_TIMEOUT_FACTOR: u32 = 10;

pub struct SqlserverConfigDatabaseCtResource {
    provider_data: TencentCloudProviderData,
}

impl SqlserverConfigDatabaseCtResource {
    pub fn new(provider_data: TencentCloudProviderData) -> Self {
        Self { provider_data }
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .description("Enables or disables change tracking of a SQL Server database")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .description("instance_id#db_name")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("instance_id", AttributeType::String)
                    .required()
                    .force_new()
                    .description("Instance ID.")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("db_name", AttributeType::String)
                    .required()
                    .force_new()
                    .description("database name.")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("modify_type", AttributeType::String)
                    .required()
                    .description("Enable or disable CT. Valid values: enable, disable.")
                    .validator(OneOf::new(&["enable", "disable"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("change_retention_day", AttributeType::Number)
                    .optional()
                    .computed()
                    .description("Retention period (in days) of change tracking information when CT is enabled. Value range: 3-30. Default value: 3.")
                    .validator(NumberRange::between(3.0, 30.0))
                    .build(),
            )
            .build()
    }

    fn split_id(id: &str) -> Result<(String, String), OperationError> {
        let parts = split_composite_id(id, ID_SEPARATOR, 2, ID_SHAPE)
            .map_err(|_| OperationError::BrokenId(id.to_string()))?;
        Ok((parts[0].to_string(), parts[1].to_string()))
    }

    /// Current CT settings of the database, or None when it no longer exists
    async fn read_remote(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<Option<DynamicValue>, OperationError> {
        let (instance_id, db_name) = Self::split_id(id)?;
        let api = self.provider_data.client.sqlserver();

        let databases = retry(self.provider_data.timeouts.read_retry(ctx), || async {
            api.describe_dbs_normal(&instance_id)
                .await
                .map_err(retry_error)
        })
        .await?;

        let Some(database) = databases
            .unwrap_or_default()
            .into_iter()
            .find(|db| db.name == db_name)
        else {
            tracing::warn!(
                "resource `{}` [{}] not found, please check if it has been deleted.",
                TYPE_NAME,
                id
            );
            return Ok(None);
        };

        let modify_type = match database.is_db_chaining_on.as_deref() {
            Some("0") => "disable",
            _ => "enable",
        };

        let mut state = DynamicValue::object();
        state.set_string(&AttributePath::new("id"), id)?;
        state.set_string(&AttributePath::new("instance_id"), instance_id)?;
        state.set_string(&AttributePath::new("db_name"), database.name)?;
        state.set_string(&AttributePath::new("modify_type"), modify_type)?;
        if let Some(days) = database
            .retention_period
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
        {
            state.set_number(&AttributePath::new("change_retention_day"), days as f64)?;
        }

        Ok(Some(state))
    }

    /// Applies the configured CT settings and waits for the flow to finish
    async fn apply(&self, ctx: &Context, id: &str, config: &DynamicValue) -> Result<(), OperationError> {
        let (instance_id, db_name) = Self::split_id(id)?;
        let timeouts = &self.provider_data.timeouts;
        let api = self.provider_data.client.sqlserver();

        let request = ModifyDatabaseCtRequest {
            db_names: vec![db_name],
            modify_type: config.get_string(&AttributePath::new("modify_type"))?,
            instance_id,
            change_retention_day: config.get_opt_i64(&AttributePath::new("change_retention_day"))?,
        };

        let flow_id = retry(timeouts.write_retry(ctx), || async {
            api.modify_database_ct(&request).await.map_err(retry_error)
        })
        .await?;
        tracing::info!("ModifyDatabaseCT started flow {}", flow_id);

        let poll = timeouts.poll(ctx.bound(timeouts.write * FLOW_TIMEOUT_FACTOR));
        await_completion(flow_id, || api.describe_flow_status(flow_id), poll).await?;
        Ok(())
    }

    /// Apply, then read back what the database now reports
    async fn apply_and_read(
        &self,
        ctx: &Context,
        id: &str,
        config: &DynamicValue,
    ) -> Result<DynamicValue, OperationError> {
        self.apply(ctx, id, config).await?;
        self.read_remote(ctx, id)
            .await?
            .ok_or_else(|| OperationError::Vanished(id.to_string()))
    }
}

#[async_trait]
impl Resource for SqlserverConfigDatabaseCtResource {
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

            let id = match (
                request.config.get_string(&AttributePath::new("instance_id")),
                request.config.get_string(&AttributePath::new("db_name")),
            ) {
                (Ok(instance_id), Ok(db_name)) => {
                    format!("{}{}{}", instance_id, ID_SEPARATOR, db_name)
                }
                (Err(e), _) | (_, Err(e)) => {
                    return CreateResourceResponse::failed(vec![Diagnostic::error(
                        "Invalid configuration",
                        e.to_string(),
                    )])
                }
            };

            match self.apply_and_read(&ctx, &id, &request.config).await {
                Ok(state) => CreateResourceResponse {
                    new_state: state,
                    diagnostics,
                },
                Err(e) => {
                    tracing::error!("create sqlserver configDatabaseCT failed, reason: {}", e);
                    CreateResourceResponse::failed(vec![
                        e.into_diagnostic("Failed to configure database change tracking")
                    ])
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
            let id = match request.current_state.get_string(&AttributePath::new("id")) {
                Ok(id) => id,
                Err(e) => {
                    return ReadResourceResponse {
                        new_state: None,
                        diagnostics: vec![Diagnostic::error("Invalid state", e.to_string())],
                    }
                }
            };

            match self.read_remote(&ctx, &id).await {
                Ok(state) => ReadResourceResponse {
                    new_state: state,
                    diagnostics: vec![],
                },
                Err(e) => ReadResourceResponse {
                    new_state: Some(request.current_state.clone()),
                    diagnostics: vec![e.into_diagnostic("Failed to read database change tracking")],
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

            let id = match request.prior_state.get_string(&AttributePath::new("id")) {
                Ok(id) => id,
                Err(e) => {
                    return UpdateResourceResponse::failed(
                        request.prior_state.clone(),
                        vec![Diagnostic::error("Invalid state", e.to_string())],
                    )
                }
            };

            match self.apply_and_read(&ctx, &id, &request.config).await {
                Ok(state) => UpdateResourceResponse {
                    new_state: state,
                    diagnostics,
                },
                Err(e) => {
                    tracing::error!("update sqlserver configDatabaseCT failed, reason: {}", e);
                    UpdateResourceResponse::failed(
                        request.prior_state.clone(),
                        vec![e.into_diagnostic("Failed to update database change tracking")],
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Change tracking stays as it is; only the state is dropped
    async fn delete(&self, ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        logging::operation_span(TYPE_NAME, "delete", &ctx)
            .in_scope(|| tracing::info!("leaving change tracking settings in place"));
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn importer(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for SqlserverConfigDatabaseCtResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();

        let parts = match split_composite_id(&request.id, ID_SEPARATOR, 2, ID_SHAPE) {
            Ok(parts) => parts,
            Err(diag) => {
                response.diagnostics.push(diag);
                return response;
            }
        };

        let mut state = DynamicValue::object();
        let result = state
            .set_string(&AttributePath::new("id"), request.id.clone())
            .and_then(|_| state.set_string(&AttributePath::new("instance_id"), parts[0]))
            .and_then(|_| state.set_string(&AttributePath::new("db_name"), parts[1]));
        match result {
            Ok(()) => response.imported_resources.push(ImportedResource {
                type_name: request.type_name.clone(),
                state,
            }),
            Err(e) => response
                .diagnostics
                .push(Diagnostic::error("Failed to set import ID", e.to_string())),
        }
        response
    }
}
