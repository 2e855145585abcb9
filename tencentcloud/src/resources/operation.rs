//! One-shot operation resources
//!
//! An operation resource fires a single mutating API call when it is created
//! and, when the call starts a vendor-side task, waits for that task to
//! finish. There is nothing to read back or update afterwards: every field
//! forces replacement and deleting only forgets the state.
//!
//! Each operation is a row of [`OPERATIONS`]; [`OperationResource`] runs any
//! row.

use super::{retry_error, OperationError};
use crate::api::common::handle_from_value;
use crate::api::{autoscaling, mysql, ApiError, Client, Service};
use crate::logging::{self, Elapsed};
use crate::provider_data::{TencentCloudProviderData, Timeouts};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::time::Duration;
use tfplug::resource::*;
use tfplug::types::has_errors;
use tfplug::validator::{NumberRange, OneOf};
use tfplug::{
    await_completion, import_state_passthrough_id, retry, AttributeBuilder, AttributePath,
    AttributeType, Context, Diagnostic, Dynamic, DynamicValue, Schema, SchemaBuilder,
    StatusSnapshot,
};
use tracing::Instrument;

/// Fetches the status of the task behind a handle
pub type StatusFetcher =
    for<'a> fn(&'a Client, &'a str) -> BoxFuture<'a, Result<StatusSnapshot, ApiError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    Int,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    OneOf(&'static [&'static str]),
    AtLeast(i64),
}

/// Maps one configuration attribute onto one request parameter
#[derive(Debug)]
pub struct FieldSpec {
    pub attribute: &'static str,
    pub param: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
    pub rule: Option<FieldRule>,
}

/// Where the resource id comes from once the call succeeded
#[derive(Debug, Clone, Copy)]
pub enum IdSource {
    Attribute(&'static str),
    ResponseField(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub enum PollBudget {
    Read,
    Write,
}

impl PollBudget {
    fn timeout(self, timeouts: &Timeouts) -> Duration {
        match self {
            PollBudget::Read => timeouts.read,
            PollBudget::Write => timeouts.write,
        }
    }
}

pub struct PollSpec {
    /// Response field holding the task handle
    pub handle_field: &'static str,
    pub fetch: StatusFetcher,
    pub budget: PollBudget,
}

pub struct OperationDescriptor {
    pub type_name: &'static str,
    pub description: &'static str,
    pub service: Service,
    pub action: &'static str,
    pub fields: &'static [FieldSpec],
    /// At least one of these attributes must be set
    pub require_one_of: &'static [&'static str],
    pub id: IdSource,
    pub poll: Option<PollSpec>,
    pub importable: bool,
}

fn fetch_mysql_async_request<'a>(
    client: &'a Client,
    handle: &'a str,
) -> BoxFuture<'a, Result<StatusSnapshot, ApiError>> {
    async move {
        let info = client.mysql().describe_async_request_info(handle).await?;
        Ok(info.snapshot())
    }
    .boxed()
}

fn fetch_scaling_activity<'a>(
    client: &'a Client,
    handle: &'a str,
) -> BoxFuture<'a, Result<StatusSnapshot, ApiError>> {
    async move {
        let activity = client.autoscaling().describe_activity(handle).await?;
        Ok(activity.snapshot())
    }
    .boxed()
}

pub static OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor {
        type_name: "tencentcloud_mysql_switch_master_slave_operation",
        description: "switch mysql master and slave",
        service: mysql::SERVICE,
        action: "SwitchDBInstanceMasterSlave",
        fields: &[
            FieldSpec {
                attribute: "instance_id",
                param: "InstanceId",
                kind: FieldKind::String,
                required: true,
                description: "instance id.",
                rule: None,
            },
            FieldSpec {
                attribute: "dst_slave",
                param: "DstSlave",
                kind: FieldKind::String,
                required: false,
                description: "target instance. Possible values: `first` - first standby; `second` - second standby. The default value is `first`, and only multi-AZ instances support setting it to `second`.",
                rule: Some(FieldRule::OneOf(&["first", "second"])),
            },
            FieldSpec {
                attribute: "force_switch",
                param: "ForceSwitch",
                kind: FieldKind::Bool,
                required: false,
                description: "Whether to force switch. Default is False. Forcing a switch risks data loss on the instance.",
                rule: None,
            },
            FieldSpec {
                attribute: "wait_switch",
                param: "WaitSwitch",
                kind: FieldKind::Bool,
                required: false,
                description: "Whether to switch within the time window. Default is False. Ignored when force_switch is true.",
                rule: None,
            },
        ],
        require_one_of: &[],
        id: IdSource::Attribute("instance_id"),
        poll: Some(PollSpec {
            handle_field: "AsyncRequestId",
            fetch: fetch_mysql_async_request,
            budget: PollBudget::Read,
        }),
        importable: true,
    },
    OperationDescriptor {
        type_name: "tencentcloud_mysql_ro_stop_replication",
        description: "stop mysql read-only replication",
        service: mysql::SERVICE,
        action: "StopReplication",
        fields: &[FieldSpec {
            attribute: "instance_id",
            param: "InstanceId",
            kind: FieldKind::String,
            required: true,
            description: "Read-Only instance ID.",
            rule: None,
        }],
        require_one_of: &[],
        id: IdSource::Attribute("instance_id"),
        poll: Some(PollSpec {
            handle_field: "AsyncRequestId",
            fetch: fetch_mysql_async_request,
            budget: PollBudget::Read,
        }),
        importable: false,
    },
    OperationDescriptor {
        type_name: "tencentcloud_as_scale_in_instances",
        description: "scale in auto scaling group",
        service: autoscaling::SERVICE,
        action: "ScaleInInstances",
        fields: &[
            FieldSpec {
                attribute: "auto_scaling_group_id",
                param: "AutoScalingGroupId",
                kind: FieldKind::String,
                required: true,
                description: "Scaling group ID.",
                rule: None,
            },
            FieldSpec {
                attribute: "scale_in_number",
                param: "ScaleInNumber",
                kind: FieldKind::Int,
                required: true,
                description: "Number of instances to be reduced.",
                rule: Some(FieldRule::AtLeast(1)),
            },
        ],
        require_one_of: &[],
        id: IdSource::ResponseField("ActivityId"),
        poll: Some(PollSpec {
            handle_field: "ActivityId",
            fetch: fetch_scaling_activity,
            budget: PollBudget::Write,
        }),
        importable: false,
    },
    OperationDescriptor {
        type_name: "tencentcloud_as_complete_lifecycle",
        description: "complete auto scaling lifecycle action",
        service: autoscaling::SERVICE,
        action: "CompleteLifecycleAction",
        fields: &[
            FieldSpec {
                attribute: "lifecycle_hook_id",
                param: "LifecycleHookId",
                kind: FieldKind::String,
                required: true,
                description: "Lifecycle hook ID.",
                rule: None,
            },
            FieldSpec {
                attribute: "lifecycle_action_result",
                param: "LifecycleActionResult",
                kind: FieldKind::String,
                required: true,
                description: "Result of the lifecycle action. Value range: `CONTINUE`, `ABANDON`.",
                rule: Some(FieldRule::OneOf(&["CONTINUE", "ABANDON"])),
            },
            FieldSpec {
                attribute: "instance_id",
                param: "InstanceId",
                kind: FieldKind::String,
                required: false,
                description: "Instance ID. Either instance_id or lifecycle_action_token must be specified.",
                rule: None,
            },
            FieldSpec {
                attribute: "lifecycle_action_token",
                param: "LifecycleActionToken",
                kind: FieldKind::String,
                required: false,
                description: "Either instance_id or lifecycle_action_token must be specified.",
                rule: None,
            },
        ],
        require_one_of: &["instance_id", "lifecycle_action_token"],
        id: IdSource::Attribute("lifecycle_hook_id"),
        poll: None,
        importable: true,
    },
];

pub fn find(type_name: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|d| d.type_name == type_name)
}

impl OperationDescriptor {
    pub fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new().description(self.description).attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .description("ID of the resource.")
                .build(),
        );

        for field in self.fields {
            let r#type = match field.kind {
                FieldKind::String => AttributeType::String,
                FieldKind::Bool => AttributeType::Bool,
                FieldKind::Int => AttributeType::Number,
            };
            let mut attr = AttributeBuilder::new(field.attribute, r#type)
                .description(field.description)
                .force_new();
            attr = if field.required {
                attr.required()
            } else {
                attr.optional()
            };
            attr = match field.rule {
                Some(FieldRule::OneOf(allowed)) => attr.validator(OneOf::new(allowed)),
                Some(FieldRule::AtLeast(min)) => attr.validator(NumberRange::at_least(min as f64)),
                None => attr,
            };
            builder = builder.attribute(attr.build());
        }

        builder.build()
    }

    /// Schema validation plus the one-of rule across attributes
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = self.schema().validate(config);

        if !self.require_one_of.is_empty() {
            let mut any_set = false;
            let mut any_unknown = false;
            for name in self.require_one_of {
                match config.get(&AttributePath::new(name)) {
                    Ok(Dynamic::Unknown) => any_unknown = true,
                    Ok(value) if !value.is_absent() => any_set = true,
                    _ => {}
                }
            }
            if !any_set && !any_unknown {
                diagnostics.push(Diagnostic::error(
                    "Missing required argument",
                    format!(
                        "one of `{}` must be specified",
                        self.require_one_of.join(",")
                    ),
                ));
            }
        }

        diagnostics
    }

    /// Request body built from the configured fields; unset optionals are omitted
    pub fn payload(&self, config: &DynamicValue) -> Result<Map<String, Value>, OperationError> {
        let mut body = Map::new();

        for field in self.fields {
            let path = AttributePath::new(field.attribute);
            if config.is_absent(&path) {
                continue;
            }
            let value = match field.kind {
                FieldKind::String => Value::String(config.get_string(&path)?),
                FieldKind::Bool => Value::Bool(config.get_bool(&path)?),
                FieldKind::Int => Value::from(config.get_i64(&path)?),
            };
            body.insert(field.param.to_string(), value);
        }

        Ok(body)
    }

    fn resource_id(&self, config: &DynamicValue, response: &Value) -> Result<String, OperationError> {
        match self.id {
            IdSource::Attribute(name) => Ok(config.get_string(&AttributePath::new(name))?),
            IdSource::ResponseField(field) => {
                response
                    .get(field)
                    .and_then(handle_from_value)
                    .ok_or_else(|| OperationError::MissingHandle {
                        action: self.action.to_string(),
                        field: field.to_string(),
                    })
            }
        }
    }
}

/// Runs one row of [`OPERATIONS`]
pub struct OperationResource {
    descriptor: &'static OperationDescriptor,
    provider_data: TencentCloudProviderData,
}

impl OperationResource {
    pub fn new(
        descriptor: &'static OperationDescriptor,
        provider_data: TencentCloudProviderData,
    ) -> Self {
        Self {
            descriptor,
            provider_data,
        }
    }

    /// Issues the call, then waits for its task. Returns the resource id.
    async fn execute(&self, ctx: &Context, config: &DynamicValue) -> Result<String, OperationError> {
        let descriptor = self.descriptor;
        let client = &self.provider_data.client;
        let timeouts = &self.provider_data.timeouts;
        let payload = descriptor.payload(config)?;

        let response: Value = retry(timeouts.write_retry(ctx), || async {
            client
                .call(&descriptor.service, descriptor.action, &payload)
                .await
                .map_err(retry_error)
        })
        .await?;
        tracing::info!("api[{}] accepted", descriptor.action);

        let id = descriptor.resource_id(config, &response)?;

        if let Some(poll) = &descriptor.poll {
            let handle = response
                .get(poll.handle_field)
                .and_then(handle_from_value)
                .ok_or_else(|| OperationError::MissingHandle {
                    action: descriptor.action.to_string(),
                    field: poll.handle_field.to_string(),
                })?;
            let poll_config = timeouts.poll(ctx.bound(poll.budget.timeout(timeouts)));
            tracing::info!(
                "waiting up to {:?} for {} task {}",
                poll_config.timeout,
                descriptor.action,
                handle
            );
            await_completion(&handle, || (poll.fetch)(client, &handle), poll_config).await?;
        }

        Ok(id)
    }
}

#[async_trait]
impl Resource for OperationResource {
    fn type_name(&self) -> &str {
        self.descriptor.type_name
    }

    fn schema(&self) -> Schema {
        self.descriptor.schema()
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: self.descriptor.validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let span = logging::operation_span(self.descriptor.type_name, "create", &ctx);
        let _elapsed = Elapsed::start(self.descriptor.type_name, "create");

        async {
            let diagnostics = self.descriptor.validate(&request.config);
            if has_errors(&diagnostics) {
                return CreateResourceResponse::failed(diagnostics);
            }

            let id = match self.execute(&ctx, &request.config).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!("{} failed, reason: {}", self.descriptor.description, e);
                    return CreateResourceResponse::failed(vec![
                        e.into_diagnostic(format!("Failed to {}", self.descriptor.description))
                    ]);
                }
            };

            let mut state = request.config.clone();
            if let Err(e) = state.set_string(&AttributePath::new("id"), id) {
                return CreateResourceResponse::failed(vec![Diagnostic::error(
                    "Failed to record resource id",
                    e.to_string(),
                )]);
            }

            CreateResourceResponse {
                new_state: state,
                diagnostics,
            }
        }
        .instrument(span)
        .await
    }

    /// The operation has no remote object to refresh from
    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![],
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        UpdateResourceResponse::failed(
            request.prior_state,
            vec![Diagnostic::error(
                "Update not supported",
                format!(
                    "{} cannot be updated in place; every argument forces a new operation",
                    self.descriptor.type_name
                ),
            )],
        )
    }

    async fn delete(&self, ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        logging::operation_span(self.descriptor.type_name, "delete", &ctx).in_scope(|| {
            tracing::info!("removing {} from state only", self.descriptor.type_name)
        });
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn importer(&self) -> Option<&dyn ResourceWithImportState> {
        if self.descriptor.importable {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl ResourceWithImportState for OperationResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::default();
        if !self.descriptor.importable {
            response.diagnostics.push(Diagnostic::error(
                "Import not supported",
                format!("{} cannot be imported", self.descriptor.type_name),
            ));
            return response;
        }

        import_state_passthrough_id(AttributePath::new("id"), &request, &mut response);
        if let IdSource::Attribute(name) = self.descriptor.id {
            for imported in &mut response.imported_resources {
                if let Err(e) = imported
                    .state
                    .set_string(&AttributePath::new(name), request.id.clone())
                {
                    response
                        .diagnostics
                        .push(Diagnostic::error("Failed to set import ID", e.to_string()));
                }
            }
        }
        response
    }
}
