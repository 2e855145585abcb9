//! Provider trait
//!
//! A provider is configured once with credentials and then hands out
//! resource instances bound to its API client.

use crate::context::Context;
use crate::resource::Resource;
use crate::schema::Schema;
use crate::types::{Diagnostic, DynamicValue};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Prefix shared by all resource type names, e.g. "tencentcloud"
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// Called once before any resource is created
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Fails when the provider is not configured or `name` is unknown
    async fn create_resource(&self, name: &str) -> Result<Box<dyn Resource>>;

    /// Schemas of every resource type, available before configuration
    async fn resource_schemas(&self) -> HashMap<String, Schema>;
}

pub struct ConfigureProviderRequest {
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
}
