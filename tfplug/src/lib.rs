//! tfplug - Terraform provider framework for Rust
//!
//! Providers, resources and schemas, plus the two waiting primitives that
//! cloud resources are built on: bounded retry of API calls and completion
//! polling of asynchronous vendor operations.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod provider;
pub mod resource;

// Helper modules
pub mod import;
pub mod poll;
pub mod retry;
pub mod validator;

// Re-exports for convenience
pub use context::Context;
pub use error::{Result, TfplugError};
pub use import::{import_state_passthrough_id, split_composite_id};
pub use poll::{await_completion, PollConfig, PollError, StatusSnapshot, TaskStatus};
pub use provider::{ConfigureProviderRequest, ConfigureProviderResponse, Provider};
pub use resource::{Resource, ResourceWithImportState};
pub use retry::{retry, RetryConfig, RetryError};
pub use schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Config, Diagnostic, Dynamic, DynamicValue, State};
