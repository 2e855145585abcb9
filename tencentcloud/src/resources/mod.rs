//! Resource implementations

pub mod cvm_image_share_permission;
pub mod operation;
pub mod sqlserver_config_database_ct;

pub use cvm_image_share_permission::CvmImageSharePermissionResource;
pub use operation::{OperationDescriptor, OperationResource, OPERATIONS};
pub use sqlserver_config_database_ct::SqlserverConfigDatabaseCtResource;

use crate::api::ApiError;
use tfplug::{Diagnostic, PollError, RetryError, TfplugError};

/// Everything that can abort a resource operation
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("{action} response has no {field}")]
    MissingHandle { action: String, field: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] TfplugError),

    #[error("id is broken, {0}")]
    BrokenId(String),

    #[error("{0} was not found after it was applied")]
    Vanished(String),
}

impl OperationError {
    pub fn into_diagnostic(self, summary: impl Into<String>) -> Diagnostic {
        Diagnostic::error(summary, self.to_string())
    }
}

/// Sorts an API error for the write retry helper
pub(crate) fn retry_error(e: ApiError) -> RetryError<ApiError> {
    if e.is_retryable() {
        tracing::warn!("retryable API error: {}", e);
        RetryError::Retryable(e)
    } else {
        RetryError::Permanent(e)
    }
}
