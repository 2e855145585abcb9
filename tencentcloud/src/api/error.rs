use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// An error reported inside the response envelope
    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    Vendor {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("API returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Response of {action} is missing {field}")]
    MissingField { action: String, field: String },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,
}

/// Vendor codes worth another attempt. Matched as prefixes.
const RETRYABLE_CODES: &[&str] = &[
    "RequestLimitExceeded",
    "InternalError",
    "ResourceInUse",
    "ResourceBusy",
    "FailedOperation.InstanceBusy",
    "FailedOperation.TaskConflict",
    "OperationDenied.InstanceStatusLimitError",
    "ClientError.NetworkError",
];

impl ApiError {
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Vendor { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether a write retry may re-attempt the call that produced this error
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Vendor { code, .. } => {
                RETRYABLE_CODES.iter().any(|c| code.starts_with(c))
            }
            ApiError::RequestError(e) => e.is_timeout() || e.is_connect(),
            ApiError::Timeout(_) | ApiError::RateLimited | ApiError::ServiceUnavailable => true,
            ApiError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            ApiError::ParseError(_)
            | ApiError::MissingField { .. }
            | ApiError::InvalidEndpoint(_) => false,
        }
    }

    /// The vendor reported that the addressed object does not exist
    pub fn is_not_found(&self) -> bool {
        self.code()
            .is_some_and(|code| code.ends_with("NotFound") || code.contains(".NotFound"))
    }
}
