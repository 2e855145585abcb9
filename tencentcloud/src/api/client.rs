use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::common::{parse_envelope, Service};
use super::error::ApiError;
use super::pool::{ConnectionPoolConfig, ConnectionPoolManager, ConnectionStats};
use super::sign::{self, Credentials};

/// Tencent Cloud API v3 client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    credentials: Credentials,
    region: String,
    endpoint: Option<Endpoint>,
    retry_config: RetryConfig,
    pool_manager: ConnectionPoolManager,
}

/// Where a request is sent and the host it is signed for
#[derive(Debug, Clone, PartialEq)]
struct Endpoint {
    url: String,
    host: String,
}

impl Endpoint {
    fn parse(raw: &str) -> Result<Self, ApiError> {
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };
        let url = url::Url::parse(&with_scheme)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", raw, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| ApiError::InvalidEndpoint(format!("{}: missing host", raw)))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            url: format!("{}://{}/", url.scheme(), host),
            host,
        })
    }

    fn for_service(service: &Service) -> Self {
        let host = service.default_host();
        Self {
            url: format!("https://{}/", host),
            host,
        }
    }
}

/// Transport-level retry of a single API call
#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a new API client with default configuration.
    /// `endpoint` overrides the per-service default host for every call.
    pub fn new(
        credentials: Credentials,
        region: &str,
        endpoint: Option<&str>,
    ) -> Result<Self, ApiError> {
        Self::with_config(credentials, region, endpoint, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        credentials: Credentials,
        region: &str,
        endpoint: Option<&str>,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let pool_config = ConnectionPoolConfig {
            request_timeout: std::time::Duration::from_secs(retry_config.timeout_seconds),
            ..Default::default()
        };

        let pool_manager = ConnectionPoolManager::new(pool_config);
        let http_client = pool_manager.build_client()?;
        let endpoint = endpoint.map(Endpoint::parse).transpose()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                credentials,
                region: region.to_string(),
                endpoint,
                retry_config,
                pool_manager,
            }),
        })
    }

    pub fn region(&self) -> &str {
        &self.inner.region
    }

    /// Calls `action` of `service` with a JSON body and unwraps the response
    pub async fn call<B, T>(&self, service: &Service, action: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|e| ApiError::ParseError(format!("cannot encode {} request: {}", action, e)))?;
        let endpoint = match &self.inner.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => Endpoint::for_service(service),
        };

        tracing::debug!(
            "api[{}] request body [{}]",
            action,
            String::from_utf8_lossy(&payload)
        );

        let result = self
            .execute_with_retry(
                || async {
                    let now = Utc::now();
                    let authorization = sign::authorization(
                        &self.inner.credentials,
                        service.name,
                        &endpoint.host,
                        now,
                        &payload,
                    );

                    let mut request = self
                        .inner
                        .http_client
                        .post(&endpoint.url)
                        .header(CONTENT_TYPE, sign::CONTENT_TYPE)
                        .header(AUTHORIZATION, authorization)
                        .header("X-TC-Action", action)
                        .header("X-TC-Version", service.version)
                        .header("X-TC-Timestamp", now.timestamp().to_string())
                        .header("X-TC-Region", &self.inner.region);
                    if let Some(token) = &self.inner.credentials.token {
                        request = request.header("X-TC-Token", token);
                    }

                    request.body(payload.clone()).send().await
                },
                action,
            )
            .await;

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                let stats = self.get_connection_stats().await;
                tracing::warn!(
                    "api[{}] failed: {} ({} of {} requests on this client failed)",
                    action,
                    e,
                    stats.failed_requests,
                    stats.total_requests
                );
                return Err(e);
            }
        };

        tracing::debug!("api[{}] response body [{}]", action, text);
        parse_envelope(action, &text)
    }

    /// Get connection pool statistics
    pub async fn get_connection_stats(&self) -> ConnectionStats {
        self.inner.pool_manager.get_stats().await
    }

    pub fn mysql(&self) -> super::mysql::MysqlApi<'_> {
        super::mysql::MysqlApi::new(self)
    }

    pub fn sqlserver(&self) -> super::sqlserver::SqlserverApi<'_> {
        super::sqlserver::SqlserverApi::new(self)
    }

    pub fn cvm(&self) -> super::cvm::CvmApi<'_> {
        super::cvm::CvmApi::new(self)
    }

    pub fn autoscaling(&self) -> super::autoscaling::AutoScalingApi<'_> {
        super::autoscaling::AutoScalingApi::new(self)
    }

    /// Execute request with retry logic, returning the body of the first
    /// successful HTTP response
    async fn execute_with_retry<F, Fut>(&self, request_fn: F, action: &str) -> Result<String, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.inner.retry_config.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    self.inner.retry_config.initial_backoff_ms * (2_u64.pow(attempt - 1)),
                    self.inner.retry_config.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying {} after {}ms (attempt {})",
                    action,
                    backoff,
                    attempt
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        self.inner.pool_manager.record_request(true).await;
                        return Ok(response.text().await?);
                    }

                    self.inner.pool_manager.record_request(false).await;

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        let message = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        return Err(ApiError::HttpStatus {
                            status: status.as_u16(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    self.inner.pool_manager.record_request(false).await;

                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() || e.is_request() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }
}
