use pfplug::Context;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::common::ApiErrorResponse;
use super::error::ApiError;
use super::pool::{build_client, ConnectionPoolConfig, TlsConfig};

/// PingFederate admin API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth: Auth,
    bypass_external_validation: bool,
    retry_config: RetryConfig,
}

/// Credentials sent with every request
#[derive(Clone)]
pub enum Auth {
    Basic { username: String, password: String },
    AccessToken(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Auth::AccessToken(_) => f.write_str("AccessToken"),
        }
    }
}

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

/// Everything needed to build a [`Client`]
#[derive(Clone)]
pub struct ClientConfig {
    /// `https_host` joined with `admin_api_path`
    pub base_url: String,
    pub auth: Auth,
    pub tls: TlsConfig,
    pub bypass_external_validation: bool,
    pub user_agent: String,
    pub retry_config: RetryConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let pool_config = ConnectionPoolConfig {
            request_timeout: std::time::Duration::from_secs(config.retry_config.timeout_seconds),
            ..Default::default()
        };
        let http_client = build_client(&pool_config, &config.tls, &config.user_agent)?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                auth: config.auth,
                bypass_external_validation: config.bypass_external_validation,
                retry_config: config.retry_config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<T, ApiError> {
        self.send(ctx, Method::GET, path, None).await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        body: &Value,
    ) -> Result<T, ApiError> {
        self.send(ctx, Method::POST, path, Some(body)).await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        body: &Value,
    ) -> Result<T, ApiError> {
        self.send(ctx, Method::PUT, path, Some(body)).await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete(&self, ctx: &Context, path: &str) -> Result<(), ApiError> {
        let _: Value = self.send(ctx, Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Singleton configuration endpoint operations
    pub fn singleton(&self, path: &'static str) -> super::endpoint::SingletonApi<'_> {
        super::endpoint::SingletonApi::new(self, path)
    }

    /// Collection endpoint operations
    pub fn collection(&self, path: &'static str) -> super::endpoint::CollectionApi<'_> {
        super::endpoint::CollectionApi::new(self, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let request = self.execute_with_retry(
            || {
                tracing::debug!(method = %method, url = %url, "admin API request");
                let builder = self.inner.http_client.request(method.clone(), &url);
                let builder = self.apply_headers(builder);
                match body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            },
            path,
        );

        ctx.run(request).await.map_err(|_| ApiError::Cancelled)?
    }

    fn apply_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("X-Xsrf-Header", "PingFederate")
            .header(
                "X-BypassExternalValidation",
                self.inner.bypass_external_validation.to_string(),
            );
        match &self.inner.auth {
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::AccessToken(token) => builder.bearer_auth(token),
        }
    }

    /// Execute request with retry logic
    async fn execute_with_retry<F, T>(&self, request_fn: F, path: &str) -> Result<T, ApiError>
    where
        F: Fn() -> RequestBuilder,
        T: DeserializeOwned,
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
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff)).await;
            }

            match request_fn().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return self.parse_success_response(response).await;
                    }

                    match status {
                        StatusCode::UNAUTHORIZED => return Err(ApiError::AuthError),
                        StatusCode::NOT_FOUND => return Err(ApiError::NotFound(path.to_string())),
                        StatusCode::TOO_MANY_REQUESTS => last_error = Some(ApiError::RateLimited),
                        s if s.is_server_error() => {
                            last_error = Some(ApiError::ServiceUnavailable)
                        }
                        _ => return self.handle_error_response(response).await,
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error =
                            Some(ApiError::Timeout(self.inner.retry_config.timeout_seconds));
                    } else if e.is_connect() {
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

    /// Parse successful response; an empty body reads as JSON null
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let text = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str::<T>(text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match serde_json::from_str::<ApiErrorResponse>(&text) {
            Ok(err_resp) => Err(ApiError::ApiError {
                status,
                message: err_resp.message.unwrap_or(text),
                validation_errors: err_resp.validation_errors,
            }),
            Err(_) => Err(ApiError::ApiError {
                status,
                message: text,
                validation_errors: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn test_client(url: &str, auth: Auth) -> Client {
        Client::new(ClientConfig {
            base_url: format!("{}/pf-admin-api/v1", url),
            auth,
            tls: TlsConfig::default(),
            bypass_external_validation: true,
            user_agent: "terraform-provider-pingfederate/test 12.1.0".to_string(),
            retry_config: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
                timeout_seconds: 5,
            },
        })
        .unwrap()
    }

    fn basic() -> Auth {
        Auth::Basic {
            username: "administrator".to_string(),
            password: "2FederateM0re".to_string(),
        }
    }

    #[tokio::test]
    async fn client_sends_required_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pf-admin-api/v1/version")
            .match_header("x-xsrf-header", "PingFederate")
            .match_header("x-bypassexternalvalidation", "true")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .match_header(
                "user-agent",
                "terraform-provider-pingfederate/test 12.1.0",
            )
            .with_body(r#"{"version":"12.1.0.4"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), basic());
        let body: Value = client.get(&Context::new(), "/version").await.unwrap();
        assert_eq!(body["version"], "12.1.0.4");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_uses_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pf-admin-api/v1/serverSettings")
            .match_header("authorization", "Bearer token-123")
            .with_body("{}")
            .create_async()
            .await;

        let client = test_client(&server.url(), Auth::AccessToken("token-123".to_string()));
        let _: Value = client
            .get(&Context::new(), "/serverSettings")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_maps_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pf-admin-api/v1/oauth/clients/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url(), basic());
        let result: Result<Value, _> = client
            .get(&Context::new(), "/oauth/clients/missing")
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(p)) if p == "/oauth/clients/missing"));
    }

    #[tokio::test]
    async fn client_reports_validation_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/pf-admin-api/v1/oauth/clients")
            .with_status(422)
            .with_body(
                r#"{"resultId":"validation_error","message":"Validation error(s) occurred.",
                    "validationErrors":[{"errorId":"invalid","fieldPath":"grantTypes","message":"required"}]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url(), basic());
        let result: Result<Value, _> = client
            .post(&Context::new(), "/oauth/clients", &serde_json::json!({}))
            .await;

        match result {
            Err(ApiError::ApiError {
                status,
                message,
                validation_errors,
            }) => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation error(s) occurred.");
                assert_eq!(validation_errors[0].field_path.as_deref(), Some("grantTypes"));
            }
            other => panic!("expected ApiError, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn client_retries_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pf-admin-api/v1/serverSettings")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = test_client(&server.url(), basic());
        let result: Result<Value, _> = client.get(&Context::new(), "/serverSettings").await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_delete_accepts_empty_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/pf-admin-api/v1/oauth/clients/c1")
            .with_status(204)
            .create_async()
            .await;

        let client = test_client(&server.url(), basic());
        client
            .delete(&Context::new(), "/oauth/clients/c1")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn cancelled_context_stops_request() {
        let client = test_client("http://127.0.0.1:9", basic());
        let ctx = Context::new();
        ctx.cancel();

        let result: Result<Value, _> = client.get(&ctx, "/version").await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    #[tokio::test]
    async fn expired_deadline_stops_retries() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pf-admin-api/v1/version")
            .with_status(503)
            .create_async()
            .await;

        let client = Client::new(ClientConfig {
            retry_config: RetryConfig {
                max_retries: 10,
                initial_backoff_ms: 1000,
                max_backoff_ms: 1000,
                timeout_seconds: 5,
            },
            ..test_config(&server.url())
        })
        .unwrap();

        let ctx = Context::new().with_timeout(Duration::from_millis(50));
        let result: Result<Value, _> = client.get(&ctx, "/version").await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    fn test_config(url: &str) -> ClientConfig {
        ClientConfig {
            base_url: format!("{}/pf-admin-api/v1", url),
            auth: basic(),
            tls: TlsConfig::default(),
            bypass_external_validation: false,
            user_agent: "test".to_string(),
            retry_config: RetryConfig::default(),
        }
    }
}
