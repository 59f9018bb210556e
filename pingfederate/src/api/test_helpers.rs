//! Test helpers for the PingFederate admin API

use super::client::{Auth, Client, ClientConfig, RetryConfig};
use super::pool::TlsConfig;

/// Client against a mock server's `/pf-admin-api/v1`, with fast retries
#[allow(clippy::disallowed_methods)]
pub fn create_test_client(url: &str) -> Client {
    Client::new(ClientConfig {
        base_url: format!("{}/pf-admin-api/v1", url),
        auth: Auth::Basic {
            username: "administrator".to_string(),
            password: "2FederateM0re".to_string(),
        },
        tls: TlsConfig::default(),
        bypass_external_validation: false,
        user_agent: "terraform-provider-pingfederate/test".to_string(),
        retry_config: RetryConfig {
            max_retries: 1,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            timeout_seconds: 5,
        },
    })
    .unwrap()
}
