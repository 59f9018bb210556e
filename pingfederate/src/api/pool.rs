//! HTTP connection pool and TLS setup for the admin API

use super::error::ApiError;
use std::path::PathBuf;
use std::time::Duration;

pub struct ConnectionPoolConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    pub request_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

/// Trust settings for the admin API's certificate
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    pub insecure_trust_all_tls: bool,
    /// Extra root certificates, each file may hold several PEM blocks
    pub ca_certificate_pem_files: Vec<PathBuf>,
}

pub fn build_client(
    config: &ConnectionPoolConfig,
    tls: &TlsConfig,
    user_agent: &str,
) -> Result<reqwest::Client, ApiError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .danger_accept_invalid_certs(tls.insecure_trust_all_tls)
        .timeout(config.request_timeout)
        .connect_timeout(config.connection_timeout)
        .pool_idle_timeout(config.idle_timeout)
        .pool_max_idle_per_host(config.max_idle_connections);

    if let Some(keepalive) = config.tcp_keepalive {
        builder = builder.tcp_keepalive(keepalive);
    }

    for path in &tls.ca_certificate_pem_files {
        let pem = std::fs::read(path).map_err(|e| {
            ApiError::InvalidConfig(format!(
                "failed to read CA certificate file {}: {}",
                path.display(),
                e
            ))
        })?;
        let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
            ApiError::InvalidConfig(format!(
                "failed to parse CA certificate file {}: {}",
                path.display(),
                e
            ))
        })?;
        if certs.is_empty() {
            return Err(ApiError::InvalidConfig(format!(
                "no certificates found in {}",
                path.display()
            )));
        }
        tracing::debug!(file = %path.display(), count = certs.len(), "adding CA certificates");
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    Ok(builder.build()?)
}
