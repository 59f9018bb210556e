//! Provider block configuration with `PINGFEDERATE_PROVIDER_*` fallbacks
//!
//! A value set in the provider block always wins over the environment. All
//! problems are collected into one set of diagnostics so `terraform plan`
//! reports a broken provider block in a single pass.

use crate::api::{Auth, ClientConfig, RetryConfig, TlsConfig};
use pfplug::schema::Schema;
use pfplug::{
    AttributeBuilder, AttributePath, AttributeType, Diagnostics, Dynamic, DynamicValue,
    SchemaBuilder, SupportedVersion, VersionRegistry,
};
use std::path::PathBuf;
use tracing::{debug, info};

pub const INVALID_PROVIDER_CONFIGURATION: &str = "Invalid provider configuration";

pub const DEFAULT_ADMIN_API_PATH: &str = "/pf-admin-api/v1";

const HTTPS_HOST_ENV: &str = "PINGFEDERATE_PROVIDER_HTTPS_HOST";
const ADMIN_API_PATH_ENV: &str = "PINGFEDERATE_PROVIDER_ADMIN_API_PATH";
const USERNAME_ENV: &str = "PINGFEDERATE_PROVIDER_USERNAME";
const PASSWORD_ENV: &str = "PINGFEDERATE_PROVIDER_PASSWORD";
const ACCESS_TOKEN_ENV: &str = "PINGFEDERATE_PROVIDER_ACCESS_TOKEN";
const INSECURE_TRUST_ALL_TLS_ENV: &str = "PINGFEDERATE_PROVIDER_INSECURE_TRUST_ALL_TLS";
const CA_CERTIFICATE_PEM_FILES_ENV: &str = "PINGFEDERATE_PROVIDER_CA_CERTIFICATE_PEM_FILES";
pub const PRODUCT_VERSION_ENV: &str = "PINGFEDERATE_PROVIDER_PRODUCT_VERSION";
const X_BYPASS_EXTERNAL_VALIDATION_HEADER_ENV: &str =
    "PINGFEDERATE_PROVIDER_X_BYPASS_EXTERNAL_VALIDATION_HEADER";
const APPEND_USER_AGENT_ENV: &str = "PINGFEDERATE_TF_APPEND_USER_AGENT";

/// Resolved provider settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub https_host: String,
    pub admin_api_path: String,
    pub auth: Auth,
    pub insecure_trust_all_tls: bool,
    pub ca_certificate_pem_files: Vec<PathBuf>,
    pub product_version: SupportedVersion,
    pub x_bypass_external_validation_header: bool,
    pub user_agent_suffix: Option<String>,
}

impl ProviderConfig {
    /// Resolve the provider block against the environment.
    /// Returns `None` when any error diagnostic was added.
    pub fn load(
        config: &DynamicValue,
        registry: &VersionRegistry,
        diagnostics: &mut Diagnostics,
    ) -> Option<Self> {
        let errors_before = diagnostics.errors.len();

        let https_host = required_string(config, "https_host", HTTPS_HOST_ENV, diagnostics);
        if let Some(host) = &https_host {
            validate_host(host, diagnostics);
        }

        let admin_api_path = optional_string(config, "admin_api_path", ADMIN_API_PATH_ENV, diagnostics)
            .unwrap_or_else(|| DEFAULT_ADMIN_API_PATH.to_string());

        let auth = resolve_auth(config, diagnostics);

        let product_version =
            required_string(config, "product_version", PRODUCT_VERSION_ENV, diagnostics)
                .and_then(|text| match registry.parse(&text) {
                    Ok(version) => Some(version),
                    Err(e) => {
                        diagnostics.add_attribute_error(
                            AttributePath::new("product_version"),
                            INVALID_PROVIDER_CONFIGURATION,
                            e.to_string(),
                        );
                        None
                    }
                });

        let insecure_trust_all_tls = bool_setting(
            config,
            "insecure_trust_all_tls",
            INSECURE_TRUST_ALL_TLS_ENV,
        );
        let x_bypass_external_validation_header = bool_setting(
            config,
            "x_bypass_external_validation_header",
            X_BYPASS_EXTERNAL_VALIDATION_HEADER_ENV,
        );
        let ca_certificate_pem_files = ca_certificate_pem_files(config);

        if diagnostics.errors.len() > errors_before {
            return None;
        }

        let (Some(https_host), Some(auth), Some(product_version)) =
            (https_host, auth, product_version)
        else {
            return None;
        };

        info!(
            https_host = %https_host,
            product_version = %product_version,
            insecure_trust_all_tls,
            "resolved provider configuration"
        );

        Some(Self {
            https_host,
            admin_api_path,
            auth,
            insecure_trust_all_tls,
            ca_certificate_pem_files,
            product_version,
            x_bypass_external_validation_header,
            user_agent_suffix: env_var(APPEND_USER_AGENT_ENV),
        })
    }

    pub fn user_agent(&self) -> String {
        let mut agent = format!(
            "terraform-provider-pingfederate/{} {}",
            env!("CARGO_PKG_VERSION"),
            self.product_version
        );
        if let Some(suffix) = &self.user_agent_suffix {
            agent.push(' ');
            agent.push_str(suffix);
        }
        agent
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: format!(
                "{}{}",
                self.https_host.trim_end_matches('/'),
                self.admin_api_path
            ),
            auth: self.auth.clone(),
            tls: TlsConfig {
                insecure_trust_all_tls: self.insecure_trust_all_tls,
                ca_certificate_pem_files: self.ca_certificate_pem_files.clone(),
            },
            bypass_external_validation: self.x_bypass_external_validation_header,
            user_agent: self.user_agent(),
            retry_config: RetryConfig::default(),
        }
    }
}

/// Schema of the `provider "pingfederate"` block
pub fn provider_schema() -> Schema {
    let string = |name: &str, description: &str| {
        AttributeBuilder::new(name, AttributeType::String)
            .description(description)
            .optional()
    };

    SchemaBuilder::new()
        .description("PingFederate provider")
        .attribute(
            string("https_host", "URI for PingFederate HTTPS port.")
                .build(),
        )
        .attribute(
            string(
                "admin_api_path",
                "Path for PingFederate Admin API. Defaults to /pf-admin-api/v1.",
            )
            .build(),
        )
        .attribute(string("username", "Username for PingFederate Admin user.").build())
        .attribute(
            string("password", "Password for PingFederate Admin user.")
                .sensitive()
                .build(),
        )
        .attribute(
            string("access_token", "Access token for PingFederate Admin API.")
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("insecure_trust_all_tls", AttributeType::Bool)
                .description("Set to true to trust any certificate when connecting to the PingFederate server.")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new(
                "ca_certificate_pem_files",
                AttributeType::Set(Box::new(AttributeType::String)),
            )
            .description("Paths to files containing PEM-encoded certificates to be trusted as root CAs.")
            .optional()
            .build(),
        )
        .attribute(
            string(
                "product_version",
                "Version of the PingFederate server being configured.",
            )
            .build(),
        )
        .attribute(
            AttributeBuilder::new("x_bypass_external_validation_header", AttributeType::Bool)
                .description("Header value in request for PingFederate. When true, connectivity checks for resources such as data stores are skipped.")
                .optional()
                .build(),
        )
        .build()
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// String from the block, else from the environment. Unknown values are an
/// error: the provider cannot connect with a value known only after apply.
fn optional_string(
    config: &DynamicValue,
    attribute: &str,
    env: &str,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    match config.get_or_null(&AttributePath::new(attribute)) {
        Dynamic::Unknown => {
            diagnostics.add_attribute_error(
                AttributePath::new(attribute),
                INVALID_PROVIDER_CONFIGURATION,
                format!(
                    "{} cannot be unknown. It can be set either in the configuration or with the {} environment variable",
                    attribute, env
                ),
            );
            None
        }
        Dynamic::String(value) if !value.is_empty() => Some(value),
        _ => env_var(env),
    }
}

fn required_string(
    config: &DynamicValue,
    attribute: &str,
    env: &str,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    if config.get_or_null(&AttributePath::new(attribute)).is_unknown() {
        return optional_string(config, attribute, env, diagnostics);
    }
    let value = optional_string(config, attribute, env, diagnostics);
    if value.is_none() {
        diagnostics.add_attribute_error(
            AttributePath::new(attribute),
            INVALID_PROVIDER_CONFIGURATION,
            format!(
                "{} is required. Either set it in the configuration or use the {} environment variable",
                attribute, env
            ),
        );
    }
    value
}

/// Booleans that fail to parse from the environment fall back to false
fn bool_setting(config: &DynamicValue, attribute: &str, env: &str) -> bool {
    if let Some(value) = config.get_or_null(&AttributePath::new(attribute)).as_bool() {
        return value;
    }
    match env_var(env) {
        Some(raw) => raw.parse::<bool>().unwrap_or_else(|_| {
            info!(
                "Failed to parse boolean from '{}' environment variable, defaulting '{}' to false",
                env, attribute
            );
            false
        }),
        None => false,
    }
}

fn ca_certificate_pem_files(config: &DynamicValue) -> Vec<PathBuf> {
    let from_config = config
        .get_or_null(&AttributePath::new("ca_certificate_pem_files"))
        .as_list()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_string().map(PathBuf::from))
                .collect::<Vec<_>>()
        });

    match from_config {
        Some(files) => files,
        None => match env_var(CA_CERTIFICATE_PEM_FILES_ENV) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
            None => {
                debug!("no CA certificate files configured, using the host's root CA set");
                Vec::new()
            }
        },
    }
}

fn validate_host(host: &str, diagnostics: &mut Diagnostics) {
    match url::Url::parse(host) {
        Ok(url) if matches!(url.scheme(), "https" | "http") && url.host().is_some() => {}
        Ok(url) => diagnostics.add_attribute_error(
            AttributePath::new("https_host"),
            INVALID_PROVIDER_CONFIGURATION,
            format!("https_host must be an http(s) URL, got scheme '{}'", url.scheme()),
        ),
        Err(e) => diagnostics.add_attribute_error(
            AttributePath::new("https_host"),
            INVALID_PROVIDER_CONFIGURATION,
            format!("https_host '{}' is not a valid URL: {}", host, e),
        ),
    }
}

/// Exactly one of basic auth or an access token
fn resolve_auth(config: &DynamicValue, diagnostics: &mut Diagnostics) -> Option<Auth> {
    let username = optional_string(config, "username", USERNAME_ENV, diagnostics);
    let password = optional_string(config, "password", PASSWORD_ENV, diagnostics);
    let access_token = optional_string(config, "access_token", ACCESS_TOKEN_ENV, diagnostics);

    let has_basic = username.is_some() || password.is_some();

    match (has_basic, access_token) {
        (false, None) => {
            diagnostics.add_error(
                INVALID_PROVIDER_CONFIGURATION,
                "Unable to find username and password, or access_token for configuration. \
                 Either set them in the configuration or use the PINGFEDERATE_PROVIDER_* environment variables.",
            );
            None
        }
        (true, Some(_)) => {
            diagnostics.add_error(
                INVALID_PROVIDER_CONFIGURATION,
                "Username and password cannot be used with access_token. \
                 Only basic authentication (username and password) or access_token can be used.",
            );
            None
        }
        (false, Some(token)) => Some(Auth::AccessToken(token)),
        (true, None) => {
            for (attribute, value, env) in [
                ("username", &username, USERNAME_ENV),
                ("password", &password, PASSWORD_ENV),
            ] {
                if value.is_none() {
                    diagnostics.add_attribute_error(
                        AttributePath::new(attribute),
                        INVALID_PROVIDER_CONFIGURATION,
                        format!(
                            "{} cannot be empty when using basic authentication. Either set it in the configuration or use the {} environment variable.",
                            attribute, env
                        ),
                    );
                }
            }
            Some(Auth::Basic {
                username: username?,
                password: password?,
            })
        }
    }
}
