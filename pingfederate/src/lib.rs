//! Terraform provider for PingFederate
//!
//! Every resource is checked against the PingFederate version named in the
//! provider block, so one configuration can target several server releases.

pub mod api;
pub mod config;
pub mod data_sources;
pub mod provider_data;
pub mod resources;
pub mod versions;

use async_trait::async_trait;
use pfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, ProviderSchemaResponse,
    ResourceFactory,
};
use pfplug::{Context, Diagnostics, Provider, INTERNAL_ERROR_SUMMARY};
use provider_data::PingFederateProviderData;
use resources::common::ResourceDefinition;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Default)]
pub struct PingFederateProvider {
    provider_data: Option<PingFederateProviderData>,
}

impl PingFederateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider_data(&self) -> Option<&PingFederateProviderData> {
        self.provider_data.as_ref()
    }
}

fn resource_factory<R: ResourceDefinition>() -> Box<dyn pfplug::Resource> {
    Box::new(resources::common::ApiResource::<R>::new())
}

#[async_trait]
impl Provider for PingFederateProvider {
    fn type_name(&self) -> &str {
        "pingfederate"
    }

    async fn schema(&self, _ctx: Context) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: config::provider_schema(),
            diagnostics: Diagnostics::new(),
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = Diagnostics::new();
        let unconfigured = |diagnostics| ConfigureProviderResponse {
            diagnostics,
            provider_data: None,
        };

        let registry = match versions::registry() {
            Ok(registry) => registry,
            Err(e) => {
                diagnostics.add_error(INTERNAL_ERROR_SUMMARY, e.to_string());
                return unconfigured(diagnostics);
            }
        };

        let Some(settings) =
            config::ProviderConfig::load(&request.config, &registry, &mut diagnostics)
        else {
            return unconfigured(diagnostics);
        };

        let client = match api::Client::new(settings.client_config()) {
            Ok(client) => client,
            Err(e) => {
                diagnostics.add_error("Failed to create API client", e.detail());
                return unconfigured(diagnostics);
            }
        };

        let resolver = match versions::resolver(registry, settings.product_version.clone()) {
            Ok(resolver) => resolver,
            Err(e) => {
                diagnostics.add_error(INTERNAL_ERROR_SUMMARY, e.to_string());
                return unconfigured(diagnostics);
            }
        };

        info!(
            terraform_version = %request.terraform_version,
            product_version = %settings.product_version,
            base_url = %client.base_url(),
            "configured PingFederate provider"
        );

        let data = PingFederateProviderData::new(client, resolver);
        self.provider_data = Some(data.clone());
        let provider_data: Arc<dyn Any + Send + Sync> = Arc::new(data);

        ConfigureProviderResponse {
            diagnostics,
            provider_data: Some(provider_data),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        use resources::{
            incoming_proxy_settings::IncomingProxySettings, oauth_client::OAuthClient,
            oauth_server_settings::OAuthServerSettings, server_settings::ServerSettings,
        };

        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            IncomingProxySettings::TYPE_NAME.to_string(),
            resource_factory::<IncomingProxySettings>,
        );
        factories.insert(OAuthClient::TYPE_NAME.to_string(), resource_factory::<OAuthClient>);
        factories.insert(
            OAuthServerSettings::TYPE_NAME.to_string(),
            resource_factory::<OAuthServerSettings>,
        );
        factories.insert(
            ServerSettings::TYPE_NAME.to_string(),
            resource_factory::<ServerSettings>,
        );
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert(data_sources::VersionDataSource::TYPE_NAME.to_string(), || {
            Box::new(data_sources::VersionDataSource::new())
        });
        factories
    }
}
