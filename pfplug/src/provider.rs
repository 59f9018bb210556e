//! Provider trait and factory lookup
//!
//! A provider is configured once per process. Whatever it hands out as
//! `provider_data` is passed to every resource and data source it creates.

use crate::context::Context;
use crate::data_source::{ConfigureDataSourceRequest, DataSource};
use crate::error::{PfplugError, Result};
use crate::resource::{ConfigureResourceRequest, Resource};
use crate::schema::Schema;
use crate::types::{Diagnostics, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

pub type ResourceFactory = fn() -> Box<dyn Resource>;
pub type DataSourceFactory = fn() -> Box<dyn DataSource>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Prefix shared by every resource type name (e.g., "example")
    fn type_name(&self) -> &str;

    async fn schema(&self, ctx: Context) -> ProviderSchemaResponse;

    /// Called once, before any resource or data source is created
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    fn resources(&self) -> HashMap<String, ResourceFactory>;

    fn data_sources(&self) -> HashMap<String, DataSourceFactory>;
}

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Diagnostics,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Diagnostics,
    /// Shared with resources and data sources through their configure call
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}

/// Create and configure the resource registered as `type_name`
pub async fn configured_resource(
    ctx: Context,
    provider: &dyn Provider,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &str,
) -> Result<(Box<dyn Resource>, Diagnostics)> {
    let factory = provider
        .resources()
        .get(type_name)
        .copied()
        .ok_or_else(|| PfplugError::ResourceNotFound(type_name.to_string()))?;

    let mut resource = factory();
    let response = resource
        .configure(ctx, ConfigureResourceRequest { provider_data })
        .await;
    Ok((resource, response.diagnostics))
}

/// Create and configure the data source registered as `type_name`
pub async fn configured_data_source(
    ctx: Context,
    provider: &dyn Provider,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &str,
) -> Result<(Box<dyn DataSource>, Diagnostics)> {
    let factory = provider
        .data_sources()
        .get(type_name)
        .copied()
        .ok_or_else(|| PfplugError::DataSourceNotFound(type_name.to_string()))?;

    let mut data_source = factory();
    let response = data_source
        .configure(ctx, ConfigureDataSourceRequest { provider_data })
        .await;
    Ok((data_source, response.diagnostics))
}
