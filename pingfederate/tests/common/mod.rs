//! Drives provider resources the way Terraform does, against a mock server

#![allow(dead_code)]

use pfplug::provider::{configured_resource, ConfigureProviderRequest};
use pfplug::resource::*;
use pfplug::{propose_new_state, AttributePath, Context, Dynamic, DynamicValue, Provider, Resource};
use pingfederate::PingFederateProvider;
use std::any::Any;
use std::sync::Arc;

pub type ProviderData = Option<Arc<dyn Any + Send + Sync>>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn string_list(items: &[&str]) -> Dynamic {
    Dynamic::List(items.iter().map(|s| Dynamic::string(*s)).collect())
}

pub fn object(fields: &[(&str, Dynamic)]) -> DynamicValue {
    let mut value = DynamicValue::object();
    for (name, field) in fields {
        value.set(&AttributePath::new(name), field.clone()).unwrap();
    }
    value
}

/// Provider configured for `product_version` against `url`
pub async fn configure(url: &str, product_version: &str) -> (PingFederateProvider, ProviderData) {
    init_tracing();
    let config = object(&[
        ("https_host", Dynamic::string(url)),
        ("username", Dynamic::string("administrator")),
        ("password", Dynamic::string("2FederateM0re")),
        ("product_version", Dynamic::string(product_version)),
    ]);

    let mut provider = PingFederateProvider::new();
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    (provider, response.provider_data)
}

pub struct Harness {
    pub resource: Box<dyn Resource>,
    pub type_name: String,
}

impl Harness {
    pub async fn new(provider: &PingFederateProvider, data: ProviderData, type_name: &str) -> Self {
        let (resource, diagnostics) = configured_resource(Context::new(), provider, data, type_name)
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
        Self {
            resource,
            type_name: type_name.to_string(),
        }
    }

    pub async fn plan(&self, config: &DynamicValue, prior: Option<&DynamicValue>) -> ModifyPlanResponse {
        let schema = self
            .resource
            .schema(Context::new(), ResourceSchemaRequest)
            .await
            .schema;
        let validated = self
            .resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: self.type_name.clone(),
                    config: config.clone(),
                },
            )
            .await;

        let mut response = self
            .resource
            .modify_plan(
                Context::new(),
                ModifyPlanRequest {
                    type_name: self.type_name.clone(),
                    config: config.clone(),
                    prior_state: prior.cloned().unwrap_or_else(DynamicValue::null),
                    proposed_new_state: propose_new_state(&schema, config),
                    prior_private: Vec::new(),
                },
            )
            .await;
        let mut diagnostics = validated.diagnostics;
        diagnostics.extend(response.diagnostics);
        response.diagnostics = diagnostics;
        response
    }

    pub async fn create(&self, config: &DynamicValue, planned: DynamicValue) -> CreateResourceResponse {
        self.resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: self.type_name.clone(),
                    planned_state: planned,
                    config: config.clone(),
                    planned_private: Vec::new(),
                },
            )
            .await
    }

    pub async fn update(
        &self,
        config: &DynamicValue,
        prior: DynamicValue,
        planned: DynamicValue,
    ) -> UpdateResourceResponse {
        self.resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: self.type_name.clone(),
                    prior_state: prior,
                    planned_state: planned,
                    config: config.clone(),
                    planned_private: Vec::new(),
                },
            )
            .await
    }

    pub async fn read(&self, current: DynamicValue, private: Vec<u8>) -> ReadResourceResponse {
        self.resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: self.type_name.clone(),
                    current_state: current,
                    private,
                },
            )
            .await
    }

    pub async fn import(&self, id: &str) -> ImportedResource {
        let mut response = self
            .resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: self.type_name.clone(),
                    id: id.to_string(),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        response.imported_resources.remove(0)
    }

    pub async fn delete(&self, prior: DynamicValue) -> DeleteResourceResponse {
        self.resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: self.type_name.clone(),
                    prior_state: prior,
                    planned_private: Vec::new(),
                },
            )
            .await
    }
}
