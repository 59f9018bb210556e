//! Lifecycle shared by every admin API resource
//!
//! A resource only declares its schema (with the version gate table on each
//! attribute) and where it lives in the admin API. Planning, request bodies
//! and state mapping are done by the reconciliation engine in `pfplug`.

use crate::api::{ApiError, Client};
use crate::provider_data::PingFederateProviderData;
use async_trait::async_trait;
use pfplug::import::{import_private_state, take_read_mode};
use pfplug::resource::*;
use pfplug::{
    encode_request, import_state_passthrough_id, validate_config, AttributePath, Context,
    Diagnostics, Dynamic, DynamicValue, PfplugError, PlanReconciler, ReadMode, Resource, Schema,
    StateReader, VersionGate, INTERNAL_ERROR_SUMMARY,
};
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Where a resource lives in the admin API
pub enum Endpoint {
    /// Configuration object that always exists, read with GET and written with PUT
    Singleton(&'static str),
    /// Objects created with POST and addressed as `path/{id}`
    Collection {
        path: &'static str,
        id_attribute: &'static str,
    },
}

/// Declaration of one admin API resource
pub trait ResourceDefinition: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const ENDPOINT: Endpoint;

    fn schema() -> Schema;

    /// Versions in which the whole resource exists
    fn gate() -> VersionGate {
        VersionGate::always()
    }

    /// Values derived from other attributes of the same plan
    fn adjust_plan(_planned: &mut HashMap<String, Dynamic>, _diagnostics: &mut Diagnostics) {}
}

/// [`Resource`] implementation driven by a [`ResourceDefinition`]
pub struct ApiResource<R> {
    provider_data: Option<PingFederateProviderData>,
    _definition: PhantomData<fn() -> R>,
}

impl<R> Default for ApiResource<R> {
    fn default() -> Self {
        Self {
            provider_data: None,
            _definition: PhantomData,
        }
    }
}

impl<R: ResourceDefinition> ApiResource<R> {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self, diagnostics: &mut Diagnostics) -> Option<&PingFederateProviderData> {
        if self.provider_data.is_none() {
            diagnostics.add_error(
                "Provider not configured",
                "Provider data was not properly configured",
            );
        }
        self.provider_data.as_ref()
    }

    fn id_of(state: &DynamicValue, diagnostics: &mut Diagnostics) -> Option<String> {
        let Endpoint::Collection { id_attribute, .. } = R::ENDPOINT else {
            return None;
        };
        match state.get_string(&AttributePath::new(id_attribute)) {
            Ok(id) => Some(id),
            Err(e) => {
                diagnostics.add_attribute_error(
                    AttributePath::new(id_attribute),
                    INTERNAL_ERROR_SUMMARY,
                    format!("Failed to read resource ID: {}", e),
                );
                None
            }
        }
    }

    async fn fetch(
        &self,
        ctx: &Context,
        client: &Client,
        state: &DynamicValue,
        diagnostics: &mut Diagnostics,
    ) -> Option<Result<Value, ApiError>> {
        match R::ENDPOINT {
            Endpoint::Singleton(path) => Some(client.singleton(path).get(ctx).await),
            Endpoint::Collection { path, .. } => {
                let id = Self::id_of(state, diagnostics)?;
                Some(client.collection(path).get(ctx, &id).await)
            }
        }
    }

    /// PUT (or POST on create) the planned state and map the response
    async fn write(
        &self,
        ctx: &Context,
        planned: &DynamicValue,
        creating: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<DynamicValue> {
        let data = self.data(diagnostics)?;
        let schema = R::schema();
        let body = encode_request(&schema, planned);
        let verb = if creating { "creating" } else { "updating" };
        debug!(resource = R::TYPE_NAME, verb, "writing planned state");

        let client = &data.client;
        let result = match R::ENDPOINT {
            Endpoint::Singleton(path) => client.singleton(path).update(ctx, &body).await,
            Endpoint::Collection { path, .. } if creating => {
                client.collection(path).create(ctx, &body).await
            }
            Endpoint::Collection { path, .. } => {
                let id = Self::id_of(planned, diagnostics)?;
                client.collection(path).update(ctx, &id, &body).await
            }
        };

        match result {
            Ok(response) => {
                to_state(&schema, data, &response, planned, ReadMode::Refresh, diagnostics)
            }
            Err(e) => {
                report_api_error(
                    diagnostics,
                    &format!("An error occurred while {} the {}", verb, R::TYPE_NAME),
                    &e,
                );
                None
            }
        }
    }
}

/// Map an admin API response to state; decode failures become diagnostics
pub(crate) fn to_state(
    schema: &Schema,
    data: &PingFederateProviderData,
    response: &Value,
    prior: &DynamicValue,
    mode: ReadMode,
    diagnostics: &mut Diagnostics,
) -> Option<DynamicValue> {
    let prior = (!prior.is_null()).then_some(prior);
    match StateReader::new(schema, &data.resolver).read(response, prior, mode) {
        Ok(state) => Some(state),
        Err(e @ PfplugError::RemoteDecode { .. }) => {
            diagnostics.add_error(
                INTERNAL_ERROR_SUMMARY,
                format!("The response from PingFederate could not be read: {}", e),
            );
            None
        }
        Err(e) => {
            diagnostics.add_error(INTERNAL_ERROR_SUMMARY, e.to_string());
            None
        }
    }
}

pub(crate) fn report_api_error(diagnostics: &mut Diagnostics, summary: &str, err: &ApiError) {
    diagnostics.add_error(summary, err.detail());
}

#[async_trait]
impl<R: ResourceDefinition> Resource for ApiResource<R> {
    fn type_name(&self) -> &str {
        R::TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: R::schema(),
            diagnostics: Diagnostics::new(),
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = Diagnostics::new();
        self.provider_data =
            PingFederateProviderData::from_configure(request.provider_data, &mut diagnostics);
        ConfigureResourceResponse { diagnostics }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let resolver = self.provider_data.as_ref().map(|d| d.resolver.as_ref());
        ValidateResourceConfigResponse {
            diagnostics: validate_config(&R::schema(), resolver, &request.config),
        }
    }

    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        let mut diagnostics = Diagnostics::new();
        let passthrough = |diagnostics| ModifyPlanResponse {
            planned_state: request.proposed_new_state.clone(),
            requires_replace: Vec::new(),
            planned_private: request.prior_private.clone(),
            diagnostics,
        };

        if request.proposed_new_state.is_null() {
            return passthrough(diagnostics);
        }
        let Some(data) = self.data(&mut diagnostics) else {
            return passthrough(diagnostics);
        };
        if !data
            .resolver
            .require_resource_available(R::TYPE_NAME, &R::gate(), &mut diagnostics)
        {
            return passthrough(diagnostics);
        }

        let schema = R::schema();
        let prior = (!request.prior_state.is_null()).then_some(&request.prior_state);
        let plan = PlanReconciler::new(&schema, &data.resolver).reconcile_with(
            &request.proposed_new_state,
            prior,
            R::adjust_plan,
        );
        diagnostics.extend(plan.diagnostics);

        ModifyPlanResponse {
            planned_state: plan.planned_state,
            requires_replace: plan.requires_replace,
            planned_private: request.prior_private,
            diagnostics,
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = Diagnostics::new();
        let new_state = self
            .write(&ctx, &request.planned_state, true, &mut diagnostics)
            .await
            .unwrap_or(request.planned_state);

        CreateResourceResponse {
            new_state,
            private: request.planned_private,
            diagnostics,
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = Diagnostics::new();
        let (mode, private) = take_read_mode(&request.private);

        let Some(data) = self.data(&mut diagnostics) else {
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics,
                private,
            };
        };

        let fetched = self
            .fetch(&ctx, &data.client, &request.current_state, &mut diagnostics)
            .await;

        let new_state = match fetched {
            None => Some(request.current_state),
            Some(Ok(response)) => Some(
                to_state(
                    &R::schema(),
                    data,
                    &response,
                    &request.current_state,
                    mode,
                    &mut diagnostics,
                )
                .unwrap_or(request.current_state),
            ),
            Some(Err(e)) if e.is_not_found() => {
                warn!(
                    resource = R::TYPE_NAME,
                    "resource not found on the server, removing it from state"
                );
                None
            }
            Some(Err(e)) => {
                report_api_error(
                    &mut diagnostics,
                    &format!("An error occurred while reading the {}", R::TYPE_NAME),
                    &e,
                );
                Some(request.current_state)
            }
        };

        ReadResourceResponse {
            new_state,
            diagnostics,
            private,
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = Diagnostics::new();
        let new_state = self
            .write(&ctx, &request.planned_state, false, &mut diagnostics)
            .await
            .unwrap_or(request.prior_state);

        UpdateResourceResponse {
            new_state,
            private: request.planned_private,
            diagnostics,
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = Diagnostics::new();

        match R::ENDPOINT {
            Endpoint::Singleton(_) => {
                warn!(
                    resource = R::TYPE_NAME,
                    "configuration cannot be deleted from PingFederate, removing it from state only"
                );
            }
            Endpoint::Collection { path, .. } => {
                if let (Some(data), Some(id)) = (
                    self.provider_data.as_ref(),
                    Self::id_of(&request.prior_state, &mut diagnostics),
                ) {
                    match data.client.collection(path).delete(&ctx, &id).await {
                        Ok(()) => {}
                        Err(e) if e.is_not_found() => {
                            debug!(resource = R::TYPE_NAME, id = %id, "already deleted");
                        }
                        Err(e) => report_api_error(
                            &mut diagnostics,
                            &format!("An error occurred while deleting the {}", R::TYPE_NAME),
                            &e,
                        ),
                    }
                } else if self.provider_data.is_none() {
                    self.data(&mut diagnostics);
                }
            }
        }

        DeleteResourceResponse { diagnostics }
    }

    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: Vec::new(),
            diagnostics: Diagnostics::new(),
        };

        match R::ENDPOINT {
            Endpoint::Collection { id_attribute, .. } => {
                import_state_passthrough_id(
                    &ctx,
                    AttributePath::new(id_attribute),
                    &request,
                    &mut response,
                );
            }
            Endpoint::Singleton(_) => match import_private_state() {
                Ok(private) => response.imported_resources.push(ImportedResource {
                    type_name: request.type_name,
                    state: DynamicValue::object(),
                    private,
                }),
                Err(e) => response
                    .diagnostics
                    .add_error("Failed to encode private state", e.to_string()),
            },
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use crate::versions;
    use pfplug::{AttributeBuilder, AttributeType, SchemaBuilder};
    use std::any::Any;
    use std::sync::Arc;

    struct Widget;

    impl ResourceDefinition for Widget {
        const TYPE_NAME: &'static str = "pingfederate_widget";
        const ENDPOINT: Endpoint = Endpoint::Collection {
            path: "/widgets",
            id_attribute: "widget_id",
        };

        fn schema() -> Schema {
            SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("widget_id", AttributeType::String)
                        .required()
                        .build(),
                )
                .build()
        }

        fn gate() -> VersionGate {
            VersionGate::since(versions::PINGFEDERATE_1300)
        }
    }

    async fn configured(url: &str, version: &str) -> ApiResource<Widget> {
        let registry = versions::registry().unwrap();
        let target = registry.parse(version).unwrap();
        let data: Arc<dyn Any + Send + Sync> = Arc::new(PingFederateProviderData::new(
            create_test_client(url),
            versions::resolver(registry, target).unwrap(),
        ));
        let mut resource = ApiResource::<Widget>::new();
        resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(data),
                },
            )
            .await;
        resource
    }

    fn widget(id: &str) -> DynamicValue {
        let mut state = DynamicValue::object();
        state.set_string(&AttributePath::new("widget_id"), id).unwrap();
        state
    }

    #[tokio::test]
    async fn resource_gate_is_checked_at_plan() {
        let resource = configured("http://127.0.0.1:9", "12.2").await;
        let response = resource
            .modify_plan(
                Context::new(),
                ModifyPlanRequest {
                    type_name: Widget::TYPE_NAME.to_string(),
                    config: widget("w"),
                    prior_state: DynamicValue::null(),
                    proposed_new_state: widget("w"),
                    prior_private: vec![],
                },
            )
            .await;

        assert_eq!(response.diagnostics.errors.len(), 1);
        assert!(response.diagnostics.errors[0]
            .detail
            .contains("13.0.0 or later is required for resource pingfederate_widget"));
    }

    #[tokio::test]
    async fn missing_remote_object_is_removed_from_state() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pf-admin-api/v1/widgets/w")
            .with_status(404)
            .create_async()
            .await;

        let resource = configured(&server.url(), "13.0").await;
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: Widget::TYPE_NAME.to_string(),
                    current_state: widget("w"),
                    private: vec![],
                },
            )
            .await;

        assert!(response.new_state.is_none());
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn undecodable_response_keeps_prior_state() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pf-admin-api/v1/widgets/w")
            .with_body(r#"{"widgetId": 42}"#)
            .create_async()
            .await;

        let resource = configured(&server.url(), "13.0").await;
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: Widget::TYPE_NAME.to_string(),
                    current_state: widget("w"),
                    private: vec![],
                },
            )
            .await;

        assert_eq!(response.new_state, Some(widget("w")));
        assert_eq!(response.diagnostics.errors[0].summary, INTERNAL_ERROR_SUMMARY);
        assert!(response.diagnostics.errors[0].detail.contains("widget_id"));
    }

    #[tokio::test]
    async fn unconfigured_resource_reports_error() {
        let resource = ApiResource::<Widget>::new();
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: Widget::TYPE_NAME.to_string(),
                    planned_state: widget("w"),
                    config: widget("w"),
                    planned_private: vec![],
                },
            )
            .await;

        assert_eq!(response.diagnostics.errors[0].summary, "Provider not configured");
    }
}
