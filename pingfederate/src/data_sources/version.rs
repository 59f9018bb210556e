use crate::api::version::product_version_prefix;
use crate::provider_data::PingFederateProviderData;
use async_trait::async_trait;
use pfplug::data_source::*;
use pfplug::{
    AttributeBuilder, AttributePath, AttributeType, Context, DataSource, Diagnostics, Dynamic,
    DynamicValue, SchemaBuilder,
};
use tracing::{debug, warn};

pub struct VersionDataSource {
    provider_data: Option<PingFederateProviderData>,
}

impl Default for VersionDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionDataSource {
    pub const TYPE_NAME: &'static str = "pingfederate_version";

    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    fn computed(name: &str, type_: AttributeType, description: &str) -> pfplug::schema::Attribute {
        AttributeBuilder::new(name, type_)
            .description(description)
            .computed()
            .build()
    }
}

#[async_trait]
impl DataSource for VersionDataSource {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .description("Version of the PingFederate server the provider talks to")
            .attribute(Self::computed("id", AttributeType::String, "Identifier of this data source."))
            .attribute(Self::computed(
                "server_version",
                AttributeType::String,
                "Version reported by the server, including the build number.",
            ))
            .attribute(Self::computed(
                "product_version",
                AttributeType::String,
                "Product version the provider was configured with.",
            ))
            .attribute(Self::computed(
                "server_version_supported",
                AttributeType::Bool,
                "Whether the provider knows the version reported by the server.",
            ))
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: Diagnostics::new(),
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = Diagnostics::new();
        self.provider_data =
            PingFederateProviderData::from_configure(request.provider_data, &mut diagnostics);
        ConfigureDataSourceResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = Diagnostics::new();
        let mut state = DynamicValue::object();

        let Some(data) = &self.provider_data else {
            diagnostics.add_error(
                "Provider not configured",
                "Provider data was not properly configured",
            );
            return ReadDataSourceResponse { state, diagnostics };
        };

        let info = match data.client.version(&ctx).await {
            Ok(info) => info,
            Err(e) => {
                diagnostics.add_error("Failed to read PingFederate version", e.detail());
                return ReadDataSourceResponse { state, diagnostics };
            }
        };

        let registry = data.resolver.registry();
        let product_version = data.resolver.target().to_string();
        let supported = registry.is_valid(&product_version_prefix(&info.version));
        debug!(server_version = %info.version, %product_version, supported, "read server version");

        if !supported {
            warn!(server_version = %info.version, "server reports an unsupported version");
            diagnostics.add_warning(
                "Unsupported PingFederate version",
                format!(
                    "The server reports version {}, which this provider does not support. {}",
                    info.version,
                    registry.supported_versions_message()
                ),
            );
        }

        let values = [
            ("id", Dynamic::string(Self::TYPE_NAME)),
            ("server_version", Dynamic::string(info.version)),
            ("product_version", Dynamic::string(product_version)),
            ("server_version_supported", Dynamic::Bool(supported)),
        ];
        for (name, value) in values {
            if let Err(e) = state.set(&AttributePath::new(name), value) {
                diagnostics.add_error(pfplug::INTERNAL_ERROR_SUMMARY, e.to_string());
            }
        }

        ReadDataSourceResponse { state, diagnostics }
    }
}
