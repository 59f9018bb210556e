//! Incoming proxy settings resource

use super::common::{Endpoint, ResourceDefinition};
use crate::versions::PINGFEDERATE_1220;
use pfplug::schema::{Attribute, Schema};
use pfplug::validator::OneOfValidator;
use pfplug::{
    AttributeBuilder, AttributeType, Diagnostics, Dynamic, SchemaBuilder, VersionedDefault,
};
use std::collections::HashMap;

/// Header name and index pairs; PingFederate uses the last value when only
/// the name is set
const FORWARDED_HEADERS: &[(&str, &str)] = &[
    ("forwarded_ip_address_header_name", "forwarded_ip_address_header_index"),
    ("forwarded_host_header_name", "forwarded_host_header_index"),
];

fn header_name(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .build()
}

fn header_index(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
        .validator(OneOfValidator::create(&["FIRST", "LAST"]))
        .build()
}

pub struct IncomingProxySettings;

impl ResourceDefinition for IncomingProxySettings {
    const TYPE_NAME: &'static str = "pingfederate_incoming_proxy_settings";
    const ENDPOINT: Endpoint = Endpoint::Singleton("/incomingProxySettings");

    fn schema() -> Schema {
        SchemaBuilder::new()
            .description("Manages incoming proxy settings")
            .attribute(header_name(
                "forwarded_ip_address_header_name",
                "Globally specify the header name (for example, X-Forwarded-For) where PingFederate should attempt to retrieve the client IP address in all HTTP requests.",
            ))
            .attribute(header_index(
                "forwarded_ip_address_header_index",
                "Which of the comma-separated header values holds the client IP address. Default is to use the last address.",
            ))
            .attribute(header_name(
                "forwarded_host_header_name",
                "Globally specify the header name (for example, X-Forwarded-Host) where PingFederate should attempt to retrieve the hostname and port in all HTTP requests.",
            ))
            .attribute(header_index(
                "forwarded_host_header_index",
                "Which of the comma-separated header values holds the hostname. Default is to use the last hostname.",
            ))
            .attribute(
                header_name(
                    "client_cert_ssl_header_name",
                    "While the proxy server is configured to pass client certificates as HTTP request headers, specify the header name here.",
                ),
            )
            .attribute(
                AttributeBuilder::new("client_cert_chain_ssl_header_name", AttributeType::String)
                    .description("While the proxy server is configured to pass client certificates as HTTP request headers, specify the chain header name here.")
                    .optional()
                    .api_name("clientCertChainSSLHeaderName")
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("client_cert_header_encoding_format", AttributeType::String)
                    .description("Specify the encoding format of the client certificate header. Supported in PF version 12.2 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1220)
                    .default(VersionedDefault::string("APACHE_MOD_SSL"))
                    .validator(OneOfValidator::create(&["APACHE_MOD_SSL", "NGINX"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enable_client_cert_header_auth", AttributeType::Bool)
                    .description("Enable client certificate header authentication. Supported in PF version 12.2 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1220)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("proxy_terminates_https_conns", AttributeType::Bool)
                    .description("Allows you to globally specify that connections to the reverse proxy are made over HTTPS even when HTTP is used between the reverse proxy and PingFederate.")
                    .optional()
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .build()
    }

    fn adjust_plan(planned: &mut HashMap<String, Dynamic>, _diagnostics: &mut Diagnostics) {
        for (name, index) in FORWARDED_HEADERS {
            let name_set = planned.get(*name).is_some_and(Dynamic::is_defined);
            if let Some(value) = planned.get_mut(*index).filter(|v| v.is_unknown()) {
                *value = if name_set {
                    Dynamic::string("LAST")
                } else {
                    Dynamic::Null
                };
            }
        }
    }
}
