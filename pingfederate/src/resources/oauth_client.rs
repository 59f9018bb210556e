//! OAuth client resource

use super::common::{Endpoint, ResourceDefinition};
use crate::versions::{PINGFEDERATE_1130, PINGFEDERATE_1200, PINGFEDERATE_1210, PINGFEDERATE_1220};
use pfplug::plan_modifier::{RequiresReplaceIfChanged, UseStateForUnknown};
use pfplug::schema::Schema;
use pfplug::validator::{
    ListLengthValidator, NumberRangeValidator, OneOfValidator, StringLengthValidator,
};
use pfplug::{
    AttributeBuilder, AttributeType, Diagnostics, Dynamic, NestingMode, SchemaBuilder,
    VersionedDefault,
};
use std::collections::HashMap;

const SERVER_DEFAULT: &str = "SERVER_DEFAULT";
const OVERRIDE_SERVER_DEFAULT: &str = "OVERRIDE_SERVER_DEFAULT";

fn string_set() -> AttributeType {
    AttributeType::Set(Box::new(AttributeType::String))
}

fn empty_set() -> VersionedDefault {
    VersionedDefault::always(Dynamic::List(Vec::new()))
}

fn server_default_choice(name: &str, description: &str) -> pfplug::schema::Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .min_version(PINGFEDERATE_1210)
        .default(VersionedDefault::string(SERVER_DEFAULT))
        .validator(OneOfValidator::create(&[SERVER_DEFAULT, "YES", "NO"]))
        .build()
}

fn oidc_policy() -> pfplug::schema::Attribute {
    AttributeBuilder::nested(
        "oidc_policy",
        NestingMode::Single,
        vec![
            AttributeBuilder::new("id_token_signing_algorithm", AttributeType::String)
                .description("The JSON Web Signature [JWS] algorithm required for the ID Token.")
                .optional()
                .build(),
            AttributeBuilder::new("grant_access_session_revocation_api", AttributeType::Bool)
                .description("Determines whether this client is allowed to access the Session Revocation API.")
                .optional()
                .default(VersionedDefault::bool(false))
                .build(),
            AttributeBuilder::new("post_logout_redirect_uris", string_set())
                .description("URIs to which the OIDC OP may redirect the resource owner's user agent after RP-initiated logout has completed. Supported in PF version 12.0 or later.")
                .optional()
                .min_version(PINGFEDERATE_1200)
                .build(),
            AttributeBuilder::new(
                "user_info_response_content_encryption_algorithm",
                AttributeType::String,
            )
            .description("The JSON Web Encryption [JWE] content encryption algorithm for the UserInfo Response. Supported in PF version 12.2 or later.")
            .optional()
            .min_version(PINGFEDERATE_1220)
            .build(),
            AttributeBuilder::new("user_info_response_encryption_algorithm", AttributeType::String)
                .description("The JSON Web Encryption [JWE] encryption algorithm used to encrypt the content-encryption key of the UserInfo response. Supported in PF version 12.2 or later.")
                .optional()
                .min_version(PINGFEDERATE_1220)
                .build(),
            AttributeBuilder::new("user_info_response_signing_algorithm", AttributeType::String)
                .description("The JSON Web Signature [JWS] algorithm required to sign the UserInfo response. Supported in PF version 12.2 or later.")
                .optional()
                .min_version(PINGFEDERATE_1220)
                .build(),
        ],
    )
    .description("Open ID Connect Policy settings. This is included in the message only when OIDC is enabled.")
    .optional()
    .computed()
    .plan_modifier(UseStateForUnknown::create())
    .build()
}

fn client_auth() -> pfplug::schema::Attribute {
    AttributeBuilder::nested(
        "client_auth",
        NestingMode::Single,
        vec![
            AttributeBuilder::new("type", AttributeType::String)
                .description("Client authentication type.")
                .required()
                .validator(OneOfValidator::create(&[
                    "NONE",
                    "SECRET",
                    "CERTIFICATE",
                    "PRIVATE_KEY_JWT",
                    "CLIENT_SECRET_JWT",
                ]))
                .build(),
            AttributeBuilder::new("secret", AttributeType::String)
                .description("Client secret for Basic Authentication. PingFederate never returns it, so changes made outside of Terraform are not detected.")
                .optional()
                .sensitive()
                .state_only()
                .build(),
            AttributeBuilder::new("encrypted_secret", AttributeType::String)
                .description("Encrypted client secret for Basic Authentication.")
                .server_computed()
                .build(),
        ],
    )
    .description("Client authentication settings.")
    .optional()
    .computed()
    .plan_modifier(UseStateForUnknown::create())
    .build()
}

pub struct OAuthClient;

impl ResourceDefinition for OAuthClient {
    const TYPE_NAME: &'static str = "pingfederate_oauth_client";
    const ENDPOINT: Endpoint = Endpoint::Collection {
        path: "/oauth/clients",
        id_attribute: "client_id",
    };

    fn schema() -> Schema {
        SchemaBuilder::new()
            .description("Manages an OAuth client")
            .attribute(
                AttributeBuilder::new("client_id", AttributeType::String)
                    .description("A unique identifier the client provides to the Resource Server to identify itself. This identifier is included with every request the client makes.")
                    .required()
                    .validator(Box::new(StringLengthValidator { min: Some(1), max: None }))
                    .plan_modifier(RequiresReplaceIfChanged::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("A descriptive name for the client instance. This name appears when the user is prompted for authorization.")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("A description of what the client application does.")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled", AttributeType::Bool)
                    .description("Specifies whether the client is enabled. The default value is true.")
                    .optional()
                    .default(VersionedDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("grant_types", string_set())
                    .description("The grant types allowed for this client.")
                    .required()
                    .validator(Box::new(ListLengthValidator { min: Some(1), max: None }))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("redirect_uris", string_set())
                    .description("URIs to which the OAuth AS may redirect the resource owner's user agent after authorization is obtained.")
                    .optional()
                    .default(empty_set())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("restricted_scopes", string_set())
                    .description("The scopes available for this client.")
                    .optional()
                    .default(empty_set())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_authentication_api_init", AttributeType::Bool)
                    .description("Set to true to allow this client to initiate the authentication API redirectless flow.")
                    .optional()
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("restrict_scopes", AttributeType::Bool)
                    .description("Restricts this client's access to specific scopes. Follows allow_authentication_api_init when not set.")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("bypass_approval_page", AttributeType::Bool)
                    .description("Use this setting, for example, when you want to deploy a trusted application and authenticate end users via an IdP adapter or IdP connection. Must be true when allow_authentication_api_init is true.")
                    .optional()
                    .computed()
                    .requires_value_when(
                        Dynamic::Bool(false),
                        "allow_authentication_api_init",
                        Dynamic::Bool(false),
                    )
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("require_dpop", AttributeType::Bool)
                    .description("Determines whether Demonstrating Proof-of-Possession (DPoP) is required for this client. Supported in PF version 11.3 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1130)
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enable_cookieless_authentication_api", AttributeType::Bool)
                    .description("Indicates if cookies should be used for state tracking when the authentication API is used with this client. Supported in PF version 12.1 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1210)
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .attribute(server_default_choice(
                "require_offline_access_scope_to_issue_refresh_tokens",
                "Determines whether offline_access scope is required to issue refresh tokens by this client or not. Supported in PF version 12.1 or later.",
            ))
            .attribute(server_default_choice(
                "offline_access_require_consent_prompt",
                "Determines whether offline_access requires the prompt parameter value to be set to 'consent' by this client or not. Supported in PF version 12.1 or later.",
            ))
            .attribute(
                AttributeBuilder::new("refresh_token_rolling_interval_type", AttributeType::String)
                    .description("Use the global default refresh token rolling interval or override it for this client.")
                    .optional()
                    .default(VersionedDefault::string(SERVER_DEFAULT))
                    .validator(OneOfValidator::create(&[SERVER_DEFAULT, OVERRIDE_SERVER_DEFAULT]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("refresh_token_rolling_interval", AttributeType::Number)
                    .description("The minimum interval to roll refresh tokens. Only applies when refresh_token_rolling_interval_type is OVERRIDE_SERVER_DEFAULT.")
                    .optional()
                    .requires_value(
                        "refresh_token_rolling_interval_type",
                        Dynamic::string(OVERRIDE_SERVER_DEFAULT),
                    )
                    .validator(Box::new(NumberRangeValidator {
                        min: Some(0.0),
                        max: None,
                    }))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "refresh_token_rolling_interval_time_unit",
                    AttributeType::String,
                )
                .description("The refresh token rolling interval time unit. Supported in PF version 12.1 or later.")
                .optional()
                .min_version(PINGFEDERATE_1210)
                .default(VersionedDefault::string("HOURS"))
                .empty_means_default()
                .imported_only_with(
                    "refresh_token_rolling_interval_type",
                    Dynamic::string(OVERRIDE_SERVER_DEFAULT),
                )
                .validator(OneOfValidator::create(&["SECONDS", "MINUTES", "HOURS"]))
                .build(),
            )
            .attribute(
                AttributeBuilder::new("lockout_max_malicious_actions_type", AttributeType::String)
                    .description("Allows an administrative user to override the global lockout settings for this client. Supported in PF version 12.2 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1220)
                    .default(VersionedDefault::string(SERVER_DEFAULT))
                    .validator(OneOfValidator::create(&[
                        SERVER_DEFAULT,
                        "DO_NOT_LOCKOUT",
                        OVERRIDE_SERVER_DEFAULT,
                    ]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lockout_max_malicious_actions", AttributeType::Number)
                    .description("The number of malicious actions allowed before an OAuth client is locked out. Supported in PF version 12.2 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1220)
                    .requires_value(
                        "lockout_max_malicious_actions_type",
                        Dynamic::string(OVERRIDE_SERVER_DEFAULT),
                    )
                    .build(),
            )
            .attribute(oidc_policy())
            .attribute(client_auth())
            .attribute(
                AttributeBuilder::new("creation_date", AttributeType::String)
                    .description("The time at which the client was created.")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("modification_date", AttributeType::String)
                    .description("The time at which the client was last changed.")
                    .server_computed()
                    .build(),
            )
            .build()
    }

    fn adjust_plan(planned: &mut HashMap<String, Dynamic>, _diagnostics: &mut Diagnostics) {
        let api_init = planned
            .get("allow_authentication_api_init")
            .cloned()
            .unwrap_or(Dynamic::Null);
        if !api_init.is_defined() {
            return;
        }
        for name in ["restrict_scopes", "bypass_approval_page"] {
            if let Some(value) = planned.get_mut(name).filter(|v| v.is_unknown()) {
                *value = api_init.clone();
            }
        }
    }
}
