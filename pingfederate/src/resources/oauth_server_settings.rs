//! OAuth authorization server settings resource

use super::common::{Endpoint, ResourceDefinition};
use crate::versions::{PINGFEDERATE_1130, PINGFEDERATE_1200, PINGFEDERATE_1210};
use pfplug::schema::Schema;
use pfplug::validator::{NumberRangeValidator, OneOfValidator};
use pfplug::{AttributeBuilder, AttributeType, Dynamic, NestingMode, SchemaBuilder, VersionedDefault};

pub struct OAuthServerSettings;

impl ResourceDefinition for OAuthServerSettings {
    const TYPE_NAME: &'static str = "pingfederate_oauth_server_settings";
    const ENDPOINT: Endpoint = Endpoint::Singleton("/oauth/authServerSettings");

    fn schema() -> Schema {
        let number = |name: &str, description: &str| {
            AttributeBuilder::new(name, AttributeType::Number)
                .description(description)
                .required()
                .build()
        };

        SchemaBuilder::new()
            .description("Manages the OAuth authorization server settings")
            .attribute(number(
                "authorization_code_timeout",
                "The authorization code timeout, in seconds.",
            ))
            .attribute(number(
                "authorization_code_entropy",
                "The authorization code returned by the server will be generated with this many bytes of entropy.",
            ))
            .attribute(number(
                "refresh_token_length",
                "The refresh token length in number of characters.",
            ))
            .attribute(number(
                "refresh_rolling_interval",
                "The minimum interval to roll refresh tokens.",
            ))
            .attribute(number(
                "device_polling_interval",
                "The amount of time client should wait between polling requests, in seconds.",
            ))
            .attribute(number(
                "pending_authorization_timeout",
                "The 'device_code' and 'user_code' timeout, in seconds.",
            ))
            .attribute(
                AttributeBuilder::new("registered_authorization_path", AttributeType::String)
                    .description("The Registered Authorization Path is concatenated to PingFederate base URL to generate 'verification_url' and 'verification_url_complete' values in a Device Authorization request.")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("bypass_activation_code_confirmation", AttributeType::Bool)
                    .description("Indicates if the Activation Code Confirmation page should be bypassed.")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("roll_refresh_token_values", AttributeType::Bool)
                    .description("The roll refresh token values default policy. Defaults to false.")
                    .optional()
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("persistent_grant_lifetime", AttributeType::Number)
                    .description("The persistent grant lifetime. The default value is indefinite. -1 indicates an indefinite amount of time.")
                    .optional()
                    .default(VersionedDefault::number(-1.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("persistent_grant_lifetime_unit", AttributeType::String)
                    .description("The persistent grant lifetime unit.")
                    .optional()
                    .default(VersionedDefault::string("DAYS"))
                    .validator(OneOfValidator::create(&["MINUTES", "DAYS", "HOURS"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("track_user_sessions_for_logout", AttributeType::Bool)
                    .description("Determines whether user sessions are tracked for logout.")
                    .optional()
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "scopes",
                    NestingMode::Set,
                    vec![
                        AttributeBuilder::new("name", AttributeType::String)
                            .description("The name of the scope.")
                            .required()
                            .build(),
                        AttributeBuilder::new("description", AttributeType::String)
                            .description("The description of the scope.")
                            .required()
                            .build(),
                        AttributeBuilder::new("dynamic", AttributeType::Bool)
                            .description("True if the scope is dynamic.")
                            .optional()
                            .default(VersionedDefault::bool(false))
                            .build(),
                    ],
                )
                .description("The list of common scopes.")
                .optional()
                .build(),
            )
            // DPoP
            .attribute(
                AttributeBuilder::new("dpop_proof_require_nonce", AttributeType::Bool)
                    .description("Determines whether nonce is required in the Demonstrating Proof-of-Possession (DPoP) proof JWT. Supported in PF version 11.3 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1130)
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dpop_proof_lifetime_seconds", AttributeType::Number)
                    .description("The lifetime, in seconds, of the DPoP proof JWT. Supported in PF version 11.3 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1130)
                    .default(VersionedDefault::number(120.0))
                    .validator(Box::new(NumberRangeValidator {
                        min: Some(1.0),
                        max: None,
                    }))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dpop_proof_enforce_replay_prevention", AttributeType::Bool)
                    .description("Determines whether DPoP proof JWT replay prevention is enforced. Supported in PF version 11.3 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1130)
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            // Consent
            .attribute(
                AttributeBuilder::new("bypass_authorization_for_approved_consents", AttributeType::Bool)
                    .description("Bypass authorization for previously approved consents. Supported in PF version 12.0 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1200)
                    .default(VersionedDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("consent_lifetime_days", AttributeType::Number)
                    .description("The consent lifetime in days. -1 indicates an indefinite amount of time. Supported in PF version 12.0 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1200)
                    .default(VersionedDefault::number(-1.0))
                    .build(),
            )
            // Offline access and cookieless authentication
            .attribute(
                AttributeBuilder::new(
                    "require_offline_access_scope_to_issue_refresh_tokens",
                    AttributeType::Bool,
                )
                .description("Determines whether offline_access scope is required to issue refresh tokens. Supported in PF version 12.1 or later.")
                .optional()
                .min_version(PINGFEDERATE_1210)
                .default(VersionedDefault::bool(false))
                .build(),
            )
            .attribute(
                AttributeBuilder::new("offline_access_require_consent_prompt", AttributeType::Bool)
                    .description("Determines whether offline_access requires the prompt parameter value to be set to 'consent'. Only applies when require_offline_access_scope_to_issue_refresh_tokens is true. Supported in PF version 12.1 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1210)
                    .default(VersionedDefault::bool(false))
                    .requires_value_when(
                        Dynamic::Bool(true),
                        "require_offline_access_scope_to_issue_refresh_tokens",
                        Dynamic::Bool(true),
                    )
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("refresh_rolling_interval_time_unit", AttributeType::String)
                    .description("The refresh token rolling interval time unit. Supported in PF version 12.1 or later.")
                    .optional()
                    .min_version(PINGFEDERATE_1210)
                    .default(VersionedDefault::string("HOURS"))
                    .validator(OneOfValidator::create(&["SECONDS", "MINUTES", "HOURS"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "enable_cookieless_user_authorization_authentication_api",
                    AttributeType::Bool,
                )
                .description("Indicates if cookies should be used for state tracking when the user authorization endpoint is operating in authentication API redirectless mode. Supported in PF version 12.1 or later.")
                .optional()
                .min_version(PINGFEDERATE_1210)
                .default(VersionedDefault::bool(false))
                .build(),
            )
            .build()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::versions;
    use pfplug::{propose_new_state, AttributePath, AvailabilityResolver, DynamicValue, PlanReconciler};

    fn resolver(version: &str) -> AvailabilityResolver {
        let registry = versions::registry().unwrap();
        let target = registry.parse(version).unwrap();
        versions::resolver(registry, target).unwrap()
    }

    fn minimal_config() -> DynamicValue {
        let mut config = DynamicValue::object();
        for (name, value) in [
            ("authorization_code_timeout", 60.0),
            ("authorization_code_entropy", 30.0),
            ("refresh_token_length", 42.0),
            ("refresh_rolling_interval", 0.0),
            ("device_polling_interval", 5.0),
            ("pending_authorization_timeout", 600.0),
        ] {
            config.set_number(&AttributePath::new(name), value).unwrap();
        }
        config
            .set_string(&AttributePath::new("registered_authorization_path"), "/as/oauth")
            .unwrap();
        config
            .set_bool(&AttributePath::new("bypass_activation_code_confirmation"), false)
            .unwrap();
        config
    }

    fn plan_at(version: &str, config: &DynamicValue) -> pfplug::ReconciledPlan {
        let schema = OAuthServerSettings::schema();
        let resolver = resolver(version);
        PlanReconciler::new(&schema, &resolver).reconcile(&propose_new_state(&schema, config), None)
    }

    fn value(plan: &pfplug::ReconciledPlan, name: &str) -> Dynamic {
        plan.planned_state.get_or_null(&AttributePath::new(name))
    }

    #[test]
    fn gated_defaults_follow_product_version() {
        let old = plan_at("11.2.0", &minimal_config());
        assert!(old.diagnostics.is_empty());
        for name in [
            "dpop_proof_lifetime_seconds",
            "consent_lifetime_days",
            "refresh_rolling_interval_time_unit",
        ] {
            assert!(value(&old, name).is_null(), "{name}");
        }

        let mid = plan_at("12.0.3", &minimal_config());
        assert_eq!(value(&mid, "dpop_proof_lifetime_seconds"), Dynamic::Number(120.0));
        assert_eq!(value(&mid, "consent_lifetime_days"), Dynamic::Number(-1.0));
        assert!(value(&mid, "refresh_rolling_interval_time_unit").is_null());

        let new = plan_at("12.1", &minimal_config());
        assert_eq!(
            value(&new, "refresh_rolling_interval_time_unit"),
            Dynamic::string("HOURS")
        );
        assert_eq!(
            value(&new, "enable_cookieless_user_authorization_authentication_api"),
            Dynamic::Bool(false)
        );
    }

    #[test]
    fn consent_prompt_needs_offline_access_scope() {
        let mut config = minimal_config();
        config
            .set_bool(&AttributePath::new("offline_access_require_consent_prompt"), true)
            .unwrap();

        let plan = plan_at("12.1.0", &config);
        assert_eq!(plan.diagnostics.errors.len(), 1);
        assert_eq!(
            plan.diagnostics.errors[0].attribute,
            Some(AttributePath::new("offline_access_require_consent_prompt"))
        );

        config
            .set_bool(
                &AttributePath::new("require_offline_access_scope_to_issue_refresh_tokens"),
                true,
            )
            .unwrap();
        assert!(!plan_at("12.1.0", &config).diagnostics.has_errors());
    }

    #[test]
    fn dpop_settings_rejected_before_11_3() {
        let mut config = minimal_config();
        config
            .set_bool(&AttributePath::new("dpop_proof_require_nonce"), true)
            .unwrap();
        config
            .set_number(&AttributePath::new("consent_lifetime_days"), 30.0)
            .unwrap();

        let plan = plan_at("11.2.5", &config);
        assert_eq!(plan.diagnostics.errors.len(), 2);
        assert!(value(&plan, "dpop_proof_require_nonce").is_null());
        assert!(plan.diagnostics.errors[0]
            .detail
            .contains("PingFederate version 11.3.0 or later is required"));
    }
}
