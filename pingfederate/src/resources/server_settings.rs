//! Server settings resource

use super::common::{Endpoint, ResourceDefinition};
use crate::versions::{PINGFEDERATE_1130, PINGFEDERATE_1200, PINGFEDERATE_1210};
use pfplug::plan_modifier::UseStateForUnknown;
use pfplug::schema::{Attribute, Schema};
use pfplug::validator::OneOfValidator;
use pfplug::{AttributeBuilder, AttributeType, NestingMode, SchemaBuilder, VersionedDefault};

const NOTIFICATION_MODES: &[&str] = &["NOTIFICATION_PUBLISHER", "LOGGING_ONLY"];

fn optional_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .build()
}

fn email_address(required: bool) -> Attribute {
    let builder = AttributeBuilder::new("email_address", AttributeType::String)
        .description("Email address where notifications are sent.");
    if required {
        builder.required().build()
    } else {
        builder.optional().build()
    }
}

fn notification_mode(default: &str) -> AttributeBuilder {
    AttributeBuilder::new("notification_mode", AttributeType::String)
        .description("The mode of notification. Set to NOTIFICATION_PUBLISHER to enable email notifications and server log messages. Set to LOGGING_ONLY to enable server log messages.")
        .optional()
        .default(VersionedDefault::string(default))
        .validator(OneOfValidator::create(NOTIFICATION_MODES))
}

fn warning_days(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Number)
        .description(description)
        .optional()
        .min_version(PINGFEDERATE_1200)
        .default(VersionedDefault::number(14.0))
        .build()
}

fn notifications() -> Attribute {
    AttributeBuilder::nested(
        "notifications",
        NestingMode::Single,
        vec![
            AttributeBuilder::nested(
                "license_events",
                NestingMode::Single,
                vec![email_address(true)],
            )
            .description("Settings for license event notifications.")
            .optional()
            .build(),
            AttributeBuilder::nested(
                "certificate_expirations",
                NestingMode::Single,
                vec![
                    email_address(true),
                    AttributeBuilder::new("initial_warning_period", AttributeType::Number)
                        .description("Time before certificate expiration when initial warning is sent (in days).")
                        .optional()
                        .build(),
                    AttributeBuilder::new("final_warning_period", AttributeType::Number)
                        .description("Time before certificate expiration when final warning is sent (in days).")
                        .required()
                        .build(),
                    notification_mode("NOTIFICATION_PUBLISHER")
                        .min_version(PINGFEDERATE_1130)
                        .build(),
                ],
            )
            .description("Notification settings for certificate expiration events.")
            .optional()
            .build(),
            AttributeBuilder::new("notify_admin_user_password_changes", AttributeType::Bool)
                .description("Determines whether admin users are notified through email when their account is changed.")
                .optional()
                .default(VersionedDefault::bool(false))
                .build(),
            warning_days(
                "expired_certificate_administrative_console_warning_days",
                "Indicates the number of days past expiration when the administrative console warning is shown. Supported in PF version 12.0 or later.",
            ),
            warning_days(
                "expiring_certificate_administrative_console_warning_days",
                "Indicates the number of days prior to certificate expiry when the administrative console warning starts. Supported in PF version 12.0 or later.",
            ),
            AttributeBuilder::nested(
                "thread_pool_exhaustion_notification_settings",
                NestingMode::Single,
                vec![
                    email_address(false),
                    AttributeBuilder::new("thread_dump_enabled", AttributeType::Bool)
                        .description("Generate a thread dump when approaching thread pool exhaustion.")
                        .optional()
                        .build(),
                    notification_mode("LOGGING_ONLY").build(),
                ],
            )
            .description("Notification settings for thread pool exhaustion events. Supported in PF version 12.0 or later.")
            .optional()
            .min_version(PINGFEDERATE_1200)
            .build(),
            AttributeBuilder::nested(
                "bulkhead_alert_notification_settings",
                NestingMode::Single,
                vec![
                    AttributeBuilder::new("email_address", AttributeType::String)
                        .description("Email address where notifications are sent.")
                        .optional()
                        .default(VersionedDefault::string(""))
                        .build(),
                    AttributeBuilder::new("thread_dump_enabled", AttributeType::Bool)
                        .description("Generate a thread dump when a bulkhead reaches its warning threshold or is full.")
                        .optional()
                        .default(VersionedDefault::bool(true))
                        .build(),
                    notification_mode("LOGGING_ONLY").build(),
                ],
            )
            .description("Settings for bulkhead notifications. Supported in PF version 12.1 or later.")
            .optional()
            .min_version(PINGFEDERATE_1210)
            .build(),
        ],
    )
    .description("Notification settings for license and certificate expiration events.")
    .optional()
    .computed()
    .plan_modifier(UseStateForUnknown::create())
    .build()
}

pub struct ServerSettings;

impl ResourceDefinition for ServerSettings {
    const TYPE_NAME: &'static str = "pingfederate_server_settings";
    const ENDPOINT: Endpoint = Endpoint::Singleton("/serverSettings");

    fn schema() -> Schema {
        SchemaBuilder::new()
            .description("Manages the global server configuration settings")
            .attribute(
                AttributeBuilder::nested(
                    "contact_info",
                    NestingMode::Single,
                    vec![
                        optional_string("company", "Company name."),
                        optional_string("email", "Contact email address."),
                        optional_string("first_name", "Contact first name."),
                        optional_string("last_name", "Contact last name."),
                        optional_string("phone", "Contact phone number."),
                    ],
                )
                .description("Information that identifies the server.")
                .optional()
                .computed()
                .plan_modifier(UseStateForUnknown::create())
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "federation_info",
                    NestingMode::Single,
                    vec![
                        AttributeBuilder::new("base_url", AttributeType::String)
                            .description("The fully qualified host name, port, and path (if applicable) on which the PingFederate server runs.")
                            .required()
                            .build(),
                        AttributeBuilder::new("saml_2_entity_id", AttributeType::String)
                            .description("This ID defines your organization as the entity operating the server for SAML 2.0 transactions.")
                            .required()
                            .api_name("saml2EntityId")
                            .build(),
                        optional_string(
                            "saml_1x_issuer_id",
                            "This ID identifies your federation server for SAML 1.x transactions.",
                        ),
                        optional_string(
                            "wsfed_realm",
                            "The URI of the realm associated with the PingFederate server.",
                        ),
                    ],
                )
                .description("Federation Info.")
                .optional()
                .computed()
                .plan_modifier(UseStateForUnknown::create())
                .build(),
            )
            .attribute(notifications())
            .build()
    }
}
