//! Properties of the version reconciliation engine, checked across every
//! version of a synthetic registry

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use pfplug::schema::Attribute;
use pfplug::{
    encode_request, propose_new_state, validate_config, AttributeBuilder, AttributePath,
    AttributeType, AvailabilityResolver, Dynamic, DynamicValue, PfplugError, PlanReconciler,
    ReadMode, Schema, SchemaBuilder, StateReader, SupportedVersion, VersionGate,
    VersionRegistry, VersionedDefault,
};
use std::cmp::Ordering;
use std::sync::Arc;

const VERSIONS: [&str; 7] = [
    "11.2.0", "11.2.1", "11.3.0", "11.3.4", "12.0.0", "12.1.0", "12.2.0",
];
const V1130: SupportedVersion = SupportedVersion::from_static("11.3.0");
const V1200: SupportedVersion = SupportedVersion::from_static("12.0.0");
const V1220: SupportedVersion = SupportedVersion::from_static("12.2.0");

fn registry() -> Arc<VersionRegistry> {
    Arc::new(VersionRegistry::new(VERSIONS.into_iter().map(SupportedVersion::from_static)).unwrap())
}

fn resolver_for(registry: &Arc<VersionRegistry>, version: &SupportedVersion) -> AvailabilityResolver {
    AvailabilityResolver::new(registry.clone(), version.clone()).unwrap()
}

fn gated(name: &str, ty: AttributeType, min: SupportedVersion) -> Attribute {
    AttributeBuilder::new(name, ty)
        .optional()
        .computed()
        .min_version(min)
        .build()
}

fn schema() -> Schema {
    SchemaBuilder::new()
        .attribute(
            AttributeBuilder::new("client_id", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("require_dpop", AttributeType::Bool)
                .optional()
                .min_version(V1130)
                .default(VersionedDefault::bool(false))
                .build(),
        )
        .attribute(gated("require_signed_requests", AttributeType::Bool, V1200))
        .attribute(gated("lockout_max_malicious_actions", AttributeType::Number, V1220))
        .attribute(gated("description_v12", AttributeType::String, V1200))
        .attribute(
            AttributeBuilder::new("time_unit", AttributeType::String)
                .optional()
                .default(
                    VersionedDefault::since(V1130, Dynamic::string("MINUTES"))
                        .then_since(V1220, Dynamic::string("HOURS")),
                )
                .build(),
        )
        .attribute(
            AttributeBuilder::new("modification_date", AttributeType::String)
                .server_computed()
                .build(),
        )
        .build()
}

fn config(pairs: &[(&str, Dynamic)]) -> DynamicValue {
    let mut dv = DynamicValue::object();
    for (k, v) in pairs {
        dv.set(&AttributePath::new(k), v.clone()).unwrap();
    }
    dv
}

#[test]
fn ordering_is_total_antisymmetric_and_transitive() {
    let reg = registry();
    let versions = reg.versions().to_vec();

    for a in &versions {
        for b in &versions {
            let ab = reg.compare(a, b).unwrap();
            let ba = reg.compare(b, a).unwrap();
            assert_eq!(ab, ba.reverse(), "{a} vs {b}");
            assert_eq!(ab == Ordering::Equal, a == b);

            for c in &versions {
                let bc = reg.compare(b, c).unwrap();
                if ab == Ordering::Less && bc == Ordering::Less {
                    assert_eq!(reg.compare(a, c).unwrap(), Ordering::Less);
                }
            }
        }
    }
}

#[test]
fn parse_is_idempotent_on_canonical_form() {
    let reg = registry();
    for input in ["11.2", "11.3", "12.0", "12.1", "11.3.4", "12.2.0"] {
        let parsed = reg.parse(input).unwrap();
        let reparsed = reg.parse(parsed.as_str()).unwrap();
        assert_eq!(parsed, reparsed);
    }
    assert_eq!(reg.parse("11.3").unwrap().as_str(), "11.3.0");
}

#[test]
fn malformed_version_is_a_parse_error() {
    let err = registry().parse("abc").unwrap_err();
    assert!(matches!(err, PfplugError::VersionParse { .. }));
}

#[test]
fn gates_are_monotonic() {
    let reg = registry();
    for threshold in reg.versions() {
        let gate = VersionGate::since(threshold.clone());
        for target in reg.versions() {
            let available = resolver_for(&reg, target).is_available(&gate).unwrap();
            let expected = reg.compare(target, threshold).unwrap() != Ordering::Less;
            assert_eq!(available, expected, "gate {threshold} target {target}");
        }
    }
}

#[test]
fn threshold_version_itself_is_available() {
    let reg = registry();
    let res = resolver_for(&reg, &V1200);
    assert!(res.is_available(&VersionGate::since(V1200)).unwrap());
}

#[test]
fn reconciliation_never_fabricates_unavailable_values() {
    let reg = registry();
    let schema = schema();
    let inputs = [
        Dynamic::Unknown,
        Dynamic::Null,
        Dynamic::Bool(true),
        Dynamic::Bool(false),
    ];

    for target in reg.versions() {
        let res = resolver_for(&reg, target);
        for input in &inputs {
            let proposed = propose_new_state(
                &schema,
                &config(&[
                    ("client_id", Dynamic::string("c")),
                    ("require_dpop", input.clone()),
                    ("require_signed_requests", input.clone()),
                ]),
            );
            let plan = PlanReconciler::new(&schema, &res).reconcile(&proposed, None);

            for attr in schema.attributes().iter().filter(|a| a.is_gated()) {
                if !res.is_available(&attr.gate).unwrap() {
                    let value = plan.planned_state.get_or_null(&AttributePath::new(&attr.name));
                    assert!(value.is_null(), "{} at {} was {:?}", attr.name, target, value);
                }
            }
        }
    }
}

#[test]
fn supported_values_round_trip_through_remote_echo() {
    let reg = registry();
    let schema = schema();
    let res = resolver_for(&reg, reg.latest());

    let cfg = config(&[
        ("client_id", Dynamic::string("c")),
        ("require_dpop", Dynamic::Bool(true)),
        ("lockout_max_malicious_actions", Dynamic::Number(7.0)),
        ("time_unit", Dynamic::string("DAYS")),
    ]);
    let plan = PlanReconciler::new(&schema, &res).reconcile(&propose_new_state(&schema, &cfg), None);
    assert!(!plan.diagnostics.has_errors());

    let mut echo = encode_request(&schema, &plan.planned_state);
    echo["modificationDate"] = serde_json::json!("2024-01-01T00:00:00Z");
    let state = StateReader::new(&schema, &res)
        .read(&echo, None, ReadMode::Refresh)
        .unwrap();

    for (name, value) in [
        ("client_id", Dynamic::string("c")),
        ("require_dpop", Dynamic::Bool(true)),
        ("lockout_max_malicious_actions", Dynamic::Number(7.0)),
        ("time_unit", Dynamic::string("DAYS")),
    ] {
        assert_eq!(state.get_or_null(&AttributePath::new(name)), value, "{name}");
    }
}

#[test]
fn one_pass_reports_every_unsupported_attribute() {
    let reg = registry();
    let schema = schema();
    let res = resolver_for(&reg, reg.oldest());
    let cfg = config(&[
        ("client_id", Dynamic::string("c")),
        ("require_signed_requests", Dynamic::Bool(true)),
        ("lockout_max_malicious_actions", Dynamic::Number(3.0)),
        ("description_v12", Dynamic::string("x")),
    ]);

    let diags = validate_config(&schema, Some(&res), &cfg);
    assert_eq!(diags.errors.len(), 3);

    let plan = PlanReconciler::new(&schema, &res).reconcile(&propose_new_state(&schema, &cfg), None);
    let mut reported: Vec<String> = plan
        .diagnostics
        .errors
        .iter()
        .filter_map(|d| d.attribute.as_ref().map(|p| p.to_string()))
        .collect();
    reported.sort();
    assert_eq!(
        reported,
        vec![
            "description_v12",
            "lockout_max_malicious_actions",
            "require_signed_requests"
        ]
    );
}

#[test]
fn oldest_target_rejects_newer_attribute_with_version_in_message() {
    let reg = registry();
    let schema = schema();
    let res = resolver_for(&reg, reg.oldest());
    let cfg = config(&[
        ("client_id", Dynamic::string("c")),
        ("require_dpop", Dynamic::Bool(true)),
    ]);

    let diags = validate_config(&schema, Some(&res), &cfg);
    assert_eq!(diags.errors.len(), 1);
    assert_eq!(
        diags.errors[0].attribute,
        Some(AttributePath::new("require_dpop"))
    );
    assert!(diags.errors[0].detail.contains("11.3.0 or later"));
}

#[test]
fn newest_target_passes_value_through_unchanged() {
    let reg = registry();
    let schema = schema();
    let res = resolver_for(&reg, reg.latest());
    let cfg = config(&[
        ("client_id", Dynamic::string("c")),
        ("require_dpop", Dynamic::Bool(true)),
    ]);

    let plan = PlanReconciler::new(&schema, &res).reconcile(&propose_new_state(&schema, &cfg), None);
    assert!(plan.diagnostics.is_empty());
    assert_eq!(
        plan.planned_state.get_or_null(&AttributePath::new("require_dpop")),
        Dynamic::Bool(true)
    );
}

#[test]
fn defaults_follow_the_target_version() {
    let reg = registry();
    let schema = schema();
    let cfg = config(&[("client_id", Dynamic::string("c"))]);
    let expected = [
        ("11.2.0", Dynamic::Unknown),
        ("11.3.0", Dynamic::string("MINUTES")),
        ("12.1.0", Dynamic::string("MINUTES")),
        ("12.2.0", Dynamic::string("HOURS")),
    ];

    for (version, value) in expected {
        let res = resolver_for(&reg, &reg.parse(version).unwrap());
        let plan =
            PlanReconciler::new(&schema, &res).reconcile(&propose_new_state(&schema, &cfg), None);
        assert_eq!(
            plan.planned_state.get_or_null(&AttributePath::new("time_unit")),
            value,
            "{version}"
        );
    }
}

#[test]
fn remote_omission_of_available_field_reads_as_default() {
    let reg = registry();
    let schema = schema();
    let res = resolver_for(&reg, &V1200);
    let state = StateReader::new(&schema, &res)
        .read(
            &serde_json::json!({"clientId": "c", "modificationDate": "d"}),
            None,
            ReadMode::Refresh,
        )
        .unwrap();

    assert_eq!(
        state.get_or_null(&AttributePath::new("require_dpop")),
        Dynamic::Bool(false)
    );
    assert!(state
        .get_or_null(&AttributePath::new("require_signed_requests"))
        .is_null());
    assert!(state
        .get_or_null(&AttributePath::new("lockout_max_malicious_actions"))
        .is_null());
}

#[test]
fn refresh_after_apply_shows_no_drift() {
    let reg = registry();
    let schema = schema();
    let res = resolver_for(&reg, &V1130);
    let cfg = config(&[("client_id", Dynamic::string("c"))]);

    let created = PlanReconciler::new(&schema, &res).reconcile(&propose_new_state(&schema, &cfg), None);
    // an 11.3 server echoes nothing but the id and its timestamp
    let state = StateReader::new(&schema, &res)
        .read(
            &serde_json::json!({"clientId": "c", "modificationDate": "d1"}),
            Some(&created.planned_state),
            ReadMode::Refresh,
        )
        .unwrap();

    let next = PlanReconciler::new(&schema, &res)
        .reconcile(&propose_new_state(&schema, &cfg), Some(&state));
    assert!(!next.diagnostics.has_errors());
    assert_eq!(next.planned_state, state);
}
