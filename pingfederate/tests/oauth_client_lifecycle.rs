//! OAuth client lifecycle against a mocked admin API

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

mod common;

use common::{configure, object, string_list, Harness};
use mockito::{Matcher, Server};
use pfplug::{AttributePath, Dynamic, DynamicValue};
use serde_json::json;

const CLIENTS: &str = "/pf-admin-api/v1/oauth/clients";
const TYPE_NAME: &str = "pingfederate_oauth_client";

fn client_config() -> DynamicValue {
    object(&[
        ("client_id", Dynamic::string("app")),
        ("name", Dynamic::string("App")),
        ("grant_types", string_list(&["AUTHORIZATION_CODE"])),
    ])
}

/// Client as PingFederate 13.0 reports it
fn remote_client(name: &str, modified: &str) -> serde_json::Value {
    json!({
        "clientId": "app",
        "name": name,
        "enabled": true,
        "grantTypes": ["AUTHORIZATION_CODE"],
        "redirectUris": [],
        "restrictedScopes": [],
        "allowAuthenticationApiInit": false,
        "restrictScopes": false,
        "bypassApprovalPage": false,
        "requireDpop": false,
        "enableCookielessAuthenticationApi": false,
        "requireOfflineAccessScopeToIssueRefreshTokens": "SERVER_DEFAULT",
        "offlineAccessRequireConsentPrompt": "SERVER_DEFAULT",
        "refreshTokenRollingIntervalType": "SERVER_DEFAULT",
        "refreshTokenRollingIntervalTimeUnit": "HOURS",
        "lockoutMaxMaliciousActionsType": "SERVER_DEFAULT",
        "oidcPolicy": {"grantAccessSessionRevocationApi": false},
        "clientAuth": {"type": "NONE"},
        "creationDate": "2024-05-01T10:00:00Z",
        "modificationDate": modified,
    })
}

fn get(state: &DynamicValue, name: &str) -> Dynamic {
    state.get_or_null(&AttributePath::new(name))
}

#[tokio::test]
async fn client_round_trip_has_no_drift() {
    let mut server = Server::new_async().await;
    let created_body = remote_client("App", "2024-05-01T10:00:00Z").to_string();
    let create = server
        .mock("POST", CLIENTS)
        .match_header("x-xsrf-header", "PingFederate")
        .match_body(Matcher::PartialJson(json!({
            "clientId": "app",
            "requireDpop": false,
            "lockoutMaxMaliciousActionsType": "SERVER_DEFAULT",
        })))
        .with_status(201)
        .with_body(&created_body)
        .create_async()
        .await;
    let read = server
        .mock("GET", format!("{}/app", CLIENTS).as_str())
        .with_body(&created_body)
        .expect(2)
        .create_async()
        .await;

    let (provider, data) = configure(&server.url(), "13.0.0").await;
    let harness = Harness::new(&provider, data, TYPE_NAME).await;
    let config = client_config();

    let plan = harness.plan(&config, None).await;
    assert!(plan.diagnostics.is_empty(), "{:?}", plan.diagnostics);
    assert!(get(&plan.planned_state, "modification_date").is_unknown());

    let created = harness.create(&config, plan.planned_state).await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    create.assert_async().await;

    let refreshed = harness.read(created.new_state.clone(), created.private).await;
    let state = refreshed.new_state.unwrap();
    assert_eq!(state, created.new_state);

    let replan = harness.plan(&config, Some(&state)).await;
    assert!(replan.diagnostics.is_empty());
    assert!(replan.requires_replace.is_empty());
    assert_eq!(replan.planned_state, state);

    let imported = harness.import("app").await;
    let after_import = harness.read(imported.state, imported.private).await;
    let imported_state = after_import.new_state.unwrap();
    assert_eq!(get(&imported_state, "name"), Dynamic::string("App"));
    assert!(get(&imported_state, "refresh_token_rolling_interval_time_unit").is_null());
    read.assert_async().await;
}

#[tokio::test]
async fn server_ordering_of_sets_is_not_drift() {
    let mut server = Server::new_async().await;
    let mut remote = remote_client("App", "2024-05-01T10:00:00Z");
    remote["grantTypes"] = json!(["AUTHORIZATION_CODE", "IMPLICIT"]);
    remote.as_object_mut().unwrap().remove("restrictedScopes");
    let create = server
        .mock("POST", CLIENTS)
        .match_body(Matcher::PartialJson(json!({
            "grantTypes": ["IMPLICIT", "AUTHORIZATION_CODE"],
        })))
        .with_status(201)
        .with_body(remote.to_string())
        .create_async()
        .await;
    let read = server
        .mock("GET", format!("{}/app", CLIENTS).as_str())
        .with_body(remote.to_string())
        .create_async()
        .await;

    let (provider, data) = configure(&server.url(), "13.0.0").await;
    let harness = Harness::new(&provider, data, TYPE_NAME).await;
    let mut config = client_config();
    config
        .set(
            &AttributePath::new("grant_types"),
            string_list(&["IMPLICIT", "AUTHORIZATION_CODE"]),
        )
        .unwrap();

    let plan = harness.plan(&config, None).await;
    let created = harness.create(&config, plan.planned_state).await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    create.assert_async().await;

    let state = harness
        .read(created.new_state, created.private)
        .await
        .new_state
        .unwrap();
    assert_eq!(get(&state, "restricted_scopes"), Dynamic::List(Vec::new()));
    read.assert_async().await;

    let replan = harness.plan(&config, Some(&state)).await;
    assert!(replan.diagnostics.is_empty(), "{:?}", replan.diagnostics);
    assert_eq!(
        get(&replan.planned_state, "modification_date"),
        Dynamic::string("2024-05-01T10:00:00Z")
    );
}

#[tokio::test]
async fn rename_updates_and_refreshes_modification_date() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PUT", format!("{}/app", CLIENTS).as_str())
        .match_body(Matcher::PartialJson(json!({"name": "Renamed"})))
        .with_body(remote_client("Renamed", "2024-06-01T08:30:00Z").to_string())
        .create_async()
        .await;

    let (provider, data) = configure(&server.url(), "13.0.0").await;
    let harness = Harness::new(&provider, data, TYPE_NAME).await;

    let mut prior = harness.plan(&client_config(), None).await.planned_state;
    for (name, value) in [
        ("modification_date", "2024-05-01T10:00:00Z"),
        ("creation_date", "2024-05-01T10:00:00Z"),
    ] {
        prior.set_string(&AttributePath::new(name), value).unwrap();
    }
    prior
        .set(
            &AttributePath::new("oidc_policy"),
            object(&[("grant_access_session_revocation_api", Dynamic::Bool(false))]).value,
        )
        .unwrap();
    prior
        .set(
            &AttributePath::new("client_auth"),
            object(&[("type", Dynamic::string("NONE"))]).value,
        )
        .unwrap();

    let mut config = client_config();
    config.set_string(&AttributePath::new("name"), "Renamed").unwrap();
    let plan = harness.plan(&config, Some(&prior)).await;
    assert!(plan.diagnostics.is_empty());
    assert!(get(&plan.planned_state, "modification_date").is_unknown());

    let updated = harness.update(&config, prior, plan.planned_state).await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);
    assert_eq!(
        get(&updated.new_state, "modification_date"),
        Dynamic::string("2024-06-01T08:30:00Z")
    );
    update.assert_async().await;
}

#[tokio::test]
async fn old_server_never_receives_newer_fields() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", CLIENTS)
        .match_body(Matcher::Json(json!({
            "clientId": "app",
            "name": "App",
            "enabled": true,
            "grantTypes": ["AUTHORIZATION_CODE"],
            "redirectUris": [],
            "restrictedScopes": [],
            "allowAuthenticationApiInit": false,
            "restrictScopes": false,
            "bypassApprovalPage": false,
            "refreshTokenRollingIntervalType": "SERVER_DEFAULT",
        })))
        .with_status(201)
        .with_body(
            json!({
                "clientId": "app",
                "name": "App",
                "grantTypes": ["AUTHORIZATION_CODE"],
                "clientAuth": {"type": "NONE"},
                "modificationDate": "2024-05-01T10:00:00Z",
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (provider, data) = configure(&server.url(), "11.2.0").await;
    let harness = Harness::new(&provider, data, TYPE_NAME).await;
    let config = client_config();

    let plan = harness.plan(&config, None).await;
    assert!(plan.diagnostics.is_empty(), "{:?}", plan.diagnostics);
    for name in ["require_dpop", "enable_cookieless_authentication_api", "lockout_max_malicious_actions_type"] {
        assert!(get(&plan.planned_state, name).is_null(), "{name}");
    }

    let created = harness.create(&config, plan.planned_state).await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    assert_eq!(get(&created.new_state, "enabled"), Dynamic::Bool(true));
    assert!(get(&created.new_state, "require_dpop").is_null());
    create.assert_async().await;
}

#[tokio::test]
async fn newer_fields_are_rejected_for_old_server() {
    let server = Server::new_async().await;
    let (provider, data) = configure(&server.url(), "11.2.0").await;
    let harness = Harness::new(&provider, data, TYPE_NAME).await;

    let mut config = client_config();
    config
        .set_bool(&AttributePath::new("require_dpop"), true)
        .unwrap();

    let plan = harness.plan(&config, None).await;
    // reported once by validate and once by plan
    assert_eq!(plan.diagnostics.errors.len(), 2);
    assert!(plan.diagnostics.errors.iter().all(|e| e
        .detail
        .contains("PingFederate version 11.3.0 or later is required for attribute require_dpop")));
}

#[tokio::test]
async fn deleted_client_is_dropped_from_state() {
    let mut server = Server::new_async().await;
    let gone = server
        .mock("GET", format!("{}/app", CLIENTS).as_str())
        .with_status(404)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", format!("{}/app", CLIENTS).as_str())
        .with_status(204)
        .create_async()
        .await;

    let (provider, data) = configure(&server.url(), "12.2.0").await;
    let harness = Harness::new(&provider, data, TYPE_NAME).await;

    let refreshed = harness.read(client_config(), Vec::new()).await;
    assert!(refreshed.new_state.is_none());
    gone.assert_async().await;

    let deleted = harness.delete(client_config()).await;
    assert!(deleted.diagnostics.is_empty());
    delete.assert_async().await;
}
