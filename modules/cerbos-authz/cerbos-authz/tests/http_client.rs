#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the HTTP PDP client against a mock Cerbos server.

use std::sync::Arc;
use std::time::Duration;

use cerbos_authz::infra::http_client::{CHECK_RESOURCES_PATH, PLAYGROUND_INSTANCE_HEADER};
use cerbos_authz::{DeploymentDefaults, EvaluationService, HttpPdpClient, PdpSettings};
use cerbos_authz_sdk::{
    EvaluationRequest, PdpClient, PdpError, Principal, Resource, ResourceAction,
};
use httpmock::prelude::*;
use indexmap::IndexMap;
use serde_json::json;

fn settings_for(server: &MockServer) -> PdpSettings {
    PdpSettings {
        target: server.base_url(),
        ..PdpSettings::default()
    }
}

fn principal() -> Principal {
    Principal {
        id: "alice".to_owned(),
        roles: vec!["employee".to_owned()],
        policy_version: None,
        scope: None,
        attributes: IndexMap::new(),
    }
}

fn read_alpha() -> Vec<ResourceAction> {
    vec![ResourceAction {
        actions: vec!["read".to_owned()],
        resource: Resource {
            kind: "document".to_owned(),
            id: "/documents/alpha".to_owned(),
            policy_version: None,
            scope: None,
            attributes: IndexMap::new(),
        },
    }]
}

fn allow_body() -> serde_json::Value {
    json!({
        "requestId": "r-1",
        "results": [{
            "resource": { "id": "/documents/alpha", "kind": "document" },
            "actions": { "read": "EFFECT_ALLOW" }
        }]
    })
}

#[tokio::test]
async fn decodes_check_resources_response() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(CHECK_RESOURCES_PATH)
                .header("content-type", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(allow_body());
        })
        .await;

    let client = HttpPdpClient::new(&settings_for(&server)).unwrap();
    let result = client.check_resources(principal(), read_alpha()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.request_id, "r-1");
    assert!(result.find("/documents/alpha").unwrap().is_allowed("read"));
}

#[tokio::test]
async fn sends_static_and_playground_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(CHECK_RESOURCES_PATH)
                .header("x-tenant", "acme")
                .header(PLAYGROUND_INSTANCE_HEADER, "pg-1");
            then.status(200).json_body(allow_body());
        })
        .await;

    let settings = PdpSettings {
        playground_instance: Some("pg-1".to_owned()),
        headers: IndexMap::from([("x-tenant".to_owned(), "acme".to_owned())]),
        ..settings_for(&server)
    };
    let client = HttpPdpClient::new(&settings).unwrap();
    client.check_resources(principal(), read_alpha()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_rejected_with_cerbos_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(CHECK_RESOURCES_PATH);
            then.status(500)
                .json_body(json!({ "code": 13, "message": "policy store offline" }));
        })
        .await;

    let client = HttpPdpClient::new(&settings_for(&server)).unwrap();
    let err = client
        .check_resources(principal(), read_alpha())
        .await
        .unwrap_err();

    match err {
        PdpError::Rejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "policy store offline");
        }
        other => panic!("expected rejection, got {other}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(CHECK_RESOURCES_PATH);
            then.status(200).body("<html>not cerbos</html>");
        })
        .await;

    let client = HttpPdpClient::new(&settings_for(&server)).unwrap();
    let err = client
        .check_resources(principal(), read_alpha())
        .await
        .unwrap_err();

    assert!(matches!(err, PdpError::InvalidResponse(_)));
}

#[tokio::test]
async fn slow_pdp_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(CHECK_RESOURCES_PATH);
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(allow_body());
        })
        .await;

    let settings = PdpSettings {
        timeout: Duration::from_millis(100),
        ..settings_for(&server)
    };
    let client = HttpPdpClient::new(&settings).unwrap();
    let err = client
        .check_resources(principal(), read_alpha())
        .await
        .unwrap_err();

    assert!(matches!(err, PdpError::Timeout(t) if t == Duration::from_millis(100)));
}

#[tokio::test]
async fn unreachable_pdp_is_a_transport_error() {
    let settings = PdpSettings {
        target: "127.0.0.1:1".to_owned(),
        ..PdpSettings::default()
    };
    let client = HttpPdpClient::new(&settings).unwrap();
    let err = client
        .check_resources(principal(), read_alpha())
        .await
        .unwrap_err();

    assert!(matches!(err, PdpError::Transport(_)), "got {err}");
}

#[tokio::test]
async fn evaluation_service_over_http_end_to_end() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(CHECK_RESOURCES_PATH);
            then.status(200).json_body(allow_body());
        })
        .await;

    let defaults = Arc::new(DeploymentDefaults {
        pdp: settings_for(&server),
        ..DeploymentDefaults::default()
    });
    let client = HttpPdpClient::new(&defaults.pdp).unwrap();
    let service = EvaluationService::new(Arc::new(client), defaults);

    let request = EvaluationRequest::builder("alice", "/documents/alpha", "read")
        .roles(["ROLE_employee"])
        .resource_kind("document")
        .build();

    assert!(service.is_authorized(&request).await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn unavailable_pdp_fails_closed_through_the_service() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(CHECK_RESOURCES_PATH);
            then.status(503).body("upstream connect error");
        })
        .await;

    let defaults = Arc::new(DeploymentDefaults {
        pdp: settings_for(&server),
        ..DeploymentDefaults::default()
    });
    let client = HttpPdpClient::new(&defaults.pdp).unwrap();
    let service = EvaluationService::new(Arc::new(client), defaults);
    let request = EvaluationRequest::builder("alice", "/documents/alpha", "read").build();

    let err = service.is_authorized(&request).await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(err.to_string().contains("upstream connect error"));
}
