//! PDP client for the Cerbos HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use cerbos_authz_sdk::{CheckResourcesResult, PdpClient, PdpError, Principal, ResourceAction};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{PdpSettings, TransportMode};

/// Path of the `CheckResources` endpoint.
pub const CHECK_RESOURCES_PATH: &str = "/api/check/resources";

/// Header selecting a playground instance.
pub const PLAYGROUND_INSTANCE_HEADER: &str = "playground-instance";

/// Calls a Cerbos PDP over HTTP.
///
/// Built once from [`PdpSettings`]; the underlying `reqwest::Client` pools
/// connections and is cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpPdpClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpPdpClient {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `PdpError::Configuration` if the target is blank, a header
    /// name or value is invalid, or the HTTP client cannot be built.
    pub fn new(settings: &PdpSettings) -> Result<Self, PdpError> {
        let base = base_url(&settings.target, settings.transport)?;
        let headers = default_headers(settings)?;

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(settings.transport == TransportMode::Insecure)
            .build()
            .map_err(|e| PdpError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{base}{CHECK_RESOURCES_PATH}"),
            timeout: settings.timeout,
        })
    }

    /// Full URL of the `CheckResources` endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send_error(&self, err: &reqwest::Error) -> PdpError {
        if err.is_timeout() {
            PdpError::Timeout(self.timeout)
        } else {
            PdpError::Transport(error_chain(err))
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckResourcesBody<'a> {
    request_id: String,
    principal: &'a Principal,
    resources: &'a [ResourceAction],
}

/// Error body returned by Cerbos on failure.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[async_trait]
impl PdpClient for HttpPdpClient {
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint, resources = resources.len()))]
    async fn check_resources(
        &self,
        principal: Principal,
        resources: Vec<ResourceAction>,
    ) -> Result<CheckResourcesResult, PdpError> {
        let body = CheckResourcesBody {
            request_id: Uuid::new_v4().to_string(),
            principal: &principal,
            resources: &resources,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PdpError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&text, status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.send_error(&e))?;
        let result: CheckResourcesResult = serde_json::from_slice(&bytes)
            .map_err(|e| PdpError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            request_id = %result.request_id,
            results = result.results.len(),
            "PDP answered"
        );
        Ok(result)
    }
}

/// Base URL for a target. Explicit `http(s)://` targets are kept as given.
fn base_url(target: &str, transport: TransportMode) -> Result<String, PdpError> {
    let target = target.trim().trim_end_matches('/');
    if target.is_empty() {
        return Err(PdpError::Configuration("PDP target must not be blank".to_owned()));
    }
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(target.to_owned());
    }
    let scheme = match transport {
        TransportMode::Plaintext => "http",
        TransportMode::Insecure | TransportMode::Tls => "https",
    };
    Ok(format!("{scheme}://{target}"))
}

fn default_headers(settings: &PdpSettings) -> Result<HeaderMap, PdpError> {
    let mut headers = HeaderMap::with_capacity(settings.headers.len() + 1);
    for (name, value) in &settings.headers {
        headers.insert(header_name(name)?, header_value(name, value)?);
    }
    if let Some(instance) = settings
        .playground_instance
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        headers.insert(
            HeaderName::from_static(PLAYGROUND_INSTANCE_HEADER),
            header_value(PLAYGROUND_INSTANCE_HEADER, instance)?,
        );
    }
    Ok(headers)
}

fn header_name(name: &str) -> Result<HeaderName, PdpError> {
    HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| PdpError::Configuration(format!("invalid header name '{name}': {e}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, PdpError> {
    HeaderValue::from_str(value)
        .map_err(|e| PdpError::Configuration(format!("invalid value for header '{name}': {e}")))
}

/// Message from a Cerbos error body, the raw text, or the status reason.
fn rejection_message(text: &str, status: http::StatusCode) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(text)
        && !body.message.trim().is_empty()
    {
        return body.message;
    }
    let text = text.trim();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_owned()
    } else {
        text.to_owned()
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use cerbos_authz_sdk::Resource;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn plaintext_target_uses_http() {
        let client = HttpPdpClient::new(&PdpSettings::default()).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:3593/api/check/resources");
    }

    #[test]
    fn tls_and_insecure_targets_use_https() {
        for transport in [TransportMode::Tls, TransportMode::Insecure] {
            let settings = PdpSettings {
                target: "cerbos.internal:3593".to_owned(),
                transport,
                ..PdpSettings::default()
            };
            let client = HttpPdpClient::new(&settings).unwrap();
            assert_eq!(
                client.endpoint(),
                "https://cerbos.internal:3593/api/check/resources"
            );
        }
    }

    #[test]
    fn explicit_url_is_kept() {
        let settings = PdpSettings {
            target: "http://127.0.0.1:3592/".to_owned(),
            transport: TransportMode::Tls,
            ..PdpSettings::default()
        };
        let client = HttpPdpClient::new(&settings).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:3592/api/check/resources");
    }

    #[test]
    fn blank_target_is_a_configuration_error() {
        let settings = PdpSettings {
            target: "  ".to_owned(),
            ..PdpSettings::default()
        };
        assert!(matches!(
            HttpPdpClient::new(&settings),
            Err(PdpError::Configuration(_))
        ));
    }

    #[test]
    fn invalid_header_is_a_configuration_error() {
        let settings = PdpSettings {
            headers: IndexMap::from([("bad header".to_owned(), "x".to_owned())]),
            ..PdpSettings::default()
        };
        let err = HttpPdpClient::new(&settings).unwrap_err();
        assert!(err.to_string().contains("bad header"));
    }

    #[test]
    fn rejection_message_prefers_cerbos_error_body() {
        let status = http::StatusCode::BAD_REQUEST;
        assert_eq!(
            rejection_message(r#"{"code":3,"message":"invalid principal"}"#, status),
            "invalid principal"
        );
        assert_eq!(rejection_message("plain failure", status), "plain failure");
        assert_eq!(rejection_message("", status), "Bad Request");
    }

    #[test]
    fn request_body_uses_cerbos_shape() {
        let principal = Principal {
            id: "alice".to_owned(),
            roles: vec!["employee".to_owned()],
            policy_version: None,
            scope: None,
            attributes: IndexMap::new(),
        };
        let resources = vec![ResourceAction {
            actions: vec!["read".to_owned()],
            resource: Resource {
                kind: "document".to_owned(),
                id: "/documents/alpha".to_owned(),
                policy_version: Some("default".to_owned()),
                scope: None,
                attributes: IndexMap::new(),
            },
        }];
        let body = CheckResourcesBody {
            request_id: "r-1".to_owned(),
            principal: &principal,
            resources: &resources,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "requestId": "r-1",
                "principal": { "id": "alice", "roles": ["employee"] },
                "resources": [{
                    "actions": ["read"],
                    "resource": {
                        "kind": "document",
                        "id": "/documents/alpha",
                        "policyVersion": "default"
                    }
                }]
            })
        );
    }
}
