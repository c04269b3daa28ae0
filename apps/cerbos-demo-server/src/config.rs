//! Demo server configuration.
//!
//! Layered with figment: built-in defaults, then the YAML file, then
//! `CERBOS_DEMO__*` environment variables (`__` separates nesting levels).

use std::path::Path;

use anyhow::Context;
use cerbos_authz::DeploymentDefaults;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::{Deserialize, Serialize};
use static_pdp_plugin::StaticPdpConfig;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "CERBOS_DEMO__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Which PDP answers authorization questions.
    pub pdp_backend: PdpBackend,
    /// Cerbos adapter defaults, including the PDP connection.
    pub authz: DeploymentDefaults,
    /// Policy used when `pdp_backend` is `static`.
    pub static_pdp: StaticPdpConfig,
    /// Bearer tokens accepted by the demo authentication layer.
    pub users: Vec<DemoUser>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            pdp_backend: PdpBackend::Http,
            authz: DeploymentDefaults::default(),
            static_pdp: StaticPdpConfig::default(),
            users: vec![
                DemoUser::new("alice-token", "alice", ["ROLE_employee"]),
                DemoUser::new("bob-token", "bob", ["ROLE_manager"]),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or any layer fails to parse.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            anyhow::ensure!(path.exists(), "config file not found: {}", path.display());
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load demo server configuration")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdpBackend {
    /// Cerbos over HTTP.
    #[default]
    Http,
    /// In-process static policy.
    Static,
}

/// A user known to the demo authentication layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoUser {
    pub token: String,
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl DemoUser {
    #[must_use]
    pub fn new<I, R>(token: &str, id: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            token: token.to_owned(),
            id: id.to_owned(),
            roles: roles.into_iter().map(Into::into).collect(),
            attributes: serde_json::Map::new(),
        }
    }
}
