#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Cerbos authorization adapter.
//!
//! Translates application access requests into Cerbos `CheckResources`
//! calls and reduces the answer to a single allow/deny decision.
//!
//! - [`DeploymentDefaults`] - process-wide defaults and PDP settings
//! - [`EvaluationService`] - validation, override resolution and the PDP call
//! - [`HttpPdpClient`] - `PdpClient` over the Cerbos HTTP API
//! - [`pep`] - axum middleware enforcing decisions on incoming requests

pub mod config;
pub mod domain;
pub mod infra;
pub mod pep;

pub use config::{DeploymentDefaults, MethodActions, PdpSettings, TransportMode};
pub use domain::{AuthorizationError, EvaluationService, sanitize_roles};
pub use infra::HttpPdpClient;
