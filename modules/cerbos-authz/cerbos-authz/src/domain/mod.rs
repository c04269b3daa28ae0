//! Domain layer for the Cerbos authorization adapter.

pub mod error;
pub mod service;

pub use error::AuthorizationError;
pub use cerbos_authz_sdk::sanitize_roles;
pub use service::EvaluationService;
