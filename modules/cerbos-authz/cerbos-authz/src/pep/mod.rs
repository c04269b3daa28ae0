//! Policy enforcement point for axum services.
//!
//! ```ignore
//! let gate = AuthorizationGate::new(service, Arc::new(HttpRequestFactory::new(defaults)));
//! let app = Router::new()
//!     .route("/documents/{id}", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(gate, authorization_middleware));
//! ```

pub mod identity;
pub mod middleware;
pub mod problem;
pub mod request_factory;

pub use identity::{AccountStatus, Identity};
pub use middleware::{AuthorizationGate, GateDecision, authorization_middleware};
pub use problem::{PROBLEM_CONTENT_TYPE, Problem};
pub use request_factory::{AuthorizationRequestFactory, HttpRequestFactory};
