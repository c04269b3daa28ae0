#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Cerbos `AuthZ` SDK
//!
//! This crate provides the public API shared by the Cerbos authorization
//! adapter, its PDP clients and its consumers:
//!
//! - [`AttributeValue`] - Canonical typed attribute value sent to the PDP
//! - [`HostValue`], [`normalize`], [`normalize_map`] - Value normalizer
//! - [`EvaluationRequest`] - Immutable description of one authorization question
//! - [`Principal`], [`ResourceAction`], [`CheckResourcesResult`] - PDP request/response models
//! - [`PdpClient`] - Collaborator trait implemented by PDP clients
//! - [`PdpError`] - Infrastructure errors raised by PDP clients
//!
//! ## Usage
//!
//! ```ignore
//! use cerbos_authz_sdk::{EvaluationRequest, HostValue};
//!
//! let request = EvaluationRequest::builder("alice", "/documents/alpha", "read")
//!     .roles(["ROLE_employee"])
//!     .resource_kind("document")
//!     .resource_attribute("owner", "alice")
//!     .build();
//!
//! let allowed = evaluation_service.is_authorized(&request).await?;
//! ```

pub mod api;
pub mod attributes;
pub mod error;
pub mod models;
pub mod request;

// Re-export main types at crate root
pub use api::PdpClient;
pub use attributes::{HostNumber, HostValue, normalize, normalize_map};
pub use error::PdpError;
pub use models::{
    AttributeValue, CheckResourcesResult, Effect, INFINITY_LITERAL, NAN_LITERAL,
    NEG_INFINITY_LITERAL, NULL_LITERAL, Principal, Resource, ResourceAction, ResourceMeta,
    ResourceResult, ValidationIssue,
};
pub use request::{EvaluationRequest, EvaluationRequestBuilder, sanitize_roles};
