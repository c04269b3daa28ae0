#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static PDP Plugin
//!
//! In-process stand-in for a Cerbos PDP, for development and testing.
//!
//! ## Modes
//!
//! - `allow_all` (default): every requested action is allowed
//! - `deny_all`: every requested action is denied
//! - `rules`: an action is allowed when a rule lists one of the principal's
//!   roles, the resource kind and the action (`*` matches anything)
//!
//! ## Configuration
//!
//! ```yaml
//! static_pdp:
//!   mode: rules
//!   rules:
//!     - roles: ["employee"]
//!       kinds: ["document"]
//!       actions: ["read"]
//!     - roles: ["admin"]
//!       kinds: ["*"]
//!       actions: ["*"]
//! ```

pub mod config;
pub mod domain;

pub use config::{PolicyRule, StaticMode, StaticPdpConfig};
pub use domain::Service as StaticPdpClient;
