//! Domain layer for the static PDP plugin.

mod client;
pub mod service;

pub use service::Service;
