//! # fall-core
//!
//! Application composition core for the fall HTTP toolkit: a name-keyed
//! component registry with lazy singleton construction, manifest-driven
//! dependency injection and post-construction lifecycle hooks.

pub mod config;
pub mod container;
pub mod errors;
pub mod foundation;

pub use config::{ConfigError, EnvConfiguration, Environment, NoopEnvConfiguration};
pub use container::{Component, Inject, Instance, Manifest, Registry, Resolution, Resolved};
pub use errors::{BoxError, CoreError};
pub use foundation::Initializable;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
