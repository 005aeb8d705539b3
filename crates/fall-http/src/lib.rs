//! # fall-http
//!
//! HTTP layer of the fall toolkit: a scoped router with onion-model
//! middleware chains, controller discovery over the component registry,
//! and an application bootstrap serving through Axum.

pub mod config;
pub mod controller;
pub mod errors;
pub mod foundation;
pub mod logging;
pub mod middleware;
pub mod request;
pub mod response;
pub mod routing;
pub mod server;

pub use config::HttpConfig;
pub use controller::{discover_controllers, Controller, ControllerComponent};
pub use errors::{HttpError, HttpResult};
pub use foundation::{handler, Handler, NextFuture};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use middleware::{middleware_fn, LoggingMiddleware, Middleware, MiddlewarePipeline, Next};
pub use request::FallRequest;
pub use response::{FallResponse, IntoFallResponse, ResponseBody};
pub use routing::{RouteInfo, RoutePattern, Router};
pub use server::App;

// Re-export the HTTP primitives used in the public API
pub use axum::http::{Method, StatusCode};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
