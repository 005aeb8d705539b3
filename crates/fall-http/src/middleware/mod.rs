//! # Middleware
//!
//! Middleware trait, pipeline composition, and built-in middleware.

pub mod logging;
pub mod pipeline;

pub use logging::LoggingMiddleware;
pub use pipeline::{middleware_fn, FnMiddleware, Middleware, MiddlewarePipeline, Next};
