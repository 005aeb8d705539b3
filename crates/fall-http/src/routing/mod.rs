//! Routing: path patterns and the scoped router

pub mod pattern;
pub mod router;

pub use pattern::{PathSegment, RoutePattern, RoutePatternError};
pub use router::{RouteInfo, Router};
