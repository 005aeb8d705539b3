pub mod constants;
pub mod types;

pub use types::{handler, Handler, NextFuture};
