pub mod component;
pub mod manifest;
pub mod registry;

pub use component::{Component, Instance, Resolved};
pub use manifest::{Inject, Manifest};
pub use registry::{Registry, Resolution};
