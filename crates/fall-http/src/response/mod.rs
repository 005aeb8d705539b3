pub mod response;

pub use response::{FallResponse, IntoFallResponse, ResponseBody};
