pub mod request;

pub use request::FallRequest;
pub(crate) use request::MatchedRoute;
