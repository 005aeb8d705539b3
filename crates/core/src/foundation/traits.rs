use crate::errors::BoxError;

/// Trait for components that need a post-construction initialization step
///
/// The registry calls `init` exactly once per instance, after every
/// dependency slot has been injected and before the instance is cached.
/// An error aborts the resolution and nothing is cached.
pub trait Initializable {
    fn init(&mut self) -> Result<(), BoxError>;
}
