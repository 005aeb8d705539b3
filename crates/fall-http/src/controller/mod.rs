//! Controllers and their discovery in the registry
//!
//! A controller is any registered component exposing the `dyn Controller`
//! view. Discovery resolves the whole registry and collects those views.

use crate::errors::HttpResult;
use crate::routing::Router;
use fall_core::{Component, Registry};
use std::sync::Arc;
use tracing::debug;

/// A component that registers its routes on a router
pub trait Controller: Send + Sync {
    fn configure(&self, router: &mut Router) -> HttpResult<()>;
}

/// Registration helper exposing a component as a controller
pub trait ControllerComponent {
    fn controller(self) -> Self;
}

impl<T: Controller + 'static> ControllerComponent for Component<T> {
    fn controller(self) -> Self {
        self.expose::<dyn Controller, _>(|c| c as Arc<dyn Controller>)
    }
}

/// Resolve every component and return the controllers among them
///
/// Any resolution failure aborts discovery; serving with a partially wired
/// registry is not allowed.
pub fn discover_controllers(registry: &Registry) -> HttpResult<Vec<Arc<dyn Controller>>> {
    let controllers = registry.resolve_all_as::<dyn Controller>()?;
    debug!(count = controllers.len(), "discovered controllers");
    Ok(controllers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HttpError;
    use fall_core::CoreError;

    struct Health;

    impl Controller for Health {
        fn configure(&self, router: &mut Router) -> HttpResult<()> {
            router.get("/health", |_req| async { "ok" })?;
            Ok(())
        }
    }

    #[test]
    fn test_only_exposed_components_are_controllers() {
        let registry = Registry::new();
        registry.register("health", Component::new(|| Ok(Health)).controller());
        registry.register("plain", Component::new(|| Ok(Health)));
        registry.store("config", 42u32);

        let controllers = discover_controllers(&registry).unwrap();
        assert_eq!(controllers.len(), 1);

        let mut router = Router::new();
        controllers[0].configure(&mut router).unwrap();
        assert_eq!(router.routes()[0].pattern, "/health");
        assert!(registry.is_resolved("plain"));
    }

    #[test]
    fn test_discovery_fails_on_broken_component() {
        let registry = Registry::new();
        registry.register("health", Component::new(|| Ok(Health)).controller());
        registry.register("broken", Component::<Health>::new(|| Err("boom".into())));

        let err = discover_controllers(&registry).err().unwrap();
        assert!(matches!(
            err,
            HttpError::Registry(CoreError::ConstructionFailed { .. })
        ));
    }
}
