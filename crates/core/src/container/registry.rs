use crate::container::component::{Component, Constructor, Instance, Resolved};
use crate::container::manifest::Inject;
use crate::errors::CoreError;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Name-keyed component registry with lazy singleton construction
///
/// Components are registered once, at startup, under a unique name. The
/// first resolution of a name runs its factory, fills the dependency slots
/// declared in its manifest, runs its lifecycle hook, and caches the result.
/// Every later resolution returns the cached instance.
///
/// Cached reads only take the instance table's read lock. Construction is
/// serialized by a single registry-wide mutex, held across the whole
/// check-construct-cache sequence, so each name is constructed at most once
/// even when several threads resolve it concurrently. Dependencies are
/// resolved through [`Resolution`], which already holds that mutex.
///
/// Factories and lifecycle hooks therefore must not call back into the
/// registry (`resolve`, `resolve_all`, `inject`): the mutex is not reentrant
/// and the call deadlocks. Declare dependencies in the component's manifest.
/// A factory that panics does not poison the registry; later resolutions
/// proceed normally.
pub struct Registry {
    components: RwLock<HashMap<String, Arc<dyn Constructor>>>,
    instances: RwLock<HashMap<String, Arc<Resolved>>>,
    construction: Mutex<()>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            construction: Mutex::new(()),
        }
    }

    /// Register a component under `name`
    ///
    /// Registering a name twice replaces the earlier component. An instance
    /// that was already resolved for that name stays cached.
    pub fn register<T>(&self, name: impl Into<String>, component: Component<T>)
    where
        T: Send + Sync + 'static,
    {
        let name = name.into();
        let mut components = match self.components.write() {
            Ok(components) => components,
            Err(poisoned) => poisoned.into_inner(),
        };

        if components.insert(name.clone(), Arc::new(component)).is_some() {
            tracing::warn!(component = %name, "component registered twice, last registration wins");
        } else {
            tracing::debug!(component = %name, "component registered");
        }
    }

    /// Seed the cache with an externally constructed value
    ///
    /// No factory, injection or lifecycle hook runs for a stored name.
    pub fn store<T>(&self, name: impl Into<String>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.store_resolved(name.into(), Resolved::new(value));
    }

    /// Seed the cache with a shared handle, typically a trait object
    pub fn store_shared<U>(&self, name: impl Into<String>, value: Arc<U>)
    where
        U: ?Sized + Send + Sync + 'static,
    {
        self.store_resolved(name.into(), Resolved::from_shared(value));
    }

    fn store_resolved(&self, name: String, resolved: Resolved) {
        let mut instances = match self.instances.write() {
            Ok(instances) => instances,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::debug!(component = %name, type_name = resolved.type_name(), "instance stored");
        instances.insert(name, Arc::new(resolved));
    }

    /// Resolve a component by name
    pub fn resolve(&self, name: &str) -> Result<Instance, CoreError> {
        Ok(self.resolve_entry(name)?.instance())
    }

    /// Resolve a component and return its `Arc<U>` view
    pub fn resolve_as<U>(&self, name: &str) -> Result<Arc<U>, CoreError>
    where
        U: ?Sized + 'static,
    {
        let resolved = self.resolve_entry(name)?;
        resolved.view::<U>().ok_or_else(|| CoreError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<U>(),
        })
    }

    /// Resolve a component and return the full resolved entry
    pub fn resolve_entry(&self, name: &str) -> Result<Arc<Resolved>, CoreError> {
        if let Some(resolved) = self.cached(name)? {
            return Ok(resolved);
        }

        let mut resolution = self.begin();
        resolution.resolve_entry(name)
    }

    /// Resolve every registered component
    ///
    /// Stops at the first failure. Names are visited in sorted order.
    pub fn resolve_all(&self) -> Result<Vec<Instance>, CoreError> {
        Ok(self
            .resolve_all_entries()?
            .into_iter()
            .map(|(_, resolved)| resolved.instance())
            .collect())
    }

    /// Resolve every registered component and keep those exposing `U`
    pub fn resolve_all_as<U>(&self) -> Result<Vec<Arc<U>>, CoreError>
    where
        U: ?Sized + 'static,
    {
        Ok(self
            .resolve_all_entries()?
            .into_iter()
            .filter_map(|(_, resolved)| resolved.view::<U>())
            .collect())
    }

    /// Resolve every registered component, paired with its name
    pub fn resolve_all_entries(&self) -> Result<Vec<(String, Arc<Resolved>)>, CoreError> {
        let mut resolution = self.begin();
        let names = self.names();

        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let entry = resolution.resolve_entry(&name)?;
            resolved.push((name, entry));
        }
        Ok(resolved)
    }

    /// Fill the slots of an externally constructed record
    pub fn inject(&self, target: &mut dyn Any, manifest: &dyn Inject) -> Result<(), CoreError> {
        let mut resolution = self.begin();
        manifest.inject(target, &mut resolution)
    }

    /// Check if a component is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.components
            .read()
            .map(|components| components.contains_key(name))
            .unwrap_or(false)
    }

    /// Check if an instance is cached under `name`
    pub fn is_resolved(&self, name: &str) -> bool {
        self.instances
            .read()
            .map(|instances| instances.contains_key(name))
            .unwrap_or(false)
    }

    /// Registered component names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .components
            .read()
            .map(|components| components.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.components
            .read()
            .map(|components| components.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The mutex guards no data, so a factory that panicked leaves nothing
    // half-built behind it.
    fn begin(&self) -> Resolution<'_> {
        let guard = self
            .construction
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        Resolution {
            registry: self,
            _guard: guard,
            stack: Vec::new(),
        }
    }

    fn cached(&self, name: &str) -> Result<Option<Arc<Resolved>>, CoreError> {
        let instances = self
            .instances
            .read()
            .map_err(|_| CoreError::lock("registry_instances"))?;
        Ok(instances.get(name).cloned())
    }

    fn constructor(&self, name: &str) -> Result<Arc<dyn Constructor>, CoreError> {
        let components = self
            .components
            .read()
            .map_err(|_| CoreError::lock("registry_components"))?;
        components
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::not_registered(name))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved = self
            .instances
            .read()
            .map(|instances| instances.len())
            .unwrap_or(0);
        f.debug_struct("Registry")
            .field("components", &self.names())
            .field("resolved", &resolved)
            .finish()
    }
}

/// A resolution in progress, holding the registry's construction lock
///
/// Factories' dependencies are resolved through this handle rather than
/// through [`Registry::resolve`], which would try to take the lock again.
/// It also tracks the names currently under construction so that a
/// dependency cycle fails with [`CoreError::CyclicDependency`] instead of
/// recursing forever.
pub struct Resolution<'a> {
    registry: &'a Registry,
    _guard: MutexGuard<'a, ()>,
    stack: Vec<String>,
}

impl<'a> Resolution<'a> {
    /// Resolve a dependency without re-acquiring the construction lock
    pub fn resolve(&mut self, name: &str) -> Result<Instance, CoreError> {
        Ok(self.resolve_entry(name)?.instance())
    }

    /// Resolve a dependency and return the full resolved entry
    pub fn resolve_entry(&mut self, name: &str) -> Result<Arc<Resolved>, CoreError> {
        if let Some(resolved) = self.registry.cached(name)? {
            return Ok(resolved);
        }

        if self.stack.iter().any(|pending| pending == name) {
            let mut path = self.stack.clone();
            path.push(name.to_string());
            return Err(CoreError::CyclicDependency {
                path: path.join(" -> "),
            });
        }

        let constructor = self.registry.constructor(name)?;
        tracing::debug!(component = name, type_name = constructor.type_name(), "constructing component");

        self.stack.push(name.to_string());
        let constructed = constructor.construct(name, self);
        self.stack.pop();

        let resolved = Arc::new(constructed?);
        self.registry
            .instances
            .write()
            .map_err(|_| CoreError::lock("registry_instances"))?
            .insert(name.to_string(), resolved.clone());

        tracing::debug!(component = name, "component ready");
        Ok(resolved)
    }

    /// Names currently under construction, outermost first
    pub fn in_progress(&self) -> &[String] {
        &self.stack
    }
}
