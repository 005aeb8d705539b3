//! Component registrations and the instances they resolve to

use crate::container::manifest::Manifest;
use crate::container::registry::Resolution;
use crate::errors::{BoxError, CoreError};
use crate::foundation::Initializable;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased shared instance handed out by the registry
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory<T> = Box<dyn Fn() -> Result<T, BoxError> + Send + Sync>;
type InitHook<T> = Box<dyn Fn(&mut T) -> Result<(), BoxError> + Send + Sync>;
type ViewFn<T> = Box<dyn Fn(&Arc<T>) -> (TypeId, Box<dyn Any + Send + Sync>) + Send + Sync>;

/// A fully constructed, injected and initialized component
///
/// Besides the erased instance, a resolved component carries typed views:
/// the concrete `Arc<T>` plus every capability exposed at registration time
/// (for example `Arc<dyn Controller>`).
pub struct Resolved {
    type_name: &'static str,
    instance: Instance,
    views: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Resolved {
    /// Wrap an owned value
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an already shared value; the value itself becomes the instance
    pub fn from_arc<T: Send + Sync + 'static>(shared: Arc<T>) -> Self {
        let mut views: HashMap<TypeId, Box<dyn Any + Send + Sync>> = HashMap::new();
        views.insert(TypeId::of::<Arc<T>>(), Box::new(shared.clone()));
        Self {
            type_name: std::any::type_name::<T>(),
            instance: shared,
            views,
        }
    }

    /// Wrap a shared trait object
    ///
    /// The erased instance is the `Arc<U>` handle itself, so `instance()`
    /// downcasts to `Arc<U>` while `view::<U>()` returns it directly.
    pub fn from_shared<U: ?Sized + Send + Sync + 'static>(shared: Arc<U>) -> Self {
        let mut views: HashMap<TypeId, Box<dyn Any + Send + Sync>> = HashMap::new();
        views.insert(TypeId::of::<Arc<U>>(), Box::new(shared.clone()));
        Self {
            type_name: std::any::type_name::<U>(),
            instance: Arc::new(shared),
            views,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn instance(&self) -> Instance {
        self.instance.clone()
    }

    /// Typed view of this instance, if the component provides one
    pub fn view<U: ?Sized + 'static>(&self) -> Option<Arc<U>> {
        self.views
            .get(&TypeId::of::<Arc<U>>())?
            .downcast_ref::<Arc<U>>()
            .cloned()
    }

    pub fn has_view<U: ?Sized + 'static>(&self) -> bool {
        self.views.contains_key(&TypeId::of::<Arc<U>>())
    }

    fn insert_view(&mut self, (id, view): (TypeId, Box<dyn Any + Send + Sync>)) {
        self.views.insert(id, view);
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("type_name", &self.type_name)
            .field("views", &self.views.len())
            .finish()
    }
}

/// Registration-time description of a component
///
/// ```rust
/// use fall_core::container::{Component, Registry};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Clock;
///
/// #[derive(Default)]
/// struct Greeter {
///     clock: Option<Arc<Clock>>,
/// }
///
/// let registry = Registry::new();
/// registry.register("clock", Component::<Clock>::from_default());
/// registry.register(
///     "greeter",
///     Component::<Greeter>::from_default()
///         .inject("clock", "clock", |g: &mut Greeter, clock: Arc<Clock>| g.clock = Some(clock)),
/// );
///
/// let greeter = registry.resolve_as::<Greeter>("greeter").unwrap();
/// assert!(greeter.clock.is_some());
/// ```
pub struct Component<T> {
    factory: Factory<T>,
    manifest: Manifest<T>,
    init: Option<InitHook<T>>,
    views: Vec<ViewFn<T>>,
}

impl<T: Send + Sync + 'static> Component<T> {
    /// Create a component from a fallible factory
    ///
    /// The factory runs while the registry's construction lock is held, so it
    /// must not call [`Registry::resolve`](crate::container::Registry::resolve)
    /// or any other resolving method on the same registry: the call would
    /// deadlock. Declare dependencies with [`Component::inject`] or a
    /// [`Manifest`] instead, or capture values that are already resolved.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            manifest: Manifest::new(),
            init: None,
            views: Vec::new(),
        }
    }

    /// Create a component built with `T::default()`
    pub fn from_default() -> Self
    where
        T: Default,
    {
        Self::new(|| Ok(T::default()))
    }

    /// Replace the dependency manifest
    pub fn with_manifest(mut self, manifest: Manifest<T>) -> Self {
        self.manifest = manifest;
        self
    }

    /// Add a dependency slot to the manifest
    pub fn inject<D, F>(mut self, field: &'static str, dependency: impl Into<String>, setter: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        self.manifest = self.manifest.slot(field, dependency, setter);
        self
    }

    /// Inject into an embedded structure, in place
    pub fn embed<U, A>(mut self, field: &'static str, accessor: A, manifest: Manifest<U>) -> Self
    where
        U: 'static,
        A: Fn(&mut T) -> &mut U + Send + Sync + 'static,
    {
        self.manifest = self.manifest.embed(field, accessor, manifest);
        self
    }

    /// Run `Initializable::init` after injection
    pub fn initializable(self) -> Self
    where
        T: Initializable,
    {
        self.on_init(T::init)
    }

    /// Run a custom hook after injection
    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.init = Some(Box::new(hook));
        self
    }

    /// Expose the resolved instance as `Arc<U>`, usually a trait object
    pub fn expose<U, F>(mut self, cast: F) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        self.views.push(Box::new(move |shared: &Arc<T>| {
            let view: Box<dyn Any + Send + Sync> = Box::new(cast(shared.clone()));
            (TypeId::of::<Arc<U>>(), view)
        }));
        self
    }

    pub fn manifest(&self) -> &Manifest<T> {
        &self.manifest
    }
}

/// Object-safe construction entry used by the registry
pub(crate) trait Constructor: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn construct(&self, name: &str, resolution: &mut Resolution<'_>) -> Result<Resolved, CoreError>;
}

impl<T: Send + Sync + 'static> Constructor for Component<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn construct(&self, name: &str, resolution: &mut Resolution<'_>) -> Result<Resolved, CoreError> {
        let mut instance = (self.factory)().map_err(|source| CoreError::ConstructionFailed {
            name: name.to_string(),
            source,
        })?;

        self.manifest.apply(name, None, &mut instance, resolution)?;

        if let Some(init) = &self.init {
            init(&mut instance).map_err(|source| CoreError::InitializationFailed {
                name: name.to_string(),
                source,
            })?;
        }

        let shared = Arc::new(instance);
        let mut resolved = Resolved::from_arc(shared.clone());
        for view in &self.views {
            resolved.insert_view(view(&shared));
        }
        Ok(resolved)
    }
}
