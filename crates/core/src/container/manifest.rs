//! Dependency manifests: the declarative list of slots a component needs
//! filled before it is usable.
//!
//! A manifest replaces runtime struct introspection. Each slot names the
//! component it must receive and carries a typed setter; embedded manifests
//! describe nested structures that are injected in place, without a slot of
//! their own.

use crate::container::component::Resolved;
use crate::container::registry::Resolution;
use crate::errors::CoreError;
use std::any::Any;
use std::sync::Arc;

type Assign<T> = Box<dyn Fn(&mut T, &Resolved) -> Result<(), CoreError> + Send + Sync>;
type ApplyEmbedded<T> =
    Box<dyn Fn(&mut T, &str, &str, &mut Resolution<'_>) -> Result<(), CoreError> + Send + Sync>;

enum Entry<T> {
    Slot {
        field: &'static str,
        dependency: String,
        assign: Assign<T>,
    },
    Embedded {
        field: &'static str,
        apply: ApplyEmbedded<T>,
    },
}

/// Ordered list of dependency slots for a record of type `T`
pub struct Manifest<T> {
    entries: Vec<Entry<T>>,
}

impl<T: 'static> Manifest<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declare a slot filled with the component registered as `dependency`
    ///
    /// The dependency must provide an `Arc<D>` view: either it is a `D`
    /// itself, or it exposed `D` at registration time.
    pub fn slot<D, F>(mut self, field: &'static str, dependency: impl Into<String>, setter: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let dependency = dependency.into();
        let target = dependency.clone();
        let assign: Assign<T> = Box::new(move |record, resolved| {
            let value = resolved
                .view::<D>()
                .ok_or_else(|| CoreError::UnassignableSlot {
                    field: field.to_string(),
                    dependency: target.clone(),
                    expected: std::any::type_name::<D>(),
                })?;
            setter(record, value);
            Ok(())
        });

        self.entries.push(Entry::Slot {
            field,
            dependency,
            assign,
        });
        self
    }

    /// Declare an embedded structure whose own manifest is applied in place
    pub fn embed<U, A>(mut self, field: &'static str, accessor: A, manifest: Manifest<U>) -> Self
    where
        U: 'static,
        A: Fn(&mut T) -> &mut U + Send + Sync + 'static,
    {
        let apply: ApplyEmbedded<T> = Box::new(move |record, owner, path, resolution| {
            manifest.apply(owner, Some(path), accessor(record), resolution)
        });
        self.entries.push(Entry::Embedded { field, apply });
        self
    }

    /// Component names this manifest depends on, embedded ones excluded
    pub fn dependencies(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Slot { dependency, .. } => Some(dependency.as_str()),
                Entry::Embedded { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn apply(
        &self,
        owner: &str,
        prefix: Option<&str>,
        record: &mut T,
        resolution: &mut Resolution<'_>,
    ) -> Result<(), CoreError> {
        for entry in &self.entries {
            match entry {
                Entry::Slot {
                    field,
                    dependency,
                    assign,
                } => {
                    let path = field_path(prefix, field);
                    tracing::trace!(component = owner, field = %path, dependency = %dependency, "injecting slot");

                    let injection_failed = |source: CoreError| CoreError::InjectionFailed {
                        name: owner.to_string(),
                        field: path.clone(),
                        source: Box::new(source),
                    };

                    let resolved = resolution.resolve_entry(dependency).map_err(injection_failed)?;
                    assign(record, &resolved).map_err(injection_failed)?;
                }
                Entry::Embedded { field, apply } => {
                    let path = field_path(prefix, field);
                    apply(record, owner, &path, resolution)?;
                }
            }
        }
        Ok(())
    }
}

impl<T: 'static> Default for Manifest<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn field_path(prefix: Option<&str>, field: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, field),
        None => field.to_string(),
    }
}

/// Object-safe injection entry point over an erased target
pub trait Inject: Send + Sync {
    /// Type name of the record this manifest fills
    fn target_type(&self) -> &'static str;

    /// Fill every slot of `target`, which must be the manifest's record type
    fn inject(&self, target: &mut dyn Any, resolution: &mut Resolution<'_>) -> Result<(), CoreError>;
}

impl<T: 'static> Inject for Manifest<T> {
    fn target_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn inject(&self, target: &mut dyn Any, resolution: &mut Resolution<'_>) -> Result<(), CoreError> {
        let record = target
            .downcast_mut::<T>()
            .ok_or(CoreError::InvalidTarget {
                expected: std::any::type_name::<T>(),
            })?;
        self.apply(std::any::type_name::<T>(), None, record, resolution)
    }
}
