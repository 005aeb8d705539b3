use thiserror::Error;

/// Boxed error returned by factories and lifecycle hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for the fall registry
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("dependency not registered: {name}")]
    NotRegistered { name: String },

    #[error("construction failed for {name}: {source}")]
    ConstructionFailed { name: String, source: BoxError },

    #[error("injection failed for {name} (field {field}): {source}")]
    InjectionFailed {
        name: String,
        field: String,
        source: Box<CoreError>,
    },

    #[error("initialization failed for {name}: {source}")]
    InitializationFailed { name: String, source: BoxError },

    #[error("injection target must be a {expected}")]
    InvalidTarget { expected: &'static str },

    #[error("cannot set field {field}: dependency {dependency} is not a {expected}")]
    UnassignableSlot {
        field: String,
        dependency: String,
        expected: &'static str,
    },

    #[error("component {name} is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("cyclic dependency detected: {path}")]
    CyclicDependency { path: String },

    #[error("lock error on resource: {resource}")]
    LockError { resource: String },
}

impl CoreError {
    /// Create a not registered error
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered { name: name.into() }
    }

    pub(crate) fn lock(resource: &str) -> Self {
        Self::LockError {
            resource: resource.to_string(),
        }
    }

    /// Check if the error, or the error it wraps, is a missing registration
    pub fn is_not_registered(&self) -> bool {
        match self {
            Self::NotRegistered { .. } => true,
            Self::InjectionFailed { source, .. } => source.is_not_registered(),
            _ => false,
        }
    }

    /// Check if the error, or the error it wraps, is a dependency cycle
    pub fn is_cyclic(&self) -> bool {
        match self {
            Self::CyclicDependency { .. } => true,
            Self::InjectionFailed { source, .. } => source.is_cyclic(),
            _ => false,
        }
    }

    /// Innermost error of an injection chain
    pub fn root_cause(&self) -> &CoreError {
        match self {
            Self::InjectionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_injection_chain() {
        let error = CoreError::InjectionFailed {
            name: "controller".to_string(),
            field: "service".to_string(),
            source: Box::new(CoreError::InjectionFailed {
                name: "service".to_string(),
                field: "repo".to_string(),
                source: Box::new(CoreError::not_registered("db")),
            }),
        };

        assert!(error.is_not_registered());
        assert!(!error.is_cyclic());
        assert!(matches!(error.root_cause(), CoreError::NotRegistered { name } if name == "db"));
        assert_eq!(
            error.to_string(),
            "injection failed for controller (field service): injection failed for service (field repo): dependency not registered: db"
        );
    }
}
