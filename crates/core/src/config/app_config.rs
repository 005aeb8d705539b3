use crate::config::ConfigError;
use std::env;
use std::str::FromStr;

/// Environment variable selecting the application environment
pub const ENV_VAR: &str = "ENV";

/// Environment enumeration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment".to_string(),
                value: s.to_string(),
                expected: "development, testing, or production".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    /// Read the environment from `ENV`, defaulting to development when unset
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(Environment::default()),
        }
    }

    /// Check if environment is development
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Check if environment is testing
    pub fn is_testing(&self) -> bool {
        matches!(self, Environment::Testing)
    }

    /// Check if environment is production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Environment-specific setup run once by the application bootstrap,
/// before any controller is resolved
pub trait EnvConfiguration: Send + Sync {
    fn configure(&self, env: &Environment) -> Result<(), ConfigError>;
}

/// Configuration that accepts every environment
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnvConfiguration;

impl EnvConfiguration for NoopEnvConfiguration {
    fn configure(&self, _env: &Environment) -> Result<(), ConfigError> {
        Ok(())
    }
}

impl<F> EnvConfiguration for F
where
    F: Fn(&Environment) -> Result<(), ConfigError> + Send + Sync,
{
    fn configure(&self, env: &Environment) -> Result<(), ConfigError> {
        self(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Testing);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    #[serial]
    fn test_environment_from_env_defaults_to_development() {
        env::remove_var(ENV_VAR);
        assert_eq!(Environment::from_env().unwrap(), Environment::Development);

        env::set_var(ENV_VAR, "prod");
        assert!(Environment::from_env().unwrap().is_production());

        env::set_var(ENV_VAR, "nonsense");
        assert!(Environment::from_env().is_err());

        env::remove_var(ENV_VAR);
    }

    #[test]
    fn test_closure_env_configuration() {
        let only_production = |env: &Environment| {
            if env.is_production() {
                Ok(())
            } else {
                Err(ConfigError::environment_error(format!("unsupported: {}", env)))
            }
        };

        assert!(only_production.configure(&Environment::Production).is_ok());
        assert!(only_production.configure(&Environment::Testing).is_err());
        assert!(NoopEnvConfiguration.configure(&Environment::Testing).is_ok());
    }
}
