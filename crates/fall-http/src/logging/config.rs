//! # Logging initialisation
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and one
//! formatting layer picked by [`LogFormat`].

use fall_core::Environment;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Pretty,
    /// One JSON object per event
    Json,
}

/// How the process-wide subscriber is set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, e.g. `"fall_http=debug,axum=warn"`
    pub filter: String,
    /// Record source file and line on each event
    pub with_location: bool,
    /// Reported in the startup event
    pub service: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plain,
            filter: "info".to_string(),
            with_location: false,
            service: None,
        }
    }
}

impl LoggingConfig {
    /// JSON events, framework crates at `info`, axum and tower at `warn`
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info,fall_core=info,fall_http=info,tower=warn,axum=warn".to_string(),
            ..Self::default()
        }
    }

    pub fn development() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info,fall_core=debug,fall_http=debug".to_string(),
            with_location: true,
            ..Self::default()
        }
    }

    /// Quiet output for test runs
    pub fn test() -> Self {
        Self {
            filter: "warn".to_string(),
            ..Self::default()
        }
    }

    pub fn for_environment(env: &Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Testing => Self::test(),
            Environment::Production => Self::production(),
        }
    }

    pub fn with_service(mut self, name: impl Into<String>) -> Self {
        self.service = Some(name.into());
        self
    }

    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = directives.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Build the filter, letting `RUST_LOG` override the configured directives
    fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.filter))
    }
}

/// Install the global subscriber described by `config`
///
/// Fails, without panicking, on invalid filter directives or when a global
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = config.env_filter()?;
    let layer = Layer::new()
        .with_writer(io::stdout)
        .with_file(config.with_location)
        .with_line_number(config.with_location);

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init()?,
        LogFormat::Pretty => registry.with(layer.pretty()).try_init()?,
        LogFormat::Plain => registry.with(layer).try_init()?,
    }

    tracing::info!(
        target: "fall::logging",
        service = config.service.as_deref().unwrap_or("-"),
        format = ?config.format,
        filter = %config.filter,
        "logging initialised"
    );
    Ok(())
}
