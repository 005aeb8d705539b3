//! # Application bootstrap
//!
//! Owns the registry and the root router. Construction runs the environment
//! configuration, discovers controllers and lets each register its routes.

use super::lifecycle::{build_internal_router, serve_with_shutdown, start_server};
use crate::config::HttpConfig;
use crate::controller::{discover_controllers, Controller};
use crate::errors::HttpResult;
use crate::middleware::MiddlewarePipeline;
use crate::request::FallRequest;
use crate::response::FallResponse;
use crate::routing::Router;
use fall_core::{EnvConfiguration, Environment, Registry};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The application: registry, environment and configured router
///
/// # Example
///
/// ```rust,no_run
/// use fall_core::{Component, Environment, NoopEnvConfiguration, Registry};
/// use fall_http::{
///     init_logging, App, Controller, ControllerComponent, HttpConfig, HttpResult, LoggingConfig,
///     LoggingMiddleware, MiddlewarePipeline, Router,
/// };
/// use std::sync::Arc;
///
/// struct Ping;
///
/// impl Controller for Ping {
///     fn configure(&self, router: &mut Router) -> HttpResult<()> {
///         router.get("/ping", |_req| async { "pong" })?;
///         Ok(())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let env = Environment::from_env()?;
///     init_logging(LoggingConfig::for_environment(&env).with_service("ping"))?;
///
///     let registry = Arc::new(Registry::new());
///     registry.register("ping", Component::new(|| Ok(Ping)).controller());
///
///     let app = App::new(
///         registry,
///         env,
///         &NoopEnvConfiguration,
///         MiddlewarePipeline::new().add(LoggingMiddleware::new()),
///     )?;
///     app.listen(HttpConfig::from_env()?).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct App {
    registry: Arc<Registry>,
    env: Environment,
    router: Router,
}

impl App {
    /// Configure the environment, then discover and configure controllers
    ///
    /// `middleware` is the global chain every route inherits. Any failure
    /// aborts construction.
    pub fn new(
        registry: Arc<Registry>,
        env: Environment,
        env_config: &dyn EnvConfiguration,
        middleware: MiddlewarePipeline,
    ) -> HttpResult<Self> {
        info!(env = %env, "configuring application");
        env_config.configure(&env)?;

        let mut app = Self {
            registry,
            env,
            router: Router::with_middleware(middleware),
        };

        let controllers = discover_controllers(&app.registry)?;
        app.set_controllers(controllers)?;

        info!(
            routes = app.router.len(),
            components = app.registry.len(),
            "application ready"
        );
        Ok(app)
    }

    /// Let each controller register its routes on the root router
    pub fn set_controllers<I>(&mut self, controllers: I) -> HttpResult<&mut Self>
    where
        I: IntoIterator<Item = Arc<dyn Controller>>,
    {
        for controller in controllers {
            controller.configure(&mut self.router)?;
        }
        Ok(self)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Mutable root router, for routes registered outside controllers
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Serve one request in-process
    pub async fn dispatch(&self, request: FallRequest) -> FallResponse {
        self.router.dispatch(request).await
    }

    /// Convert into an Axum router serving this application
    pub fn into_axum_router(self, config: &HttpConfig) -> axum::Router {
        build_internal_router(Arc::new(self), config.max_request_size)
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn listen(self, config: HttpConfig) -> HttpResult<()> {
        config.validate()?;
        let addr = config.socket_addr()?;
        info!("Starting server on {}", addr);

        let router = self.into_axum_router(&config);
        start_server(addr, router, config.shutdown_timeout()).await
    }

    /// Serve on an already bound listener until `signal` completes
    pub async fn serve<F>(self, listener: TcpListener, config: HttpConfig, signal: F) -> HttpResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        config.validate()?;
        let timeout = config.shutdown_timeout();
        let router = self.into_axum_router(&config);
        serve_with_shutdown(listener, router, signal, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HttpError;
    use axum::http::{Method, StatusCode};
    use fall_core::{Component, ConfigError, NoopEnvConfiguration};

    use crate::controller::ControllerComponent;

    struct Ping;

    impl Controller for Ping {
        fn configure(&self, router: &mut Router) -> HttpResult<()> {
            router.get("/ping", |_req| async { "pong" })?;
            Ok(())
        }
    }

    fn registry_with_ping() -> Arc<Registry> {
        let registry = Arc::new(Registry::new());
        registry.register("ping", Component::new(|| Ok(Ping)).controller());
        registry
    }

    #[tokio::test]
    async fn test_new_configures_discovered_controllers() {
        let app = App::new(
            registry_with_ping(),
            Environment::Testing,
            &NoopEnvConfiguration,
            MiddlewarePipeline::new(),
        )
        .unwrap();

        let response = app
            .dispatch(FallRequest::parse(Method::GET, "/ping").unwrap())
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.body_text().as_deref(), Some("pong"));
        assert!(app.env().is_testing());
    }

    #[test]
    fn test_env_configuration_failure_aborts_before_discovery() {
        let registry = Arc::new(Registry::new());
        registry.register("ping", Component::new(|| Ok(Ping)).controller());

        let reject = |_env: &Environment| -> Result<(), ConfigError> {
            Err(ConfigError::environment_error("missing secrets"))
        };
        let err = App::new(registry.clone(), Environment::Production, &reject, MiddlewarePipeline::new())
            .unwrap_err();

        assert!(matches!(err, HttpError::Config(_)));
        assert!(!registry.is_resolved("ping"));
    }

    #[test]
    fn test_duplicate_controller_routes_abort_startup() {
        let registry = registry_with_ping();
        registry.register("ping_again", Component::new(|| Ok(Ping)).controller());

        let err = App::new(registry, Environment::Testing, &NoopEnvConfiguration, MiddlewarePipeline::new())
            .unwrap_err();

        assert!(matches!(err, HttpError::RouteConflict { .. }));
    }

    #[test]
    fn test_set_controllers_adds_routes() {
        let mut app = App::new(
            Arc::new(Registry::new()),
            Environment::Testing,
            &NoopEnvConfiguration,
            MiddlewarePipeline::new(),
        )
        .unwrap();
        assert!(app.router().is_empty());

        app.set_controllers(vec![Arc::new(Ping) as Arc<dyn Controller>]).unwrap();
        assert_eq!(app.router().routes()[0].pattern, "/ping");
    }
}
