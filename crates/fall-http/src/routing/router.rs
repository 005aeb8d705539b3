//! Router with scoped groups and per-route middleware chains
//!
//! Routes are wrapped with their effective middleware chain when they are
//! registered; dispatch only has to pick the best match and call it.

use super::pattern::{RoutePattern, RoutePatternError};
use crate::errors::{HttpError, HttpResult};
use crate::foundation::{handler, Handler};
use crate::middleware::{Middleware, MiddlewarePipeline};
use crate::request::{FallRequest, MatchedRoute};
use crate::response::{FallResponse, IntoFallResponse};
use axum::http::Method;
use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

struct Route {
    method: Method,
    pattern: RoutePattern,
    middleware: Vec<&'static str>,
    handler: Handler,
}

/// Registered route, as reported by [`Router::routes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    pub pattern: String,
    /// Effective middleware chain, outermost first
    pub middleware: Vec<&'static str>,
}

/// Request router
///
/// A router is a scope: a path prefix plus the middleware chain that routes
/// registered in it inherit. [`Router::group`] opens a child scope over the
/// same route table.
pub struct Router {
    prefix: String,
    chain: MiddlewarePipeline,
    routes: Vec<Route>,
}

impl Router {
    /// Create a root router with no prefix and no middleware
    pub fn new() -> Self {
        Self::with_middleware(MiddlewarePipeline::new())
    }

    /// Create a root router whose routes all inherit `chain`
    pub fn with_middleware(chain: MiddlewarePipeline) -> Self {
        Self {
            prefix: "/".to_string(),
            chain,
            routes: Vec::new(),
        }
    }

    /// Effective path prefix of this scope
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Middleware routes registered from now on in this scope will inherit
    pub fn middleware(&self) -> &MiddlewarePipeline {
        &self.chain
    }

    /// Append middleware to this scope's chain
    ///
    /// Routes registered earlier keep the chain they were registered with.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.chain.add_mut(middleware);
        self
    }

    /// Append an already shared middleware to this scope's chain
    pub fn use_shared(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.chain.add_shared(middleware);
        self
    }

    /// Configure a child scope under `prefix`
    ///
    /// The child starts from a snapshot of this scope's chain; anything it
    /// adds stays local to it and its own children.
    pub fn group<F>(&mut self, prefix: &str, configure: F) -> HttpResult<&mut Self>
    where
        F: FnOnce(&mut Router) -> HttpResult<()>,
    {
        let mut child = Router {
            prefix: join_paths(&self.prefix, prefix),
            chain: self.chain.clone(),
            routes: std::mem::take(&mut self.routes),
        };

        let result = configure(&mut child);
        self.routes = child.routes;
        result?;
        Ok(self)
    }

    /// Register a boxed handler with extra per-route middleware
    ///
    /// The effective chain is this scope's chain followed by `local`.
    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handler: Handler,
        local: MiddlewarePipeline,
    ) -> HttpResult<&mut Self> {
        let full_path = join_paths(&self.prefix, path);
        let pattern = RoutePattern::parse(&full_path).map_err(|e| invalid_route(&full_path, e))?;

        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.pattern.same_shape(&pattern))
        {
            return Err(HttpError::RouteConflict {
                method,
                path: full_path,
            });
        }

        let chain = self.chain.clone().extend(local);
        info!("{} {}", method, full_path);

        self.routes.push(Route {
            method,
            pattern,
            middleware: chain.names(),
            handler: chain.wrap(handler),
        });
        Ok(self)
    }

    /// Register an async handler for `method` and `path`
    pub fn route<F, Fut, R>(&mut self, method: Method, path: &str, f: F) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.handle(method, path, handler(f), MiddlewarePipeline::new())
    }

    /// Register an async handler with per-route middleware
    pub fn route_with<F, Fut, R>(
        &mut self,
        method: Method,
        path: &str,
        local: MiddlewarePipeline,
        f: F,
    ) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.handle(method, path, handler(f), local)
    }

    pub fn get<F, Fut, R>(&mut self, path: &str, f: F) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.route(Method::GET, path, f)
    }

    pub fn post<F, Fut, R>(&mut self, path: &str, f: F) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.route(Method::POST, path, f)
    }

    pub fn put<F, Fut, R>(&mut self, path: &str, f: F) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.route(Method::PUT, path, f)
    }

    pub fn delete<F, Fut, R>(&mut self, path: &str, f: F) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.route(Method::DELETE, path, f)
    }

    pub fn patch<F, Fut, R>(&mut self, path: &str, f: F) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.route(Method::PATCH, path, f)
    }

    pub fn options<F, Fut, R>(&mut self, path: &str, f: F) -> HttpResult<&mut Self>
    where
        F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFallResponse + 'static,
    {
        self.route(Method::OPTIONS, path, f)
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|route| RouteInfo {
                method: route.method.clone(),
                pattern: route.pattern.to_string(),
                middleware: route.middleware.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route a request to the most specific matching handler
    ///
    /// Path parameters and the matched pattern are placed on the request
    /// before the route's middleware chain runs. Unmatched paths get a 404;
    /// a path registered only under other methods gets a 405 with `Allow`.
    /// A `HEAD` request with no `HEAD` route is served by the `GET` route
    /// and answered without a body.
    pub async fn dispatch(&self, mut request: FallRequest) -> FallResponse {
        let mut best: Option<(&Route, _)> = None;
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.match_path(request.path()) else {
                continue;
            };

            if !serves(&route.method, &request.method) {
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
                if route.method == Method::GET && !allowed.contains(&Method::HEAD) {
                    allowed.push(Method::HEAD);
                }
                continue;
            }

            let better = match &best {
                Some((current, _)) => match route.pattern.specificity_cmp(&current.pattern) {
                    Ordering::Less => true,
                    Ordering::Equal => {
                        route.method == request.method && current.method != request.method
                    }
                    Ordering::Greater => false,
                },
                None => true,
            };
            if better {
                best = Some((route, params));
            }
        }

        match best {
            Some((route, params)) => {
                let head_fallback = route.method != request.method;
                request.path_params = params;
                request.insert_extension(MatchedRoute(format!(
                    "{} {}",
                    route.method, route.pattern
                )));

                let mut response = (route.handler)(request).await;
                if head_fallback {
                    response.clear_body();
                }
                response
            }
            None if !allowed.is_empty() => HttpError::MethodNotAllowed {
                method: request.method.clone(),
                path: request.path().to_string(),
                allowed,
            }
            .into_response(),
            None => HttpError::NotFound {
                method: request.method.clone(),
                path: request.path().to_string(),
            }
            .into_response(),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("middleware", &self.chain.names())
            .field("routes", &self.routes())
            .finish()
    }
}

fn serves(route: &Method, requested: &Method) -> bool {
    route == requested || (*requested == Method::HEAD && *route == Method::GET)
}

fn invalid_route(path: &str, error: RoutePatternError) -> HttpError {
    HttpError::InvalidRoute {
        path: path.to_string(),
        reason: error.to_string(),
    }
}

/// Join a scope prefix and a path into one normalized path
///
/// The result has exactly one leading `/`, no trailing `/` (except the root),
/// and no empty segments.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;
    use crate::response::ResponseBody;
    use axum::http::StatusCode;

    fn request(method: Method, uri: &str) -> FallRequest {
        FallRequest::parse(method, uri).unwrap()
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("/", "users"), "/users");
        assert_eq!(join_paths("/api", "/users/"), "/api/users");
        assert_eq!(join_paths("/api/", "//v1//items"), "/api/v1/items");
        assert_eq!(join_paths("api", "/"), "/api");
    }

    #[tokio::test]
    async fn test_dispatch_extracts_params_and_pattern() {
        let mut router = Router::new();
        router
            .get("/users/{id}", |req: FallRequest| async move {
                let id = req.path_param("id").cloned().unwrap_or_default();
                let pattern = req.route_pattern().unwrap_or_default().to_string();
                format!("{}|{}", id, pattern)
            })
            .unwrap();

        let response = router.dispatch(request(Method::GET, "/users/42")).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.body_text().as_deref(), Some("42|GET /users/{id}"));
    }

    #[tokio::test]
    async fn test_dispatch_decodes_params() {
        let mut router = Router::new();
        router
            .get("/items/{name}", |req: FallRequest| async move {
                req.path_param("name").cloned().unwrap_or_default()
            })
            .unwrap();

        let spaced = router.dispatch(request(Method::GET, "/items/blue%20lamp")).await;
        let slashed = router.dispatch(request(Method::GET, "/items/a%2Fb")).await;

        assert_eq!(spaced.body_text().as_deref(), Some("blue lamp"));
        assert_eq!(slashed.body_text().as_deref(), Some("a/b"));
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let mut router = Router::new();
        router
            .get("/items", |_req| async { "list" })
            .unwrap()
            .post("/items", |_req| async { "create" })
            .unwrap();

        let missing = router.dispatch(request(Method::GET, "/nothing")).await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let wrong_method = router.dispatch(request(Method::DELETE, "/items")).await;
        assert_eq!(wrong_method.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(wrong_method.header_str("allow"), Some("GET, HEAD, POST"));
    }

    #[tokio::test]
    async fn test_head_is_served_by_get_route() {
        let mut router = Router::new();
        router
            .get("/items", |_req: FallRequest| async {
                FallResponse::ok().with_header("x-count", "3").text("list")
            })
            .unwrap();

        let head = router.dispatch(request(Method::HEAD, "/items")).await;

        assert_eq!(head.status_code(), StatusCode::OK);
        assert_eq!(head.header_str("x-count"), Some("3"));
        assert!(matches!(head.body(), ResponseBody::Empty));

        router
            .route(Method::HEAD, "/items", |_req| async { "explicit" })
            .unwrap();
        let explicit = router.dispatch(request(Method::HEAD, "/items")).await;
        assert_eq!(explicit.body_text().as_deref(), Some("explicit"));
    }

    #[tokio::test]
    async fn test_trailing_slash_matches() {
        let mut router = Router::new();
        router.get("/items/", |_req| async { "list" }).unwrap();

        assert_eq!(router.routes()[0].pattern, "/items");
        let response = router.dispatch(request(Method::GET, "/items/")).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_conflict_ignores_param_names() {
        let mut router = Router::new();
        router.get("/items/{id}", |_req| async { "a" }).unwrap();

        let err = router.get("/items/{item}", |_req| async { "b" }).unwrap_err();
        assert!(matches!(err, HttpError::RouteConflict { .. }));

        // same path, different method is fine
        assert!(router.put("/items/{id}", |_req| async { "c" }).is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut router = Router::new();
        let err = router.get("/files/{rest...}/x", |_req| async { "" }).unwrap_err();
        assert!(matches!(err, HttpError::InvalidRoute { .. }));
    }

    #[tokio::test]
    async fn test_use_is_not_retroactive() {
        let mut router = Router::new();
        router.get("/before", |_req| async { "before" }).unwrap();
        router.use_middleware(middleware_fn("tag", |req, next| async move {
            next.run(req).await.with_header("x-tag", "on")
        }));
        router.get("/after", |_req| async { "after" }).unwrap();

        let before = router.dispatch(request(Method::GET, "/before")).await;
        let after = router.dispatch(request(Method::GET, "/after")).await;

        assert_eq!(before.header_str("x-tag"), None);
        assert_eq!(after.header_str("x-tag"), Some("on"));
    }

    #[test]
    fn test_group_does_not_leak_middleware() {
        let mut router = Router::new();
        router.use_middleware(middleware_fn("outer", |req, next| next.call(req)));
        router
            .group("/admin", |admin| {
                admin.use_middleware(middleware_fn("inner", |req, next| next.call(req)));
                admin.get("/stats", |_req| async { "stats" })?;
                Ok(())
            })
            .unwrap()
            .get("/home", |_req| async { "home" })
            .unwrap();

        let routes = router.routes();
        assert_eq!(routes[0].pattern, "/admin/stats");
        assert_eq!(routes[0].middleware, vec!["outer", "inner"]);
        assert_eq!(routes[1].pattern, "/home");
        assert_eq!(routes[1].middleware, vec!["outer"]);
        assert_eq!(router.middleware().names(), vec!["outer"]);
    }

    #[test]
    fn test_group_error_keeps_earlier_routes() {
        let mut router = Router::new();
        router.get("/a", |_req| async { "a" }).unwrap();

        let result = router.group("/g", |g| {
            g.get("/b", |_req| async { "b" })?;
            g.get("/b", |_req| async { "again" })?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(router.len(), 2);
    }
}
