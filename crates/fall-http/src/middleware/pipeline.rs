//! # Middleware pipeline
//!
//! Middleware follows the handle(request, next) pattern. A pipeline wraps a
//! handler so that the first middleware added is the outermost layer: it sees
//! the request first and the response last.

use crate::foundation::{Handler, NextFuture};
use crate::request::FallRequest;
use crate::response::FallResponse;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Next represents the rest of the middleware chain
pub struct Next {
    handler: Box<dyn FnOnce(FallRequest) -> NextFuture<'static> + Send>,
}

impl Next {
    /// Create a new Next with a handler function
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(FallRequest) -> NextFuture<'static> + Send + 'static,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Run the rest of the middleware chain with the given request
    pub async fn run(self, request: FallRequest) -> FallResponse {
        (self.handler)(request).await
    }

    /// Hand the request to the rest of the chain without awaiting it
    pub fn call(self, request: FallRequest) -> NextFuture<'static> {
        (self.handler)(request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Middleware trait with handle(request, next) pattern
/// Uses boxed futures to be dyn-compatible
pub trait Middleware: Send + Sync + fmt::Debug {
    /// Handle the request and call the next middleware in the chain
    fn handle(&self, request: FallRequest, next: Next) -> NextFuture<'static>;

    /// Optional middleware name for debugging
    fn name(&self) -> &'static str {
        "Middleware"
    }
}

/// Ordered middleware chain
///
/// Cloning is cheap and yields an independent chain: pushing onto the clone
/// never changes the original. Router groups rely on this for their
/// snapshot semantics.
#[derive(Debug, Clone, Default)]
pub struct MiddlewarePipeline {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    /// Create a new empty middleware pipeline
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
        }
    }

    /// Add middleware to the pipeline
    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Add middleware to the pipeline (mutable version)
    pub fn add_mut<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middleware.push(Arc::new(middleware));
    }

    /// Add an already shared middleware to the pipeline
    pub fn add_shared(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Extend this pipeline with middleware from another pipeline
    /// The middleware from this pipeline will execute before the middleware from the other pipeline
    pub fn extend(mut self, other: Self) -> Self {
        self.middleware.extend(other.middleware);
        self
    }

    /// Wrap `handler` so that every request runs through the whole chain
    ///
    /// For `[m1, m2, m3]` the result behaves as `m1(m2(m3(handler)))`.
    pub fn wrap(&self, handler: Handler) -> Handler {
        if self.middleware.is_empty() {
            return handler;
        }

        let chain = self.middleware.clone();
        Arc::new(move |request: FallRequest| {
            let mut next = {
                let handler = handler.clone();
                Box::new(move |req: FallRequest| handler(req))
                    as Box<dyn FnOnce(FallRequest) -> NextFuture<'static> + Send>
            };

            for middleware in chain.iter().rev() {
                let middleware = middleware.clone();
                let inner = next;
                next = Box::new(move |req: FallRequest| {
                    middleware.handle(req, Next::new(inner))
                });
            }

            next(request)
        })
    }

    /// Execute the middleware pipeline with a one-off handler
    pub async fn execute<F, Fut>(&self, request: FallRequest, handler: F) -> FallResponse
    where
        F: FnOnce(FallRequest) -> Fut + Send + 'static,
        Fut: Future<Output = FallResponse> + Send + 'static,
    {
        let mut chain = Box::new(move |req: FallRequest| Box::pin(handler(req)) as NextFuture<'static>)
            as Box<dyn FnOnce(FallRequest) -> NextFuture<'static> + Send>;

        for middleware in self.middleware.iter().rev() {
            let middleware = middleware.clone();
            let next_handler = chain;
            chain = Box::new(move |req: FallRequest| {
                let next = Next::new(next_handler);
                middleware.handle(req, next)
            });
        }

        chain(request).await
    }

    /// Get number of middleware in pipeline
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Check if pipeline is empty
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Get middleware names for debugging
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }
}

impl From<Vec<Arc<dyn Middleware>>> for MiddlewarePipeline {
    fn from(middleware: Vec<Arc<dyn Middleware>>) -> Self {
        Self { middleware }
    }
}

/// Middleware built from a closure
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware").field("name", &self.name).finish()
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(FallRequest, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FallResponse> + Send + 'static,
{
    fn handle(&self, request: FallRequest, next: Next) -> NextFuture<'static> {
        Box::pin((self.f)(request, next))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Create middleware from an async closure
///
/// ```rust
/// use fall_http::{middleware_fn, MiddlewarePipeline};
///
/// let pipeline = MiddlewarePipeline::new().add(middleware_fn("tag", |req, next| async move {
///     next.run(req).await.with_header("x-tag", "1")
/// }));
/// assert_eq!(pipeline.names(), vec!["tag"]);
/// ```
pub fn middleware_fn<F, Fut>(name: &'static str, f: F) -> FnMiddleware<F>
where
    F: Fn(FallRequest, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FallResponse> + Send + 'static,
{
    FnMiddleware { name, f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::handler;
    use axum::http::{Method, StatusCode};
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    #[derive(Debug)]
    struct Recording {
        label: &'static str,
        trace: Trace,
    }

    impl Middleware for Recording {
        fn handle(&self, request: FallRequest, next: Next) -> NextFuture<'static> {
            let label = self.label;
            let trace = self.trace.clone();
            Box::pin(async move {
                trace.lock().unwrap().push(format!("{} in", label));
                let response = next.run(request).await;
                trace.lock().unwrap().push(format!("{} out", label));
                response
            })
        }

        fn name(&self) -> &'static str {
            self.label
        }
    }

    fn request() -> FallRequest {
        FallRequest::parse(Method::GET, "/").unwrap()
    }

    #[tokio::test]
    async fn test_wrap_runs_first_middleware_outermost() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let pipeline = MiddlewarePipeline::new()
            .add(Recording { label: "m1", trace: trace.clone() })
            .add(Recording { label: "m2", trace: trace.clone() });

        let inner = trace.clone();
        let wrapped = pipeline.wrap(handler(move |_req| {
            let inner = inner.clone();
            async move {
                inner.lock().unwrap().push("handler".to_string());
                FallResponse::ok()
            }
        }));

        let response = wrapped(request()).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["m1 in", "m2 in", "handler", "m2 out", "m1 out"]
        );
    }

    #[tokio::test]
    async fn test_wrapped_handler_is_reusable() {
        let pipeline = MiddlewarePipeline::new().add(middleware_fn("stamp", |req, next| async move {
            next.run(req).await.with_header("x-stamp", "yes")
        }));
        let wrapped = pipeline.wrap(handler(|_req| async { "hello" }));

        for _ in 0..3 {
            let response = wrapped(request()).await;
            assert_eq!(response.header_str("x-stamp"), Some("yes"));
        }
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let pipeline = MiddlewarePipeline::new().add(middleware_fn("deny", |_req, _next| async {
            FallResponse::with_status(StatusCode::UNAUTHORIZED)
        }));

        let response = pipeline
            .execute(request(), |_req| async { FallResponse::ok() })
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_clone_is_independent() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let parent = MiddlewarePipeline::new().add(Recording { label: "a", trace: trace.clone() });
        let mut child = parent.clone();
        child.add_mut(Recording { label: "b", trace });

        assert_eq!(parent.names(), vec!["a"]);
        assert_eq!(child.names(), vec!["a", "b"]);
    }
}
