//! Handler and future aliases shared by the router and middleware

use crate::request::FallRequest;
use crate::response::{FallResponse, IntoFallResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future produced by handlers and middleware
pub type NextFuture<'a> = Pin<Box<dyn Future<Output = FallResponse> + Send + 'a>>;

/// Terminal request handler, shareable across concurrent dispatches
pub type Handler = Arc<dyn Fn(FallRequest) -> NextFuture<'static> + Send + Sync>;

/// Box an async function into a [`Handler`]
///
/// Any return type implementing [`IntoFallResponse`] is accepted, so
/// handlers may return `HttpResult<FallResponse>`, strings, or status codes.
pub fn handler<F, Fut, R>(f: F) -> Handler
where
    F: Fn(FallRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFallResponse + 'static,
{
    Arc::new(move |request: FallRequest| {
        let fut = f(request);
        Box::pin(async move { fut.await.into_response() }) as NextFuture<'static>
    })
}
