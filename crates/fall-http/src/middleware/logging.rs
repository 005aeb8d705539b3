//! # Logging Middleware
//!
//! HTTP request/response logging middleware for observability.

use crate::foundation::NextFuture;
use crate::request::FallRequest;
use std::time::Instant;
use tracing::{info, warn};

use super::pipeline::{Middleware, Next};

/// Logs each request on entry and its status and latency on exit
#[derive(Debug, Default, Clone)]
pub struct LoggingMiddleware {
    log_headers: bool,
}

impl LoggingMiddleware {
    /// Create new logging middleware with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log request headers at debug level, skipping sensitive ones
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(&self, request: FallRequest, next: Next) -> NextFuture<'static> {
        let log_headers = self.log_headers;
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method.clone();
            let uri = request.uri.clone();
            let remote = request
                .remote_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| "-".to_string());

            info!(remote = %remote, method = %method, uri = %uri, "→ request");
            if log_headers {
                for (name, value) in request.headers.iter() {
                    if !is_sensitive_header(name.as_str()) {
                        if let Ok(value) = value.to_str() {
                            tracing::debug!("  {}: {}", name, value);
                        }
                    }
                }
            }

            let response = next.run(request).await;

            let status = response.status_code();
            let latency_ms = start.elapsed().as_millis() as u64;
            if status.is_server_error() {
                warn!(method = %method, uri = %uri, status = status.as_u16(), latency_ms, "← response");
            } else {
                info!(method = %method, uri = %uri, status = status.as_u16(), latency_ms, "← response");
            }

            response
        })
    }

    fn name(&self) -> &'static str {
        "LoggingMiddleware"
    }
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization" | "cookie" | "set-cookie" | "x-api-key" | "x-auth-token"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewarePipeline;
    use crate::response::FallResponse;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_logging_middleware_passes_response_through() {
        let pipeline = MiddlewarePipeline::new().add(LoggingMiddleware::new().with_headers());
        let request = FallRequest::parse(Method::GET, "/ping")
            .unwrap()
            .with_header("authorization", "Bearer secret")
            .unwrap();

        let response = pipeline
            .execute(request, |_req| async { FallResponse::created() })
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    #[test]
    fn test_sensitive_headers() {
        assert!(is_sensitive_header("Authorization"));
        assert!(is_sensitive_header("cookie"));
        assert!(!is_sensitive_header("accept"));
    }
}
