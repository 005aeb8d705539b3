//! Server lifecycle management - startup, shutdown, and signal handling

use super::app::App;
use crate::errors::{HttpError, HttpResult};
use crate::request::FallRequest;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Build the internal Axum router (hidden from users)
///
/// Every request goes through a single fallback that converts it into a
/// [`FallRequest`] and hands it to the application's router.
pub(crate) fn build_internal_router(app: Arc<App>, max_request_size: usize) -> axum::Router {
    axum::Router::new().fallback(move |request: axum::extract::Request| {
        let app = app.clone();
        async move {
            let response = match FallRequest::from_axum_request(request, max_request_size).await {
                Ok(request) => app.dispatch(request).await,
                Err(error) => error.into_response(),
            };
            response.into_axum_response()
        }
    })
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM
pub async fn start_server(
    addr: SocketAddr,
    router: axum::Router,
    shutdown_timeout: Duration,
) -> HttpResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| HttpError::startup(format!("Failed to bind to {}: {}", addr, e)))?;

    serve_with_shutdown(listener, router, shutdown_signal(), shutdown_timeout).await
}

/// Serve on an already bound listener until `signal` completes
///
/// In-flight requests get `shutdown_timeout` to finish once the signal fires.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    router: axum::Router,
    signal: F,
    shutdown_timeout: Duration,
) -> HttpResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| HttpError::startup(format!("Listener has no local address: {}", e)))?;
    info!("HTTP Server started, listening on {}", addr);

    let signalled = Arc::new(Notify::new());
    let trigger = signalled.clone();
    let serve = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            signal.await;
            trigger.notify_one();
        })
        .into_future();
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => {
            return result.map_err(|e| HttpError::internal(format!("Server error: {}", e)));
        }
        _ = signalled.notified() => {}
    }

    match tokio::time::timeout(shutdown_timeout, &mut serve).await {
        Ok(result) => {
            result.map_err(|e| HttpError::internal(format!("Server error: {}", e)))?;
            info!("Server shut down gracefully");
        }
        Err(_) => {
            warn!(
                "Shutdown timeout of {:?} elapsed, dropping open connections",
                shutdown_timeout
            );
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            warn!("Received terminate signal, shutting down gracefully...");
        },
    }
}
