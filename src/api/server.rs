//! API server lifecycle — binds the listener, mounts `api_router()`, and
//! runs until a shutdown signal arrives.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, ctx: ApiContext) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, ctx, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// Factored out from `serve` so tests can bind an ephemeral port and
/// control shutdown.
pub async fn serve_on<F>(listener: TcpListener, ctx: ApiContext, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "API server started");

    axum::serve(listener, api_router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Cannot listen for shutdown signal: {e}"),
    }
}
