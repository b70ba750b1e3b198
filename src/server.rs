//! HTTP surface: the token exchange and customer endpoints plus the flow page.
//!
//! Available with the `server` feature. Every route answers unsupported methods with
//! `405 {"error":"Method not allowed"}` and every failure with a JSON `{error}` body.

pub mod error;
pub mod handlers;
pub mod page;

pub use error::{ApiError, ErrorBody};

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Router,
	routing::{get, post},
};
use tokio::net::TcpListener;
// self
use crate::{_prelude::*, flows::ReqwestGateway};

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Gateway owning the token cache and provider transport.
	pub gateway: Arc<ReqwestGateway>,
}
impl AppState {
	/// Wraps a gateway for use as router state.
	pub fn new(gateway: impl Into<Arc<ReqwestGateway>>) -> Self {
		Self { gateway: gateway.into() }
	}
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(page::index).fallback(handlers::method_not_allowed))
		.route(
			"/oauth/token",
			post(handlers::exchange_token).fallback(handlers::method_not_allowed),
		)
		.route(
			"/oauth/authorize",
			get(handlers::authorize).fallback(handlers::method_not_allowed),
		)
		.route("/customers", get(handlers::get_customers).fallback(handlers::method_not_allowed))
		.with_state(state)
}

/// Binds `addr` and serves `router` until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
	let listener = TcpListener::bind(addr).await?;

	#[cfg(feature = "tracing")]
	tracing::info!(addr = %listener.local_addr()?, "Billing gateway listening.");

	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
	if tokio::signal::ctrl_c().await.is_err() {
		std::future::pending::<()>().await;
	}

	#[cfg(feature = "tracing")]
	tracing::info!("Shutdown signal received.");
}
