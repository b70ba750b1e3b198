//! Billing OAuth gateway server.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use billing_oauth_gateway::{
	config::GatewayConfig,
	server::{self, AppState},
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let config = GatewayConfig::from_env()?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let gateway = config.build_gateway(store)?;

	if let Some(token) = config.access_token.as_deref()
		&& gateway.seed_access_token(token).await?
	{
		tracing::info!("Seeded access token from the environment.");
	}

	tracing::debug!(?config, "Configuration loaded.");

	server::serve(config.bind_addr, server::router(AppState::new(gateway))).await?;

	Ok(())
}
