//! OAuth 2.0 gateway for billing providers: authorization-code exchange, a cached access
//! token with single-flight refresh, and customer lookups that recover from one 401.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
#[cfg(feature = "server")] pub mod server;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use std::collections::{BTreeMap, HashMap};

	pub use parking_lot::Mutex;

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::ProviderId,
		flows::ReqwestGateway,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{ApiFamily, Credentials, ProviderDescriptor},
		store::{MemoryStore, TokenStore},
	};

	/// Client identifier used by test gateways.
	pub const TEST_CLIENT_ID: &str = "client-test";
	/// Client secret used by test gateways.
	pub const TEST_CLIENT_SECRET: &str = "secret-test";
	/// Redirect URI used by test gateways.
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Descriptor whose token and customer endpoints live under `base` (an `https://` mock
	/// server origin).
	pub fn test_descriptor(base: &str) -> ProviderDescriptor {
		let base = base.trim_end_matches('/');
		let url = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Mock endpoint URL should parse.")
		};

		ProviderDescriptor::builder(
			ProviderId::new("mock-billing").expect("Mock provider identifier should be valid."),
		)
		.api_family(ApiFamily::Subscriptions)
		.authorization_endpoint(url("/oauth/v2/auth"))
		.token_endpoint(url("/oauth/v2/token"))
		.customers_endpoint(url("/api/v1/customers"))
		.build()
		.expect("Mock descriptor should build.")
	}

	/// Credentials matching the `TEST_*` constants.
	pub fn test_credentials() -> Credentials {
		Credentials::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_REDIRECT_URI)
			.expect("Test credentials should be valid.")
	}

	/// Constructs a [`ReqwestGateway`] backed by an in-memory store and the insecure reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_gateway(
		descriptor: ProviderDescriptor,
		credentials: Credentials,
	) -> (ReqwestGateway, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let gateway = ReqwestGateway::with_http_client(
			store,
			descriptor,
			credentials,
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		);

		(gateway, store_backend)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(feature = "server")] use {color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use {httpmock as _, tower as _};
