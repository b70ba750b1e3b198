//! Token lifecycle and resource flows orchestrated by the [`Gateway`].

pub mod customer;
pub mod exchange;
pub mod token;

mod metrics;

pub use customer::*;
pub use metrics::RefreshMetrics;

// crates.io
use oauth2::{AsyncHttpClient, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	error::ConfigError,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TokenEndpoint, TokenResponse, TransportErrorMapper},
	obs::FlowKind,
	provider::{Credentials, ProviderDescriptor},
	store::TokenStore,
};

/// Gateway specialized for the crate's default reqwest transport stack.
pub type ReqwestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Owns the token cache and every outbound call made on behalf of the user.
///
/// A gateway pairs one provider descriptor with one client registration and one
/// single-slot token store. Exchanges, refreshes, and resource calls all go through
/// the same transport so they share timeouts and error mapping. Refreshes are
/// serialized by an async guard so concurrent callers observe one refresh.
#[derive(Clone)]
pub struct Gateway<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token store holding the single live record.
	pub store: Arc<dyn TokenStore>,
	/// Provider descriptor that defines endpoints and header formats.
	pub descriptor: ProviderDescriptor,
	/// Static client registration.
	pub credentials: Credentials,
	/// Long-lived refresh token from configuration, used when the cache has none.
	pub refresh_token: Option<TokenSecret>,
	/// Shared metrics recorder for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	token_endpoint: Arc<TokenEndpoint<C, M>>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> Gateway<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a gateway that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		descriptor: ProviderDescriptor,
		credentials: Credentials,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let token_endpoint = Arc::new(TokenEndpoint::new(
			descriptor.endpoints.token.clone(),
			credentials.clone(),
			http_client.clone(),
			transport_mapper.clone(),
		));

		Self {
			http_client,
			transport_mapper,
			store,
			descriptor,
			credentials,
			refresh_token: None,
			refresh_metrics: Default::default(),
			token_endpoint,
			refresh_guard: Default::default(),
		}
	}

	/// Sets the configured refresh token used when the cached record carries none.
	pub fn with_refresh_token(mut self, secret: impl Into<String>) -> Self {
		let secret = TokenSecret::new(secret);

		self.refresh_token = (!secret.is_empty()).then_some(secret);

		self
	}

	/// Consent-screen URL for the given `state` (the user's email).
	pub fn authorization_url(&self, state: &str) -> Url {
		self.descriptor.authorization_url(&self.credentials, state)
	}

	pub(crate) async fn send_once(
		&self,
		flow: FlowKind,
		request: HttpRequest,
	) -> Result<HttpResponse> {
		let handle = self.http_client.handle();

		handle.call(request).await.map_err(|e| self.transport_mapper.map_transport_error(flow, e))
	}
}
impl ReqwestGateway {
	/// Creates a gateway with its own reqwest transport bounded by `timeout`.
	pub fn new(
		store: Arc<dyn TokenStore>,
		descriptor: ProviderDescriptor,
		credentials: Credentials,
		timeout: std::time::Duration,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(timeout)?;

		Ok(Self::with_http_client(
			store,
			descriptor,
			credentials,
			http_client,
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> Debug for Gateway<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("descriptor", &self.descriptor)
			.field("credentials", &self.credentials)
			.field("refresh_token_set", &self.refresh_token.is_some())
			.finish()
	}
}

/// Builds the cache record for a token payload received at `issued_at`.
///
/// `fallback_refresh` is kept when the provider does not rotate the refresh token.
pub(crate) fn record_from_response(
	response: &TokenResponse,
	fallback_refresh: Option<TokenSecret>,
	issued_at: OffsetDateTime,
) -> Result<TokenRecord> {
	let mut builder = TokenRecord::builder()
		.issued_at(issued_at)
		.maybe_refresh_token(fallback_refresh)
		.maybe_refresh_token(response.refresh_token().map(TokenSecret::new));

	if let Some(access) = response.access_token() {
		builder = builder.access_token(access);
	}
	if let Some(lifetime) = response.expires_in() {
		builder = builder.expires_in(lifetime);
	}

	builder.default_lifetime().build().map_err(|e| ConfigError::from(e).into())
}
