//! Token endpoint facade and transport error mapping.
//!
//! The facade posts `application/x-www-form-urlencoded` bodies through a
//! [`TokenHttpClient`] handle and keeps the provider's JSON payload verbatim, so
//! callers can forward it unchanged and still read typed fields from it.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, AuthorizationCode, HttpClientError, HttpRequest, HttpResponse, RefreshToken,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	auth::MAX_TOKEN_LIFETIME,
	error::{ConfigError, ProviderTokenError, TransportError},
	http::{ReqwestHttpClient, TokenHttpClient},
	obs::FlowKind,
	provider::{Credentials, GrantType},
};

type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into gateway [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a gateway error.
	fn map_transport_error(&self, flow: FlowKind, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, flow: FlowKind, err: HttpClientError<ReqwestError>) -> Error {
		let _ = flow;

		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() =>
				ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other(message).into(),
			_ => TransportError::Other("unrecognized transport failure".into()).into(),
		}
	}
}

/// Token endpoint payload kept exactly as the provider sent it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenResponse(Map<String, Value>);
impl TokenResponse {
	/// Wraps a raw JSON object.
	pub fn from_raw(raw: Map<String, Value>) -> Self {
		Self(raw)
	}

	/// Raw JSON object.
	pub fn raw(&self) -> &Map<String, Value> {
		&self.0
	}

	/// Consumes the response, returning the raw JSON object.
	pub fn into_raw(self) -> Map<String, Value> {
		self.0
	}

	/// Non-empty `access_token` field.
	pub fn access_token(&self) -> Option<&str> {
		self.non_empty_str("access_token")
	}

	/// Non-empty `refresh_token` field.
	pub fn refresh_token(&self) -> Option<&str> {
		self.non_empty_str("refresh_token")
	}

	/// Positive `expires_in` seconds, accepted as a JSON number or a numeric string.
	///
	/// Values above [`MAX_TOKEN_LIFETIME`] are capped.
	pub fn expires_in(&self) -> Option<Duration> {
		let secs = match self.0.get("expires_in")? {
			Value::Number(number) =>
				number.as_i64().or_else(|| number.as_f64().map(|value| value as i64))?,
			Value::String(text) => text.trim().parse::<i64>().ok()?,
			_ => return None,
		};

		(secs > 0).then(|| Duration::seconds(secs).min(MAX_TOKEN_LIFETIME))
	}

	/// OAuth `error` field.
	pub fn error(&self) -> Option<&str> {
		self.non_empty_str("error")
	}

	/// OAuth `error_description` field.
	pub fn error_description(&self) -> Option<&str> {
		self.non_empty_str("error_description")
	}

	fn non_empty_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str).filter(|value| !value.is_empty())
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let keys = self.0.keys().map(String::as_str).collect::<Vec<_>>();

		f.debug_struct("TokenResponse").field("keys", &keys).finish()
	}
}

/// Form-post client for the provider's token endpoint.
pub(crate) struct TokenEndpoint<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	token_url: Url,
	credentials: Credentials,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenEndpoint<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		token_url: Url,
		credentials: Credentials,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Self {
		Self { token_url, credentials, http_client, error_mapper }
	}

	/// `grant_type=authorization_code` exchange.
	pub(crate) fn exchange_code<'a>(
		&'a self,
		code: &'a AuthorizationCode,
	) -> FacadeFuture<'a, TokenResponse> {
		Box::pin(async move {
			let params = [
				("code", code.secret().as_str()),
				("client_id", self.credentials.client_id.as_str()),
				("client_secret", self.credentials.client_secret.secret().as_str()),
				("redirect_uri", self.credentials.redirect_uri.as_str()),
				("grant_type", GrantType::AuthorizationCode.as_str()),
			];

			self.post(GrantType::AuthorizationCode, FlowKind::AuthorizationCode, &params).await
		})
	}

	/// `grant_type=refresh_token` exchange.
	pub(crate) fn refresh<'a>(
		&'a self,
		refresh_token: &'a RefreshToken,
	) -> FacadeFuture<'a, TokenResponse> {
		Box::pin(async move {
			let params = [
				("refresh_token", refresh_token.secret().as_str()),
				("client_id", self.credentials.client_id.as_str()),
				("client_secret", self.credentials.client_secret.secret().as_str()),
				("grant_type", GrantType::RefreshToken.as_str()),
				("redirect_uri", self.credentials.redirect_uri.as_str()),
			];

			self.post(GrantType::RefreshToken, FlowKind::Refresh, &params).await
		})
	}

	async fn post(
		&self,
		grant: GrantType,
		flow: FlowKind,
		params: &[(&str, &str)],
	) -> Result<TokenResponse> {
		let body = FormSerializer::new(String::new()).extend_pairs(params).finish();
		let request: HttpRequest = Request::builder()
			.method(Method::POST)
			.uri(self.token_url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let handle = self.http_client.handle();
		let response = handle
			.call(request)
			.await
			.map_err(|e| self.error_mapper.map_transport_error(flow, e))?;

		interpret_token_response(grant, response)
	}
}

fn interpret_token_response(grant: GrantType, response: HttpResponse) -> Result<TokenResponse> {
	let status = response.status();
	let payload = TokenResponse::from_raw(parse_json(status.as_u16(), response.body())?);

	if !status.is_success() || payload.access_token().is_none() {
		return Err(ProviderTokenError {
			grant,
			status: status.as_u16(),
			error: payload.error().map(ToOwned::to_owned),
			error_description: payload.error_description().map(ToOwned::to_owned),
		}
		.into());
	}

	Ok(payload)
}

/// Parses a provider body as JSON; the body itself never leaves this function.
pub(crate) fn parse_json<T>(status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| Error::InvalidProviderResponse { source, status })
}
