//! Authenticated resource calls and the customer lookup built on them.

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		Method, Request, StatusCode,
		header::{ACCEPT, AUTHORIZATION},
	},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{CustomerEmail, TokenSecret},
	error::ConfigError,
	flows::Gateway,
	http::TokenHttpClient,
	oauth::{TransportErrorMapper, parse_json},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Message used when the resource API gives no `message` of its own.
pub const DEFAULT_UPSTREAM_MESSAGE: &str = "Failed to fetch customer data.";

/// Customer lookup payload passed through exactly as the provider returned it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerRecord(Value);
impl CustomerRecord {
	/// Wraps a raw JSON value.
	pub fn from_raw(raw: Value) -> Self {
		Self(raw)
	}

	/// Raw JSON value.
	pub fn raw(&self) -> &Value {
		&self.0
	}

	/// Consumes the record, returning the raw JSON value.
	pub fn into_raw(self) -> Value {
		self.0
	}

	/// Entries of the `customers` array; empty when absent.
	pub fn customers(&self) -> &[Value] {
		self.0.get("customers").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
	}
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends a resource request with the cached access token.
	///
	/// `build` is called once per attempt with the token to place in the request. A
	/// 401 triggers exactly one forced refresh and one retry; the retry's response is
	/// returned whatever its status. When the refresh itself is refused or impossible,
	/// the original 401 is returned instead.
	pub async fn send_authenticated<F>(&self, flow: FlowKind, build: F) -> Result<HttpResponse>
	where
		F: Send + Sync + Fn(&TokenSecret) -> Result<HttpRequest>,
	{
		let token = self.access_token().await?;
		let response = self.send_once(flow, build(&token)?).await?;

		if response.status() != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}

		#[cfg(feature = "tracing")]
		tracing::info!(
			flow = flow.as_str(),
			"Resource API rejected the access token; refreshing once."
		);

		let refreshed = match self.refresh_access_token(Some(&token)).await {
			Ok(record) => record,
			Err(Error::Config(ConfigError::MissingRefreshToken) | Error::TokenRefresh { .. }) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					flow = flow.as_str(),
					"Refresh after a 401 failed; keeping the 401."
				);

				return Ok(response);
			},
			Err(err) => return Err(err),
		};

		self.send_once(flow, build(&refreshed.access_token)?).await
	}

	/// Looks up customers by email.
	///
	/// Non-2xx answers (including a second 401) become [`Error::Upstream`] carrying the
	/// provider's `message` when it sent one.
	pub async fn get_customer(&self, email: &CustomerEmail) -> Result<CustomerRecord> {
		const KIND: FlowKind = FlowKind::CustomerLookup;

		let span = FlowSpan::new(KIND, "get_customer");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = self.descriptor.customer_lookup_url(email);
				let response = self
					.send_authenticated(KIND, |token| self.resource_request(&url, token))
					.await?;
				let status = response.status();

				if !status.is_success() {
					#[cfg(feature = "tracing")]
					tracing::warn!(status = status.as_u16(), "Customer lookup failed upstream.");

					return Err(Error::Upstream {
						status: status.as_u16(),
						message: upstream_message(response.body()),
					});
				}

				parse_json(status.as_u16(), response.body())
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	fn resource_request(&self, url: &Url, token: &TokenSecret) -> Result<HttpRequest> {
		let mut builder = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, token.authorization_value(self.descriptor.auth_scheme.as_str()))
			.header(ACCEPT, "application/json");

		if let Some((name, value)) = self.descriptor.org_header() {
			builder = builder.header(name, value);
		}

		builder.body(Vec::new()).map_err(|e| ConfigError::from(e).into())
	}
}

fn upstream_message(body: &[u8]) -> String {
	serde_json::from_slice::<Value>(body)
		.ok()
		.and_then(|value| value.get("message").and_then(Value::as_str).map(ToOwned::to_owned))
		.filter(|message| !message.is_empty())
		.unwrap_or_else(|| DEFAULT_UPSTREAM_MESSAGE.to_owned())
}
