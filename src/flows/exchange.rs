//! Authorization code exchange.

// crates.io
use oauth2::AuthorizationCode;
// self
use crate::{
	_prelude::*,
	flows::{Gateway, record_from_response},
	http::TokenHttpClient,
	oauth::{TokenResponse, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> Gateway<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code and replaces the cached token with the result.
	///
	/// The provider payload is returned verbatim. Codes are single use; reuse is
	/// rejected by the provider and surfaces as [`Error::ProviderToken`].
	pub async fn exchange_code(&self, code: &AuthorizationCode) -> Result<TokenResponse> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if code.secret().trim().is_empty() {
					return Err(Error::validation("Missing authorization code"));
				}

				let response = self.token_endpoint.exchange_code(code).await?;
				let record = record_from_response(&response, None, OffsetDateTime::now_utc())?;
				// Serialized with refreshes.
				let _singleflight = self.refresh_guard.lock().await;

				self.store.save(record).await?;

				#[cfg(feature = "tracing")]
				tracing::info!("Authorization code exchanged.");

				Ok(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
