//! Token provider: cached access tokens with single-flight refresh.
//!
//! [`Gateway::access_token`] answers from the store while the cached record is
//! active and otherwise refreshes it. [`Gateway::refresh_access_token`] performs
//! the `grant_type=refresh_token` call under the gateway's refresh guard; callers
//! that queued behind another refresh reuse its result instead of calling the
//! provider again.

// crates.io
use oauth2::RefreshToken;
// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	error::ConfigError,
	flows::{Gateway, record_from_response},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> Gateway<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a usable access token, refreshing when the cache is empty or expired.
	///
	/// A valid cached token is returned without any network call.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		if let Some(record) = self.store.load().await?
			&& record.is_active()
		{
			return Ok(record.access_token);
		}

		self.refresh_access_token(None).await.map(|record| record.access_token)
	}

	/// Refreshes the cached access token, bypassing the expiry check.
	///
	/// `rejected` names the token a resource server just refused. When another caller
	/// already replaced it (or, with `None`, already produced any active record) while
	/// this one waited for the guard, that record is returned as is.
	///
	/// The refresh token is taken from the cached record when the provider issued one,
	/// otherwise from the configuration.
	pub async fn refresh_access_token(
		&self,
		rejected: Option<&TokenSecret>,
	) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _singleflight = self.refresh_guard.lock().await;
				let current = self.store.load().await.inspect_err(|_| {
					self.refresh_metrics.record_failure();
				})?;

				if let Some(record) = current.as_ref()
					&& record.is_active()
					&& rejected.is_none_or(|token| token != &record.access_token)
				{
					#[cfg(feature = "tracing")]
					tracing::debug!("Reusing access token refreshed by a concurrent caller.");

					self.refresh_metrics.record_reuse();

					return Ok(record.clone());
				}

				let refresh_secret = current
					.and_then(|record| record.refresh_token)
					.or_else(|| self.refresh_token.clone())
					.ok_or_else(|| {
						self.refresh_metrics.record_failure();

						Error::from(ConfigError::MissingRefreshToken)
					})?;
				let response = self
					.token_endpoint
					.refresh(&RefreshToken::new(refresh_secret.expose().to_owned()))
					.await
					.map_err(|err| {
						self.refresh_metrics.record_failure();

						into_refresh_error(err)
					})?;
				let record =
					record_from_response(&response, Some(refresh_secret), OffsetDateTime::now_utc())
						.inspect_err(|_| {
							self.refresh_metrics.record_failure();
						})?;

				self.store.save(record.clone()).await.inspect_err(|_| {
					self.refresh_metrics.record_failure();
				})?;
				self.refresh_metrics.record_success();

				#[cfg(feature = "tracing")]
				tracing::info!(expires_at = %record.expires_at, "Access token refreshed.");

				Ok(record)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Seeds an empty cache with an access token obtained out of band.
	///
	/// The token gets the default lifetime. An occupied cache is left untouched and
	/// `false` is returned.
	pub async fn seed_access_token(&self, token: impl Into<String>) -> Result<bool> {
		let record = TokenRecord::builder()
			.access_token(token)
			.default_lifetime()
			.build()
			.map_err(ConfigError::from)?;

		Ok(self.store.save_if_empty(record).await?)
	}
}

fn into_refresh_error(err: Error) -> Error {
	match err {
		Error::ProviderToken(inner) => Error::TokenRefresh {
			reason: inner.reason().unwrap_or("token endpoint returned no access token").to_owned(),
			status: Some(inner.status),
		},
		other => other,
	}
}
