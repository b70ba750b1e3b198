//! Cached token record, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Lifetime applied when the provider omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::seconds(3_600);
/// Upper bound on any provider-reported lifetime.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::days(365);

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is currently valid.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the access token value is empty.
	#[error("Access token cannot be empty.")]
	EmptyAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the expiry instant cannot be represented.
	#[error("Expiry is out of range.")]
	ExpiryOutOfRange,
}

/// The single live access token held by the gateway.
///
/// Records are replaced wholesale on every successful exchange or refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant at which the gateway received the token.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `issued_at` plus `expires_in`.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at { TokenStatus::Expired } else { TokenStatus::Active }
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TokenStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the record is usable at the provided instant.
	pub fn is_active_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Active)
	}

	/// Returns `true` if the record is usable right now.
	pub fn is_active(&self) -> bool {
		matches!(self.status(), TokenStatus::Active)
	}

	/// Expiry expressed as Unix epoch milliseconds.
	pub fn expires_at_epoch_millis(&self) -> i128 {
		self.expires_at.unix_timestamp_nanos() / 1_000_000
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Applies [`DEFAULT_TOKEN_LIFETIME`] unless an expiry was already configured.
	pub fn default_lifetime(mut self) -> Self {
		if self.expires_at.is_none() && self.expires_in.is_none() {
			self.expires_in = Some(DEFAULT_TOKEN_LIFETIME);
		}

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides an optional refresh token secret, keeping any value set earlier on `None`.
	pub fn maybe_refresh_token(mut self, token: Option<TokenSecret>) -> Self {
		if token.is_some() {
			self.refresh_token = token;
		}

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;

		if access_token.is_empty() {
			return Err(TokenRecordBuilderError::EmptyAccessToken);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(TokenRecordBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		Ok(TokenRecord { access_token, refresh_token: self.refresh_token, issued_at, expires_at })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn status_flips_at_expiry_instant() {
		let record = TokenRecord::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_at(macros::datetime!(2025-01-01 01:00 UTC))
			.build()
			.expect("Token record builder should succeed for status transitions.");

		assert_eq!(record.status_at(macros::datetime!(2025-01-01 00:30 UTC)), TokenStatus::Active);
		assert_eq!(record.status_at(macros::datetime!(2025-01-01 01:00 UTC)), TokenStatus::Expired);
		assert!(!record.is_active_at(macros::datetime!(2025-01-02 00:00 UTC)));
	}

	#[test]
	fn default_lifetime_is_one_hour() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let record = TokenRecord::builder()
			.access_token("secret")
			.issued_at(issued)
			.default_lifetime()
			.build()
			.expect("Default lifetime should produce a record.");

		assert_eq!(record.expires_at - record.issued_at, Duration::seconds(3_600));
		assert_eq!(record.expires_at_epoch_millis(), 1_735_693_200_000);

		let explicit = TokenRecord::builder()
			.access_token("secret")
			.issued_at(issued)
			.expires_in(Duration::minutes(30))
			.default_lifetime()
			.build()
			.expect("Explicit lifetime should win over the default.");

		assert_eq!(explicit.expires_at, macros::datetime!(2025-01-01 00:30 UTC));
	}

	#[test]
	fn builder_rejects_missing_or_empty_values() {
		assert_eq!(
			TokenRecord::builder().default_lifetime().build().err(),
			Some(TokenRecordBuilderError::MissingAccessToken)
		);
		assert_eq!(
			TokenRecord::builder().access_token("").default_lifetime().build().err(),
			Some(TokenRecordBuilderError::EmptyAccessToken)
		);
		assert_eq!(
			TokenRecord::builder().access_token("a").build().err(),
			Some(TokenRecordBuilderError::MissingExpiry)
		);
	}

	#[test]
	fn unrepresentable_expiry_is_an_error() {
		let err = TokenRecord::builder()
			.access_token("a")
			.expires_in(Duration::seconds(i64::MAX))
			.build()
			.expect_err("Overflowing expiry must not build.");

		assert_eq!(err, TokenRecordBuilderError::ExpiryOutOfRange);
	}

	#[test]
	fn maybe_refresh_token_keeps_previous_value() {
		let record = TokenRecord::builder()
			.access_token("a")
			.refresh_token("carried")
			.maybe_refresh_token(None)
			.default_lifetime()
			.build()
			.expect("Record with carried refresh token should build.");

		assert_eq!(record.refresh_token.as_ref().map(TokenSecret::expose), Some("carried"));
		assert!(format!("{record:?}").contains("<redacted>"));
		assert!(!format!("{record:?}").contains("carried"));
	}
}
