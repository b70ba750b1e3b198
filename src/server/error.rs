//! Mapping from gateway errors to HTTP responses.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
// self
use crate::{_prelude::*, error::TransportError};

/// Message returned when the provider answers with something other than JSON.
pub const INVALID_JSON_MESSAGE: &str = "Server returned invalid JSON.";
/// Message returned for failures that must not leak detail.
pub const INTERNAL_MESSAGE: &str = "Internal server error.";
/// Message returned when a code exchange fails without a provider `error` field.
pub const EXCHANGE_FAILED_MESSAGE: &str = "Failed to exchange authorization code for tokens.";

/// JSON body of every failed request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Caller-facing message.
	pub error: String,
	/// Provider-supplied description, when one exists.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}
impl ErrorBody {
	/// Body with only a message.
	pub fn new(error: impl Into<String>) -> Self {
		Self { error: error.into(), error_description: None }
	}
}

/// [`Error`] adapter implementing [`IntoResponse`].
#[derive(Debug)]
pub struct ApiError(pub Error);
impl ApiError {
	/// Status code and body for the wrapped error.
	pub fn parts(&self) -> (StatusCode, ErrorBody) {
		match &self.0 {
			Error::Validation { message } =>
				(StatusCode::BAD_REQUEST, ErrorBody::new(message.as_str())),
			Error::Unauthorized { message } =>
				(StatusCode::UNAUTHORIZED, ErrorBody::new(message.as_str())),
			Error::ProviderToken(inner) => {
				let status = StatusCode::from_u16(inner.status)
					.ok()
					.filter(|status| status.is_client_error() || status.is_server_error())
					.unwrap_or(StatusCode::BAD_REQUEST);
				let body = ErrorBody {
					error: inner.error.clone().unwrap_or_else(|| EXCHANGE_FAILED_MESSAGE.into()),
					error_description: inner.error_description.clone(),
				};

				(status, body)
			},
			Error::TokenRefresh { .. } =>
				(StatusCode::BAD_GATEWAY, ErrorBody::new(self.0.to_string())),
			Error::InvalidProviderResponse { .. } =>
				(StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(INVALID_JSON_MESSAGE)),
			Error::Upstream { status, message } => (
				StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
				ErrorBody::new(message.as_str()),
			),
			Error::Transport(TransportError::Timeout { .. }) =>
				(StatusCode::GATEWAY_TIMEOUT, ErrorBody::new(self.0.to_string())),
			Error::Transport(_) => (StatusCode::BAD_GATEWAY, ErrorBody::new(self.0.to_string())),
			Error::Config(_) | Error::Storage(_) =>
				(StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(INTERNAL_MESSAGE)),
		}
	}
}
impl<E> From<E> for ApiError
where
	E: Into<Error>,
{
	fn from(err: E) -> Self {
		Self(err.into())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, body) = self.parts();

		#[cfg(feature = "tracing")]
		{
			if status.is_server_error() {
				tracing::error!(status = status.as_u16(), error = %self.0, "Request failed.");
			} else {
				tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected.");
			}
		}

		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::ProviderTokenError, provider::GrantType};

	fn provider_error(status: u16, error: Option<&str>) -> ApiError {
		ApiError(
			ProviderTokenError {
				grant: GrantType::AuthorizationCode,
				status,
				error: error.map(ToOwned::to_owned),
				error_description: None,
			}
			.into(),
		)
	}

	#[test]
	fn provider_errors_pass_status_through() {
		let (status, body) = provider_error(401, Some("invalid_client")).parts();

		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body.error, "invalid_client");

		let (status, body) = provider_error(200, None).parts();

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body.error, EXCHANGE_FAILED_MESSAGE);
	}

	#[test]
	fn internal_failures_hide_detail() {
		let (status, body) =
			ApiError(crate::store::StoreError::Backend { message: "disk on fire".into() }.into())
				.parts();

		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, ErrorBody::new(INTERNAL_MESSAGE));
	}

	#[test]
	fn upstream_and_validation_statuses() {
		let (status, body) =
			ApiError(Error::Upstream { status: 404, message: "Customer not found".into() }).parts();

		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body.error, "Customer not found");

		let (status, _) = ApiError(Error::validation("Missing authorization code")).parts();

		assert_eq!(status, StatusCode::BAD_REQUEST);

		let (status, _) =
			ApiError(Error::TokenRefresh { reason: "invalid_code".into(), status: Some(400) })
				.parts();

		assert_eq!(status, StatusCode::BAD_GATEWAY);
	}
}
