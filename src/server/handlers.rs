//! JSON endpoints.

// crates.io
use axum::{
	Json,
	extract::{
		Query, State,
		rejection::{JsonRejection, QueryRejection},
	},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::Redirect,
};
use oauth2::AuthorizationCode;
// self
use crate::{
	_prelude::*,
	auth::CustomerEmail,
	flows::CustomerRecord,
	oauth::TokenResponse,
	provider::AuthScheme,
	server::{AppState, ApiError, ErrorBody},
};

/// Message returned when `POST /oauth/token` carries no code.
pub const MISSING_CODE_MESSAGE: &str = "Missing authorization code";
/// Message returned when a lookup carries no email.
pub const MISSING_EMAIL_MESSAGE: &str = "Email query parameter is required";
/// Message returned when the inbound `Authorization` header is unusable.
pub const INVALID_AUTHORIZATION_MESSAGE: &str = "Missing or invalid Authorization header.";
/// Message returned for unsupported methods.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// Body of `POST /oauth/token`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExchangeRequest {
	/// Authorization code received on the redirect URI.
	#[serde(default)]
	pub code: Option<String>,
}

/// Query of the endpoints keyed by the user's email.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmailQuery {
	/// Customer email.
	#[serde(default)]
	pub email: Option<String>,
}
impl EmailQuery {
	fn require(self) -> Result<CustomerEmail> {
		let raw = self
			.email
			.map(|email| email.trim().to_owned())
			.filter(|email| !email.is_empty())
			.ok_or_else(|| Error::validation(MISSING_EMAIL_MESSAGE))?;

		CustomerEmail::new(raw).map_err(|e| Error::validation(e.to_string()))
	}
}

/// `POST /oauth/token`: exchanges the code and returns the provider payload unchanged.
pub async fn exchange_token(
	State(state): State<AppState>,
	payload: Result<Json<ExchangeRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
	let Json(request) = payload.map_err(|rejection| match rejection {
		JsonRejection::MissingJsonContentType(_) => Error::validation(MISSING_CODE_MESSAGE),
		other => Error::validation(other.body_text()),
	})?;
	let code = request
		.code
		.filter(|code| !code.trim().is_empty())
		.ok_or_else(|| Error::validation(MISSING_CODE_MESSAGE))?;
	let response = state.gateway.exchange_code(&AuthorizationCode::new(code)).await?;

	Ok(Json(response))
}

/// `GET /customers?email=`: customer lookup through the gateway's token cache.
///
/// The presented token seeds the cache when the gateway holds none yet; otherwise the
/// cached token is used.
pub async fn get_customers(
	State(state): State<AppState>,
	headers: HeaderMap,
	query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<CustomerRecord>, ApiError> {
	let email = query.map(|Query(query)| query).unwrap_or_default().require()?;
	let presented = presented_token(&headers, &state.gateway.descriptor.auth_scheme)?;

	state.gateway.seed_access_token(presented).await?;

	let record = state.gateway.get_customer(&email).await?;

	Ok(Json(record))
}

/// `GET /oauth/authorize?email=`: redirects to the provider consent screen.
pub async fn authorize(
	State(state): State<AppState>,
	query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Redirect, ApiError> {
	let email = query.map(|Query(query)| query).unwrap_or_default().require()?;

	Ok(Redirect::to(state.gateway.authorization_url(&email).as_str()))
}

/// Fallback for unsupported methods on known routes.
pub async fn method_not_allowed() -> (StatusCode, Json<ErrorBody>) {
	(StatusCode::METHOD_NOT_ALLOWED, Json(ErrorBody::new(METHOD_NOT_ALLOWED_MESSAGE)))
}

/// Extracts `<scheme> <token>` where the scheme is `Bearer` or the configured one.
fn presented_token(headers: &HeaderMap, configured: &AuthScheme) -> Result<String> {
	let invalid = || Error::unauthorized(INVALID_AUTHORIZATION_MESSAGE);
	let value = headers.get(AUTHORIZATION).ok_or_else(invalid)?.to_str().map_err(|_| invalid())?;
	let (scheme, token) = value.trim().split_once(' ').ok_or_else(invalid)?;
	let token = token.trim();
	let scheme_ok = scheme.eq_ignore_ascii_case(AuthScheme::Bearer.as_str())
		|| scheme.eq_ignore_ascii_case(configured.as_str());

	if !scheme_ok || token.is_empty() || token.contains(char::is_whitespace) {
		return Err(invalid());
	}

	Ok(token.to_owned())
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::HeaderValue;
	// self
	use super::*;

	fn headers(value: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::from_static(value));

		headers
	}

	#[test]
	fn presented_token_accepts_bearer_and_configured_scheme() {
		assert_eq!(
			presented_token(&headers("Bearer tok1"), &AuthScheme::ZohoOauthToken).ok(),
			Some("tok1".into())
		);
		assert_eq!(
			presented_token(&headers("Zoho-oauthtoken tok2"), &AuthScheme::ZohoOauthToken).ok(),
			Some("tok2".into())
		);
	}

	#[test]
	fn presented_token_rejects_malformed_headers() {
		for value in ["Bearer", "Bearer ", "Basic abc", "tok1", "Bearer a b"] {
			let err = presented_token(&headers(value), &AuthScheme::Bearer)
				.expect_err("Malformed header must be rejected.");

			assert!(matches!(err, Error::Unauthorized { .. }), "{value}");
		}

		assert!(presented_token(&HeaderMap::new(), &AuthScheme::Bearer).is_err());
	}

	#[test]
	fn email_query_requires_a_value() {
		assert!(EmailQuery::default().require().is_err());
		assert!(EmailQuery { email: Some("  ".into()) }.require().is_err());
		assert_eq!(
			EmailQuery { email: Some(" a@b.com ".into()) }
				.require()
				.expect("Trimmed email should be accepted.")
				.as_ref(),
			"a@b.com"
		);
	}
}
