//! Gateway-level error types shared across flows, providers, and stores.

// self
use crate::{_prelude::*, provider::GrantType};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint rejected an exchange.
	#[error(transparent)]
	ProviderToken(#[from] ProviderTokenError),

	/// Caller input is missing or malformed.
	#[error("{message}")]
	Validation {
		/// Caller-facing description of the problem.
		message: String,
	},
	/// Inbound request lacks a usable `Authorization` header.
	#[error("{message}")]
	Unauthorized {
		/// Caller-facing description of the problem.
		message: String,
	},
	/// Refreshing the cached access token failed.
	#[error("Failed to refresh access token: {reason}.")]
	TokenRefresh {
		/// Provider- or gateway-supplied reason string.
		reason: String,
		/// HTTP status returned by the token endpoint, when available.
		status: Option<u16>,
	},
	/// Provider answered with a body that is not valid JSON.
	///
	/// The raw body is dropped on purpose; only the parser position survives.
	#[error("Provider returned a response that is not valid JSON.")]
	InvalidProviderResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the offending response.
		status: u16,
	},
	/// Resource API answered with a non-success status.
	#[error("Upstream API returned {status}: {message}.")]
	Upstream {
		/// HTTP status code returned by the resource API.
		status: u16,
		/// Message extracted from the upstream body.
		message: String,
	},
}
impl Error {
	/// Builds a [`Error::Validation`] from any message.
	pub fn validation(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into() }
	}

	/// Builds a [`Error::Unauthorized`] from any message.
	pub fn unauthorized(message: impl Into<String>) -> Self {
		Self::Unauthorized { message: message.into() }
	}
}

/// Token endpoint rejection carrying the provider's OAuth error fields.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token endpoint rejected the {grant} grant with status {status}.")]
pub struct ProviderTokenError {
	/// Grant that was being exchanged.
	pub grant: GrantType,
	/// HTTP status returned by the token endpoint.
	pub status: u16,
	/// Provider-supplied OAuth `error` field.
	pub error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
}
impl ProviderTokenError {
	/// Returns the most specific provider message available.
	pub fn reason(&self) -> Option<&str> {
		self.error_description.as_deref().or(self.error.as_deref())
	}
}

/// Configuration and validation failures raised while wiring the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor is invalid.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Required environment variable is absent or empty.
	#[error("Environment variable `{name}` is required.")]
	MissingVar {
		/// Variable name without the optional `ZOHO_` prefix.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidVar {
		/// Variable name without the optional `ZOHO_` prefix.
		name: &'static str,
		/// Human-readable parsing failure.
		reason: String,
	},
	/// Neither the cached record nor the configuration holds a refresh token.
	#[error("No refresh token is available; configure REFRESH_TOKEN or complete a code exchange.")]
	MissingRefreshToken,
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
	/// Scope configuration cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, deadlines).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured deadline.
	#[error("Request to the provider timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// Transport failed without a structured error.
	#[error("HTTP client error occurred while calling the provider: {0}.")]
	Other(String),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
