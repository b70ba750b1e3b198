//! Static client registration shared by every token request.

// crates.io
use oauth2::{ClientId, ClientSecret, RedirectUrl};
// self
use crate::{_prelude::*, error::ConfigError};

/// OAuth client registration loaded once at startup and never mutated.
#[derive(Clone)]
pub struct Credentials {
	/// Registered client identifier.
	pub client_id: ClientId,
	/// Registered client secret; redacted in `Debug`.
	pub client_secret: ClientSecret,
	/// Redirect URI registered with the provider.
	pub redirect_uri: RedirectUrl,
}
impl Credentials {
	/// Validates and wraps the client registration.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let redirect_uri = RedirectUrl::new(redirect_uri.into())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;

		Ok(Self {
			client_id: ClientId::new(client_id.into()),
			client_secret: ClientSecret::new(client_secret.into()),
			redirect_uri,
		})
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("client_id", &self.client_id.as_str())
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.finish()
	}
}
