//! Provider descriptor data structures and helpers shared by all flows.
//!
//! The module exposes validated metadata, supporting builder utilities, and the
//! API family table so the gateway can describe the provider in a
//! transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// API family and header scheme tables.
pub mod family;
/// Grant identifiers used on token requests.
pub mod grant;

pub use builder::*;
pub use family::*;
pub use grant::*;

// self
use crate::{
	_prelude::*,
	auth::{CustomerEmail, ProviderId, ScopeSet},
	provider::Credentials,
};

/// Default accounts server hosting the consent screen and token endpoint.
pub const ZOHO_ACCOUNTS_URL: &str = "https://accounts.zoho.com";
/// Scope requested when the configuration does not name any.
pub const DEFAULT_SCOPE: &str = "ZohoSubscriptions.customers.READ";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Consent screen the browser is redirected to.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// Customer collection endpoint queried with `?email=`.
	pub customers: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Resource API family.
	pub api_family: ApiFamily,
	/// Scheme used on outbound `Authorization` headers.
	pub auth_scheme: AuthScheme,
	/// Organization identifier sent on resource calls, when configured.
	pub org_id: Option<String>,
	/// Scopes requested on the consent screen.
	pub scopes: ScopeSet,
	/// Character used to join scopes in the `scope` parameter.
	pub scope_delimiter: char,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Organization header name and value, when an organization is configured.
	pub fn org_header(&self) -> Option<(&'static str, &str)> {
		self.org_id.as_deref().map(|org| (self.api_family.org_header(), org))
	}

	/// Builds the consent-screen URL; `state` round-trips back to the redirect URI.
	pub fn authorization_url(&self, credentials: &Credentials, state: &str) -> Url {
		let mut url = self.endpoints.authorization.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs
				.append_pair("client_id", credentials.client_id.as_str())
				.append_pair("response_type", "code")
				.append_pair("redirect_uri", credentials.redirect_uri.as_str());

			if let Some(scope) = self.scopes.joined(self.scope_delimiter) {
				pairs.append_pair("scope", &scope);
			}

			pairs
				.append_pair("access_type", "offline")
				.append_pair("prompt", "consent")
				.append_pair("state", state);
		}

		url
	}

	/// Customer lookup URL for the provided email.
	pub fn customer_lookup_url(&self, email: &CustomerEmail) -> Url {
		let mut url = self.endpoints.customers.clone();

		url.query_pairs_mut().append_pair("email", email);

		url
	}
}
