// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProviderId, ScopeSet, ScopeValidationError},
	provider::{ApiFamily, AuthScheme, DEFAULT_SCOPE, ProviderDescriptor, ProviderEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Descriptor identifier is invalid.
	#[error(transparent)]
	InvalidId(#[from] IdentifierError),
	/// Consent-screen scopes are invalid.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
	/// Authorization endpoint is required to start the consent flow.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for exchanges and refreshes.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Customer endpoint is mandatory for lookups.
	#[error("Missing customers endpoint.")]
	MissingCustomersEndpoint,
	/// Endpoint could not be resolved against its base URL.
	#[error("The {endpoint} endpoint is invalid: {reason}.")]
	InvalidEndpoint {
		/// Which endpoint failed to resolve.
		endpoint: &'static str,
		/// Parser message.
		reason: String,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// Organization identifiers are sent as header values.
	#[error("Organization identifier must be a non-empty visible ASCII string.")]
	InvalidOrgId,
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Consent screen endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used for exchanges and refreshes.
	pub token_endpoint: Option<Url>,
	/// Customer collection endpoint.
	pub customers_endpoint: Option<Url>,
	/// Resource API family.
	pub api_family: ApiFamily,
	/// Header scheme override; the family default applies when unset.
	pub auth_scheme: Option<AuthScheme>,
	/// Organization identifier.
	pub org_id: Option<String>,
	/// Consent-screen scopes.
	pub scopes: ScopeSet,
	/// Character used to join scopes.
	pub scope_delimiter: char,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			authorization_endpoint: None,
			token_endpoint: None,
			customers_endpoint: None,
			api_family: ApiFamily::default(),
			auth_scheme: None,
			org_id: None,
			scopes: ScopeSet::default(),
			scope_delimiter: ' ',
		}
	}

	/// Preset for the Zoho accounts server and the given API family.
	///
	/// `accounts_base` is the accounts origin, e.g. `https://accounts.zoho.eu`.
	pub fn zoho(accounts_base: &Url, family: ApiFamily) -> Result<Self, ProviderDescriptorError> {
		let id = ProviderId::new(format!("zoho-{family}"))?;
		let authorization = resolve(accounts_base, "authorization", "/oauth/v2/auth")?;
		let token = resolve(accounts_base, "token", "/oauth/v2/token")?;
		let customers = Url::parse(family.customers_url()).map_err(|e| {
			ProviderDescriptorError::InvalidEndpoint {
				endpoint: "customers",
				reason: e.to_string(),
			}
		})?;
		let scopes = ScopeSet::new([DEFAULT_SCOPE])?;

		Ok(Self::new(id)
			.authorization_endpoint(authorization)
			.token_endpoint(token)
			.customers_endpoint(customers)
			.api_family(family)
			.scopes(scopes)
			.scope_delimiter(','))
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the customer collection endpoint.
	pub fn customers_endpoint(mut self, url: Url) -> Self {
		self.customers_endpoint = Some(url);

		self
	}

	/// Sets the API family.
	pub fn api_family(mut self, family: ApiFamily) -> Self {
		self.api_family = family;

		self
	}

	/// Overrides the header scheme implied by the API family.
	pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
		self.auth_scheme = Some(scheme);

		self
	}

	/// Sets the organization identifier sent on resource calls.
	pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
		self.org_id = Some(org_id.into());

		self
	}

	/// Overrides the consent-screen scopes.
	pub fn scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Overrides the scope delimiter.
	pub fn scope_delimiter(mut self, delimiter: char) -> Self {
		self.scope_delimiter = delimiter;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let customers =
			self.customers_endpoint.ok_or(ProviderDescriptorError::MissingCustomersEndpoint)?;
		let auth_scheme = self.auth_scheme.unwrap_or_else(|| self.api_family.default_auth_scheme());
		let descriptor = ProviderDescriptor {
			id: self.id,
			endpoints: ProviderEndpoints { authorization, token, customers },
			api_family: self.api_family,
			auth_scheme,
			org_id: self.org_id,
			scopes: self.scopes,
			scope_delimiter: self.scope_delimiter,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("customers", &self.endpoints.customers)?;

		if self.scope_delimiter.is_control() {
			return Err(ProviderDescriptorError::InvalidScopeDelimiter {
				delimiter: self.scope_delimiter,
			});
		}
		if let Some(org) = self.org_id.as_deref()
			&& (org.is_empty() || !org.bytes().all(|b| b.is_ascii_graphic()))
		{
			return Err(ProviderDescriptorError::InvalidOrgId);
		}

		Ok(())
	}
}

fn resolve(base: &Url, endpoint: &'static str, path: &str) -> Result<Url, ProviderDescriptorError> {
	base.join(path)
		.map_err(|e| ProviderDescriptorError::InvalidEndpoint { endpoint, reason: e.to_string() })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
