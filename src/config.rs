//! Environment-driven gateway configuration.
//!
//! Every variable is read under its plain name first and then with a `ZOHO_` prefix,
//! so `CLIENT_ID` and `ZOHO_CLIENT_ID` are interchangeable. Empty values count as unset.

// std
use std::{net::SocketAddr, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ConfigError,
	flows::ReqwestGateway,
	http::DEFAULT_HTTP_TIMEOUT,
	provider::{
		ApiFamily, AuthScheme, Credentials, DEFAULT_SCOPE, ProviderDescriptor,
		ProviderDescriptorBuilder, ZOHO_ACCOUNTS_URL,
	},
	store::TokenStore,
};

/// Prefix accepted in front of every variable name.
pub const ENV_PREFIX: &str = "ZOHO_";
/// Listen address used when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Fully parsed gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Redirect URI registered with the provider.
	pub redirect_uri: String,
	/// Long-lived refresh token.
	pub refresh_token: Option<String>,
	/// Access token seeded into the cache at startup.
	pub access_token: Option<String>,
	/// Organization identifier sent on resource calls.
	pub org_id: Option<String>,
	/// Resource API family.
	pub api_family: ApiFamily,
	/// Header scheme override.
	pub auth_scheme: Option<AuthScheme>,
	/// Accounts server origin.
	pub accounts_url: Url,
	/// Resource API base replacing the family default; `/customers` is appended.
	pub api_base_url: Option<Url>,
	/// Consent-screen scopes.
	pub scopes: ScopeSet,
	/// Listen address of the HTTP server.
	pub bind_addr: SocketAddr,
	/// Timeout applied to every outbound call.
	pub http_timeout: StdDuration,
}
impl GatewayConfig {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, which maps a variable name to its value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let vars = Vars(lookup);
		let accounts_url = match vars.get("ACCOUNTS_URL") {
			Some(raw) => parse_url("ACCOUNTS_URL", &raw)?,
			None => parse_url("ACCOUNTS_URL", ZOHO_ACCOUNTS_URL)?,
		};
		let api_base_url =
			vars.get("API_BASE_URL").map(|raw| parse_url("API_BASE_URL", &raw)).transpose()?;
		let scopes =
			ScopeSet::from_str(&vars.get("SCOPES").unwrap_or_else(|| DEFAULT_SCOPE.into()))?;
		let bind_addr = vars
			.get("BIND_ADDR")
			.unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
			.parse::<SocketAddr>()
			.map_err(|e| ConfigError::InvalidVar { name: "BIND_ADDR", reason: e.to_string() })?;
		let http_timeout = match vars.get("HTTP_TIMEOUT_SECS") {
			Some(raw) => match raw.parse::<u64>() {
				Ok(secs) if secs > 0 => StdDuration::from_secs(secs),
				_ => {
					return Err(ConfigError::InvalidVar {
						name: "HTTP_TIMEOUT_SECS",
						reason: format!("expected a positive integer, got `{raw}`"),
					});
				},
			},
			None => DEFAULT_HTTP_TIMEOUT,
		};

		Ok(Self {
			client_id: vars.require("CLIENT_ID")?,
			client_secret: vars.require("CLIENT_SECRET")?,
			redirect_uri: vars.require("REDIRECT_URI")?,
			refresh_token: vars.get("REFRESH_TOKEN"),
			access_token: vars.get("ACCESS_TOKEN"),
			org_id: vars.get("ORG_ID"),
			api_family: vars.parse("API_FAMILY")?.unwrap_or_default(),
			auth_scheme: vars.parse("AUTH_SCHEME")?,
			accounts_url,
			api_base_url,
			scopes,
			bind_addr,
			http_timeout,
		})
	}

	/// Static client registration.
	pub fn credentials(&self) -> Result<Credentials, ConfigError> {
		Credentials::new(&self.client_id, &self.client_secret, &self.redirect_uri)
	}

	/// Provider descriptor implied by the family, overrides, and organization.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		let mut builder = ProviderDescriptorBuilder::zoho(&self.accounts_url, self.api_family)?
			.scopes(self.scopes.clone());

		if let Some(base) = self.api_base_url.as_ref() {
			let customers = format!("{}/customers", base.as_str().trim_end_matches('/'));

			builder = builder.customers_endpoint(parse_url("API_BASE_URL", &customers)?);
		}
		if let Some(scheme) = self.auth_scheme.clone() {
			builder = builder.auth_scheme(scheme);
		}
		if let Some(org) = self.org_id.as_deref() {
			builder = builder.org_id(org);
		}

		Ok(builder.build()?)
	}

	/// Builds a reqwest-backed gateway over `store`.
	///
	/// `ACCESS_TOKEN` is not applied here; seed it with
	/// [`Gateway::seed_access_token`](crate::flows::Gateway::seed_access_token).
	pub fn build_gateway(&self, store: Arc<dyn TokenStore>) -> Result<ReqwestGateway> {
		let mut gateway =
			ReqwestGateway::new(store, self.descriptor()?, self.credentials()?, self.http_timeout)?;

		if let Some(refresh) = self.refresh_token.as_deref() {
			gateway = gateway.with_refresh_token(refresh);
		}

		Ok(gateway)
	}
}
impl Debug for GatewayConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatewayConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri)
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("access_token_set", &self.access_token.is_some())
			.field("org_id", &self.org_id)
			.field("api_family", &self.api_family)
			.field("auth_scheme", &self.auth_scheme)
			.field("accounts_url", &self.accounts_url.as_str())
			.field("api_base_url", &self.api_base_url.as_ref().map(Url::as_str))
			.field("scopes", &self.scopes)
			.field("bind_addr", &self.bind_addr)
			.field("http_timeout", &self.http_timeout)
			.finish()
	}
}

struct Vars<F>(F);
impl<F> Vars<F>
where
	F: Fn(&str) -> Option<String>,
{
	fn get(&self, name: &'static str) -> Option<String> {
		[name.to_owned(), format!("{ENV_PREFIX}{name}")]
			.iter()
			.filter_map(|key| (self.0)(key.as_str()))
			.map(|value| value.trim().to_owned())
			.find(|value| !value.is_empty())
	}

	fn require(&self, name: &'static str) -> Result<String, ConfigError> {
		self.get(name).ok_or(ConfigError::MissingVar { name })
	}

	fn parse<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr<Err = String>,
	{
		self.get(name)
			.map(|raw| raw.parse::<T>().map_err(|reason| ConfigError::InvalidVar { name, reason }))
			.transpose()
	}
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|e| ConfigError::InvalidVar { name, reason: e.to_string() })
}
