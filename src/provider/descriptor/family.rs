// self
use crate::_prelude::*;

/// Resource API family exposed by the billing provider.
///
/// The two families share the accounts server but differ in host, header scheme, and
/// organization header name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiFamily {
	/// `subscriptions.zoho.com/api/v1`, authenticated with `Zoho-oauthtoken`.
	#[default]
	Subscriptions,
	/// `www.zohoapis.com/billing/v1`, authenticated with `Bearer`.
	Billing,
}
impl ApiFamily {
	/// Header scheme expected by the family unless overridden.
	pub fn default_auth_scheme(self) -> AuthScheme {
		match self {
			ApiFamily::Subscriptions => AuthScheme::ZohoOauthToken,
			ApiFamily::Billing => AuthScheme::Bearer,
		}
	}

	/// Customer collection endpoint of the family.
	pub fn customers_url(self) -> &'static str {
		match self {
			ApiFamily::Subscriptions => "https://subscriptions.zoho.com/api/v1/customers",
			ApiFamily::Billing => "https://www.zohoapis.com/billing/v1/customers",
		}
	}

	/// Header carrying the organization identifier.
	pub fn org_header(self) -> &'static str {
		match self {
			ApiFamily::Subscriptions => "X-com-zoho-subscriptions-organizationid",
			ApiFamily::Billing => "X-com-zoho-billing-organizationid",
		}
	}

	/// Lowercase configuration name.
	pub fn as_str(self) -> &'static str {
		match self {
			ApiFamily::Subscriptions => "subscriptions",
			ApiFamily::Billing => "billing",
		}
	}
}
impl Display for ApiFamily {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ApiFamily {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"subscriptions" => Ok(ApiFamily::Subscriptions),
			"billing" => Ok(ApiFamily::Billing),
			other => Err(format!("expected `subscriptions` or `billing`, got `{other}`")),
		}
	}
}

/// Scheme placed before the access token in outbound `Authorization` headers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthScheme {
	/// RFC 6750 `Bearer`.
	Bearer,
	/// Provider-specific `Zoho-oauthtoken`.
	ZohoOauthToken,
	/// Any other single-word scheme.
	Custom(String),
}
impl AuthScheme {
	/// Scheme token as sent on the wire.
	pub fn as_str(&self) -> &str {
		match self {
			AuthScheme::Bearer => "Bearer",
			AuthScheme::ZohoOauthToken => "Zoho-oauthtoken",
			AuthScheme::Custom(value) => value,
		}
	}
}
impl Display for AuthScheme {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for AuthScheme {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();

		if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
			return Err(format!("`{trimmed}` is not a single header scheme"));
		}
		if trimmed.eq_ignore_ascii_case("bearer") {
			return Ok(AuthScheme::Bearer);
		}
		if trimmed.eq_ignore_ascii_case("zoho-oauthtoken") {
			return Ok(AuthScheme::ZohoOauthToken);
		}

		Ok(AuthScheme::Custom(trimmed.to_owned()))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn family_defaults_follow_host() {
		assert_eq!(ApiFamily::Subscriptions.default_auth_scheme().as_str(), "Zoho-oauthtoken");
		assert_eq!(ApiFamily::Billing.default_auth_scheme().as_str(), "Bearer");
		assert!(ApiFamily::Billing.customers_url().starts_with("https://www.zohoapis.com/"));
		assert_eq!(ApiFamily::Billing.org_header(), "X-com-zoho-billing-organizationid");
		assert_eq!("Billing".parse::<ApiFamily>(), Ok(ApiFamily::Billing));
		assert!("books".parse::<ApiFamily>().is_err());
	}

	#[test]
	fn schemes_parse_case_insensitively() {
		assert_eq!("bearer".parse::<AuthScheme>(), Ok(AuthScheme::Bearer));
		assert_eq!("ZOHO-OAUTHTOKEN".parse::<AuthScheme>(), Ok(AuthScheme::ZohoOauthToken));
		assert_eq!("Token".parse::<AuthScheme>(), Ok(AuthScheme::Custom("Token".into())));
		assert!("two words".parse::<AuthScheme>().is_err());
		assert!("".parse::<AuthScheme>().is_err());
	}
}
