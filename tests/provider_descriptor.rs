// crates.io
use url::Url;
// self
use billing_oauth_gateway::{
	auth::{CustomerEmail, ProviderId, ScopeSet},
	provider::{
		ApiFamily, AuthScheme, Credentials, ProviderDescriptor, ProviderDescriptorBuilder,
		ProviderDescriptorError, ZOHO_ACCOUNTS_URL,
	},
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock provider URL.")
}

fn builder(id: &str) -> ProviderDescriptorBuilder {
	let provider_id =
		ProviderId::new(id).expect("Failed to build provider identifier for mock descriptor.");

	ProviderDescriptor::builder(provider_id)
}

#[test]
fn descriptor_rejects_missing_and_insecure_endpoints() {
	let err = builder("mock-missing")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.build()
		.expect_err("Descriptor builder should reject a missing customers endpoint.");

	assert_eq!(err, ProviderDescriptorError::MissingCustomersEndpoint);

	let err = builder("mock-insecure")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("http://example.com/token"))
		.customers_endpoint(url("https://example.com/customers"))
		.build()
		.expect_err("Descriptor builder should reject insecure token endpoints.");

	assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
}

#[test]
fn descriptor_rejects_unusable_org_ids() {
	for org in ["", "has space", "tab\t"] {
		let err = builder("mock-org")
			.authorization_endpoint(url("https://example.com/auth"))
			.token_endpoint(url("https://example.com/token"))
			.customers_endpoint(url("https://example.com/customers"))
			.org_id(org)
			.build()
			.expect_err("Descriptor builder should reject header-unsafe org ids.");

		assert_eq!(err, ProviderDescriptorError::InvalidOrgId);
	}
}

#[test]
fn family_selects_scheme_unless_overridden() {
	let accounts = url(ZOHO_ACCOUNTS_URL);
	let subscriptions = ProviderDescriptorBuilder::zoho(&accounts, ApiFamily::Subscriptions)
		.expect("Subscriptions preset should resolve.")
		.build()
		.expect("Subscriptions preset should validate.");
	let billing = ProviderDescriptorBuilder::zoho(&accounts, ApiFamily::Billing)
		.expect("Billing preset should resolve.")
		.auth_scheme(AuthScheme::ZohoOauthToken)
		.build()
		.expect("Billing preset should validate.");

	assert_eq!(subscriptions.auth_scheme, AuthScheme::ZohoOauthToken);
	assert_eq!(
		subscriptions.endpoints.customers.as_str(),
		"https://subscriptions.zoho.com/api/v1/customers"
	);
	assert_eq!(billing.auth_scheme, AuthScheme::ZohoOauthToken);
	assert_eq!(
		billing.endpoints.customers.as_str(),
		"https://www.zohoapis.com/billing/v1/customers"
	);
}

#[test]
fn urls_encode_state_scopes_and_email() {
	let scopes = ScopeSet::new(["ZohoBilling.customers.READ", "ZohoBilling.settings.READ"])
		.expect("Scopes should be valid.");
	let descriptor =
		ProviderDescriptorBuilder::zoho(&url("https://accounts.zoho.eu"), ApiFamily::Billing)
			.expect("EU preset should resolve.")
			.scopes(scopes)
			.build()
			.expect("EU preset should validate.");
	let credentials = Credentials::new("client-1", "secret-1", "https://app.example.com/")
		.expect("Credentials fixture should be valid.");
	let authorize = descriptor.authorization_url(&credentials, "a+b@example.com");
	let pairs: Vec<(String, String)> = authorize.query_pairs().into_owned().collect();

	assert_eq!(authorize.host_str(), Some("accounts.zoho.eu"));
	assert!(pairs.contains(&("state".into(), "a+b@example.com".into())));
	assert!(pairs.contains(&(
		"scope".into(),
		"ZohoBilling.customers.READ,ZohoBilling.settings.READ".into()
	)));
	assert!(pairs.contains(&("access_type".into(), "offline".into())));

	let email = CustomerEmail::new("a+b@example.com").expect("Email fixture should be valid.");
	let lookup = descriptor.customer_lookup_url(&email);

	assert_eq!(lookup.query(), Some("email=a%2Bb%40example.com"));
}
