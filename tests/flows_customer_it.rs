#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
use oauth2::AuthorizationCode;
// self
use billing_oauth_gateway::{
	_preludet::*,
	auth::{CustomerEmail, TokenRecord},
	store::{MemoryStore, TokenStore},
};

const CUSTOMERS_PATH: &str = "/api/v1/customers";
const TOKEN_PATH: &str = "/oauth/v2/token";

async fn seed_active(store: &MemoryStore, access: &str) {
	let record = TokenRecord::builder()
		.access_token(access)
		.refresh_token("cached-refresh")
		.expires_in(Duration::minutes(30))
		.build()
		.expect("Token record fixture should build successfully.");

	store.save(record).await.expect("Failed to seed record into the store.");
}

fn email() -> CustomerEmail {
	CustomerEmail::new("a@b.com").expect("Customer email fixture should be valid.")
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_retried_once() {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(test_descriptor(&server.base_url()), test_credentials());

	seed_active(&store, "old-access").await;

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(CUSTOMERS_PATH)
				.query_param("email", "a@b.com")
				.header("authorization", "Zoho-oauthtoken old-access");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"code\":57,\"message\":\"You are not authorized to perform this operation\"}");
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(CUSTOMERS_PATH)
				.query_param("email", "a@b.com")
				.header("authorization", "Zoho-oauthtoken new-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"code\":0,\"customers\":[{\"customer_name\":\"Ada\",\"email\":\"a@b.com\"}]}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"new-access\",\"expires_in\":3600}");
		})
		.await;
	let record = gateway.get_customer(&email()).await.expect("Retried lookup should succeed.");

	rejected.assert_calls_async(1).await;
	accepted.assert_calls_async(1).await;
	token.assert_calls_async(1).await;

	assert_eq!(record.customers().len(), 1);
	assert_eq!(record.raw()["customers"][0]["customer_name"], "Ada");
	assert_eq!(
		store.snapshot().expect("Cache should hold the new token.").access_token.expose(),
		"new-access"
	);
}

#[tokio::test]
async fn second_rejection_is_terminal() {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(test_descriptor(&server.base_url()), test_credentials());

	seed_active(&store, "old-access").await;

	let customers = server
		.mock_async(|when, then| {
			when.method(GET).path(CUSTOMERS_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"code\":57,\"message\":\"Not authorized\"}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"new-access\"}");
		})
		.await;
	let err = gateway.get_customer(&email()).await.expect_err("Second 401 should not be retried.");

	customers.assert_calls_async(2).await;
	token.assert_calls_async(1).await;

	match err {
		Error::Upstream { status, message } => {
			assert_eq!(status, 401);
			assert_eq!(message, "Not authorized");
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn rejection_without_refresh_token_keeps_upstream_401() {
	let server = MockServer::start_async().await;
	let (gateway, _store) =
		build_reqwest_test_gateway(test_descriptor(&server.base_url()), test_credentials());

	assert!(gateway.seed_access_token("bogus").await.expect("Seeding should succeed."));

	let customers = server
		.mock_async(|when, then| {
			when.method(GET).path(CUSTOMERS_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"code\":57,\"message\":\"Invalid token\"}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).body("{\"access_token\":\"unexpected\"}");
		})
		.await;
	let err = gateway.get_customer(&email()).await.expect_err("Lookup should stay rejected.");

	customers.assert_calls_async(1).await;
	token.assert_calls_async(0).await;

	assert!(matches!(
		err,
		Error::Upstream { status: 401, ref message } if message == "Invalid token"
	));
}

#[tokio::test]
async fn refused_refresh_keeps_upstream_401() {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(test_descriptor(&server.base_url()), test_credentials());

	seed_active(&store, "old-access").await;

	let customers = server
		.mock_async(|when, then| {
			when.method(GET).path(CUSTOMERS_PATH);
			then.status(401).body("{\"code\":57,\"message\":\"Not authorized\"}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_code\"}");
		})
		.await;
	let err = gateway.get_customer(&email()).await.expect_err("Lookup should stay rejected.");

	customers.assert_calls_async(1).await;
	token.assert_calls_async(1).await;

	assert!(matches!(err, Error::Upstream { status: 401, .. }));
	assert_eq!(
		store.snapshot().expect("Cache should keep the old record.").access_token.expose(),
		"old-access"
	);
}

#[tokio::test]
async fn upstream_failure_without_message_uses_default() {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(test_descriptor(&server.base_url()), test_credentials());

	seed_active(&store, "live-access").await;

	let customers = server
		.mock_async(|when, then| {
			when.method(GET).path(CUSTOMERS_PATH);
			then.status(503).body("upstream unavailable");
		})
		.await;
	let err = gateway.get_customer(&email()).await.expect_err("503 should be reported.");

	customers.assert_calls_async(1).await;

	assert!(matches!(
		err,
		Error::Upstream { status: 503, ref message } if message == "Failed to fetch customer data."
	));
}

#[tokio::test]
async fn exchanged_token_is_used_for_lookup_without_refresh() {
	let server = MockServer::start_async().await;
	let (gateway, _store) =
		build_reqwest_test_gateway(test_descriptor(&server.base_url()), test_credentials());
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"tok1\",\"refresh_token\":\"ref1\",\"expires_in\":1800,\"api_domain\":\"https://www.zohoapis.com\"}");
		})
		.await;
	let customers = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(CUSTOMERS_PATH)
				.header("authorization", "Zoho-oauthtoken tok1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"code\":0,\"customers\":[]}");
		})
		.await;
	let response = gateway
		.exchange_code(&AuthorizationCode::new("abc".into()))
		.await
		.expect("Authorization code exchange should succeed.");

	assert_eq!(response.access_token(), Some("tok1"));
	assert_eq!(response.raw()["api_domain"], "https://www.zohoapis.com");

	let record = gateway.get_customer(&email()).await.expect("Lookup should reuse tok1.");

	assert!(record.customers().is_empty());

	token.assert_calls_async(1).await;
	customers.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_exchange_keeps_provider_fields() {
	let server = MockServer::start_async().await;
	let (gateway, store) =
		build_reqwest_test_gateway(test_descriptor(&server.base_url()), test_credentials());
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_code\"}");
		})
		.await;
	let err = gateway
		.exchange_code(&AuthorizationCode::new("used-code".into()))
		.await
		.expect_err("Provider error payload should fail the exchange.");

	token.assert_async().await;

	match err {
		Error::ProviderToken(inner) => {
			assert_eq!(inner.status, 200);
			assert_eq!(inner.error.as_deref(), Some("invalid_code"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(store.snapshot().is_none());
}
