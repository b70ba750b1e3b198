//! Server-rendered flow page.
//!
//! The page walks the user through `Unauthenticated -> Exchanging -> Authenticated`.
//! The provider redirects back to `/?code=..&state=<email>`; the handler drives the
//! exchange and the lookup on the server and renders the resulting state. Tokens never
//! reach the markup.

// crates.io
use axum::{
	extract::{Query, State, rejection::QueryRejection},
	response::Html,
};
use oauth2::AuthorizationCode;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::CustomerEmail,
	flows::{CustomerRecord, Gateway},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	server::{AppState, ApiError},
};

/// Message shown when the redirect carries a code but no email.
pub const NO_EMAIL_MESSAGE: &str = "No email provided in query parameters.";
/// Message shown when the lookup succeeds with no customers.
pub const NO_CUSTOMER_MESSAGE: &str = "No customer data found for this email.";

const NOT_AVAILABLE: &str = "N/A";

/// Boxed future returned by [`FlowBackend`].
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Operations the page needs from the gateway.
pub trait FlowBackend
where
	Self: Send + Sync,
{
	/// Exchanges an authorization code, caching the resulting tokens.
	fn exchange<'a>(&'a self, code: &'a str) -> BackendFuture<'a, ()>;

	/// Looks up customers by email.
	fn lookup<'a>(&'a self, email: &'a CustomerEmail) -> BackendFuture<'a, CustomerRecord>;
}
impl<C, M> FlowBackend for Gateway<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange<'a>(&'a self, code: &'a str) -> BackendFuture<'a, ()> {
		Box::pin(async move {
			self.exchange_code(&AuthorizationCode::new(code.to_owned())).await.map(|_| ())
		})
	}

	fn lookup<'a>(&'a self, email: &'a CustomerEmail) -> BackendFuture<'a, CustomerRecord> {
		Box::pin(self.get_customer(email))
	}
}

/// Customer panel shown once authenticated.
#[derive(Clone, Debug, PartialEq)]
pub enum CustomerView {
	/// Lookup in progress.
	Loading,
	/// Lookup finished.
	Loaded(CustomerRecord),
	/// Lookup failed with a caller-facing message.
	Failed(String),
}

/// Where the user is in the authorization flow.
#[derive(Clone, Debug, PartialEq)]
pub enum FlowState {
	/// No tokens yet; the user is offered the consent link.
	Unauthenticated {
		/// Email carried through the flow, when known.
		email: Option<String>,
		/// Error from a previous step.
		error: Option<String>,
	},
	/// Code received, exchange pending.
	Exchanging {
		/// Email carried in the `state` parameter.
		email: Option<String>,
	},
	/// Tokens cached on the server.
	Authenticated {
		/// Email whose customers are shown.
		email: String,
		/// Customer panel.
		view: CustomerView,
	},
}
impl FlowState {
	/// Starting state for a page load.
	pub fn initial(email: Option<String>, error: Option<String>) -> Self {
		Self::Unauthenticated { email, error }
	}

	/// Applies `event`; events that do not fit the current state leave it unchanged.
	pub fn apply(self, event: FlowEvent) -> Self {
		match (self, event) {
			(Self::Unauthenticated { email, .. }, FlowEvent::CodeReceived) =>
				Self::Exchanging { email },
			(Self::Exchanging { email: Some(email) }, FlowEvent::ExchangeSucceeded) =>
				Self::Authenticated { email, view: CustomerView::Loading },
			(Self::Exchanging { email: None }, FlowEvent::ExchangeSucceeded) =>
				Self::Unauthenticated { email: None, error: Some(NO_EMAIL_MESSAGE.into()) },
			(Self::Exchanging { email }, FlowEvent::ExchangeFailed(message)) =>
				Self::Unauthenticated { email, error: Some(message) },
			(Self::Authenticated { email, .. }, FlowEvent::CustomerLoaded(record)) =>
				Self::Authenticated { email, view: CustomerView::Loaded(record) },
			(Self::Authenticated { email, .. }, FlowEvent::CustomerFailed(message)) =>
				Self::Authenticated { email, view: CustomerView::Failed(message) },
			(state, _) => state,
		}
	}
}

/// Transitions of [`FlowState`].
#[derive(Clone, Debug, PartialEq)]
pub enum FlowEvent {
	/// The provider redirected back with a code.
	CodeReceived,
	/// The code was exchanged.
	ExchangeSucceeded,
	/// The exchange failed.
	ExchangeFailed(String),
	/// Customer lookup finished.
	CustomerLoaded(CustomerRecord),
	/// Customer lookup failed.
	CustomerFailed(String),
}

/// Query of the page route.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageQuery {
	/// Authorization code from the provider redirect.
	#[serde(default)]
	pub code: Option<String>,
	/// Opaque state echoed by the provider; carries the email.
	#[serde(default)]
	pub state: Option<String>,
	/// Email typed on a fresh page load.
	#[serde(default)]
	pub email: Option<String>,
	/// Error reported by the provider on the redirect.
	#[serde(default)]
	pub error: Option<String>,
}

/// Runs the flow for one page load.
pub async fn drive<B>(backend: &B, query: PageQuery) -> FlowState
where
	B: ?Sized + FlowBackend,
{
	let email = non_empty(query.state).or_else(|| non_empty(query.email));
	let state = FlowState::initial(email, non_empty(query.error));
	let Some(code) = non_empty(query.code) else {
		return state;
	};
	let state = state.apply(FlowEvent::CodeReceived);
	let state = match backend.exchange(&code).await {
		Ok(()) => state.apply(FlowEvent::ExchangeSucceeded),
		Err(err) => return state.apply(FlowEvent::ExchangeFailed(caller_message(err))),
	};
	let email = match &state {
		FlowState::Authenticated { email, .. } => Some(email.clone()),
		_ => None,
	};
	let Some(email) = email else {
		return state;
	};
	let event = match CustomerEmail::new(email) {
		Ok(email) => match backend.lookup(&email).await {
			Ok(record) => FlowEvent::CustomerLoaded(record),
			Err(err) => FlowEvent::CustomerFailed(caller_message(err)),
		},
		Err(err) => FlowEvent::CustomerFailed(err.to_string()),
	};

	state.apply(event)
}

/// Renders `state` as a full HTML document.
pub fn render(state: &FlowState) -> String {
	let mut body = String::new();

	match state {
		FlowState::Unauthenticated { email, error } => {
			push_error(&mut body, error.as_deref());
			body.push_str(&format!(
				"<p>Please authorize the app to access billing data for email: <strong>{}</strong></p>\n\
				 <form method=\"get\" action=\"/oauth/authorize\">\n\
				 <input type=\"email\" name=\"email\" value=\"{}\" required>\n\
				 <button type=\"submit\">Authorize</button>\n\
				 </form>\n",
				escape(email.as_deref().unwrap_or(NOT_AVAILABLE)),
				escape(email.as_deref().unwrap_or_default()),
			));
		},
		FlowState::Exchanging { .. } => body.push_str("<p>Exchanging authorization code...</p>\n"),
		FlowState::Authenticated { email, view } => {
			body.push_str(&format!(
				"<p>Authenticated successfully. Showing data for: <strong>{}</strong></p>\n",
				escape(email)
			));

			match view {
				CustomerView::Loading => body.push_str("<p>Loading customer data...</p>\n"),
				CustomerView::Failed(message) => push_error(&mut body, Some(message)),
				CustomerView::Loaded(record) if record.customers().is_empty() =>
					body.push_str(&format!("<p>{NO_CUSTOMER_MESSAGE}</p>\n")),
				CustomerView::Loaded(record) =>
					record.customers().iter().for_each(|customer| push_card(&mut body, customer)),
			}
		},
	}

	format!(
		"<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
		 <title>Billing customer lookup</title>\n</head>\n<body>\n<main>\n\
		 <h1>Billing customer lookup</h1>\n{body}</main>\n</body>\n</html>\n"
	)
}

/// `GET /`: drives the flow for this request and renders the page.
pub async fn index(
	State(state): State<AppState>,
	query: Result<Query<PageQuery>, QueryRejection>,
) -> Html<String> {
	let query = query.map(|Query(query)| query).unwrap_or_default();
	let flow = drive(state.gateway.as_ref(), query).await;

	Html(render(&flow))
}

fn push_error(body: &mut String, error: Option<&str>) {
	if let Some(error) = error {
		body.push_str(&format!("<div class=\"alert\" role=\"alert\">{}</div>\n", escape(error)));
	}
}

fn push_card(body: &mut String, customer: &Value) {
	let text = |value: Option<&Value>| {
		value.and_then(Value::as_str).filter(|s| !s.is_empty()).unwrap_or(NOT_AVAILABLE).to_owned()
	};
	let address = customer.get("billing_address").and_then(|address| address.get("address"));

	body.push_str(&format!(
		"<section class=\"customer\">\n<h2>{}</h2>\n<dl>\n\
		 <dt>Email</dt><dd>{}</dd>\n\
		 <dt>Company</dt><dd>{}</dd>\n\
		 <dt>Phone</dt><dd>{}</dd>\n\
		 <dt>Billing address</dt><dd>{}</dd>\n\
		 </dl>\n</section>\n",
		escape(&text(customer.get("customer_name"))),
		escape(&text(customer.get("email"))),
		escape(&text(customer.get("company_name"))),
		escape(&text(customer.get("phone"))),
		escape(&text(address)),
	));
}

fn caller_message(err: Error) -> String {
	ApiError(err).parts().1.error
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn escape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}

	out
}
