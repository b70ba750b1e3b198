//! Provider-facing configuration.
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, the API family that decides header formats, and consent-screen scopes.
//! `credentials` holds the static client registration used by every token request.

pub mod credentials;
pub mod descriptor;

pub use credentials::*;
pub use descriptor::*;
