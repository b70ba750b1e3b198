//! Token secret and record models.

pub mod record;
pub mod secret;
