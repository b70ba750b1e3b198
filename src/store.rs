//! Storage contract and the in-memory store backing the token cache.
//!
//! The gateway keeps at most one live [`TokenRecord`]; stores are single-slot.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenRecord};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Single-slot storage contract for the gateway's token record.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the current record, if any.
	fn load(&self) -> StoreFuture<'_, Option<TokenRecord>>;

	/// Replaces the current record unconditionally.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Stores `record` only when the slot is empty; returns whether it was stored.
	fn save_if_empty(&self, record: TokenRecord) -> StoreFuture<'_, bool>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
