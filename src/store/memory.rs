//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{StoreFuture, TokenStore},
};

/// Process-local token slot; contents vanish on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<TokenRecord>>>);
impl MemoryStore {
	/// Synchronous snapshot of the slot.
	pub fn snapshot(&self) -> Option<TokenRecord> {
		self.0.read().clone()
	}
}
impl TokenStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenRecord>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(record);

			Ok(())
		})
	}

	fn save_if_empty(&self, record: TokenRecord) -> StoreFuture<'_, bool> {
		let mut slot = self.0.write();
		let stored = slot.is_none();

		if stored {
			*slot = Some(record);
		}

		Box::pin(async move { Ok(stored) })
	}
}
