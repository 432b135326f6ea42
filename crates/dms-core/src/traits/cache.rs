//! Cache provider trait for the external response cache.

use async_trait::async_trait;
use tracing::debug;

use crate::result::AppResult;

/// Trait for response cache backends.
///
/// The folder core never reads from the cache; it only signals that an
/// entry has gone stale through [`CacheProvider::invalidate`]. Filling the
/// cache is left to the protocol adapters, through the backend's own API.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Delete a key from the cache. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Signal that the entry under `key` is stale.
    async fn invalidate(&self, key: &str) -> AppResult<()> {
        debug!(key, "Invalidating cache entry");
        self.delete(key).await
    }

    /// Check that the cache backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
