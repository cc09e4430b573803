// Time-boxed cache for the database listing
//
// The listing is read by several resolvers during one reconciliation pass
// (dataset database lookup, meta database adoption, database enrichment).
// One `DatabaseCache` is shared by every client in the process so those
// reads collapse into a single request per TTL window.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::Error;
use crate::models::DatabaseSummary;

/// Default lifetime of a cached listing.
pub const DEFAULT_DATABASE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    databases: Arc<Vec<DatabaseSummary>>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.databases.is_empty() && self.fetched_at.elapsed() < ttl
    }
}

/// Process-lifetime memo of `GET /database/` guarded by a read/write lock.
///
/// Fresh means non-empty and younger than the TTL. An empty listing is
/// never served from cache, so a run that creates the first database sees
/// it on the next read.
pub struct DatabaseCache {
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,
}

impl Default for DatabaseCache {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_CACHE_TTL)
    }
}

impl std::fmt::Debug for DatabaseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl DatabaseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Return the cached listing, or run `fetch` and store its result.
    ///
    /// Concurrent callers that miss together queue on the write lock; the
    /// first one fetches and the rest find the fresh entry on re-check.
    /// A failed fetch leaves the previous entry untouched.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<Vec<DatabaseSummary>>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<DatabaseSummary>, Error>>,
    {
        {
            let guard = self.entry.read().await;
            if let Some(entry) = guard.as_ref().filter(|e| e.is_fresh(self.ttl)) {
                trace!(count = entry.databases.len(), "database cache hit");
                return Ok(Arc::clone(&entry.databases));
            }
        }

        let mut guard = self.entry.write().await;
        if let Some(entry) = guard.as_ref().filter(|e| e.is_fresh(self.ttl)) {
            trace!(count = entry.databases.len(), "database cache hit after wait");
            return Ok(Arc::clone(&entry.databases));
        }

        debug!("database cache miss, fetching listing");
        let databases = Arc::new(fetch().await?);
        *guard = Some(CacheEntry {
            databases: Arc::clone(&databases),
            fetched_at: Instant::now(),
        });
        debug!(count = databases.len(), "database listing cached");
        Ok(databases)
    }

    /// Drop the cached listing unconditionally.
    pub async fn invalidate(&self) {
        let mut guard = self.entry.write().await;
        if guard.take().is_some() {
            debug!("database cache invalidated");
        }
    }
}
