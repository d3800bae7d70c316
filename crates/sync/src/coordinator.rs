use crate::api::UserApi;
use crate::cache::{CacheStatus, MutationContext, QueryCache};
use crate::config::RosterConfig;
use crate::error::{Result, SyncError};
use log::{debug, info, warn};
use roster_model::{User, UserId};
use roster_store::StoreHandle;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Remote cache plus the optimistic delete protocol for one user collection.
///
/// The coordinator owns the [`QueryCache`] and reaches the projection store
/// only through [`StoreHandle`] operations. The cache lock is never held
/// across an await, and store writes happen under it so every settle step
/// sees a fully recomputed store.
#[derive(Clone)]
pub struct UserSync {
    inner: Arc<UserSyncInner>,
}

struct UserSyncInner {
    api: Arc<dyn UserApi>,
    store: StoreHandle,
    cache: Mutex<QueryCache>,
    stale_time: Duration,
    torn_down: AtomicBool,
}

impl UserSync {
    pub fn new(api: Arc<dyn UserApi>, store: StoreHandle, config: &RosterConfig) -> Self {
        Self {
            inner: Arc::new(UserSyncInner {
                api,
                store,
                cache: Mutex::new(QueryCache::default()),
                stale_time: config.stale_time,
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.inner.store
    }

    /// Cached collection while it is fresh, otherwise [`UserSync::fetch_all`].
    pub async fn users(&self) -> Result<Vec<User>> {
        {
            let cache = self.cache();
            if cache.is_fresh(self.inner.stale_time, Instant::now()) {
                debug!("serving {} cached users", cache.data().map_or(0, <[User]>::len));
                return Ok(cache.to_vec());
            }
        }
        self.fetch_all().await
    }

    /// Fetch the authoritative collection, write it to the cache and the store.
    ///
    /// While a delete is pending the refresh is queued instead and the current
    /// (optimistic) contents are returned; a result that a delete cancelled
    /// mid-flight is discarded the same way. On failure the cache keeps its
    /// previous contents.
    pub async fn fetch_all(&self) -> Result<Vec<User>> {
        self.ensure_live()?;
        let ticket = {
            let mut cache = self.cache();
            if cache.has_pending_mutations() {
                cache.queue_refresh();
                debug!("refresh held until pending deletes settle");
                return Ok(cache.to_vec());
            }
            cache.begin_fetch()
        };

        let result = self.inner.api.fetch_users().await;
        if self.is_torn_down() {
            debug!("fetch completed after teardown; result ignored");
            return Err(SyncError::TornDown);
        }

        let mut cache = self.cache();
        match result {
            Ok(users) => {
                if !cache.finish_fetch(ticket, users.clone(), Instant::now()) {
                    debug!("fetch result superseded; discarded");
                    return Ok(cache.to_vec());
                }
                info!("fetched {} users", users.len());
                self.inner.store.set_records(users.clone());
                Ok(users)
            }
            Err(source) => {
                warn!(
                    "fetch failed: {source}; keeping {} cached users",
                    cache.data().map_or(0, <[User]>::len)
                );
                cache.fail_fetch(source.clone());
                Err(SyncError::FetchFailure { source })
            }
        }
    }

    /// Mark the cache stale and refetch.
    pub async fn invalidate(&self) -> Result<Vec<User>> {
        self.cache().invalidate();
        self.fetch_all().await
    }

    /// Optimistically delete `id`.
    ///
    /// The cache and the store drop `id` when this is called, before the
    /// returned future is first polled, so a caller may spawn the remote half
    /// and render the optimistic state right away. If the remote rejects the
    /// delete, the cache is restored from the snapshot taken just before it
    /// and [`SyncError::MutationFailure`] is returned. The store's tombstone
    /// stays: the id remains hidden for the session even though the backend
    /// still has it. Either way one refresh runs once no delete is pending;
    /// its failure is logged, not returned.
    pub fn delete(&self, id: UserId) -> impl Future<Output = Result<()>> + Send + 'static {
        let started = self.begin_delete(id);
        let this = self.clone();
        async move { this.finish_delete(started?).await }
    }

    fn begin_delete(&self, id: UserId) -> Result<MutationContext> {
        self.ensure_live()?;
        let context = {
            let mut cache = self.cache();
            let context = cache.begin_mutation(id);
            self.inner.store.delete_record(id);
            context
        };
        info!("deleting user {id}");
        Ok(context)
    }

    async fn finish_delete(&self, context: MutationContext) -> Result<()> {
        let id = context.id;
        let outcome = self.inner.api.delete_user(id).await;
        if self.is_torn_down() {
            debug!("delete of user {id} completed after teardown; result ignored");
            return Err(SyncError::TornDown);
        }

        let (result, refresh) = {
            let mut cache = self.cache();
            let result = match outcome {
                Ok(()) => {
                    info!("user {id} deleted");
                    Ok(())
                }
                Err(source) => {
                    warn!("delete of user {id} failed: {source}; rolling back cache");
                    cache.roll_back(context);
                    Err(SyncError::MutationFailure { id, source })
                }
            };
            (result, cache.settle_mutation())
        };

        if refresh {
            if let Err(err) = self.fetch_all().await {
                warn!("refresh after delete of user {id} failed: {err}");
            }
        }
        result
    }

    /// Current cache contents, `None` before the first successful fetch.
    pub fn cached(&self) -> Option<Vec<User>> {
        self.cache().data().map(<[User]>::to_vec)
    }

    pub fn status(&self) -> CacheStatus {
        self.cache().status(self.inner.stale_time, Instant::now())
    }

    /// Abandon the session: in-flight completions are ignored from now on and
    /// the store stops accepting writes.
    pub fn teardown(&self) {
        if !self.inner.torn_down.swap(true, Ordering::AcqRel) {
            debug!("sync: torn down");
        }
        self.inner.store.teardown();
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_torn_down() {
            return Err(SyncError::TornDown);
        }
        Ok(())
    }

    fn cache(&self) -> MutexGuard<'_, QueryCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
