use crate::store::ProjectionStore;
use crate::summary::StoreSummary;
use roster_model::{User, UserId, UserRow};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared owner of one [`ProjectionStore`].
///
/// All collaborators write through these operations; each one runs to
/// completion under the lock, so readers never see a half-recomputed store.
/// After [`StoreHandle::teardown`] writes are ignored: late completions of
/// abandoned requests cannot touch a store nobody renders anymore.
#[derive(Clone, Default)]
pub struct StoreHandle {
    inner: Arc<StoreHandleInner>,
}

#[derive(Default)]
struct StoreHandleInner {
    store: Mutex<ProjectionStore>,
    torn_down: AtomicBool,
    revision: AtomicU64,
}

impl StoreHandle {
    pub fn new(store: ProjectionStore) -> Self {
        Self {
            inner: Arc::new(StoreHandleInner {
                store: Mutex::new(store),
                torn_down: AtomicBool::new(false),
                revision: AtomicU64::new(0),
            }),
        }
    }

    /// Returns `false` when the write was dropped because the store is torn down.
    pub fn set_records(&self, records: Vec<User>) -> bool {
        self.write("set_records", |store| store.set_records(records))
    }

    pub fn delete_record(&self, id: UserId) -> bool {
        self.write("delete_record", |store| store.delete_record(id))
    }

    pub fn set_search_query(&self, raw: &str) -> bool {
        self.write("set_search_query", |store| store.set_search_query(raw))
    }

    pub fn projection(&self) -> Vec<UserRow> {
        self.read(|store| store.projection().to_vec())
    }

    pub fn search_query(&self) -> String {
        self.read(|store| store.search_query().to_string())
    }

    pub fn is_searching(&self) -> bool {
        self.read(ProjectionStore::is_searching)
    }

    pub fn summary(&self) -> StoreSummary {
        self.read(ProjectionStore::summary)
    }

    /// Run `f` against a consistent view of the store.
    pub fn read<R>(&self, f: impl FnOnce(&ProjectionStore) -> R) -> R {
        let store = self.lock();
        f(&*store)
    }

    /// Number of writes applied so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::Acquire)
    }

    pub fn teardown(&self) {
        if !self.inner.torn_down.swap(true, Ordering::AcqRel) {
            log::debug!("store: torn down at revision {}", self.revision());
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }

    fn write(&self, op: &str, f: impl FnOnce(&mut ProjectionStore)) -> bool {
        let mut store = self.lock();
        if self.is_torn_down() {
            log::warn!("store: {op} ignored after teardown");
            return false;
        }
        f(&mut *store);
        self.inner.revision.fetch_add(1, Ordering::AcqRel);
        true
    }

    fn lock(&self) -> MutexGuard<'_, ProjectionStore> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
