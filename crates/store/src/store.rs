use crate::projection::project;
use crate::summary::StoreSummary;
use roster_model::{User, UserId, UserRow};
use roster_security::sanitize_and_validate;
use std::collections::BTreeSet;

/// Initial contents for [`ProjectionStore::with_state`].
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub records: Vec<User>,
    pub tombstones: BTreeSet<UserId>,
    pub search_query: String,
}

/// Records, tombstones, predicate and the projection derived from them.
///
/// The projection is never written except by [`ProjectionStore::recompute`],
/// which every mutating operation calls last.
#[derive(Debug, Default)]
pub struct ProjectionStore {
    records: Vec<User>,
    tombstones: BTreeSet<UserId>,
    search_query: String,
    projection: Vec<UserRow>,
}

impl ProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from injected state.
    ///
    /// The same rules as the live operations apply: tombstoned records are
    /// dropped and the query goes through sanitization.
    pub fn with_state(state: StoreState) -> Self {
        let mut store = Self {
            records: Vec::new(),
            tombstones: state.tombstones,
            search_query: sanitize_and_validate(&state.search_query),
            projection: Vec::new(),
        };
        store.set_records(state.records);
        store
    }

    /// Replace the record set with a fresh fetch result.
    ///
    /// Tombstoned ids stay hidden even when the source still serves them.
    pub fn set_records(&mut self, records: Vec<User>) {
        let fetched = records.len();
        let tombstones = &self.tombstones;
        self.records = records
            .into_iter()
            .filter(|user| !tombstones.contains(&user.id))
            .collect();
        log::debug!(
            "store: set_records fetched={fetched} active={} tombstones={}",
            self.records.len(),
            self.tombstones.len()
        );
        self.recompute();
    }

    /// Tombstone `id` for the rest of the session and drop it from the active set.
    pub fn delete_record(&mut self, id: UserId) {
        if !self.tombstones.insert(id) {
            log::debug!("store: user {id} already tombstoned");
        }
        self.records.retain(|user| user.id != id);
        self.recompute();
    }

    /// Sanitize `raw` and make it the active predicate.
    pub fn set_search_query(&mut self, raw: &str) {
        self.search_query = sanitize_and_validate(raw);
        self.recompute();
    }

    pub fn projection(&self) -> &[UserRow] {
        &self.projection
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn is_searching(&self) -> bool {
        !self.search_query.is_empty()
    }

    pub fn active_records(&self) -> &[User] {
        &self.records
    }

    pub fn tombstones(&self) -> &BTreeSet<UserId> {
        &self.tombstones
    }

    pub fn is_tombstoned(&self, id: UserId) -> bool {
        self.tombstones.contains(&id)
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            visible: self.projection.len(),
            active: self.records.len(),
            is_searching: self.is_searching(),
        }
    }

    fn recompute(&mut self) {
        self.projection = project(&self.records, &self.tombstones, &self.search_query);
        log::debug!(
            "store: projection {} of {} (query={:?})",
            self.projection.len(),
            self.records.len(),
            self.search_query
        );
    }
}
