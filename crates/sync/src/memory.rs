use crate::api::UserApi;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use roster_model::{User, UserId};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-process record source backed by a `Vec<User>`.
///
/// Deletes remove from the backing list; unknown ids answer 404. Failures can
/// be injected per id (deletes) or globally (fetches) to exercise rollback.
#[derive(Debug, Default)]
pub struct InMemoryUserApi {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    failing_deletes: BTreeSet<UserId>,
    fetch_failure: Option<u16>,
    fetch_calls: usize,
    delete_calls: usize,
}

impl InMemoryUserApi {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                users,
                ..MemoryState::default()
            }),
        }
    }

    /// Make every delete of `id` fail with HTTP 500.
    pub fn fail_deletes_for(&self, id: UserId) {
        self.lock().failing_deletes.insert(id);
    }

    /// Make fetches fail with `status` (or succeed again with `None`).
    pub fn fail_fetches_with(&self, status: Option<u16>) {
        self.lock().fetch_failure = status;
    }

    pub fn users(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserApi for InMemoryUserApi {
    async fn fetch_users(&self) -> ApiResult<Vec<User>> {
        let mut state = self.lock();
        state.fetch_calls += 1;
        if let Some(status) = state.fetch_failure {
            return Err(ApiError::Status { status });
        }
        Ok(state.users.clone())
    }

    async fn delete_user(&self, id: UserId) -> ApiResult<()> {
        let mut state = self.lock();
        state.delete_calls += 1;
        if state.failing_deletes.contains(&id) {
            return Err(ApiError::Status { status: 500 });
        }
        let before = state.users.len();
        state.users.retain(|user| user.id != id);
        if state.users.len() == before {
            return Err(ApiError::Status { status: 404 });
        }
        Ok(())
    }
}
