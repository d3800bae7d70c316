#![allow(dead_code)]

use async_trait::async_trait;
use roster_model::{User, UserId};
use roster_store::StoreHandle;
use roster_sync::{ApiError, ApiResult, RosterConfig, UserApi, UserSync};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Backend whose calls can be held open until the test releases them.
///
/// A held fetch answers with the server list as it is at release time.
/// A held delete removes the id from the server list only when released
/// with `Ok`.
#[derive(Default)]
pub struct ScriptedApi {
    server: Mutex<Vec<User>>,
    fetch_gates: Mutex<VecDeque<oneshot::Receiver<ApiResult<()>>>>,
    delete_gates: Mutex<HashMap<UserId, oneshot::Receiver<ApiResult<()>>>>,
    fail_fetches: AtomicBool,
    fetch_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(ids: &[UserId]) -> Arc<Self> {
        let api = Self::default();
        *api.server.lock().unwrap() = users(ids);
        Arc::new(api)
    }

    /// Hold the next fetch until the returned sender fires.
    pub fn hold_next_fetch(&self) -> oneshot::Sender<ApiResult<()>> {
        let (tx, rx) = oneshot::channel();
        self.fetch_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Hold the next delete of `id` until the returned sender fires.
    pub fn hold_delete(&self, id: UserId) -> oneshot::Sender<ApiResult<()>> {
        let (tx, rx) = oneshot::channel();
        self.delete_gates.lock().unwrap().insert(id, rx);
        tx
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn server_ids(&self) -> Vec<UserId> {
        ids_of(&self.server.lock().unwrap())
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserApi for ScriptedApi {
    async fn fetch_users(&self) -> ApiResult<Vec<User>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.fetch_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            gate.await.unwrap_or(Ok(()))?;
        }
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 503 });
        }
        Ok(self.server.lock().unwrap().clone())
    }

    async fn delete_user(&self, id: UserId) -> ApiResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.delete_gates.lock().unwrap().remove(&id);
        if let Some(gate) = gate {
            gate.await.unwrap_or(Ok(()))?;
        }
        self.server.lock().unwrap().retain(|user| user.id != id);
        Ok(())
    }
}

pub fn users(ids: &[UserId]) -> Vec<User> {
    ids.iter()
        .map(|id| User::new(*id, format!("User {id}"), format!("user{id}@example.com")))
        .collect()
}

pub fn ids_of(users: &[User]) -> Vec<UserId> {
    users.iter().map(|user| user.id).collect()
}

pub fn visible_ids(sync: &UserSync) -> Vec<UserId> {
    sync.store().projection().iter().map(|row| row.id).collect()
}

pub fn cached_ids(sync: &UserSync) -> Vec<UserId> {
    sync.cached().as_deref().map(ids_of).unwrap_or_default()
}

pub fn session(api: Arc<ScriptedApi>) -> UserSync {
    UserSync::new(api, StoreHandle::default(), &RosterConfig::default())
}

/// Let spawned tasks run up to their next await point.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
