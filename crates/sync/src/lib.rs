//! # Roster Sync
//!
//! Remote side of a Roster session: the record source, a cache of the last
//! fetched collection, and the optimistic delete protocol.
//!
//! ## Delete protocol
//!
//! ```text
//! delete(id)
//!     │
//!     ├──> cancel in-flight refreshes, hold new ones
//!     ├──> snapshot cache ──> remove id from cache ──> store.delete_record(id)
//!     ├──> UserApi::delete_user(id) ...await...
//!     │      ├─ ok  : drop snapshot
//!     │      └─ err : restore cache from snapshot, report MutationFailure
//!     └──> settled: one authoritative refresh once no delete is pending
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use roster_store::StoreHandle;
//! use roster_sync::{HttpUserApi, RosterConfig, UserSync};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), roster_sync::SyncError> {
//!     let config = RosterConfig::default();
//!     let api = Arc::new(HttpUserApi::new(&config)?);
//!     let store = StoreHandle::default();
//!     let sync = UserSync::new(api, store.clone(), &config);
//!
//!     sync.fetch_all().await?;
//!     store.set_search_query("leanne");
//!     sync.delete(1).await?;
//!     Ok(())
//! }
//! ```

mod api;
mod cache;
mod config;
mod coordinator;
mod error;
mod http;
mod memory;

pub use api::UserApi;
pub use cache::{CacheStatus, QueryCache};
pub use config::{RosterConfig, DEFAULT_API_BASE_URL, ENV_API_URL, ENV_DEBOUNCE_MS};
pub use coordinator::UserSync;
pub use error::{ApiError, ApiResult, Result, SyncError};
pub use http::HttpUserApi;
pub use memory::InMemoryUserApi;
