//! # Roster Store
//!
//! The authoritative in-memory state of a Roster session.
//!
//! ```text
//!   set_records ──┐
//!  delete_record ─┼──> records − tombstones ──> filter(predicate) ──> Vec<UserRow>
//! set_search_query┘
//! ```
//!
//! Every mutating operation ends by recomputing the projection with
//! [`project`], so `projection() == project(records, tombstones, predicate)`
//! holds between any two calls.

mod handle;
mod projection;
mod store;
mod summary;

pub use handle::StoreHandle;
pub use projection::{matches_predicate, project};
pub use store::{ProjectionStore, StoreState};
pub use summary::StoreSummary;
