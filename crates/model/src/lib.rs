//! # Roster Model
//!
//! Record types shared by every Roster crate.
//!
//! ```text
//! GET /users ──> Vec<User> ──> (store) ──> Vec<UserRow> ──> table
//! ```
//!
//! `User` mirrors the record source field for field. `UserRow` is the
//! display shape the projection hands to renderers.

mod row;
mod user;

pub use row::UserRow;
pub use user::{Address, Company, Geo, User, UserId};
