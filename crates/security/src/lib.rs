//! # Roster Security
//!
//! Text-safety filter applied to every piece of user-supplied search text
//! before it reaches the store or a renderer.
//!
//! All functions are pure and total: they never fail and never panic.

mod sanitize;

pub use sanitize::{
    is_valid, is_valid_value, sanitize, sanitize_and_validate, sanitize_and_validate_value,
    sanitize_value, MAX_QUERY_CHARS,
};
