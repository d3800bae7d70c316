//! # Roster Debounce
//!
//! Emits a value only after it has been stable for a quiet period.
//!
//! ```text
//! push("J") push("Jo") push("Joh") push("John") ....quiet.... ──> "John"
//! ```
//!
//! Two layers:
//!
//! - [`DebounceState`]: a synchronous state machine (`Idle` / `Pending`) that
//!   is driven with explicit instants, so it can be tested without a clock.
//! - [`Debouncer`]: a tokio task that owns one state machine and one timer and
//!   publishes settled values through a `watch` channel.
//!
//! ## Example
//!
//! ```no_run
//! use roster_debounce::{DebounceConfig, Debouncer};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let debouncer = Debouncer::start(String::new(), DebounceConfig::default());
//!     let mut settled = debouncer.subscribe();
//!
//!     debouncer.push("Jo".to_string());
//!     debouncer.push("John".to_string());
//!
//!     settled.changed().await.ok();
//!     assert_eq!(*settled.borrow(), "John");
//! }
//! ```

mod debouncer;
mod state;

pub use debouncer::{DebounceConfig, Debouncer};
pub use state::{DebouncePhase, DebounceState};
