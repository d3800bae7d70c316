use crate::render::Frame;
use anyhow::{Context, Result};
use log::{debug, warn};
use roster_debounce::{DebounceConfig, Debouncer};
use roster_model::UserId;
use roster_security::sanitize_and_validate_value;
use roster_sync::UserSync;
use serde::Deserialize;
use serde_json::Value;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, Mutex};

/// One line of session input.
///
/// Query payloads stay untyped: a non-string `text`/`query` becomes the
/// empty query instead of rejecting the line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Keystroke-level input; applied once it survives the quiet period.
    Type {
        #[serde(default)]
        text: Value,
    },
    /// Applied immediately.
    Search {
        #[serde(default)]
        query: Value,
    },
    Clear,
    Delete {
        id: UserId,
    },
    Refresh,
    Show,
}

/// A store, its sync coordinator and a search debouncer wired together.
///
/// Every applied change writes one JSON frame per line. Deletes run in the
/// background: the optimistic frame is written at once and a second frame
/// when the delete settles, while input keeps flowing. End of input waits
/// for in-flight deletes, then tears all three down.
pub struct Session {
    sync: UserSync,
    search: Debouncer<String>,
    settled_tx: mpsc::UnboundedSender<DeleteOutcome>,
    settled_rx: Mutex<mpsc::UnboundedReceiver<DeleteOutcome>>,
    in_flight: AtomicUsize,
}

type DeleteOutcome = (UserId, roster_sync::Result<()>);

impl Session {
    pub fn new(sync: UserSync, debounce: Duration) -> Self {
        let search = Debouncer::start(
            sync.store().search_query(),
            DebounceConfig {
                quiet_period: debounce,
            },
        );
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            sync,
            search,
            settled_tx,
            settled_rx: Mutex::new(settled_rx),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub const fn sync(&self) -> &UserSync {
        &self.sync
    }

    /// Deletes issued but not yet settled.
    pub fn deletes_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut query_rx = self.search.subscribe();
        let mut settles = self.settled_rx.lock().await;
        let mut input_open = true;

        let initial = match self.sync.users().await {
            Ok(_) => Frame::capture(self.sync.store()),
            Err(err) => {
                warn!("initial load failed: {err}");
                Frame::capture(self.sync.store()).with_error(&err)
            }
        };
        write_frame(out, &initial)?;

        while input_open || self.deletes_in_flight() > 0 {
            tokio::select! {
                biased;

                Some((id, outcome)) = settles.recv() => {
                    self.in_flight.fetch_sub(1, Ordering::AcqRel);
                    debug!("delete of user {id} settled");
                    write_frame(out, &self.settled_frame(outcome))?;
                }
                changed = query_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let query = query_rx.borrow_and_update().clone();
                    debug!("search query now {query:?}");
                    self.sync.store().set_search_query(&query);
                    write_frame(out, &Frame::capture(self.sync.store()))?;
                }
                line = lines.next_line(), if input_open => {
                    match line.context("Failed to read session input")? {
                        Some(line) => {
                            if let Some(frame) = self.handle_line(&line).await {
                                write_frame(out, &frame)?;
                            }
                        }
                        None => input_open = false,
                    }
                }
                else => break,
            }
        }

        self.teardown();
        Ok(())
    }

    /// Parse and apply one input line. Blank lines are skipped.
    pub async fn handle_line(&self, line: &str) -> Option<Frame> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Action>(line) {
            Ok(action) => self.apply(action).await,
            Err(err) => {
                warn!("ignoring session input {line:?}: {err}");
                let frame = Frame::capture(self.sync.store());
                Some(frame.with_error(format!("invalid action: {err}")))
            }
        }
    }

    /// Returns the frame to render now, or `None` when the change renders
    /// through the search query instead.
    ///
    /// `search` and `clear` replace the query at once and discard any typed
    /// input still waiting out its quiet period.
    pub async fn apply(&self, action: Action) -> Option<Frame> {
        let store = self.sync.store();
        match action {
            Action::Type { text } => {
                // Raw text; the store validates length before sanitizing.
                let text = match text {
                    Value::String(text) => text,
                    _ => String::new(),
                };
                self.search.push(text);
                None
            }
            Action::Search { query } => {
                self.search.replace(sanitize_and_validate_value(&query));
                None
            }
            Action::Clear => {
                self.search.replace(String::new());
                None
            }
            Action::Delete { id } => {
                let pending = self.sync.delete(id);
                let settled_tx = self.settled_tx.clone();
                self.in_flight.fetch_add(1, Ordering::AcqRel);
                tokio::spawn(async move {
                    let _ = settled_tx.send((id, pending.await));
                });
                Some(Frame::capture(store))
            }
            Action::Refresh => Some(self.settled_frame(self.sync.invalidate().await.map(drop))),
            Action::Show => Some(Frame::capture(store)),
        }
    }

    pub fn teardown(&self) {
        self.search.shutdown();
        self.sync.teardown();
    }

    fn settled_frame(&self, outcome: roster_sync::Result<()>) -> Frame {
        let frame = Frame::capture(self.sync.store());
        match outcome {
            Ok(()) => frame,
            Err(err) => {
                warn!("{err}");
                frame.with_error(&err)
            }
        }
    }
}

fn write_frame<W: Write>(out: &mut W, frame: &Frame) -> Result<()> {
    serde_json::to_writer(&mut *out, frame)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_parse_from_json_lines() {
        let parsed: Action = serde_json::from_str(r#"{"action":"type","text":"Jo"}"#).unwrap();
        assert_eq!(
            parsed,
            Action::Type {
                text: Value::from("Jo")
            }
        );

        let parsed: Action = serde_json::from_str(r#"{"action":"delete","id":3}"#).unwrap();
        assert_eq!(parsed, Action::Delete { id: 3 });

        let parsed: Action = serde_json::from_str(r#"{"action":"search"}"#).unwrap();
        assert_eq!(parsed, Action::Search { query: Value::Null });

        assert!(serde_json::from_str::<Action>(r#"{"action":"explode"}"#).is_err());
        assert!(serde_json::from_str::<Action>(r#"{"action":"delete"}"#).is_err());
    }
}
