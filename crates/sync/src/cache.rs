use crate::error::ApiError;
use roster_model::{User, UserId};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Last fetched collection plus the bookkeeping that orders refreshes
/// against optimistic deletes.
///
/// - `epoch` moves on every delete; a fetch that started in an older epoch
///   was cancelled by that delete and its result is discarded.
/// - While `pending_mutations > 0` no refresh runs; one is queued instead.
/// - Fetch results apply in issue order (`applied_seq`), never older over newer.
#[derive(Debug, Default)]
pub struct QueryCache {
    data: Option<Vec<User>>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    epoch: u64,
    next_seq: u64,
    applied_seq: u64,
    in_flight_fetches: usize,
    pending_mutations: usize,
    refresh_queued: bool,
    last_error: Option<ApiError>,
}

/// Point-in-time view of a [`QueryCache`] for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub cached: Option<usize>,
    pub is_loading: bool,
    pub is_deleting: bool,
    pub is_stale: bool,
    pub refresh_queued: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FetchTicket {
    seq: u64,
    epoch: u64,
}

/// Pre-mutation snapshot for one in-flight delete. Consumed on settle.
#[derive(Debug)]
pub(crate) struct MutationContext {
    pub(crate) id: UserId,
    previous: Option<Vec<User>>,
}

impl QueryCache {
    pub fn data(&self) -> Option<&[User]> {
        self.data.as_deref()
    }

    pub fn is_fresh(&self, stale_time: Duration, now: Instant) -> bool {
        if self.invalidated {
            return false;
        }
        self.fetched_at
            .is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }

    pub const fn has_pending_mutations(&self) -> bool {
        self.pending_mutations > 0
    }

    pub fn status(&self, stale_time: Duration, now: Instant) -> CacheStatus {
        CacheStatus {
            cached: self.data.as_ref().map(Vec::len),
            is_loading: self.in_flight_fetches > 0,
            is_deleting: self.pending_mutations > 0,
            is_stale: !self.is_fresh(stale_time, now),
            refresh_queued: self.refresh_queued,
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<User> {
        self.data.clone().unwrap_or_default()
    }

    pub(crate) fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub(crate) fn queue_refresh(&mut self) {
        self.refresh_queued = true;
    }

    pub(crate) fn begin_fetch(&mut self) -> FetchTicket {
        self.next_seq += 1;
        self.in_flight_fetches += 1;
        self.refresh_queued = false;
        FetchTicket {
            seq: self.next_seq,
            epoch: self.epoch,
        }
    }

    /// Apply a successful fetch. Returns `false` when the result was discarded
    /// because a delete cancelled it or a newer fetch already landed.
    pub(crate) fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        users: Vec<User>,
        now: Instant,
    ) -> bool {
        self.in_flight_fetches = self.in_flight_fetches.saturating_sub(1);
        if ticket.epoch != self.epoch || self.pending_mutations > 0 {
            // Once every delete has settled, the settling refresh covers this one.
            if self.pending_mutations > 0 {
                self.refresh_queued = true;
            }
            return false;
        }
        if ticket.seq < self.applied_seq {
            return false;
        }
        self.data = Some(users);
        self.fetched_at = Some(now);
        self.invalidated = false;
        self.applied_seq = ticket.seq;
        self.last_error = None;
        true
    }

    /// Record a failed fetch. Cached data is left as it was.
    pub(crate) fn fail_fetch(&mut self, err: ApiError) {
        self.in_flight_fetches = self.in_flight_fetches.saturating_sub(1);
        self.last_error = Some(err);
    }

    /// Cancel in-flight refreshes, snapshot, then optimistically drop `id`.
    ///
    /// The snapshot is taken from the current contents, which already carry
    /// every earlier pending delete.
    pub(crate) fn begin_mutation(&mut self, id: UserId) -> MutationContext {
        self.epoch += 1;
        self.pending_mutations += 1;
        let previous = self.data.clone();
        if let Some(users) = self.data.as_mut() {
            users.retain(|user| user.id != id);
        }
        MutationContext { id, previous }
    }

    pub(crate) fn roll_back(&mut self, context: MutationContext) {
        if let Some(previous) = context.previous {
            self.data = Some(previous);
        }
    }

    /// Mark one mutation settled. Returns `true` when it was the last pending
    /// one, i.e. the caller should now run the reconciling refresh.
    pub(crate) fn settle_mutation(&mut self) -> bool {
        self.pending_mutations = self.pending_mutations.saturating_sub(1);
        if self.pending_mutations > 0 {
            self.refresh_queued = true;
            return false;
        }
        true
    }
}
