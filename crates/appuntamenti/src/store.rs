//! In-memory record set for one view.
//!
//! A refresh is split in two halves so that responses arriving out of order
//! cannot overwrite newer data:
//! - [`DateRecordStore::begin`] hands out a ticket with a monotonic sequence number
//! - [`DateRecordStore::complete`] applies the result only if no newer request
//!   was started in the meantime
//!
//! The record list is swapped as a whole behind an `Arc`, so readers always
//! see a complete list.

use chrono::{DateTime, Local};
use postino::{ApiClient, ClientError, DateFilter, DateRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// What a view renders from.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Arc<Vec<DateRecord>>,
    /// Filter the records were fetched with
    pub filter: DateFilter,
    pub refreshed_at: Option<DateTime<Local>>,
    /// Message of the latest failed refresh, cleared by the next success
    pub last_error: Option<String>,
}

impl Snapshot {
    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }
}

#[derive(Debug)]
pub struct RefreshTicket {
    seq: u64,
    filter: DateFilter,
}

impl RefreshTicket {
    pub fn filter(&self) -> &DateFilter {
        &self.filter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A newer request was started; this result was dropped
    Superseded,
}

struct StoreState {
    snapshot: Snapshot,
    /// Filter of the most recently started request
    requested: DateFilter,
}

pub struct DateRecordStore {
    name: &'static str,
    issued: AtomicU64,
    state: RwLock<StoreState>,
}

impl DateRecordStore {
    pub fn new(name: &'static str, filter: DateFilter) -> Self {
        Self {
            name,
            issued: AtomicU64::new(0),
            state: RwLock::new(StoreState {
                snapshot: Snapshot {
                    filter: filter.clone(),
                    ..Snapshot::default()
                },
                requested: filter,
            }),
        }
    }

    /// Start a refresh with `filter`; later reloads reuse it.
    pub async fn begin(&self, filter: DateFilter) -> RefreshTicket {
        let mut state = self.state.write().await;
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        state.requested = filter.clone();
        debug!(store = self.name, seq, "Refresh started");
        RefreshTicket { seq, filter }
    }

    /// Finish a refresh.
    ///
    /// On failure the records are left as they were and the error is
    /// returned. Results of superseded requests are dropped whether they
    /// succeeded or not.
    pub async fn complete(
        &self,
        ticket: RefreshTicket,
        result: Result<Vec<DateRecord>, ClientError>,
    ) -> Result<RefreshOutcome, ClientError> {
        let mut state = self.state.write().await;

        let latest = self.issued.load(Ordering::SeqCst);
        if ticket.seq < latest {
            debug!(store = self.name, seq = ticket.seq, latest, "Dropping superseded response");
            return Ok(RefreshOutcome::Superseded);
        }

        match result {
            Ok(records) => {
                let count = records.len();
                let old_count = state.snapshot.records.len();
                state.snapshot = Snapshot {
                    records: Arc::new(records),
                    filter: ticket.filter,
                    refreshed_at: Some(Local::now()),
                    last_error: None,
                };
                if count != old_count {
                    info!(
                        store = self.name,
                        count,
                        change = count as i64 - old_count as i64,
                        "Records updated"
                    );
                } else {
                    debug!(store = self.name, count, "Records refreshed");
                }
                Ok(RefreshOutcome::Applied { count })
            }
            Err(e) => {
                warn!(store = self.name, error = %e, "Refresh failed, keeping previous records");
                state.snapshot.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetch with `filter` and apply the result.
    pub async fn refresh(
        &self,
        api: &ApiClient,
        filter: DateFilter,
    ) -> Result<RefreshOutcome, ClientError> {
        let ticket = self.begin(filter).await;
        let result = api.list_dates(ticket.filter()).await;
        self.complete(ticket, result).await
    }

    /// Fetch again with the most recently requested filter.
    pub async fn reload(&self, api: &ApiClient) -> Result<RefreshOutcome, ClientError> {
        let ticket = self.begin_reload().await;
        let result = api.list_dates(ticket.filter()).await;
        self.complete(ticket, result).await
    }

    /// Like [`begin`](Self::begin) with the requested filter, read under the
    /// same guard that issues the sequence number.
    async fn begin_reload(&self) -> RefreshTicket {
        let state = self.state.write().await;
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(store = self.name, seq, "Reload started");
        RefreshTicket {
            seq,
            filter: state.requested.clone(),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot.clone()
    }

    pub async fn requested_filter(&self) -> DateFilter {
        self.state.read().await.requested.clone()
    }
}
