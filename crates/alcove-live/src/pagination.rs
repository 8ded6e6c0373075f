//! Backfill pagination guard.
//!
//! Timelines and space listings grow backwards on demand. The [`Paginator`]
//! owns the state machine that keeps those backfill requests honest: at most
//! one request in flight, no requests once upstream reports the start of
//! history, and a status value observers can watch.

use std::future::Future;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Where a list stands with respect to backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaginationStatus {
    /// No request in flight.
    Idle {
        /// Upstream reported that no further history exists. Terminal:
        /// once true, requests stop for good.
        hit_boundary: bool,
    },
    /// A backfill request is in flight, locally or upstream.
    Paginating,
}

impl PaginationStatus {
    /// The initial status: idle, boundary not yet reached.
    pub fn idle() -> Self {
        Self::Idle {
            hit_boundary: false,
        }
    }

    /// Whether further requests are pointless.
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            Self::Idle {
                hit_boundary: true
            }
        )
    }
}

impl Default for PaginationStatus {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Debug, Default)]
struct Flight {
    in_flight: bool,
    upstream_paginating: bool,
    hit_boundary: bool,
}

impl Flight {
    fn status(&self) -> PaginationStatus {
        if self.in_flight || self.upstream_paginating {
            PaginationStatus::Paginating
        } else {
            PaginationStatus::Idle {
                hit_boundary: self.hit_boundary,
            }
        }
    }
}

/// Serializes backfill requests for one list.
///
/// The guard transition happens synchronously under a lock before the
/// fetch future is ever polled, so two callers racing `request_more` can
/// never both issue a request. Upstream status reports are folded into the
/// same state through [`observe_upstream`](Self::observe_upstream).
#[derive(Debug)]
pub struct Paginator {
    page_size: u16,
    flight: Mutex<Flight>,
    status_tx: watch::Sender<PaginationStatus>,
}

impl Paginator {
    /// Create an idle paginator requesting `page_size` items per fill.
    pub fn new(page_size: u16) -> Self {
        let (status_tx, _status_rx) = watch::channel(PaginationStatus::idle());
        Self {
            page_size,
            flight: Mutex::new(Flight::default()),
            status_tx,
        }
    }

    /// Items requested per backfill.
    pub fn page_size(&self) -> u16 {
        self.page_size
    }

    /// The current status.
    pub fn status(&self) -> PaginationStatus {
        *self.status_tx.borrow()
    }

    /// A watch on status transitions.
    pub fn watch(&self) -> watch::Receiver<PaginationStatus> {
        self.status_tx.subscribe()
    }

    /// Request one more page through `fetch`, unless a request is already
    /// in flight or the boundary has been reached.
    ///
    /// Returns `Ok(true)` when a page was requested and the request
    /// completed, `Ok(false)` when the guard suppressed the request without
    /// invoking `fetch`. A failed fetch leaves the paginator idle and
    /// retryable and hands the error back unchanged.
    pub async fn request_more<E, F, Fut>(&self, fetch: F) -> Result<bool, E>
    where
        F: FnOnce(u16) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        {
            let mut flight = self.flight.lock();
            if flight.in_flight || flight.upstream_paginating || flight.hit_boundary {
                return Ok(false);
            }
            flight.in_flight = true;
            self.status_tx.send_replace(flight.status());
        }

        let result = fetch(self.page_size).await;

        let mut flight = self.flight.lock();
        flight.in_flight = false;
        self.status_tx.send_replace(flight.status());
        result.map(|()| true)
    }

    /// Fold a status report from the upstream channel into the local state.
    ///
    /// A boundary report is sticky: once upstream says history is complete,
    /// the paginator stays exhausted.
    pub fn observe_upstream(&self, status: PaginationStatus) {
        let mut flight = self.flight.lock();
        match status {
            PaginationStatus::Paginating => flight.upstream_paginating = true,
            PaginationStatus::Idle { hit_boundary } => {
                flight.upstream_paginating = false;
                flight.hit_boundary |= hit_boundary;
            }
        }
        self.status_tx.send_replace(flight.status());
    }
}
