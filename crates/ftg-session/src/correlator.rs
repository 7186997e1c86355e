//! Request correlation.
//!
//! Matches paginated query responses back to the call that produced them.
//! Request ids are monotonically increasing per channel, starting from 1,
//! and scoped to the current connected session: the gateway restarts its
//! own sequence on re-login, so the correlator restarts too.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use ftg_core::{Channel, QueryKind, RequestId};

/// An outstanding query awaiting its terminal page.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: QueryKind,
    pub submitted_at: DateTime<Utc>,
}

/// Outcome of matching an inbound response page.
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    /// Page belongs to a live request; carries its kind. The request stays
    /// live unless this was the terminal page.
    Matched { kind: QueryKind, terminal: bool },
    /// No live request with this id. Late pages from before a disconnect
    /// land here and must not reach the application.
    Stale,
}

#[derive(Debug, Default)]
struct ChannelRequests {
    next_id: i32,
    pending: HashMap<RequestId, PendingRequest>,
}

impl ChannelRequests {
    fn allocate(&mut self) -> RequestId {
        self.next_id += 1;
        RequestId(self.next_id)
    }
}

/// Multiplexed request-id table, one sequence per channel.
///
/// Shared between the request path (any task may submit) and the event
/// loop (completes and resets); a mutex keeps the id assignment atomic.
#[derive(Debug, Default)]
pub struct RequestCorrelator {
    md: Mutex<ChannelRequests>,
    td: Mutex<ChannelRequests>,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, channel: Channel) -> &Mutex<ChannelRequests> {
        match channel {
            Channel::MarketData => &self.md,
            Channel::Trading => &self.td,
        }
    }

    /// Allocate an id without tracking a pending query.
    ///
    /// Used for order inserts and actions, which are answered through the
    /// order-flow callbacks rather than paginated pages but still need a
    /// unique id on the wire.
    pub fn allocate(&self, channel: Channel) -> RequestId {
        self.channel(channel).lock().allocate()
    }

    /// Register a query and return its id.
    pub fn submit(&self, channel: Channel, kind: QueryKind) -> RequestId {
        let mut ch = self.channel(channel).lock();
        let id = ch.allocate();
        ch.pending.insert(
            id,
            PendingRequest {
                id,
                kind,
                submitted_at: Utc::now(),
            },
        );
        debug!(%channel, %id, %kind, "query submitted");
        id
    }

    /// Match an inbound page against the pending table.
    ///
    /// The terminal page (`is_last`) retires the request; later pages with
    /// the same id come back `Stale`.
    pub fn complete(&self, channel: Channel, id: RequestId, is_last: bool) -> CompleteOutcome {
        let mut ch = self.channel(channel).lock();
        match ch.pending.get(&id) {
            Some(pending) => {
                let kind = pending.kind;
                if is_last {
                    ch.pending.remove(&id);
                }
                CompleteOutcome::Matched {
                    kind,
                    terminal: is_last,
                }
            }
            None => {
                warn!(%channel, %id, "response page for unknown request id");
                CompleteOutcome::Stale
            }
        }
    }

    /// Drop every pending request for the channel and restart its id
    /// sequence. Called on front disconnect; the dropped queries never
    /// complete.
    pub fn reset(&self, channel: Channel) -> Vec<PendingRequest> {
        let mut ch = self.channel(channel).lock();
        ch.next_id = 0;
        let dropped: Vec<PendingRequest> = ch.pending.drain().map(|(_, p)| p).collect();
        if !dropped.is_empty() {
            debug!(%channel, dropped = dropped.len(), "pending queries dropped on disconnect");
        }
        dropped
    }

    /// Number of queries still awaiting their terminal page.
    pub fn outstanding(&self, channel: Channel) -> usize {
        self.channel(channel).lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_monotonic_from_one() {
        let correlator = RequestCorrelator::new();
        let a = correlator.submit(Channel::Trading, QueryKind::TradingAccount);
        let b = correlator.submit(Channel::Trading, QueryKind::Order);
        assert_eq!(a, RequestId(1));
        assert_eq!(b, RequestId(2));
    }

    #[test]
    fn test_channels_have_independent_sequences() {
        let correlator = RequestCorrelator::new();
        let td = correlator.submit(Channel::Trading, QueryKind::Trade);
        let md = correlator.submit(Channel::MarketData, QueryKind::MarketData);
        assert_eq!(td, RequestId(1));
        assert_eq!(md, RequestId(1));
    }

    #[test]
    fn test_complete_multi_page_then_terminal() {
        let correlator = RequestCorrelator::new();
        let id = correlator.submit(Channel::Trading, QueryKind::Order);

        let first = correlator.complete(Channel::Trading, id, false);
        assert_eq!(
            first,
            CompleteOutcome::Matched {
                kind: QueryKind::Order,
                terminal: false
            }
        );
        assert_eq!(correlator.outstanding(Channel::Trading), 1);

        let last = correlator.complete(Channel::Trading, id, true);
        assert_eq!(
            last,
            CompleteOutcome::Matched {
                kind: QueryKind::Order,
                terminal: true
            }
        );
        assert_eq!(correlator.outstanding(Channel::Trading), 0);

        // Anything after the terminal page is stale.
        assert_eq!(
            correlator.complete(Channel::Trading, id, true),
            CompleteOutcome::Stale
        );
    }

    #[test]
    fn test_concurrent_queries_multiplex() {
        let correlator = RequestCorrelator::new();
        let a = correlator.submit(Channel::Trading, QueryKind::TradingAccount);
        let b = correlator.submit(Channel::Trading, QueryKind::InvestorPosition);

        assert!(matches!(
            correlator.complete(Channel::Trading, b, true),
            CompleteOutcome::Matched {
                kind: QueryKind::InvestorPosition,
                ..
            }
        ));
        assert!(matches!(
            correlator.complete(Channel::Trading, a, true),
            CompleteOutcome::Matched {
                kind: QueryKind::TradingAccount,
                ..
            }
        ));
    }

    #[test]
    fn test_reset_drops_pending_and_restarts_sequence() {
        let correlator = RequestCorrelator::new();
        for _ in 0..6 {
            correlator.allocate(Channel::Trading);
        }
        let seven = correlator.submit(Channel::Trading, QueryKind::Order);
        let eight = correlator.submit(Channel::Trading, QueryKind::Trade);
        assert_eq!(seven, RequestId(7));
        assert_eq!(eight, RequestId(8));

        let dropped = correlator.reset(Channel::Trading);
        assert_eq!(dropped.len(), 2);
        assert_eq!(correlator.outstanding(Channel::Trading), 0);

        // Late pages for the dropped ids never reach the application.
        assert_eq!(
            correlator.complete(Channel::Trading, seven, true),
            CompleteOutcome::Stale
        );

        // A fresh query after re-login starts the sequence over.
        let fresh = correlator.submit(Channel::Trading, QueryKind::TradingAccount);
        assert_eq!(fresh, RequestId(1));
    }

    #[test]
    fn test_allocate_does_not_track_pending() {
        let correlator = RequestCorrelator::new();
        let id = correlator.allocate(Channel::Trading);
        assert_eq!(id, RequestId(1));
        assert_eq!(correlator.outstanding(Channel::Trading), 0);
        assert_eq!(
            correlator.complete(Channel::Trading, id, true),
            CompleteOutcome::Stale
        );
    }
}
