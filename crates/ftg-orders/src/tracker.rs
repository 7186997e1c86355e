//! Order lifecycle tracking.
//!
//! The tracker keeps the client-side image of every order this session
//! knows about, merges gateway pushes and query pages into it, and tells
//! the event loop whether a push actually moved the order forward. The
//! push channel redelivers state freely; the application is notified only
//! when status or submit status changed.
//!
//! Identity is the (front, session, reference) triple assigned at insert
//! time, with the exchange system id as a fallback join key once the
//! exchange has assigned one.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use ftg_core::{
    InputOrder, InputOrderAction, OrderActionStatus, OrderKey, OrderRecord, OrderRef, OrderSpec,
    OrderStatus, OrderSubmitStatus, TrackedOrder, TradeRecord,
};

/// What an order push did to the tracked state.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// Status or submit status moved since the last known value.
    Changed(TrackedOrder),
    /// Redelivery of already-known state; the application is not notified.
    Unchanged,
}

/// Client-side order book of record.
///
/// Owned and mutated by the event loop only. References are allocated
/// here, monotonically, and never reused; the sequence is seeded from the
/// login response so references stay unique across client restarts within
/// one trading day.
#[derive(Debug, Default)]
pub struct OrderTracker {
    orders: HashMap<OrderKey, TrackedOrder>,
    by_sys_id: HashMap<String, OrderKey>,
    by_local_ref: HashMap<OrderRef, OrderKey>,
    seen_trade_ids: HashSet<String>,
    /// Sum of distinct fills per order, reconciled against image cumulatives.
    fill_volume: HashMap<OrderKey, i64>,
    next_order_ref: u64,
}

impl OrderTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            by_sys_id: HashMap::new(),
            by_local_ref: HashMap::new(),
            seen_trade_ids: HashSet::new(),
            fill_volume: HashMap::new(),
            next_order_ref: 1,
        }
    }

    /// Seed the reference sequence from the login response's maximum used
    /// reference. Unparseable input leaves the sequence where it is.
    pub fn seed_order_ref(&mut self, max_order_ref: &str) {
        match max_order_ref.trim().parse::<u64>() {
            Ok(max) if max >= self.next_order_ref => {
                self.next_order_ref = max + 1;
            }
            Ok(_) => {}
            Err(_) => {
                warn!(max_order_ref, "unparseable max order reference, keeping local sequence");
            }
        }
    }

    /// Allocate the next order reference. Each reference is handed out
    /// exactly once.
    pub fn allocate_order_ref(&mut self) -> OrderRef {
        let seq = self.next_order_ref;
        self.next_order_ref += 1;
        OrderRef::new(seq)
    }

    /// Record a just-issued insert request.
    ///
    /// The record starts in the submitted state and is keyed under the
    /// session identity the insert was sent with.
    pub fn register_insert(
        &mut self,
        order_ref: OrderRef,
        front_id: i32,
        session_id: i32,
        spec: &OrderSpec,
        now: DateTime<Utc>,
    ) -> TrackedOrder {
        let order = TrackedOrder::from_spec(order_ref.clone(), front_id, session_id, spec, now);
        let key = order.key();
        self.by_local_ref.insert(order_ref, key.clone());
        self.orders.insert(key, order.clone());
        order
    }

    /// Merge an unsolicited order push.
    ///
    /// Returns [`PushOutcome::Changed`] only when status or submit status
    /// differ from the last known value; everything else about the image
    /// (traded volume, system id, exchange) is merged either way.
    pub fn apply_order(&mut self, push: &OrderRecord, now: DateTime<Utc>) -> PushOutcome {
        let (order, changed) = self.merge_record(push, now);
        if changed {
            PushOutcome::Changed(order)
        } else {
            debug!(order_ref = %push.order_ref, status = ?push.status, "order push without state change");
            PushOutcome::Unchanged
        }
    }

    /// Merge an order query page. Query pages refresh the book of record
    /// but never drive change notifications; the page itself is delivered
    /// through the query callback.
    pub fn refresh_order(&mut self, page: &OrderRecord, now: DateTime<Utc>) -> TrackedOrder {
        let (order, _) = self.merge_record(page, now);
        order
    }

    /// Apply a fill to the matching order's traded volume.
    ///
    /// Fills never change order status; status movement arrives separately
    /// through order pushes. Each trade id sums into the order's fill
    /// volume at most once, and the traded volume is reconciled as the
    /// larger of that sum and the last image's cumulative count. Order
    /// images carry the fill's volume already, so image-before-trade and
    /// trade-before-image deliveries land on the same total. Returns
    /// `None` when no tracked order matches; no record is created from a
    /// fill alone.
    pub fn apply_trade(&mut self, trade: &TradeRecord, now: DateTime<Utc>) -> Option<TrackedOrder> {
        let key = match self.by_sys_id.get(&trade.order_sys_id) {
            Some(key) => key.clone(),
            None => self
                .orders
                .values()
                .find(|o| {
                    o.order_ref == trade.order_ref && o.instrument_id == trade.instrument_id
                })
                .map(TrackedOrder::key)?,
        };

        if !self.seen_trade_ids.insert(trade.trade_id.clone()) {
            debug!(trade_id = %trade.trade_id, "trade already applied");
            return self.orders.get(&key).cloned();
        }

        let fills = self.fill_volume.entry(key.clone()).or_insert(0);
        *fills += trade.volume;
        let fills = *fills;

        let order = self.orders.get_mut(&key)?;
        order.volume_traded = order.volume_traded.max(fills);
        order.updated_at = now;
        if order.order_sys_id.is_none() {
            order.order_sys_id = Some(trade.order_sys_id.clone());
            self.by_sys_id.insert(trade.order_sys_id.clone(), key);
        }
        Some(order.clone())
    }

    /// The gateway rejected the insert before it reached the exchange.
    pub fn mark_insert_rejected(
        &mut self,
        input: &InputOrder,
        now: DateTime<Utc>,
    ) -> Option<TrackedOrder> {
        let key = self.by_local_ref.get(&input.order_ref)?.clone();
        let order = self.orders.get_mut(&key)?;
        order.submit_status = OrderSubmitStatus::InsertRejected;
        order.updated_at = now;
        Some(order.clone())
    }

    /// A cancel/modify request went out for this order.
    pub fn mark_action_submitted(
        &mut self,
        key: &OrderKey,
        now: DateTime<Utc>,
    ) -> Option<TrackedOrder> {
        let order = self.orders.get_mut(key)?;
        order.action_status = Some(OrderActionStatus::Submitted);
        order.updated_at = now;
        Some(order.clone())
    }

    /// The gateway rejected a cancel/modify request.
    pub fn mark_action_rejected(
        &mut self,
        action: &InputOrderAction,
        now: DateTime<Utc>,
    ) -> Option<TrackedOrder> {
        let direct = OrderKey {
            front_id: action.front_id,
            session_id: action.session_id,
            order_ref: action.order_ref.clone(),
        };
        let key = if self.orders.contains_key(&direct) {
            direct
        } else {
            let sys_id = action.order_sys_id.as_deref()?;
            self.by_sys_id.get(sys_id)?.clone()
        };
        let order = self.orders.get_mut(&key)?;
        order.action_status = Some(OrderActionStatus::Rejected);
        order.updated_at = now;
        Some(order.clone())
    }

    /// Look up one order by identity key.
    pub fn get(&self, key: &OrderKey) -> Option<TrackedOrder> {
        self.orders.get(key).cloned()
    }

    /// Look up one of our own orders by its local reference.
    pub fn find_by_ref(&self, order_ref: &OrderRef) -> Option<TrackedOrder> {
        let key = self.by_local_ref.get(order_ref)?;
        self.orders.get(key).cloned()
    }

    /// Look up an order by exchange system id.
    pub fn find_by_sys_id(&self, order_sys_id: &str) -> Option<TrackedOrder> {
        let key = self.by_sys_id.get(order_sys_id)?;
        self.orders.get(key).cloned()
    }

    /// All tracked orders, in no particular order.
    pub fn orders(&self) -> Vec<TrackedOrder> {
        self.orders.values().cloned().collect()
    }

    /// Orders that can still trade or be canceled.
    pub fn active_orders(&self) -> Vec<TrackedOrder> {
        self.orders
            .values()
            .filter(|o| !o.is_terminal())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Merge one gateway order image, adopting it as a new record when no
    /// identity matches. Returns the record and whether status or submit
    /// status moved.
    fn merge_record(&mut self, image: &OrderRecord, now: DateTime<Utc>) -> (TrackedOrder, bool) {
        let key = self.resolve_key(image);

        let Some(order) = self.orders.get_mut(&key) else {
            let order = adopt_record(image, now);
            if let Some(sys_id) = &order.order_sys_id {
                self.by_sys_id.insert(sys_id.clone(), key.clone());
            }
            self.orders.insert(key, order.clone());
            return (order, true);
        };

        let before = (order.status, order.submit_status);
        order.status = image.status;
        order.submit_status = image.submit_status;
        // Cumulative traded volume never moves backward; a fill already
        // summed from a trade push must not be re-added when its image
        // arrives, and a queue-delayed image must not rewind it.
        order.volume_traded = order.volume_traded.max(image.volume_traded);
        if order.exchange_id.is_none() && !image.exchange_id.is_empty() {
            order.exchange_id = Some(image.exchange_id.clone());
        }
        if let Some(sys_id) = &image.order_sys_id {
            if order.order_sys_id.is_none() {
                order.order_sys_id = Some(sys_id.clone());
                self.by_sys_id.insert(sys_id.clone(), key.clone());
            }
        }
        if order.action_status == Some(OrderActionStatus::Submitted) {
            if image.status == OrderStatus::Canceled {
                order.action_status = Some(OrderActionStatus::Accepted);
            } else if matches!(
                image.submit_status,
                OrderSubmitStatus::CancelRejected | OrderSubmitStatus::ModifyRejected
            ) {
                order.action_status = Some(OrderActionStatus::Rejected);
            }
        }

        let after = (order.status, order.submit_status);
        let changed = before != after;
        if changed {
            order.updated_at = now;
        }
        (order.clone(), changed)
    }

    /// Session identity first, exchange system id as fallback.
    fn resolve_key(&self, image: &OrderRecord) -> OrderKey {
        let direct = image.key();
        if self.orders.contains_key(&direct) {
            return direct;
        }
        if let Some(sys_id) = &image.order_sys_id {
            if let Some(key) = self.by_sys_id.get(sys_id) {
                return key.clone();
            }
        }
        direct
    }
}

fn adopt_record(image: &OrderRecord, now: DateTime<Utc>) -> TrackedOrder {
    TrackedOrder {
        order_ref: image.order_ref.clone(),
        front_id: image.front_id,
        session_id: image.session_id,
        instrument_id: image.instrument_id.clone(),
        direction: image.direction,
        offset_flag: image.offset_flag,
        limit_price: image.limit_price,
        volume_original: image.volume_original,
        volume_traded: image.volume_traded,
        exchange_id: (!image.exchange_id.is_empty()).then(|| image.exchange_id.clone()),
        order_sys_id: image.order_sys_id.clone(),
        status: image.status,
        submit_status: image.submit_status,
        action_status: None,
        created_at: now,
        updated_at: now,
    }
}
