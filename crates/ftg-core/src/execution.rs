//! Order lifecycle types.
//!
//! This module provides:
//! - Gateway-reported status vocabularies (`OrderStatus`, `OrderSubmitStatus`,
//!   `OrderActionStatus`)
//! - The gateway order/trade images carried by pushes and query pages
//! - The client-side `TrackedOrder` record and its identity key
//! - Request echoes used by insert/action error callbacks

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::{
    Direction, HedgeFlag, OffsetFlag, OrderActionFlag, OrderPriceType, OrderRef, OrderSpec,
};

// ============================================================================
// Status Vocabularies
// ============================================================================

/// Order status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AllTraded,
    PartTradedQueueing,
    PartTradedNotQueueing,
    NoTradeQueueing,
    NoTradeNotQueueing,
    Canceled,
    /// Not yet classified by the gateway; the status of a fresh insert.
    #[default]
    Unknown,
    NotTouched,
    Touched,
}

impl OrderStatus {
    /// Returns true if no further status changes can occur.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AllTraded | Self::Canceled)
    }

    /// Returns true if the order can still trade or be canceled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Submit status: the gateway's view of the latest insert/cancel/modify
/// request for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSubmitStatus {
    #[default]
    InsertSubmitted,
    CancelSubmitted,
    ModifySubmitted,
    Accepted,
    InsertRejected,
    CancelRejected,
    ModifyRejected,
}

impl OrderSubmitStatus {
    /// Returns true for any of the rejected variants.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::InsertRejected | Self::CancelRejected | Self::ModifyRejected
        )
    }
}

/// Progress of a cancel/modify action against a working order.
///
/// Tracked per order as `Option<OrderActionStatus>`: `None` until the first
/// action is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderActionStatus {
    Submitted,
    Accepted,
    Rejected,
}

// ============================================================================
// Gateway Images
// ============================================================================

/// Order state as carried by an order push or an order query page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub instrument_id: String,
    pub order_ref: OrderRef,
    pub front_id: i32,
    pub session_id: i32,
    pub exchange_id: String,
    /// Assigned by the exchange once the order is accepted.
    pub order_sys_id: Option<String>,
    pub direction: Direction,
    pub offset_flag: OffsetFlag,
    pub price_type: OrderPriceType,
    pub limit_price: Decimal,
    pub volume_original: i64,
    pub volume_traded: i64,
    pub status: OrderStatus,
    pub submit_status: OrderSubmitStatus,
    pub insert_time: NaiveTime,
    pub status_msg: String,
}

impl OrderRecord {
    /// Remaining unfilled volume.
    #[must_use]
    pub fn volume_remaining(&self) -> i64 {
        self.volume_original - self.volume_traded
    }

    /// Identity key for joining pushes to tracked orders.
    #[must_use]
    pub fn key(&self) -> OrderKey {
        OrderKey {
            front_id: self.front_id,
            session_id: self.session_id,
            order_ref: self.order_ref.clone(),
        }
    }
}

/// Join key for an order within one trading session.
///
/// The gateway scopes order references to (front, session); a reference
/// alone is ambiguous across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderKey {
    pub front_id: i32,
    pub session_id: i32,
    pub order_ref: OrderRef,
}

/// Fill notification as carried by a trade push or a trade query page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub instrument_id: String,
    pub order_ref: OrderRef,
    pub exchange_id: String,
    pub trade_id: String,
    pub order_sys_id: String,
    pub direction: Direction,
    pub offset_flag: OffsetFlag,
    pub hedge_flag: HedgeFlag,
    pub price: Decimal,
    pub volume: i64,
    pub trade_date: String,
    pub trade_time: NaiveTime,
}

// ============================================================================
// Request Echoes
// ============================================================================

/// Echo of an insert request, attached to insert-error callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputOrder {
    pub order_ref: OrderRef,
    pub spec: OrderSpec,
}

/// A cancel/modify request, also echoed on action-error callbacks.
///
/// Carries the working order's full identity so the gateway can locate it
/// whether or not a system id exists yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputOrderAction {
    pub action_flag: OrderActionFlag,
    pub instrument_id: String,
    pub order_ref: OrderRef,
    pub front_id: i32,
    pub session_id: i32,
    pub exchange_id: String,
    pub order_sys_id: Option<String>,
    /// New price for modify; ignored for delete.
    pub limit_price: Option<Decimal>,
    /// New volume for modify; ignored for delete.
    pub volume_change: Option<i64>,
}

// ============================================================================
// Client-Side Record
// ============================================================================

/// Client-side lifecycle record for one order.
///
/// Created when the insert request is issued, merged against every push or
/// query page that references the same identity, retained until purged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedOrder {
    pub order_ref: OrderRef,
    pub front_id: i32,
    pub session_id: i32,
    pub instrument_id: String,
    pub direction: Direction,
    pub offset_flag: OffsetFlag,
    pub limit_price: Decimal,
    pub volume_original: i64,
    pub volume_traded: i64,
    pub exchange_id: Option<String>,
    pub order_sys_id: Option<String>,
    pub status: OrderStatus,
    pub submit_status: OrderSubmitStatus,
    pub action_status: Option<OrderActionStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedOrder {
    /// Create a record for a just-issued insert request.
    ///
    /// Starts with status `Unknown` and submit status `InsertSubmitted`;
    /// the first gateway push moves it forward.
    #[must_use]
    pub fn from_spec(
        order_ref: OrderRef,
        front_id: i32,
        session_id: i32,
        spec: &OrderSpec,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_ref,
            front_id,
            session_id,
            instrument_id: spec.instrument_id.clone(),
            direction: spec.direction,
            offset_flag: spec.offset_flag,
            limit_price: spec.limit_price,
            volume_original: spec.volume,
            volume_traded: 0,
            exchange_id: None,
            order_sys_id: None,
            status: OrderStatus::Unknown,
            submit_status: OrderSubmitStatus::InsertSubmitted,
            action_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity key for this record.
    #[must_use]
    pub fn key(&self) -> OrderKey {
        OrderKey {
            front_id: self.front_id,
            session_id: self.session_id,
            order_ref: self.order_ref.clone(),
        }
    }

    /// Remaining unfilled volume.
    #[must_use]
    pub fn volume_remaining(&self) -> i64 {
        self.volume_original - self.volume_traded
    }

    /// Returns true once the order can no longer change. An order whose
    /// insert was rejected never reaches the exchange, so no further
    /// status pushes arrive for it.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal() || self.submit_status == OrderSubmitStatus::InsertRejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_spec() -> OrderSpec {
        OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 3)
    }

    #[test]
    fn test_status_terminal() {
        assert!(OrderStatus::AllTraded.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::PartTradedQueueing.is_terminal());
        assert!(OrderStatus::NoTradeQueueing.is_active());
    }

    #[test]
    fn test_submit_status_rejected() {
        assert!(OrderSubmitStatus::InsertRejected.is_rejected());
        assert!(OrderSubmitStatus::CancelRejected.is_rejected());
        assert!(!OrderSubmitStatus::Accepted.is_rejected());
    }

    #[test]
    fn test_tracked_order_from_spec() {
        let now = Utc::now();
        let order = TrackedOrder::from_spec(OrderRef::new(12), 1, 7, &sample_spec(), now);

        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.submit_status, OrderSubmitStatus::InsertSubmitted);
        assert_eq!(order.volume_traded, 0);
        assert_eq!(order.volume_remaining(), 3);
        assert!(order.order_sys_id.is_none());
        assert!(order.action_status.is_none());
        assert!(!order.is_terminal());
    }

    #[test]
    fn test_order_key_identity() {
        let now = Utc::now();
        let order = TrackedOrder::from_spec(OrderRef::new(12), 1, 7, &sample_spec(), now);
        let key = order.key();
        assert_eq!(key.front_id, 1);
        assert_eq!(key.session_id, 7);
        assert_eq!(key.order_ref, OrderRef::new(12));
    }
}
