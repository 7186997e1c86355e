//! Core domain types for the ftgate trading gateway client.
//!
//! This crate provides the fundamental types used throughout the runtime:
//! - Order-entry enums (`Direction`, `OffsetFlag`, price/time/volume
//!   conditions) with validated string forms
//! - Gateway images for orders, trades, ticks, and account queries
//! - Session identities: `Channel`, `RequestId`, `OrderRef`, login payloads

pub mod account;
pub mod error;
pub mod execution;
pub mod market;
pub mod order;
pub mod session;

pub use account::{
    InvestorPosition, InvestorPositionDetail, PositionDirection, SettlementInfoConfirm,
    TradingAccount,
};
pub use error::{CoreError, Result};
pub use market::{Bar, MarketDataSnapshot, TickView};
pub use order::{
    ContingentCondition, Direction, HedgeFlag, OffsetFlag, OrderActionFlag, OrderPriceType,
    OrderRef, OrderSpec, TimeCondition, VolumeCondition,
};
pub use session::{Channel, LoginInfo, LogoutInfo, QueryKind, RequestId, RspError};

// Order lifecycle types
pub use execution::{
    InputOrder, InputOrderAction, OrderActionStatus, OrderKey, OrderRecord, OrderStatus,
    OrderSubmitStatus, TrackedOrder, TradeRecord,
};
