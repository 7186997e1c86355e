//! Inbound transport events.
//!
//! The adapter turns gateway notifications into `TransportEvent` values and
//! hands them through one queue into the event loop. Each variant maps to
//! exactly one gateway callback family.

use std::fmt;

use ftg_core::{
    Channel, InputOrder, InputOrderAction, LoginInfo, LogoutInfo, MarketDataSnapshot, OrderRecord,
    QueryKind, RequestId, RspError, SettlementInfoConfirm, TradeRecord,
};
use ftg_core::{InvestorPosition, InvestorPositionDetail, TradingAccount};

/// Why the gateway dropped a front connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// 0x1001: network read failed.
    ReadError,
    /// 0x1002: network write failed.
    WriteError,
    /// 0x2001: no heartbeat received in time.
    HeartbeatTimeout,
    /// 0x2002: heartbeat send failed.
    HeartbeatSendError,
    /// 0x2003: malformed packet received.
    InvalidPacket,
    Unknown(i32),
}

impl DisconnectReason {
    /// Decode the gateway's reason code.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            0x1001 => Self::ReadError,
            0x1002 => Self::WriteError,
            0x2001 => Self::HeartbeatTimeout,
            0x2002 => Self::HeartbeatSendError,
            0x2003 => Self::InvalidPacket,
            other => Self::Unknown(other),
        }
    }

    /// The raw gateway code.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::ReadError => 0x1001,
            Self::WriteError => 0x1002,
            Self::HeartbeatTimeout => 0x2001,
            Self::HeartbeatSendError => 0x2002,
            Self::InvalidPacket => 0x2003,
            Self::Unknown(c) => *c,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadError => write!(f, "network read failed"),
            Self::WriteError => write!(f, "network write failed"),
            Self::HeartbeatTimeout => write!(f, "heartbeat timeout"),
            Self::HeartbeatSendError => write!(f, "heartbeat send failed"),
            Self::InvalidPacket => write!(f, "invalid packet"),
            Self::Unknown(c) => write!(f, "unknown (0x{c:x})"),
        }
    }
}

/// One record of a paginated query response.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPayload {
    TradingAccount(TradingAccount),
    InvestorPosition(InvestorPosition),
    InvestorPositionDetail(InvestorPositionDetail),
    Order(OrderRecord),
    Trade(TradeRecord),
    MarketData(MarketDataSnapshot),
}

impl QueryPayload {
    /// The query family this payload belongs to.
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::TradingAccount(_) => QueryKind::TradingAccount,
            Self::InvestorPosition(_) => QueryKind::InvestorPosition,
            Self::InvestorPositionDetail(_) => QueryKind::InvestorPositionDetail,
            Self::Order(_) => QueryKind::Order,
            Self::Trade(_) => QueryKind::Trade,
            Self::MarketData(_) => QueryKind::MarketData,
        }
    }
}

/// Typed inbound event from the transport adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    FrontConnected {
        channel: Channel,
    },
    FrontDisconnected {
        channel: Channel,
        reason: DisconnectReason,
    },
    LoginResponse {
        channel: Channel,
        info: Option<LoginInfo>,
        error: Option<RspError>,
    },
    LogoutResponse {
        channel: Channel,
        info: Option<LogoutInfo>,
        error: Option<RspError>,
    },
    SubscribeResponse {
        instrument: String,
        error: Option<RspError>,
        is_last: bool,
    },
    UnsubscribeResponse {
        instrument: String,
        error: Option<RspError>,
        is_last: bool,
    },
    SettlementConfirmResponse {
        confirm: Option<SettlementInfoConfirm>,
        error: Option<RspError>,
    },
    /// One page of a correlated query response. `payload = None` with
    /// `is_last = true` is a legitimate empty result, not an error.
    QueryResponsePage {
        kind: QueryKind,
        payload: Option<QueryPayload>,
        error: Option<RspError>,
        request_id: RequestId,
        is_last: bool,
    },
    PushOrder(OrderRecord),
    PushTrade(TradeRecord),
    PushTick(MarketDataSnapshot),
    InsertOrderError {
        input: InputOrder,
        error: RspError,
    },
    OrderActionError {
        input: InputOrderAction,
        error: RspError,
    },
    /// Malformed or unmappable gateway traffic.
    Exception {
        message: String,
    },
}

impl TransportEvent {
    /// The channel this event belongs to. Queries, order flow, and the
    /// settlement confirmation ride the trading channel; subscriptions and
    /// ticks ride market data.
    #[must_use]
    pub fn channel(&self) -> Channel {
        match self {
            Self::FrontConnected { channel }
            | Self::FrontDisconnected { channel, .. }
            | Self::LoginResponse { channel, .. }
            | Self::LogoutResponse { channel, .. } => *channel,
            Self::SubscribeResponse { .. }
            | Self::UnsubscribeResponse { .. }
            | Self::PushTick(_) => Channel::MarketData,
            Self::SettlementConfirmResponse { .. }
            | Self::QueryResponsePage { .. }
            | Self::PushOrder(_)
            | Self::PushTrade(_)
            | Self::InsertOrderError { .. }
            | Self::OrderActionError { .. }
            | Self::Exception { .. } => Channel::Trading,
        }
    }

    /// Short label for logging and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FrontConnected { .. } => "front_connected",
            Self::FrontDisconnected { .. } => "front_disconnected",
            Self::LoginResponse { .. } => "login_response",
            Self::LogoutResponse { .. } => "logout_response",
            Self::SubscribeResponse { .. } => "subscribe_response",
            Self::UnsubscribeResponse { .. } => "unsubscribe_response",
            Self::SettlementConfirmResponse { .. } => "settlement_confirm_response",
            Self::QueryResponsePage { .. } => "query_response_page",
            Self::PushOrder(_) => "push_order",
            Self::PushTrade(_) => "push_trade",
            Self::PushTick(_) => "push_tick",
            Self::InsertOrderError { .. } => "insert_order_error",
            Self::OrderActionError { .. } => "order_action_error",
            Self::Exception { .. } => "exception",
        }
    }
}
