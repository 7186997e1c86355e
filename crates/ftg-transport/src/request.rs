//! Outbound requests accepted by the transport adapter.

use ftg_core::{Channel, InputOrder, InputOrderAction, QueryKind, RequestId};

/// A fire-and-forget request toward the gateway.
///
/// Results arrive later as `TransportEvent`s; `send` only reports local
/// submission failures.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRequest {
    MdLogin,
    MdLogout,
    TdLogin,
    TdLogout,
    Subscribe {
        instruments: Vec<String>,
    },
    Unsubscribe {
        instruments: Vec<String>,
    },
    ConfirmSettlementInfo,
    Query {
        kind: QueryKind,
        instrument: Option<String>,
        request_id: RequestId,
    },
    InsertOrder {
        input: InputOrder,
        request_id: RequestId,
    },
    OrderAction {
        input: InputOrderAction,
        request_id: RequestId,
    },
}

impl OutboundRequest {
    /// The channel that carries this request.
    #[must_use]
    pub fn channel(&self) -> Channel {
        match self {
            Self::MdLogin | Self::MdLogout | Self::Subscribe { .. } | Self::Unsubscribe { .. } => {
                Channel::MarketData
            }
            Self::TdLogin
            | Self::TdLogout
            | Self::ConfirmSettlementInfo
            | Self::Query { .. }
            | Self::InsertOrder { .. }
            | Self::OrderAction { .. } => Channel::Trading,
        }
    }

    /// Short label for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MdLogin => "md_login",
            Self::MdLogout => "md_logout",
            Self::TdLogin => "td_login",
            Self::TdLogout => "td_logout",
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::ConfirmSettlementInfo => "confirm_settlement_info",
            Self::Query { .. } => "query",
            Self::InsertOrder { .. } => "insert_order",
            Self::OrderAction { .. } => "order_action",
        }
    }

    /// Returns true for the queries subject to gateway flow control.
    #[must_use]
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}
