//! Channel, request-id, and login/logout types shared across the runtime.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two independent gateway connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    MarketData,
    Trading,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarketData => write!(f, "md"),
            Self::Trading => write!(f, "td"),
        }
    }
}

/// Request identifier, unique per channel while outstanding.
///
/// Monotonically increasing from 1 within one connected session; the
/// sequence restarts after re-login because the gateway restarts its own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RequestId(pub i32);

impl RequestId {
    #[must_use]
    pub fn raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for RequestId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// The query families the trading and market-data channels answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    TradingAccount,
    InvestorPosition,
    InvestorPositionDetail,
    Order,
    Trade,
    MarketData,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TradingAccount => "trading_account",
            Self::InvestorPosition => "investor_position",
            Self::InvestorPositionDetail => "investor_position_detail",
            Self::Order => "order",
            Self::Trade => "trade",
            Self::MarketData => "market_data",
        };
        write!(f, "{s}")
    }
}

/// Login acknowledgment from the gateway.
///
/// `front_id`/`session_id` identify this connection for order references;
/// `max_order_ref` seeds the client's order-ref sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginInfo {
    pub trading_day: String,
    pub login_time: NaiveTime,
    pub broker_id: String,
    pub user_id: String,
    pub system_name: String,
    pub front_id: i32,
    pub session_id: i32,
    pub max_order_ref: String,
}

/// Logout acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoutInfo {
    pub broker_id: String,
    pub user_id: String,
}

/// Gateway-reported failure for a request or response page.
///
/// Absence (`Option::None` in callback signatures) means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RspError {
    pub code: i32,
    pub message: String,
}

impl RspError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::MarketData.to_string(), "md");
        assert_eq!(Channel::Trading.to_string(), "td");
    }

    #[test]
    fn test_request_id_ordering() {
        assert!(RequestId(1) < RequestId(2));
        assert_eq!(RequestId::from(5).raw(), 5);
    }

    #[test]
    fn test_rsp_error_display() {
        let err = RspError::new(3, "invalid session");
        assert_eq!(err.to_string(), "[3] invalid session");
    }
}
