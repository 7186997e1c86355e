//! Accounting types returned by trading-channel queries.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::{Direction, HedgeFlag};

/// Funds snapshot for the trading account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingAccount {
    pub broker_id: String,
    pub account_id: String,
    pub pre_balance: Decimal,
    pub deposit: Decimal,
    pub withdraw: Decimal,
    pub frozen_margin: Decimal,
    pub current_margin: Decimal,
    pub commission: Decimal,
    pub close_profit: Decimal,
    pub position_profit: Decimal,
    pub balance: Decimal,
    pub available: Decimal,
    pub trading_day: String,
}

/// Direction of a held position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionDirection {
    Net,
    Long,
    Short,
}

/// Aggregate position per instrument and direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorPosition {
    pub instrument_id: String,
    pub broker_id: String,
    pub investor_id: String,
    pub position_direction: PositionDirection,
    pub hedge_flag: HedgeFlag,
    /// Position carried over from previous days.
    pub yd_position: i64,
    /// Total current position.
    pub position: i64,
    /// Portion opened today.
    pub today_position: i64,
    pub open_volume: i64,
    pub close_volume: i64,
    pub position_cost: Decimal,
    pub use_margin: Decimal,
    pub trading_day: String,
}

impl InvestorPosition {
    /// Yesterday portion of the current position.
    #[must_use]
    pub fn yesterday_position(&self) -> i64 {
        self.position - self.today_position
    }
}

/// One open lot, as returned by the position-detail query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorPositionDetail {
    pub instrument_id: String,
    pub broker_id: String,
    pub investor_id: String,
    pub hedge_flag: HedgeFlag,
    pub direction: Direction,
    pub open_date: String,
    pub trade_id: String,
    pub volume: i64,
    pub open_price: Decimal,
    pub trading_day: String,
    pub close_volume: i64,
    pub exchange_id: String,
}

/// Settlement confirmation acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementInfoConfirm {
    pub broker_id: String,
    pub investor_id: String,
    pub confirm_date: String,
    pub confirm_time: NaiveTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_yesterday_position() {
        let pos = InvestorPosition {
            instrument_id: "IF2609".to_string(),
            broker_id: "9999".to_string(),
            investor_id: "070577".to_string(),
            position_direction: PositionDirection::Long,
            hedge_flag: HedgeFlag::Speculation,
            yd_position: 4,
            position: 6,
            today_position: 2,
            open_volume: 2,
            close_volume: 0,
            position_cost: dec!(2220000),
            use_margin: dec!(333000),
            trading_day: "20260820".to_string(),
        };
        assert_eq!(pos.yesterday_position(), 4);
    }
}
