//! Market data types: depth snapshots, tick views, minute bars.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full depth snapshot as delivered by the market-data feed.
///
/// The same shape arrives as an unsolicited push on every tick and as the
/// payload of a market-data query. `volume` and `turnover` are cumulative
/// for the trading day, not per-tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataSnapshot {
    pub trading_day: String,
    pub instrument_id: String,
    pub exchange_id: String,
    pub last_price: Decimal,
    pub pre_settlement_price: Decimal,
    pub pre_close_price: Decimal,
    pub open_price: Decimal,
    pub highest_price: Decimal,
    pub lowest_price: Decimal,
    /// Cumulative traded volume for the day.
    pub volume: i64,
    /// Cumulative turnover for the day.
    pub turnover: Decimal,
    pub open_interest: Decimal,
    pub upper_limit_price: Decimal,
    pub lower_limit_price: Decimal,
    pub bid_price1: Decimal,
    pub bid_volume1: i64,
    pub ask_price1: Decimal,
    pub ask_volume1: i64,
    pub update_time: NaiveTime,
    pub update_millisec: u16,
    pub action_day: String,
}

impl MarketDataSnapshot {
    /// Reduce the snapshot to the simplified per-tick view.
    #[must_use]
    pub fn to_tick_view(&self) -> TickView {
        TickView {
            instrument_id: self.instrument_id.clone(),
            update_time: self.update_time,
            update_millisec: self.update_millisec,
            price: self.last_price,
            volume: self.volume,
            turnover: self.turnover,
            open_interest: self.open_interest,
        }
    }
}

/// Simplified per-tick view: price and the cumulative day counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickView {
    pub instrument_id: String,
    pub update_time: NaiveTime,
    pub update_millisec: u16,
    pub price: Decimal,
    /// Cumulative traded volume for the day.
    pub volume: i64,
    /// Cumulative turnover for the day.
    pub turnover: Decimal,
    pub open_interest: Decimal,
}

impl fmt::Display for TickView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{:03} {} v={}",
            self.instrument_id, self.update_time, self.update_millisec, self.price, self.volume
        )
    }
}

/// One minute bar, in progress or closed.
///
/// `volume` and `turnover` are the amounts traded within this bar, already
/// converted from the feed's cumulative counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub instrument_id: String,
    /// Bar start, truncated to the minute.
    pub minute: NaiveTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub turnover: Decimal,
    /// Open interest at the last tick of the bar.
    pub open_interest: Decimal,
}

impl Bar {
    /// Returns true if open and close lie within [low, high].
    #[must_use]
    pub fn ohlc_valid(&self) -> bool {
        self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} O={} H={} L={} C={} v={}",
            self.instrument_id, self.minute, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_snapshot() -> MarketDataSnapshot {
        MarketDataSnapshot {
            trading_day: "20260820".to_string(),
            instrument_id: "IF2609".to_string(),
            exchange_id: "CFFEX".to_string(),
            last_price: dec!(3701.2),
            pre_settlement_price: dec!(3690.0),
            pre_close_price: dec!(3688.6),
            open_price: dec!(3692.0),
            highest_price: dec!(3705.8),
            lowest_price: dec!(3688.0),
            volume: 12345,
            turnover: dec!(1368000000),
            open_interest: dec!(98765),
            upper_limit_price: dec!(4059.0),
            lower_limit_price: dec!(3321.0),
            bid_price1: dec!(3701.0),
            bid_volume1: 12,
            ask_price1: dec!(3701.4),
            ask_volume1: 8,
            update_time: NaiveTime::from_hms_opt(10, 31, 22).unwrap(),
            update_millisec: 500,
            action_day: "20260820".to_string(),
        }
    }

    #[test]
    fn test_tick_view_projection() {
        let snap = sample_snapshot();
        let tick = snap.to_tick_view();
        assert_eq!(tick.instrument_id, snap.instrument_id);
        assert_eq!(tick.price, snap.last_price);
        assert_eq!(tick.volume, snap.volume);
        assert_eq!(tick.update_millisec, 500);
    }

    #[test]
    fn test_bar_ohlc_valid() {
        let bar = Bar {
            instrument_id: "IF2609".to_string(),
            minute: NaiveTime::from_hms_opt(10, 31, 0).unwrap(),
            open: dec!(100),
            high: dec!(102),
            low: dec!(99),
            close: dec!(101),
            volume: 8,
            turnover: dec!(80000),
            open_interest: dec!(500),
        };
        assert!(bar.ohlc_valid());

        let broken = Bar {
            high: dec!(99.5),
            ..bar
        };
        assert!(!broken.ohlc_valid());
    }
}
