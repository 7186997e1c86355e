//! Order-entry vocabulary and request types.
//!
//! Provides the typed enums accepted by the gateway for order insertion
//! (direction, offset, price type, time/volume conditions) together with
//! the `OrderSpec` request payload and the client-side `OrderRef`.
//!
//! String forms map through `FromStr` and fail with an explicit error for
//! unrecognized input; there is no silent default.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Order direction: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(Self::Buy),
            "sell" | "short" => Ok(Self::Sell),
            _ => Err(CoreError::InvalidDirection(s.to_string())),
        }
    }
}

/// Offset flag: open a new position or close an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetFlag {
    Open,
    Close,
    ForceClose,
    CloseToday,
    CloseYesterday,
    ForceOff,
    LocalForceClose,
}

impl fmt::Display for OffsetFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::ForceClose => "force_close",
            Self::CloseToday => "close_today",
            Self::CloseYesterday => "close_yesterday",
            Self::ForceOff => "force_off",
            Self::LocalForceClose => "local_force_close",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OffsetFlag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            "force_close" => Ok(Self::ForceClose),
            "close_today" => Ok(Self::CloseToday),
            "close_yesterday" => Ok(Self::CloseYesterday),
            "force_off" => Ok(Self::ForceOff),
            "local_force_close" => Ok(Self::LocalForceClose),
            _ => Err(CoreError::InvalidOffsetFlag(s.to_string())),
        }
    }
}

/// Order price type.
///
/// `Limit` is the default; the tick-relative variants let the gateway peg
/// the price to the current book at insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPriceType {
    Any,
    #[default]
    Limit,
    Best,
    Last,
    LastPlusOneTick,
    LastPlusTwoTicks,
    LastPlusThreeTicks,
    Ask1,
    Ask1PlusOneTick,
    Ask1PlusTwoTicks,
    Ask1PlusThreeTicks,
    Bid1,
    Bid1PlusOneTick,
    Bid1PlusTwoTicks,
    Bid1PlusThreeTicks,
    FiveLevel,
}

impl FromStr for OrderPriceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "limit" => Ok(Self::Limit),
            "best" => Ok(Self::Best),
            "last" => Ok(Self::Last),
            "last_plus_one_tick" => Ok(Self::LastPlusOneTick),
            "last_plus_two_ticks" => Ok(Self::LastPlusTwoTicks),
            "last_plus_three_ticks" => Ok(Self::LastPlusThreeTicks),
            "ask1" => Ok(Self::Ask1),
            "ask1_plus_one_tick" => Ok(Self::Ask1PlusOneTick),
            "ask1_plus_two_ticks" => Ok(Self::Ask1PlusTwoTicks),
            "ask1_plus_three_ticks" => Ok(Self::Ask1PlusThreeTicks),
            "bid1" => Ok(Self::Bid1),
            "bid1_plus_one_tick" => Ok(Self::Bid1PlusOneTick),
            "bid1_plus_two_ticks" => Ok(Self::Bid1PlusTwoTicks),
            "bid1_plus_three_ticks" => Ok(Self::Bid1PlusThreeTicks),
            "five_level" => Ok(Self::FiveLevel),
            _ => Err(CoreError::InvalidOrderPriceType(s.to_string())),
        }
    }
}

/// Hedge flag for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HedgeFlag {
    #[default]
    Speculation,
    Arbitrage,
    Hedge,
    MarketMaker,
}

impl FromStr for HedgeFlag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "speculation" => Ok(Self::Speculation),
            "arbitrage" => Ok(Self::Arbitrage),
            "hedge" => Ok(Self::Hedge),
            "market_maker" => Ok(Self::MarketMaker),
            _ => Err(CoreError::InvalidHedgeFlag(s.to_string())),
        }
    }
}

/// Time condition: how long the order stays working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeCondition {
    ImmediateOrCancel,
    GoodForSection,
    #[default]
    GoodForDay,
    GoodTilDate,
    GoodTilCanceled,
    GoodForAuction,
}

impl FromStr for TimeCondition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ioc" | "immediate_or_cancel" => Ok(Self::ImmediateOrCancel),
            "gfs" | "good_for_section" => Ok(Self::GoodForSection),
            "gfd" | "good_for_day" => Ok(Self::GoodForDay),
            "gtd" | "good_til_date" => Ok(Self::GoodTilDate),
            "gtc" | "good_til_canceled" => Ok(Self::GoodTilCanceled),
            "gfa" | "good_for_auction" => Ok(Self::GoodForAuction),
            _ => Err(CoreError::InvalidTimeCondition(s.to_string())),
        }
    }
}

/// Volume condition: how much of the order must execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeCondition {
    #[default]
    Any,
    Min,
    Complete,
}

impl FromStr for VolumeCondition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "min" => Ok(Self::Min),
            "complete" => Ok(Self::Complete),
            _ => Err(CoreError::InvalidVolumeCondition(s.to_string())),
        }
    }
}

/// Contingent condition: when the order becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContingentCondition {
    #[default]
    Immediately,
    Touch,
    TouchProfit,
    ParkedOrder,
    LastGreaterThanStop,
    LastGreaterEqualStop,
    LastLessThanStop,
    LastLessEqualStop,
    Ask1GreaterThanStop,
    Ask1GreaterEqualStop,
    Ask1LessThanStop,
    Ask1LessEqualStop,
    Bid1GreaterThanStop,
    Bid1GreaterEqualStop,
    Bid1LessThanStop,
    Bid1LessEqualStop,
}

impl ContingentCondition {
    /// Returns true if the condition compares against a stop price.
    #[must_use]
    pub fn uses_stop_price(&self) -> bool {
        !matches!(
            self,
            Self::Immediately | Self::Touch | Self::TouchProfit | Self::ParkedOrder
        )
    }
}

/// Action applied to a working order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderActionFlag {
    Delete,
    Modify,
}

impl FromStr for OrderActionFlag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "modify" => Ok(Self::Modify),
            _ => Err(CoreError::InvalidOrderActionFlag(s.to_string())),
        }
    }
}

/// Client-side order reference.
///
/// A numeric string, unique per trading session; the sequence is seeded
/// from the login response and incremented for every insert. The gateway
/// echoes it on every order push, which makes it the primary join key
/// before a system id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderRef(String);

impl OrderRef {
    /// Create a reference from a sequence number.
    pub fn new(seq: u64) -> Self {
        Self(seq.to_string())
    }

    /// Parse the numeric sequence back out of the reference.
    pub fn seq(&self) -> Result<u64, CoreError> {
        self.0
            .trim()
            .parse::<u64>()
            .map_err(|_| CoreError::InvalidOrderRef(self.0.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OrderRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parameters for an order insertion.
///
/// Defaults mirror the common case: a plain limit order, good for the day,
/// any volume, active immediately, speculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub instrument_id: String,
    pub direction: Direction,
    pub offset_flag: OffsetFlag,
    /// Limit price; ignored by the gateway for non-limit price types.
    pub limit_price: Decimal,
    pub volume: i64,
    #[serde(default)]
    pub price_type: OrderPriceType,
    #[serde(default)]
    pub hedge_flag: HedgeFlag,
    #[serde(default)]
    pub time_condition: TimeCondition,
    #[serde(default)]
    pub volume_condition: VolumeCondition,
    #[serde(default = "default_min_volume")]
    pub min_volume: i64,
    #[serde(default)]
    pub contingent_condition: ContingentCondition,
    #[serde(default)]
    pub stop_price: Decimal,
}

fn default_min_volume() -> i64 {
    1
}

impl OrderSpec {
    /// Create a limit order spec with default conditions.
    #[must_use]
    pub fn new(
        instrument_id: impl Into<String>,
        direction: Direction,
        offset_flag: OffsetFlag,
        limit_price: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            direction,
            offset_flag,
            limit_price,
            volume,
            price_type: OrderPriceType::default(),
            hedge_flag: HedgeFlag::default(),
            time_condition: TimeCondition::default(),
            volume_condition: VolumeCondition::default(),
            min_volume: default_min_volume(),
            contingent_condition: ContingentCondition::default(),
            stop_price: Decimal::ZERO,
        }
    }

    /// Override the price type.
    #[must_use]
    pub fn with_price_type(mut self, price_type: OrderPriceType) -> Self {
        self.price_type = price_type;
        self
    }

    /// Override the time condition.
    #[must_use]
    pub fn with_time_condition(mut self, tc: TimeCondition) -> Self {
        self.time_condition = tc;
        self
    }

    /// Make the order contingent on a stop price.
    #[must_use]
    pub fn with_stop(mut self, condition: ContingentCondition, stop_price: Decimal) -> Self {
        self.contingent_condition = condition;
        self.stop_price = stop_price;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_parse() {
        assert_eq!("buy".parse::<Direction>().unwrap(), Direction::Buy);
        assert_eq!("SELL".parse::<Direction>().unwrap(), Direction::Sell);
        assert!("hold".parse::<Direction>().is_err());
    }

    #[test]
    fn test_offset_flag_parse() {
        assert_eq!("open".parse::<OffsetFlag>().unwrap(), OffsetFlag::Open);
        assert_eq!(
            "close_today".parse::<OffsetFlag>().unwrap(),
            OffsetFlag::CloseToday
        );
        assert!("reopen".parse::<OffsetFlag>().is_err());
    }

    #[test]
    fn test_time_condition_aliases() {
        assert_eq!(
            "ioc".parse::<TimeCondition>().unwrap(),
            TimeCondition::ImmediateOrCancel
        );
        assert_eq!(
            "good_for_day".parse::<TimeCondition>().unwrap(),
            TimeCondition::GoodForDay
        );
    }

    #[test]
    fn test_order_spec_defaults() {
        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 1);
        assert_eq!(spec.price_type, OrderPriceType::Limit);
        assert_eq!(spec.time_condition, TimeCondition::GoodForDay);
        assert_eq!(spec.volume_condition, VolumeCondition::Any);
        assert_eq!(spec.contingent_condition, ContingentCondition::Immediately);
        assert_eq!(spec.min_volume, 1);
        assert_eq!(spec.stop_price, Decimal::ZERO);
    }

    #[test]
    fn test_order_spec_with_stop() {
        let spec = OrderSpec::new("IF2609", Direction::Sell, OffsetFlag::Close, dec!(3650), 2)
            .with_stop(ContingentCondition::LastLessEqualStop, dec!(3600));
        assert!(spec.contingent_condition.uses_stop_price());
        assert_eq!(spec.stop_price, dec!(3600));
    }

    #[test]
    fn test_order_ref_seq() {
        let r = OrderRef::new(41);
        assert_eq!(r.as_str(), "41");
        assert_eq!(r.seq().unwrap(), 41);
        assert!(OrderRef::from("abc").seq().is_err());
    }

    #[test]
    fn test_order_spec_serde_defaults() {
        let json = r#"{
            "instrument_id": "IF2609",
            "direction": "buy",
            "offset_flag": "open",
            "limit_price": "3700",
            "volume": 1
        }"#;
        let spec: OrderSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.price_type, OrderPriceType::Limit);
        assert_eq!(spec.min_volume, 1);
    }
}
