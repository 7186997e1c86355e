//! Minute bar aggregation.
//!
//! Converts depth snapshots into three derived streams per instrument:
//! a simplified tick view, the in-progress minute bar after each tick,
//! and the finished bar once a later minute opens.
//!
//! The feed reports volume and turnover as cumulative day counters; the
//! aggregator converts them to per-bar amounts by differencing against
//! the previous tick. A counter that moves backwards means the trading
//! day rolled over, in which case the new cumulative value is taken as
//! the delta.

use std::collections::HashMap;

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use tracing::debug;

use ftg_core::{Bar, MarketDataSnapshot, TickView};

/// Everything one depth snapshot produced.
///
/// `tick` is always present. `partial` is absent only for out-of-order
/// ticks, which never touch bar state. `closed` is present only when the
/// tick opened a later minute.
#[derive(Debug, Clone, PartialEq)]
pub struct BarUpdate {
    pub tick: TickView,
    pub partial: Option<Bar>,
    pub closed: Option<Bar>,
}

/// Running bar state for one instrument.
#[derive(Debug, Clone)]
struct InstrumentState {
    /// Bar start, truncated to the minute. Never decreases.
    minute: NaiveTime,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    /// Amount traded within the current bar.
    bar_volume: i64,
    bar_turnover: Decimal,
    /// Latest cumulative day counters seen from the feed.
    cum_volume: i64,
    cum_turnover: Decimal,
    open_interest: Decimal,
}

impl InstrumentState {
    fn to_bar(&self, instrument_id: &str) -> Bar {
        Bar {
            instrument_id: instrument_id.to_string(),
            minute: self.minute,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.bar_volume,
            turnover: self.bar_turnover,
            open_interest: self.open_interest,
        }
    }
}

/// Per-instrument minute bar builder.
///
/// Owns all aggregation state; only the event loop mutates it. Entries are
/// created on the first tick of an instrument and live for the rest of the
/// process.
#[derive(Debug, Default)]
pub struct BarAggregator {
    states: HashMap<String, InstrumentState>,
}

impl BarAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Instruments with aggregation state.
    pub fn instrument_count(&self) -> usize {
        self.states.len()
    }

    /// Apply one depth snapshot.
    ///
    /// Same minute as the current bar: high/low/close and the bar counters
    /// update, and the refreshed partial bar is returned. A later minute
    /// first yields the finished bar, then opens a new one seeded from this
    /// tick. An earlier minute leaves bar state alone entirely; only the
    /// tick view goes out.
    pub fn on_tick(&mut self, snapshot: &MarketDataSnapshot) -> BarUpdate {
        let tick = snapshot.to_tick_view();
        let minute = minute_key(snapshot.update_time);
        let price = snapshot.last_price;

        let Some(state) = self.states.get_mut(&snapshot.instrument_id) else {
            // First tick ever: the day so far is the opening delta.
            let state = InstrumentState {
                minute,
                open: price,
                high: price,
                low: price,
                close: price,
                bar_volume: snapshot.volume,
                bar_turnover: snapshot.turnover,
                cum_volume: snapshot.volume,
                cum_turnover: snapshot.turnover,
                open_interest: snapshot.open_interest,
            };
            let partial = state.to_bar(&snapshot.instrument_id);
            self.states.insert(snapshot.instrument_id.clone(), state);
            return BarUpdate {
                tick,
                partial: Some(partial),
                closed: None,
            };
        };

        if minute < state.minute {
            debug!(
                instrument = %snapshot.instrument_id,
                tick_minute = %minute,
                bar_minute = %state.minute,
                "out-of-order tick, bar state unchanged"
            );
            return BarUpdate {
                tick,
                partial: None,
                closed: None,
            };
        }

        let delta_volume = if snapshot.volume < state.cum_volume {
            // Day rollover: the counter restarted.
            snapshot.volume
        } else {
            snapshot.volume - state.cum_volume
        };
        let delta_turnover = if snapshot.turnover < state.cum_turnover {
            snapshot.turnover
        } else {
            snapshot.turnover - state.cum_turnover
        };

        let closed = if minute > state.minute {
            let finished = state.to_bar(&snapshot.instrument_id);
            debug!(instrument = %snapshot.instrument_id, bar = %finished, "bar closed");

            state.minute = minute;
            state.open = price;
            state.high = price;
            state.low = price;
            state.close = price;
            state.bar_volume = delta_volume;
            state.bar_turnover = delta_turnover;

            Some(finished)
        } else {
            state.high = state.high.max(price);
            state.low = state.low.min(price);
            state.close = price;
            state.bar_volume += delta_volume;
            state.bar_turnover += delta_turnover;

            None
        };

        state.cum_volume = snapshot.volume;
        state.cum_turnover = snapshot.turnover;
        state.open_interest = snapshot.open_interest;

        let partial = state.to_bar(&snapshot.instrument_id);
        BarUpdate {
            tick,
            partial: Some(partial),
            closed,
        }
    }
}

/// Truncate a feed timestamp to its minute.
fn minute_key(t: NaiveTime) -> NaiveTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}
