//! Application callback surface.

use ftg_core::{
    Bar, Channel, InputOrder, InputOrderAction, InvestorPosition, InvestorPositionDetail,
    LoginInfo, LogoutInfo, MarketDataSnapshot, OrderRecord, RequestId, RspError,
    SettlementInfoConfirm, TickView, TrackedOrder, TradeRecord, TradingAccount,
};
use ftg_transport::DisconnectReason;

/// Callbacks delivered by the event loop.
///
/// Every method has a no-op default, so an application implements only what
/// it cares about. All callbacks run on the event loop's thread of control,
/// one raw event at a time; it is safe and expected to issue new requests
/// from inside a callback (for example, firing the day's queries from
/// [`on_settlement_confirmed`](GatewayHandler::on_settlement_confirmed)).
///
/// Query callbacks deliver one record per page with an `is_last` marker on
/// the final page. An empty result still delivers exactly one page with a
/// `None` payload and `is_last = true`.
#[allow(unused_variables)]
pub trait GatewayHandler: Send {
    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn on_front_connected(&mut self, channel: Channel) {}

    fn on_front_disconnected(&mut self, channel: Channel, reason: DisconnectReason) {}

    fn on_user_login(
        &mut self,
        channel: Channel,
        info: Option<&LoginInfo>,
        error: Option<&RspError>,
    ) {
    }

    fn on_user_logout(
        &mut self,
        channel: Channel,
        info: Option<&LogoutInfo>,
        error: Option<&RspError>,
    ) {
    }

    fn on_settlement_confirmed(
        &mut self,
        confirm: Option<&SettlementInfoConfirm>,
        error: Option<&RspError>,
    ) {
    }

    // ------------------------------------------------------------------
    // Market data
    // ------------------------------------------------------------------

    fn on_subscribed(&mut self, instrument: &str, error: Option<&RspError>, is_last: bool) {}

    fn on_unsubscribed(&mut self, instrument: &str, error: Option<&RspError>, is_last: bool) {}

    /// Full depth snapshot, once per inbound tick.
    fn on_market_data(&mut self, snapshot: &MarketDataSnapshot) {}

    /// Simplified per-tick view, once per inbound tick.
    fn on_tick(&mut self, tick: &TickView) {}

    /// The in-progress minute bar after this tick was applied.
    fn on_partial_bar(&mut self, bar: &Bar) {}

    /// A finished minute bar, emitted when a later minute opens.
    fn on_closed_bar(&mut self, bar: &Bar) {}

    // ------------------------------------------------------------------
    // Trading
    // ------------------------------------------------------------------

    /// Order state after a push that changed status or submit status.
    /// Redeliveries of identical state are filtered out upstream.
    fn on_order(&mut self, order: &TrackedOrder) {}

    /// A fill. Fired for every trade push; the matching order's traded
    /// volume has already been updated when this runs.
    fn on_trade(&mut self, trade: &TradeRecord) {}

    fn on_insert_error(&mut self, input: &InputOrder, error: &RspError) {}

    fn on_action_error(&mut self, action: &InputOrderAction, error: &RspError) {}

    // ------------------------------------------------------------------
    // Query responses
    // ------------------------------------------------------------------

    fn on_rsp_trading_account(
        &mut self,
        account: Option<&TradingAccount>,
        error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
    }

    fn on_rsp_investor_position(
        &mut self,
        position: Option<&InvestorPosition>,
        error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
    }

    fn on_rsp_position_detail(
        &mut self,
        detail: Option<&InvestorPositionDetail>,
        error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
    }

    fn on_rsp_order(
        &mut self,
        order: Option<&OrderRecord>,
        error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
    }

    fn on_rsp_trade(
        &mut self,
        trade: Option<&TradeRecord>,
        error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
    }

    fn on_rsp_market_data(
        &mut self,
        snapshot: Option<&MarketDataSnapshot>,
        error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
    }

    // ------------------------------------------------------------------
    // Scheduling and errors
    // ------------------------------------------------------------------

    /// Fires after `idle_delay` of the event loop without an idle
    /// invocation, whenever the queue is drained.
    fn on_idle(&mut self) {}

    /// Gateway traffic the client could not map to a typed event.
    fn on_exception(&mut self, message: &str) {}
}

/// Handler that ignores every callback. Useful as a base for tests and
/// fire-and-forget tools.
#[derive(Debug, Default)]
pub struct NoopHandler;

impl GatewayHandler for NoopHandler {}
