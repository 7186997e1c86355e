//! Printing handler.
//!
//! Logs every callback and drives the conventional day-open flow: once the
//! settlement confirmation lands, the queries run in sequence (account,
//! positions, position detail, orders, trades), each step issued from the
//! final page of the previous one. Pacing between queries is handled by the
//! client.

use tracing::{debug, info, warn};

use ftg_client::{ClientResult, GatewayClient, GatewayHandler};
use ftg_core::{
    Bar, Channel, InputOrder, InputOrderAction, InvestorPosition, InvestorPositionDetail,
    LoginInfo, LogoutInfo, MarketDataSnapshot, OrderRecord, RequestId, RspError,
    SettlementInfoConfirm, TickView, TrackedOrder, TradeRecord, TradingAccount,
};
use ftg_transport::DisconnectReason;

/// Callback printer for the console demo.
pub struct ConsoleHandler {
    client: GatewayClient,
}

impl ConsoleHandler {
    #[must_use]
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    fn chain(&self, step: &'static str, result: ClientResult<RequestId>) {
        match result {
            Ok(request_id) => debug!(%request_id, step, "day-open query issued"),
            Err(e) => warn!(error = %e, step, "day-open query failed"),
        }
    }
}

impl GatewayHandler for ConsoleHandler {
    fn on_front_connected(&mut self, channel: Channel) {
        info!(%channel, "front connected");
    }

    fn on_front_disconnected(&mut self, channel: Channel, reason: DisconnectReason) {
        warn!(%channel, %reason, "front disconnected");
    }

    fn on_user_login(
        &mut self,
        channel: Channel,
        info: Option<&LoginInfo>,
        error: Option<&RspError>,
    ) {
        if let Some(e) = error {
            warn!(%channel, error = %e, "login failed");
        } else if let Some(info) = info {
            info!(
                %channel,
                trading_day = %info.trading_day,
                front_id = info.front_id,
                session_id = info.session_id,
                "login ok"
            );
        }
    }

    fn on_user_logout(
        &mut self,
        channel: Channel,
        _info: Option<&LogoutInfo>,
        error: Option<&RspError>,
    ) {
        match error {
            Some(e) => warn!(%channel, error = %e, "logout failed"),
            None => info!(%channel, "logout confirmed"),
        }
    }

    fn on_settlement_confirmed(
        &mut self,
        confirm: Option<&SettlementInfoConfirm>,
        error: Option<&RspError>,
    ) {
        if let Some(e) = error {
            warn!(error = %e, "settlement confirmation failed");
            return;
        }
        if let Some(confirm) = confirm {
            info!(confirm_date = %confirm.confirm_date, "settlement confirmed");
        } else {
            info!("settlement confirmed");
        }
        self.chain("trading_account", self.client.query_trading_account());
    }

    fn on_subscribed(&mut self, instrument: &str, error: Option<&RspError>, is_last: bool) {
        match error {
            Some(e) => warn!(instrument, error = %e, "subscription rejected"),
            None => info!(instrument, is_last, "subscribed"),
        }
    }

    fn on_unsubscribed(&mut self, instrument: &str, error: Option<&RspError>, _is_last: bool) {
        match error {
            Some(e) => warn!(instrument, error = %e, "unsubscription rejected"),
            None => info!(instrument, "unsubscribed"),
        }
    }

    fn on_market_data(&mut self, snapshot: &MarketDataSnapshot) {
        debug!(
            instrument = %snapshot.instrument_id,
            last = %snapshot.last_price,
            bid = %snapshot.bid_price1,
            ask = %snapshot.ask_price1,
            "depth snapshot"
        );
    }

    fn on_tick(&mut self, tick: &TickView) {
        info!(%tick, "tick");
    }

    fn on_partial_bar(&mut self, bar: &Bar) {
        debug!(%bar, "bar building");
    }

    fn on_closed_bar(&mut self, bar: &Bar) {
        info!(%bar, "bar closed");
    }

    fn on_order(&mut self, order: &TrackedOrder) {
        info!(
            order_ref = %order.order_ref,
            instrument = %order.instrument_id,
            status = ?order.status,
            traded = order.volume_traded,
            total = order.volume_original,
            "order update"
        );
    }

    fn on_trade(&mut self, trade: &TradeRecord) {
        info!(
            trade_id = %trade.trade_id,
            instrument = %trade.instrument_id,
            price = %trade.price,
            volume = trade.volume,
            "trade"
        );
    }

    fn on_insert_error(&mut self, input: &InputOrder, error: &RspError) {
        warn!(order_ref = %input.order_ref, error = %error, "order insert rejected");
    }

    fn on_action_error(&mut self, action: &InputOrderAction, error: &RspError) {
        warn!(order_ref = %action.order_ref, error = %error, "order action rejected");
    }

    fn on_rsp_trading_account(
        &mut self,
        account: Option<&TradingAccount>,
        error: Option<&RspError>,
        _request_id: RequestId,
        is_last: bool,
    ) {
        if let Some(e) = error {
            warn!(error = %e, "trading account query failed");
        } else if let Some(account) = account {
            info!(
                account_id = %account.account_id,
                balance = %account.balance,
                available = %account.available,
                margin = %account.current_margin,
                "trading account"
            );
        } else {
            info!("trading account: empty result");
        }
        if is_last {
            self.chain("positions", self.client.query_investor_position(None));
        }
    }

    fn on_rsp_investor_position(
        &mut self,
        position: Option<&InvestorPosition>,
        error: Option<&RspError>,
        _request_id: RequestId,
        is_last: bool,
    ) {
        if let Some(e) = error {
            warn!(error = %e, "position query failed");
        } else if let Some(pos) = position {
            info!(
                instrument = %pos.instrument_id,
                direction = ?pos.position_direction,
                position = pos.position,
                yesterday = pos.yesterday_position(),
                "position"
            );
        } else {
            info!("positions: empty result");
        }
        if is_last {
            self.chain(
                "position_detail",
                self.client.query_investor_position_detail(None),
            );
        }
    }

    fn on_rsp_position_detail(
        &mut self,
        detail: Option<&InvestorPositionDetail>,
        error: Option<&RspError>,
        _request_id: RequestId,
        is_last: bool,
    ) {
        if let Some(e) = error {
            warn!(error = %e, "position detail query failed");
        } else if let Some(detail) = detail {
            info!(
                instrument = %detail.instrument_id,
                direction = ?detail.direction,
                volume = detail.volume,
                open_price = %detail.open_price,
                "position detail"
            );
        } else {
            info!("position detail: empty result");
        }
        if is_last {
            self.chain("orders", self.client.query_order());
        }
    }

    fn on_rsp_order(
        &mut self,
        order: Option<&OrderRecord>,
        error: Option<&RspError>,
        _request_id: RequestId,
        is_last: bool,
    ) {
        if let Some(e) = error {
            warn!(error = %e, "order query failed");
        } else if let Some(order) = order {
            info!(
                order_ref = %order.order_ref,
                instrument = %order.instrument_id,
                status = ?order.status,
                "order on book"
            );
        } else {
            info!("orders: empty result");
        }
        if is_last {
            self.chain("trades", self.client.query_trade());
        }
    }

    fn on_rsp_trade(
        &mut self,
        trade: Option<&TradeRecord>,
        error: Option<&RspError>,
        _request_id: RequestId,
        is_last: bool,
    ) {
        if let Some(e) = error {
            warn!(error = %e, "trade query failed");
        } else if let Some(trade) = trade {
            info!(
                trade_id = %trade.trade_id,
                instrument = %trade.instrument_id,
                price = %trade.price,
                "trade on record"
            );
        } else {
            info!("trades: empty result");
        }
        if is_last {
            info!("day-open query chain complete");
        }
    }

    fn on_rsp_market_data(
        &mut self,
        snapshot: Option<&MarketDataSnapshot>,
        error: Option<&RspError>,
        _request_id: RequestId,
        _is_last: bool,
    ) {
        if let Some(e) = error {
            warn!(error = %e, "market data query failed");
        } else if let Some(snapshot) = snapshot {
            info!(
                instrument = %snapshot.instrument_id,
                last = %snapshot.last_price,
                "market data snapshot"
            );
        }
    }

    fn on_idle(&mut self) {
        debug!("idle");
    }

    fn on_exception(&mut self, message: &str) {
        warn!(message, "gateway exception");
    }
}
