//! Shared harness for runtime integration tests.
//!
//! Wires a client over the in-process transport, spawns its event loop,
//! and exposes the scripted gateway side plus an ordered stream of
//! callback labels for assertions.

use std::sync::Arc;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use ftg_client::{ClientConfig, GatewayClient, GatewayHandler};
use ftg_core::{
    Bar, Channel, InputOrder, LoginInfo, MarketDataSnapshot, OrderRecord, RequestId, RspError,
    TickView, TrackedOrder, TradeRecord,
};
use ftg_transport::{
    sim_pair, ConnectionConfig, DisconnectReason, OutboundRequest, SimGateway, TransportEvent,
};

/// Handler that forwards one label per callback into a channel, preserving
/// production order. Callbacks the tests never assert on keep their no-op
/// defaults.
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, line: String) {
        let _ = self.tx.send(line);
    }
}

impl GatewayHandler for ChannelHandler {
    fn on_front_connected(&mut self, channel: Channel) {
        self.emit(format!("front_connected:{channel}"));
    }

    fn on_front_disconnected(&mut self, channel: Channel, _reason: DisconnectReason) {
        self.emit(format!("front_disconnected:{channel}"));
    }

    fn on_user_login(
        &mut self,
        channel: Channel,
        _info: Option<&LoginInfo>,
        error: Option<&RspError>,
    ) {
        self.emit(format!("user_login:{channel}:{}", error.is_none()));
    }

    fn on_subscribed(&mut self, instrument: &str, _error: Option<&RspError>, is_last: bool) {
        self.emit(format!("subscribed:{instrument}:{is_last}"));
    }

    fn on_market_data(&mut self, snapshot: &MarketDataSnapshot) {
        self.emit(format!("market_data:{}", snapshot.instrument_id));
    }

    fn on_tick(&mut self, tick: &TickView) {
        self.emit(format!("tick:{}", tick.price));
    }

    fn on_partial_bar(&mut self, bar: &Bar) {
        self.emit(format!("partial:{}:{}", bar.minute, bar.volume));
    }

    fn on_closed_bar(&mut self, bar: &Bar) {
        self.emit(format!("closed:{}:{}", bar.minute, bar.volume));
    }

    fn on_order(&mut self, order: &TrackedOrder) {
        self.emit(format!("order:{:?}:{}", order.status, order.volume_traded));
    }

    fn on_trade(&mut self, trade: &TradeRecord) {
        self.emit(format!("trade:{}", trade.trade_id));
    }

    fn on_insert_error(&mut self, _input: &InputOrder, error: &RspError) {
        self.emit(format!("insert_error:{}", error.code));
    }

    fn on_rsp_trading_account(
        &mut self,
        account: Option<&ftg_core::TradingAccount>,
        _error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
        self.emit(format!(
            "rsp_account:{}:{request_id}:{is_last}",
            account.is_some()
        ));
    }

    fn on_rsp_order(
        &mut self,
        order: Option<&OrderRecord>,
        _error: Option<&RspError>,
        request_id: RequestId,
        is_last: bool,
    ) {
        self.emit(format!("rsp_order:{}:{request_id}:{is_last}", order.is_some()));
    }

    fn on_idle(&mut self) {
        self.emit("idle".to_string());
    }
}

/// A running runtime: client handle, scripted gateway, callback stream.
pub struct Harness {
    pub client: GatewayClient,
    pub gateway: SimGateway,
    pub callbacks: mpsc::UnboundedReceiver<String>,
    pub loop_handle: JoinHandle<()>,
}

/// Build a client over the sim transport and spawn its event loop.
pub fn start_runtime(config: ClientConfig) -> Harness {
    let (event_tx, event_rx) = mpsc::channel(config.event_queue_capacity);
    let (transport, gateway) = sim_pair(ConnectionConfig::default(), event_tx);
    let client =
        GatewayClient::new(Arc::new(transport), config).expect("client requires a tokio runtime");
    let (handler, callbacks) = ChannelHandler::new();
    let loop_handle = client.start(event_rx, Box::new(handler));
    Harness {
        client,
        gateway,
        callbacks,
        loop_handle,
    }
}

/// Config with the idle callback pushed out of the way so ordered-stream
/// assertions never race it.
pub fn quiet_config() -> ClientConfig {
    ClientConfig {
        idle_delay_ms: 60_000,
        ..ClientConfig::default()
    }
}

/// Next callback label, bounded so a missing callback fails fast.
pub async fn next_callback(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a callback")
        .expect("callback channel closed")
}

/// Skip labels until one starts with `prefix`, returning it.
pub async fn callback_with_prefix(
    rx: &mut mpsc::UnboundedReceiver<String>,
    prefix: &str,
) -> String {
    loop {
        let line = next_callback(rx).await;
        if line.starts_with(prefix) {
            return line;
        }
    }
}

/// Next request the client pushed toward the gateway.
pub async fn next_request(gateway: &mut SimGateway) -> OutboundRequest {
    timeout(Duration::from_secs(5), gateway.recv_request())
        .await
        .expect("timed out waiting for a request")
        .expect("request channel closed")
}

pub fn sample_login(front_id: i32, session_id: i32) -> LoginInfo {
    LoginInfo {
        trading_day: "20260820".to_string(),
        login_time: NaiveTime::from_hms_opt(8, 59, 30).unwrap(),
        broker_id: "9999".to_string(),
        user_id: "070577".to_string(),
        system_name: "TradingSystem".to_string(),
        front_id,
        session_id,
        max_order_ref: "1".to_string(),
    }
}

/// Drive the trading channel to ready: front up, login accepted,
/// settlement confirmation consumed. Leaves the callback stream just past
/// the login notification.
pub async fn bring_td_ready(harness: &mut Harness) {
    harness
        .gateway
        .open_front(Channel::Trading)
        .await
        .expect("event queue open");
    assert_eq!(
        next_request(&mut harness.gateway).await,
        OutboundRequest::TdLogin
    );
    harness
        .gateway
        .emit(TransportEvent::LoginResponse {
            channel: Channel::Trading,
            info: Some(sample_login(1, 100)),
            error: None,
        })
        .await
        .expect("event queue open");
    assert_eq!(
        next_request(&mut harness.gateway).await,
        OutboundRequest::ConfirmSettlementInfo
    );
    callback_with_prefix(&mut harness.callbacks, "user_login:td").await;
}

/// Depth snapshot fixture with cumulative `volume` and a turnover that
/// tracks price * volume.
pub fn tick_at(hms: (u32, u32, u32), price: Decimal, volume: i64) -> MarketDataSnapshot {
    MarketDataSnapshot {
        trading_day: "20260820".to_string(),
        instrument_id: "IF2609".to_string(),
        exchange_id: "CFFEX".to_string(),
        last_price: price,
        pre_settlement_price: dec!(100),
        pre_close_price: dec!(100),
        open_price: dec!(100),
        highest_price: price,
        lowest_price: price,
        volume,
        turnover: price * Decimal::from(volume),
        open_interest: dec!(1000),
        upper_limit_price: dec!(110),
        lower_limit_price: dec!(90),
        bid_price1: price,
        bid_volume1: 1,
        ask_price1: price,
        ask_volume1: 1,
        update_time: NaiveTime::from_hms_opt(hms.0, hms.1, hms.2).unwrap(),
        update_millisec: 0,
        action_day: "20260820".to_string(),
    }
}
