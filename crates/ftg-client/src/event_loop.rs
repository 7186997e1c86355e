//! The event loop: single consumer of the transport queue.
//!
//! One task drains `TransportEvent`s. For each raw event it first performs
//! the runtime's bookkeeping (sessions, correlator, tracker, aggregator,
//! read caches) under short lock scopes, then invokes every application
//! callback derived from that event, in order, with all locks released.
//! Handlers may therefore issue requests through the client from inside a
//! callback without deadlocking.
//!
//! When the queue stays empty past the configured idle delay the loop
//! delivers `on_idle`; after [`GatewayClient::exit`] it finishes whatever
//! is still queued and returns.
//!
//! [`GatewayClient::exit`]: crate::client::GatewayClient::exit

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use ftg_core::{
    Bar, Channel, InputOrder, InputOrderAction, InvestorPosition, InvestorPositionDetail,
    LoginInfo, LogoutInfo, MarketDataSnapshot, OrderRecord, OrderStatus, QueryKind, RequestId,
    RspError, SettlementInfoConfirm, TickView, TrackedOrder, TradeRecord, TradingAccount,
};
use ftg_orders::PushOutcome;
use ftg_session::{CompleteOutcome, SessionManager};
use ftg_telemetry::Metrics;
use ftg_transport::{DisconnectReason, OutboundRequest, QueryPayload, TransportEvent};

use crate::client::ClientShared;
use crate::handler::GatewayHandler;

/// One application callback, queued while bookkeeping still holds locks
/// and delivered afterwards in production order.
enum Invocation {
    FrontConnected(Channel),
    FrontDisconnected(Channel, DisconnectReason),
    UserLogin(Channel, Option<LoginInfo>, Option<RspError>),
    UserLogout(Channel, Option<LogoutInfo>, Option<RspError>),
    SettlementConfirmed(Option<SettlementInfoConfirm>, Option<RspError>),
    Subscribed(String, Option<RspError>, bool),
    Unsubscribed(String, Option<RspError>, bool),
    MarketData(MarketDataSnapshot),
    Tick(TickView),
    PartialBar(Bar),
    ClosedBar(Bar),
    Order(TrackedOrder),
    Trade(TradeRecord),
    InsertError(InputOrder, RspError),
    ActionError(InputOrderAction, RspError),
    RspTradingAccount(Option<TradingAccount>, Option<RspError>, RequestId, bool),
    RspInvestorPosition(Option<InvestorPosition>, Option<RspError>, RequestId, bool),
    RspPositionDetail(Option<InvestorPositionDetail>, Option<RspError>, RequestId, bool),
    RspOrder(Option<OrderRecord>, Option<RspError>, RequestId, bool),
    RspTrade(Option<TradeRecord>, Option<RspError>, RequestId, bool),
    RspMarketData(Option<MarketDataSnapshot>, Option<RspError>, RequestId, bool),
    Exception(String),
}

pub(crate) struct EventLoop {
    shared: Arc<ClientShared>,
    handler: Box<dyn GatewayHandler>,
    event_rx: mpsc::Receiver<TransportEvent>,
    last_idle: Instant,
    md_was_connected: bool,
    td_was_connected: bool,
}

impl EventLoop {
    pub(crate) fn new(
        shared: Arc<ClientShared>,
        handler: Box<dyn GatewayHandler>,
        event_rx: mpsc::Receiver<TransportEvent>,
    ) -> Self {
        Self {
            shared,
            handler,
            event_rx,
            last_idle: Instant::now(),
            md_was_connected: false,
            td_was_connected: false,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("event loop started");
        let exit = self.shared.exit.clone();
        loop {
            let idle_deadline = self.last_idle + self.shared.config.idle_delay();
            tokio::select! {
                biased;
                _ = exit.cancelled() => break,
                maybe = self.event_rx.recv() => match maybe {
                    Some(event) => self.process(event),
                    None => {
                        info!("event channel closed");
                        break;
                    }
                },
                _ = tokio::time::sleep_until(idle_deadline) => {
                    self.handler.on_idle();
                    Metrics::idle();
                    self.last_idle = Instant::now();
                }
            }
        }
        self.drain_remaining();
        info!("event loop stopped");
    }

    /// Finish whatever is already queued so no accepted event is lost to
    /// shutdown.
    fn drain_remaining(&mut self) {
        let mut drained = 0usize;
        while let Ok(event) = self.event_rx.try_recv() {
            self.process(event);
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "processed queued events during shutdown");
        }
    }

    /// Handle one raw event to completion: bookkeeping, then callbacks.
    fn process(&mut self, event: TransportEvent) {
        let kind = event.kind();
        Metrics::event_drained(kind);
        let invocations = self.dispatch(event);
        if invocations.is_empty() {
            return;
        }
        let started = Instant::now();
        for invocation in invocations {
            self.invoke(invocation);
        }
        Metrics::callback_latency(kind, started.elapsed().as_secs_f64() * 1000.0);
    }

    fn session(&self, channel: Channel) -> &Mutex<SessionManager> {
        match channel {
            Channel::MarketData => &self.shared.md_session,
            Channel::Trading => &self.shared.td_session,
        }
    }

    fn note_session_state(&self, channel: Channel) {
        let state = self.session(channel).lock().state();
        Metrics::session_state_set(&channel.to_string(), state.as_str());
    }

    /// Send a request produced by session bookkeeping. A failure here is
    /// surfaced to the application as an exception callback.
    fn send_follow_up(&self, request: Option<OutboundRequest>, out: &mut Vec<Invocation>) {
        if let Some(request) = request {
            let kind = request.kind();
            if let Err(e) = self.shared.transport.send(request) {
                warn!(kind, error = %e, "follow-up request failed");
                out.push(Invocation::Exception(format!(
                    "follow-up {kind} request failed: {e}"
                )));
            }
        }
    }

    /// Apply one raw event to the runtime state and collect the callbacks
    /// it produces. No handler code runs in here.
    fn dispatch(&mut self, event: TransportEvent) -> Vec<Invocation> {
        let mut out = Vec::new();
        match event {
            TransportEvent::FrontConnected { channel } => {
                Metrics::front_connected(&channel.to_string(), true);
                let was_connected = match channel {
                    Channel::MarketData => std::mem::replace(&mut self.md_was_connected, true),
                    Channel::Trading => std::mem::replace(&mut self.td_was_connected, true),
                };
                if was_connected {
                    Metrics::reconnect(&channel.to_string());
                }
                let login = self.session(channel).lock().on_front_connected();
                self.note_session_state(channel);
                self.send_follow_up(Some(login), &mut out);
                out.push(Invocation::FrontConnected(channel));
            }

            TransportEvent::FrontDisconnected { channel, reason } => {
                warn!(%channel, %reason, "front disconnected");
                Metrics::front_connected(&channel.to_string(), false);
                self.session(channel).lock().on_front_disconnected();
                self.note_session_state(channel);
                let dropped = self.shared.correlator.reset(channel);
                if !dropped.is_empty() {
                    warn!(
                        %channel,
                        dropped = dropped.len(),
                        "in-flight queries will never complete"
                    );
                }
                Metrics::queries_outstanding(&channel.to_string(), 0);
                out.push(Invocation::FrontDisconnected(channel, reason));
            }

            TransportEvent::LoginResponse {
                channel,
                info,
                error,
            } => {
                match (&info, &error) {
                    (Some(login), None) => {
                        let follow_up = self.session(channel).lock().on_login_success(login.clone());
                        if channel == Channel::Trading {
                            self.shared
                                .tracker
                                .lock()
                                .seed_order_ref(&login.max_order_ref);
                        }
                        self.note_session_state(channel);
                        self.send_follow_up(follow_up, &mut out);
                    }
                    _ => {
                        let code = error.as_ref().map(|e| e.code).unwrap_or(0);
                        warn!(%channel, code, "login rejected");
                        self.session(channel).lock().on_login_failure();
                        self.note_session_state(channel);
                    }
                }
                out.push(Invocation::UserLogin(channel, info, error));
            }

            TransportEvent::LogoutResponse {
                channel,
                info,
                error,
            } => {
                if error.is_none() {
                    self.session(channel).lock().on_logout();
                    self.note_session_state(channel);
                }
                out.push(Invocation::UserLogout(channel, info, error));
            }

            TransportEvent::SubscribeResponse {
                instrument,
                error,
                is_last,
            } => {
                out.push(Invocation::Subscribed(instrument, error, is_last));
            }

            TransportEvent::UnsubscribeResponse {
                instrument,
                error,
                is_last,
            } => {
                out.push(Invocation::Unsubscribed(instrument, error, is_last));
            }

            TransportEvent::SettlementConfirmResponse { confirm, error } => {
                if let Some(e) = &error {
                    warn!(code = e.code, message = %e.message, "settlement confirmation rejected");
                }
                out.push(Invocation::SettlementConfirmed(confirm, error));
            }

            TransportEvent::QueryResponsePage {
                kind,
                payload,
                error,
                request_id,
                is_last,
            } => {
                match self
                    .shared
                    .correlator
                    .complete(Channel::Trading, request_id, is_last)
                {
                    CompleteOutcome::Stale => {
                        debug!(%kind, %request_id, "late query page suppressed");
                    }
                    CompleteOutcome::Matched { kind: expected, .. } => {
                        if expected != kind {
                            warn!(%request_id, %expected, got = %kind, "query page kind mismatch");
                        }
                        Metrics::queries_outstanding(
                            &Channel::Trading.to_string(),
                            self.shared.correlator.outstanding(Channel::Trading) as i64,
                        );
                        // Order and trade pages also refresh the tracker so
                        // reconciliation does not depend on the handler.
                        match &payload {
                            Some(QueryPayload::Order(record)) => {
                                let _ =
                                    self.shared.tracker.lock().refresh_order(record, Utc::now());
                            }
                            Some(QueryPayload::Trade(trade)) => {
                                let _ = self.shared.tracker.lock().apply_trade(trade, Utc::now());
                            }
                            _ => {}
                        }
                        out.push(page_invocation(kind, payload, error, request_id, is_last));
                    }
                }
            }

            TransportEvent::PushOrder(record) => {
                match self.shared.tracker.lock().apply_order(&record, Utc::now()) {
                    PushOutcome::Changed(order) => {
                        Metrics::order_status_change(status_label(order.status));
                        out.push(Invocation::Order(order));
                    }
                    PushOutcome::Unchanged => {}
                }
            }

            TransportEvent::PushTrade(trade) => {
                let _ = self.shared.tracker.lock().apply_trade(&trade, Utc::now());
                out.push(Invocation::Trade(trade));
            }

            TransportEvent::PushTick(snapshot) => {
                Metrics::tick(&snapshot.instrument_id);
                self.shared
                    .market_snapshots
                    .insert(snapshot.instrument_id.clone(), snapshot.clone());
                let update = self.shared.aggregator.lock().on_tick(&snapshot);
                out.push(Invocation::MarketData(snapshot));
                out.push(Invocation::Tick(update.tick));
                if let Some(closed) = update.closed {
                    Metrics::bar_closed(&closed.instrument_id);
                    self.shared
                        .last_bars
                        .insert(closed.instrument_id.clone(), closed.clone());
                    out.push(Invocation::ClosedBar(closed));
                }
                if let Some(partial) = update.partial {
                    out.push(Invocation::PartialBar(partial));
                }
            }

            TransportEvent::InsertOrderError { input, error } => {
                warn!(
                    order_ref = %input.order_ref,
                    code = error.code,
                    message = %error.message,
                    "order insert rejected"
                );
                let _ = self
                    .shared
                    .tracker
                    .lock()
                    .mark_insert_rejected(&input, Utc::now());
                out.push(Invocation::InsertError(input, error));
            }

            TransportEvent::OrderActionError { input, error } => {
                warn!(
                    order_ref = %input.order_ref,
                    code = error.code,
                    message = %error.message,
                    "order action rejected"
                );
                let _ = self
                    .shared
                    .tracker
                    .lock()
                    .mark_action_rejected(&input, Utc::now());
                out.push(Invocation::ActionError(input, error));
            }

            TransportEvent::Exception { message } => {
                warn!(%message, "gateway exception");
                out.push(Invocation::Exception(message));
            }
        }
        out
    }

    fn invoke(&mut self, invocation: Invocation) {
        match invocation {
            Invocation::FrontConnected(channel) => self.handler.on_front_connected(channel),
            Invocation::FrontDisconnected(channel, reason) => {
                self.handler.on_front_disconnected(channel, reason)
            }
            Invocation::UserLogin(channel, info, error) => {
                self.handler
                    .on_user_login(channel, info.as_ref(), error.as_ref())
            }
            Invocation::UserLogout(channel, info, error) => {
                self.handler
                    .on_user_logout(channel, info.as_ref(), error.as_ref())
            }
            Invocation::SettlementConfirmed(confirm, error) => {
                self.handler
                    .on_settlement_confirmed(confirm.as_ref(), error.as_ref())
            }
            Invocation::Subscribed(instrument, error, is_last) => {
                self.handler
                    .on_subscribed(&instrument, error.as_ref(), is_last)
            }
            Invocation::Unsubscribed(instrument, error, is_last) => {
                self.handler
                    .on_unsubscribed(&instrument, error.as_ref(), is_last)
            }
            Invocation::MarketData(snapshot) => self.handler.on_market_data(&snapshot),
            Invocation::Tick(tick) => self.handler.on_tick(&tick),
            Invocation::PartialBar(bar) => self.handler.on_partial_bar(&bar),
            Invocation::ClosedBar(bar) => self.handler.on_closed_bar(&bar),
            Invocation::Order(order) => self.handler.on_order(&order),
            Invocation::Trade(trade) => self.handler.on_trade(&trade),
            Invocation::InsertError(input, error) => {
                self.handler.on_insert_error(&input, &error)
            }
            Invocation::ActionError(input, error) => {
                self.handler.on_action_error(&input, &error)
            }
            Invocation::RspTradingAccount(account, error, request_id, is_last) => self
                .handler
                .on_rsp_trading_account(account.as_ref(), error.as_ref(), request_id, is_last),
            Invocation::RspInvestorPosition(position, error, request_id, is_last) => self
                .handler
                .on_rsp_investor_position(position.as_ref(), error.as_ref(), request_id, is_last),
            Invocation::RspPositionDetail(detail, error, request_id, is_last) => self
                .handler
                .on_rsp_position_detail(detail.as_ref(), error.as_ref(), request_id, is_last),
            Invocation::RspOrder(order, error, request_id, is_last) => self
                .handler
                .on_rsp_order(order.as_ref(), error.as_ref(), request_id, is_last),
            Invocation::RspTrade(trade, error, request_id, is_last) => self
                .handler
                .on_rsp_trade(trade.as_ref(), error.as_ref(), request_id, is_last),
            Invocation::RspMarketData(snapshot, error, request_id, is_last) => self
                .handler
                .on_rsp_market_data(snapshot.as_ref(), error.as_ref(), request_id, is_last),
            Invocation::Exception(message) => self.handler.on_exception(&message),
        }
    }
}

/// Route a matched query page to the callback for its family. A payload of
/// the wrong family degrades to `None` rather than crossing callbacks.
fn page_invocation(
    kind: QueryKind,
    payload: Option<QueryPayload>,
    error: Option<RspError>,
    request_id: RequestId,
    is_last: bool,
) -> Invocation {
    match kind {
        QueryKind::TradingAccount => Invocation::RspTradingAccount(
            match payload {
                Some(QueryPayload::TradingAccount(x)) => Some(x),
                _ => None,
            },
            error,
            request_id,
            is_last,
        ),
        QueryKind::InvestorPosition => Invocation::RspInvestorPosition(
            match payload {
                Some(QueryPayload::InvestorPosition(x)) => Some(x),
                _ => None,
            },
            error,
            request_id,
            is_last,
        ),
        QueryKind::InvestorPositionDetail => Invocation::RspPositionDetail(
            match payload {
                Some(QueryPayload::InvestorPositionDetail(x)) => Some(x),
                _ => None,
            },
            error,
            request_id,
            is_last,
        ),
        QueryKind::Order => Invocation::RspOrder(
            match payload {
                Some(QueryPayload::Order(x)) => Some(x),
                _ => None,
            },
            error,
            request_id,
            is_last,
        ),
        QueryKind::Trade => Invocation::RspTrade(
            match payload {
                Some(QueryPayload::Trade(x)) => Some(x),
                _ => None,
            },
            error,
            request_id,
            is_last,
        ),
        QueryKind::MarketData => Invocation::RspMarketData(
            match payload {
                Some(QueryPayload::MarketData(x)) => Some(x),
                _ => None,
            },
            error,
            request_id,
            is_last,
        ),
    }
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::AllTraded => "all_traded",
        OrderStatus::PartTradedQueueing => "part_traded_queueing",
        OrderStatus::PartTradedNotQueueing => "part_traded_not_queueing",
        OrderStatus::NoTradeQueueing => "no_trade_queueing",
        OrderStatus::NoTradeNotQueueing => "no_trade_not_queueing",
        OrderStatus::Canceled => "canceled",
        OrderStatus::Unknown => "unknown",
        OrderStatus::NotTouched => "not_touched",
        OrderStatus::Touched => "touched",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GatewayClient;
    use crate::config::ClientConfig;
    use chrono::NaiveTime;
    use ftg_core::{
        Direction, OffsetFlag, OrderPriceType, OrderRef, OrderSpec, OrderSubmitStatus,
    };
    use ftg_session::SessionState;
    use ftg_transport::{GatewayTransport, TransportResult};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundRequest>>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<OutboundRequest> {
            self.sent.lock().clone()
        }
    }

    impl GatewayTransport for RecordingTransport {
        fn connect(&self) -> TransportResult<()> {
            Ok(())
        }

        fn send(&self, request: OutboundRequest) -> TransportResult<()> {
            self.sent.lock().push(request);
            Ok(())
        }
    }

    /// Handler that appends one line per callback, preserving order.
    struct RecordingHandler {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl GatewayHandler for RecordingHandler {
        fn on_front_connected(&mut self, channel: Channel) {
            self.log.lock().push(format!("front_connected:{channel}"));
        }

        fn on_user_login(
            &mut self,
            channel: Channel,
            _info: Option<&LoginInfo>,
            error: Option<&RspError>,
        ) {
            self.log
                .lock()
                .push(format!("user_login:{channel}:{}", error.is_none()));
        }

        fn on_market_data(&mut self, snapshot: &MarketDataSnapshot) {
            self.log
                .lock()
                .push(format!("market_data:{}", snapshot.instrument_id));
        }

        fn on_tick(&mut self, tick: &TickView) {
            self.log.lock().push(format!("tick:{}", tick.price));
        }

        fn on_partial_bar(&mut self, bar: &Bar) {
            self.log.lock().push(format!("partial:{}", bar.volume));
        }

        fn on_closed_bar(&mut self, bar: &Bar) {
            self.log.lock().push(format!("closed:{}", bar.volume));
        }

        fn on_order(&mut self, order: &TrackedOrder) {
            self.log.lock().push(format!("order:{:?}", order.status));
        }

        fn on_trade(&mut self, trade: &TradeRecord) {
            self.log.lock().push(format!("trade:{}", trade.trade_id));
        }

        fn on_rsp_trading_account(
            &mut self,
            account: Option<&TradingAccount>,
            _error: Option<&RspError>,
            request_id: RequestId,
            is_last: bool,
        ) {
            self.log.lock().push(format!(
                "rsp_account:{}:{request_id}:{is_last}",
                account.is_some()
            ));
        }

        fn on_idle(&mut self) {
            self.log.lock().push("idle".to_string());
        }
    }

    fn harness() -> (
        EventLoop,
        GatewayClient,
        Arc<RecordingTransport>,
        Arc<Mutex<Vec<String>>>,
    ) {
        let transport = Arc::new(RecordingTransport::default());
        let client = GatewayClient::new(transport.clone(), ClientConfig::default()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler { log: log.clone() };
        let (_tx, rx) = mpsc::channel(16);
        let event_loop = EventLoop::new(client.shared().clone(), Box::new(handler), rx);
        (event_loop, client, transport, log)
    }

    fn sample_login(front_id: i32, session_id: i32) -> LoginInfo {
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

    fn tick_at(hms: (u32, u32, u32), price: Decimal, volume: i64) -> MarketDataSnapshot {
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

    fn push_for(order_ref: &OrderRef, status: OrderStatus) -> OrderRecord {
        OrderRecord {
            instrument_id: "IF2609".to_string(),
            order_ref: order_ref.clone(),
            front_id: 1,
            session_id: 100,
            exchange_id: "CFFEX".to_string(),
            order_sys_id: Some("SYS-1".to_string()),
            direction: Direction::Buy,
            offset_flag: OffsetFlag::Open,
            price_type: OrderPriceType::Limit,
            limit_price: dec!(3700),
            volume_original: 2,
            volume_traded: 0,
            status,
            submit_status: OrderSubmitStatus::Accepted,
            insert_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            status_msg: String::new(),
        }
    }

    fn bring_td_up(event_loop: &mut EventLoop) {
        event_loop.process(TransportEvent::FrontConnected {
            channel: Channel::Trading,
        });
        event_loop.process(TransportEvent::LoginResponse {
            channel: Channel::Trading,
            info: Some(sample_login(1, 100)),
            error: None,
        });
    }

    #[tokio::test]
    async fn test_td_connect_login_confirm_flow() {
        let (mut event_loop, client, transport, log) = harness();

        event_loop.process(TransportEvent::FrontConnected {
            channel: Channel::Trading,
        });
        assert!(matches!(
            transport.sent().last(),
            Some(OutboundRequest::TdLogin)
        ));

        event_loop.process(TransportEvent::LoginResponse {
            channel: Channel::Trading,
            info: Some(sample_login(1, 100)),
            error: None,
        });
        assert!(matches!(
            transport.sent().last(),
            Some(OutboundRequest::ConfirmSettlementInfo)
        ));
        assert_eq!(client.td_state(), SessionState::Ready);
        assert_eq!(
            log.lock().as_slice(),
            &["front_connected:td".to_string(), "user_login:td:true".to_string()]
        );
    }

    #[tokio::test]
    async fn test_md_login_replays_subscriptions() {
        let (mut event_loop, client, transport, _log) = harness();

        client
            .subscribe(&["IF2609".to_string(), "IC2609".to_string()])
            .unwrap();
        assert!(transport.sent().is_empty());

        event_loop.process(TransportEvent::FrontConnected {
            channel: Channel::MarketData,
        });
        event_loop.process(TransportEvent::LoginResponse {
            channel: Channel::MarketData,
            info: Some(sample_login(1, 100)),
            error: None,
        });

        let sent = transport.sent();
        assert!(matches!(
            sent.last(),
            Some(OutboundRequest::Subscribe { instruments })
                if *instruments == vec!["IC2609".to_string(), "IF2609".to_string()]
        ));
    }

    #[tokio::test]
    async fn test_login_failure_fails_closed() {
        let (mut event_loop, client, _transport, log) = harness();

        event_loop.process(TransportEvent::FrontConnected {
            channel: Channel::Trading,
        });
        event_loop.process(TransportEvent::LoginResponse {
            channel: Channel::Trading,
            info: None,
            error: Some(RspError::new(3, "invalid password")),
        });

        assert_eq!(client.td_state(), SessionState::Disconnected);
        assert!(log.lock().contains(&"user_login:td:false".to_string()));
    }

    #[tokio::test]
    async fn test_tick_produces_ordered_callbacks() {
        let (mut event_loop, _client, _transport, log) = harness();

        event_loop.process(TransportEvent::PushTick(tick_at((9, 30, 5), dec!(100), 5)));
        event_loop.process(TransportEvent::PushTick(tick_at((9, 31, 2), dec!(103), 8)));

        let log = log.lock();
        assert_eq!(
            &log[..3],
            &[
                "market_data:IF2609".to_string(),
                "tick:100".to_string(),
                "partial:5".to_string()
            ]
        );
        assert_eq!(
            &log[3..],
            &[
                "market_data:IF2609".to_string(),
                "tick:103".to_string(),
                "closed:5".to_string(),
                "partial:3".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_tick_updates_read_caches() {
        let (mut event_loop, client, _transport, _log) = harness();

        event_loop.process(TransportEvent::PushTick(tick_at((9, 30, 5), dec!(100), 5)));
        assert_eq!(
            client.market_snapshot("IF2609").map(|s| s.last_price),
            Some(dec!(100))
        );
        assert!(client.last_closed_bar("IF2609").is_none());

        event_loop.process(TransportEvent::PushTick(tick_at((9, 31, 2), dec!(103), 8)));
        let closed = client.last_closed_bar("IF2609").unwrap();
        assert_eq!(closed.minute, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(closed.volume, 5);
    }

    #[tokio::test]
    async fn test_duplicate_order_push_notifies_once() {
        let (mut event_loop, client, _transport, log) = harness();
        bring_td_up(&mut event_loop);

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 2);
        let order_ref = client.insert_order(&spec).unwrap();

        let push = push_for(&order_ref, OrderStatus::NoTradeQueueing);
        event_loop.process(TransportEvent::PushOrder(push.clone()));
        event_loop.process(TransportEvent::PushOrder(push));

        let orders: Vec<_> = log
            .lock()
            .iter()
            .filter(|line| line.starts_with("order:"))
            .cloned()
            .collect();
        assert_eq!(orders, vec!["order:NoTradeQueueing".to_string()]);
    }

    #[tokio::test]
    async fn test_trade_push_fires_trade_not_order() {
        let (mut event_loop, client, _transport, log) = harness();
        bring_td_up(&mut event_loop);

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 2);
        let order_ref = client.insert_order(&spec).unwrap();
        event_loop.process(TransportEvent::PushOrder(push_for(
            &order_ref,
            OrderStatus::NoTradeQueueing,
        )));

        event_loop.process(TransportEvent::PushTrade(TradeRecord {
            instrument_id: "IF2609".to_string(),
            order_ref: order_ref.clone(),
            exchange_id: "CFFEX".to_string(),
            trade_id: "T1".to_string(),
            order_sys_id: "SYS-1".to_string(),
            direction: Direction::Buy,
            offset_flag: OffsetFlag::Open,
            hedge_flag: Default::default(),
            price: dec!(3700),
            volume: 1,
            trade_date: "20260820".to_string(),
            trade_time: NaiveTime::from_hms_opt(9, 30, 10).unwrap(),
        }));

        let log = log.lock();
        let order_lines = log.iter().filter(|l| l.starts_with("order:")).count();
        assert_eq!(order_lines, 1);
        assert!(log.contains(&"trade:T1".to_string()));
        assert_eq!(client.order(&order_ref).unwrap().volume_traded, 1);
    }

    #[tokio::test]
    async fn test_stale_query_page_suppressed() {
        let (mut event_loop, _client, _transport, log) = harness();

        event_loop.process(TransportEvent::QueryResponsePage {
            kind: QueryKind::TradingAccount,
            payload: None,
            error: None,
            request_id: RequestId(9),
            is_last: true,
        });
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_matched_empty_query_page_reaches_handler() {
        let (mut event_loop, client, _transport, log) = harness();

        let id = client
            .shared()
            .correlator
            .submit(Channel::Trading, QueryKind::TradingAccount);
        event_loop.process(TransportEvent::QueryResponsePage {
            kind: QueryKind::TradingAccount,
            payload: None,
            error: None,
            request_id: id,
            is_last: true,
        });
        assert_eq!(
            log.lock().as_slice(),
            &[format!("rsp_account:false:{id}:true")]
        );
    }

    #[tokio::test]
    async fn test_disconnect_drops_pending_queries() {
        let (mut event_loop, client, _transport, log) = harness();

        let id = client
            .shared()
            .correlator
            .submit(Channel::Trading, QueryKind::TradingAccount);
        event_loop.process(TransportEvent::FrontDisconnected {
            channel: Channel::Trading,
            reason: DisconnectReason::HeartbeatTimeout,
        });
        event_loop.process(TransportEvent::QueryResponsePage {
            kind: QueryKind::TradingAccount,
            payload: None,
            error: None,
            request_id: id,
            is_last: true,
        });

        let pages = log.lock().iter().filter(|l| l.starts_with("rsp_")).count();
        assert_eq!(pages, 0);
    }
}
