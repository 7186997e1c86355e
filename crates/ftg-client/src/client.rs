//! Gateway client facade.
//!
//! [`GatewayClient`] is the application's handle to the runtime. It owns
//! the shared state the event loop works on and exposes the outbound
//! request surface: session control, market data subscription, queries,
//! and order entry. Every request is fire-and-forget; results come back
//! through [`GatewayHandler`] callbacks.
//!
//! The handle is cheap to clone and all methods are callable from any
//! thread, including from inside a callback.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ftg_core::{
    Bar, Channel, CoreError, InputOrder, InputOrderAction, MarketDataSnapshot, OrderActionFlag,
    OrderRef, OrderSpec, QueryKind, RequestId, TrackedOrder,
};
use ftg_feed::BarAggregator;
use ftg_orders::OrderTracker;
use ftg_session::{RequestCorrelator, SessionManager, SessionState};
use ftg_telemetry::Metrics;
use ftg_transport::{GatewayTransport, OutboundRequest, TransportEvent};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::event_loop::EventLoop;
use crate::handler::GatewayHandler;

/// State shared between the client handle and the event loop.
///
/// The loop takes each lock for one bookkeeping step and releases it
/// before invoking callbacks, so request methods called from inside a
/// callback never contend with the loop holding a lock.
pub(crate) struct ClientShared {
    pub(crate) transport: Arc<dyn GatewayTransport>,
    pub(crate) config: ClientConfig,
    pub(crate) md_session: Mutex<SessionManager>,
    pub(crate) td_session: Mutex<SessionManager>,
    pub(crate) correlator: RequestCorrelator,
    pub(crate) tracker: Mutex<OrderTracker>,
    pub(crate) aggregator: Mutex<BarAggregator>,
    /// Latest depth snapshot per instrument.
    pub(crate) market_snapshots: DashMap<String, MarketDataSnapshot>,
    /// Last closed bar per instrument.
    pub(crate) last_bars: DashMap<String, Bar>,
    pub(crate) exit: CancellationToken,
    query_slot: Mutex<Instant>,
    runtime: Handle,
}

/// Handle to the gateway client runtime.
#[derive(Clone)]
pub struct GatewayClient {
    shared: Arc<ClientShared>,
}

impl GatewayClient {
    /// Create a client over a transport adapter.
    ///
    /// Must be called from within a tokio runtime; the runtime handle is
    /// captured for query scheduling and the event loop task.
    pub fn new(transport: Arc<dyn GatewayTransport>, config: ClientConfig) -> ClientResult<Self> {
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        Ok(Self {
            shared: Arc::new(ClientShared {
                transport,
                config,
                md_session: Mutex::new(SessionManager::new(Channel::MarketData)),
                td_session: Mutex::new(SessionManager::new(Channel::Trading)),
                correlator: RequestCorrelator::new(),
                tracker: Mutex::new(OrderTracker::new()),
                aggregator: Mutex::new(BarAggregator::new()),
                market_snapshots: DashMap::new(),
                last_bars: DashMap::new(),
                exit: CancellationToken::new(),
                query_slot: Mutex::new(Instant::now()),
                runtime,
            }),
        })
    }

    /// Spawn the event loop over the inbound event queue.
    ///
    /// The returned handle completes only after [`exit`](Self::exit) has
    /// been observed and any already-queued events were drained; await it
    /// to join the runtime.
    pub fn start(
        &self,
        event_rx: mpsc::Receiver<TransportEvent>,
        handler: Box<dyn GatewayHandler>,
    ) -> JoinHandle<()> {
        let event_loop = EventLoop::new(self.shared.clone(), handler, event_rx);
        self.shared.runtime.spawn(event_loop.run())
    }

    /// Request event loop shutdown. Queued events are still delivered
    /// before the loop returns.
    pub fn exit(&self) {
        info!("client exit requested");
        self.shared.exit.cancel();
    }

    // ------------------------------------------------------------------
    // Session control
    // ------------------------------------------------------------------

    /// Start dialing both fronts. Login is issued automatically once a
    /// front reports connected.
    pub fn connect(&self) -> ClientResult<()> {
        self.shared.md_session.lock().connect_started();
        self.shared.td_session.lock().connect_started();
        self.shared.transport.connect()?;
        Ok(())
    }

    /// Log the market data session in. Only needed after an explicit
    /// logout; connecting logs in automatically.
    pub fn md_login(&self) -> ClientResult<()> {
        self.shared.transport.send(OutboundRequest::MdLogin)?;
        Ok(())
    }

    pub fn md_logout(&self) -> ClientResult<()> {
        self.shared.transport.send(OutboundRequest::MdLogout)?;
        Ok(())
    }

    /// Log the trading session in. Only needed after an explicit logout.
    pub fn td_login(&self) -> ClientResult<()> {
        self.shared.transport.send(OutboundRequest::TdLogin)?;
        Ok(())
    }

    pub fn td_logout(&self) -> ClientResult<()> {
        self.shared.transport.send(OutboundRequest::TdLogout)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Market data
    // ------------------------------------------------------------------

    /// Subscribe to market data. The set persists across reconnects;
    /// while the session is down the request is parked and replayed after
    /// the next login.
    pub fn subscribe(&self, instruments: &[String]) -> ClientResult<()> {
        let request = self.shared.md_session.lock().add_subscriptions(instruments);
        if let Some(request) = request {
            self.shared.transport.send(request)?;
        }
        Ok(())
    }

    /// Drop instruments from the subscription set.
    pub fn unsubscribe(&self, instruments: &[String]) -> ClientResult<()> {
        let request = self
            .shared
            .md_session
            .lock()
            .remove_subscriptions(instruments);
        if let Some(request) = request {
            self.shared.transport.send(request)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Trading: settlement and queries
    // ------------------------------------------------------------------

    /// Confirm settlement info. Issued automatically after trading login;
    /// exposed for applications that confirm again intraday.
    pub fn confirm_settlement_info(&self) -> ClientResult<()> {
        if !self.shared.td_session.lock().is_ready() {
            return Err(ClientError::NotReady(Channel::Trading));
        }
        self.shared
            .transport
            .send(OutboundRequest::ConfirmSettlementInfo)?;
        Ok(())
    }

    pub fn query_trading_account(&self) -> ClientResult<RequestId> {
        self.submit_query(QueryKind::TradingAccount, None)
    }

    /// Query aggregate positions, optionally for one instrument.
    pub fn query_investor_position(&self, instrument: Option<&str>) -> ClientResult<RequestId> {
        self.submit_query(QueryKind::InvestorPosition, instrument.map(str::to_string))
    }

    /// Query per-open-trade position details, optionally for one
    /// instrument.
    pub fn query_investor_position_detail(
        &self,
        instrument: Option<&str>,
    ) -> ClientResult<RequestId> {
        self.submit_query(
            QueryKind::InvestorPositionDetail,
            instrument.map(str::to_string),
        )
    }

    pub fn query_order(&self) -> ClientResult<RequestId> {
        self.submit_query(QueryKind::Order, None)
    }

    pub fn query_trade(&self) -> ClientResult<RequestId> {
        self.submit_query(QueryKind::Trade, None)
    }

    pub fn query_market_data(&self, instrument: &str) -> ClientResult<RequestId> {
        self.submit_query(QueryKind::MarketData, Some(instrument.to_string()))
    }

    /// Allocate an id, claim the next pacing slot, and schedule the send.
    ///
    /// The gateway rejects query bursts, so consecutive queries are spaced
    /// `query_spacing` apart; the caller gets the id back immediately and
    /// pages arrive through the matching `on_rsp_*` callback.
    fn submit_query(&self, kind: QueryKind, instrument: Option<String>) -> ClientResult<RequestId> {
        if !self.shared.td_session.lock().is_ready() {
            return Err(ClientError::NotReady(Channel::Trading));
        }

        let request_id = self.shared.correlator.submit(Channel::Trading, kind);
        Metrics::queries_outstanding(
            &Channel::Trading.to_string(),
            self.shared.correlator.outstanding(Channel::Trading) as i64,
        );

        let slot = self.claim_query_slot();
        let transport = self.shared.transport.clone();
        let request = OutboundRequest::Query {
            kind,
            instrument,
            request_id,
        };
        self.shared.runtime.spawn(async move {
            tokio::time::sleep_until(slot).await;
            if let Err(e) = transport.send(request) {
                warn!(%kind, %request_id, error = %e, "query send failed");
            }
        });

        Ok(request_id)
    }

    /// Next free query slot, at least `query_spacing` after the previous
    /// one and never in the past.
    fn claim_query_slot(&self) -> Instant {
        let mut slot = self.shared.query_slot.lock();
        let now = Instant::now();
        let base = if *slot > now { *slot } else { now };
        *slot = base + self.shared.config.query_spacing();
        base
    }

    // ------------------------------------------------------------------
    // Trading: order entry
    // ------------------------------------------------------------------

    /// Insert an order. Allocates and returns the local order reference;
    /// the lifecycle then plays out through `on_order`/`on_trade`
    /// callbacks keyed by that reference.
    pub fn insert_order(&self, spec: &OrderSpec) -> ClientResult<OrderRef> {
        validate_spec(spec)?;

        let (front_id, session_id) = {
            let session = self.shared.td_session.lock();
            match session.login_info() {
                Some(info) if session.is_ready() => (info.front_id, info.session_id),
                _ => return Err(ClientError::NotReady(Channel::Trading)),
            }
        };

        let request_id = self.shared.correlator.allocate(Channel::Trading);
        let input = {
            let mut tracker = self.shared.tracker.lock();
            let order_ref = tracker.allocate_order_ref();
            tracker.register_insert(order_ref.clone(), front_id, session_id, spec, Utc::now());
            InputOrder {
                order_ref,
                spec: spec.clone(),
            }
        };

        let order_ref = input.order_ref.clone();
        if let Err(e) = self.shared.transport.send(OutboundRequest::InsertOrder {
            input: input.clone(),
            request_id,
        }) {
            // Never reached the wire; the record is dead on arrival.
            let _ = self
                .shared
                .tracker
                .lock()
                .mark_insert_rejected(&input, Utc::now());
            return Err(e.into());
        }
        Ok(order_ref)
    }

    /// Convenience wrapper for a plain limit order.
    pub fn insert_limit_order(
        &self,
        instrument: &str,
        direction: ftg_core::Direction,
        offset_flag: ftg_core::OffsetFlag,
        limit_price: Decimal,
        volume: i64,
    ) -> ClientResult<OrderRef> {
        let spec = OrderSpec::new(instrument, direction, offset_flag, limit_price, volume);
        self.insert_order(&spec)
    }

    /// Cancel a working order previously inserted through this client.
    pub fn delete_order(&self, order_ref: &OrderRef) -> ClientResult<RequestId> {
        self.order_action(order_ref, OrderActionFlag::Delete, None, None)
    }

    /// Modify a working order's price and/or remaining volume.
    pub fn modify_order(
        &self,
        order_ref: &OrderRef,
        limit_price: Option<Decimal>,
        volume_change: Option<i64>,
    ) -> ClientResult<RequestId> {
        self.order_action(order_ref, OrderActionFlag::Modify, limit_price, volume_change)
    }

    fn order_action(
        &self,
        order_ref: &OrderRef,
        action_flag: OrderActionFlag,
        limit_price: Option<Decimal>,
        volume_change: Option<i64>,
    ) -> ClientResult<RequestId> {
        if !self.shared.td_session.lock().is_ready() {
            return Err(ClientError::NotReady(Channel::Trading));
        }
        let order = self
            .shared
            .tracker
            .lock()
            .find_by_ref(order_ref)
            .ok_or_else(|| ClientError::UnknownOrder(order_ref.clone()))?;

        let input = InputOrderAction {
            action_flag,
            instrument_id: order.instrument_id.clone(),
            order_ref: order.order_ref.clone(),
            front_id: order.front_id,
            session_id: order.session_id,
            exchange_id: order.exchange_id.clone().unwrap_or_default(),
            order_sys_id: order.order_sys_id.clone(),
            limit_price,
            volume_change,
        };
        let request_id = self.shared.correlator.allocate(Channel::Trading);
        let _ = self
            .shared
            .tracker
            .lock()
            .mark_action_submitted(&order.key(), Utc::now());
        if let Err(e) = self.shared.transport.send(OutboundRequest::OrderAction {
            input: input.clone(),
            request_id,
        }) {
            // Never reached the wire; the action is not in flight.
            let _ = self
                .shared
                .tracker
                .lock()
                .mark_action_rejected(&input, Utc::now());
            return Err(e.into());
        }
        Ok(request_id)
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn md_state(&self) -> SessionState {
        self.shared.md_session.lock().state()
    }

    pub fn td_state(&self) -> SessionState {
        self.shared.td_session.lock().state()
    }

    /// Trading day from the trading login, while logged in.
    pub fn trading_day(&self) -> Option<String> {
        self.shared
            .td_session
            .lock()
            .login_info()
            .map(|info| info.trading_day.clone())
    }

    /// Latest depth snapshot seen for an instrument.
    pub fn market_snapshot(&self, instrument: &str) -> Option<MarketDataSnapshot> {
        self.shared
            .market_snapshots
            .get(instrument)
            .map(|entry| entry.clone())
    }

    /// Last closed minute bar for an instrument.
    pub fn last_closed_bar(&self, instrument: &str) -> Option<Bar> {
        self.shared.last_bars.get(instrument).map(|entry| entry.clone())
    }

    /// Current subscription set.
    pub fn subscriptions(&self) -> Vec<String> {
        self.shared
            .md_session
            .lock()
            .subscriptions()
            .iter()
            .cloned()
            .collect()
    }

    /// One of our orders, by local reference.
    pub fn order(&self, order_ref: &OrderRef) -> Option<TrackedOrder> {
        self.shared.tracker.lock().find_by_ref(order_ref)
    }

    /// Every tracked order.
    pub fn orders(&self) -> Vec<TrackedOrder> {
        self.shared.tracker.lock().orders()
    }

    /// Orders that can still trade or be canceled.
    pub fn active_orders(&self) -> Vec<TrackedOrder> {
        self.shared.tracker.lock().active_orders()
    }

    pub(crate) fn shared(&self) -> &Arc<ClientShared> {
        &self.shared
    }
}

/// Local sanity checks before an insert leaves the client.
fn validate_spec(spec: &OrderSpec) -> Result<(), CoreError> {
    if spec.volume <= 0 {
        return Err(CoreError::InvalidVolume(spec.volume));
    }
    if spec.min_volume <= 0 || spec.min_volume > spec.volume {
        return Err(CoreError::InvalidVolume(spec.min_volume));
    }
    if spec.contingent_condition.uses_stop_price() && spec.stop_price <= Decimal::ZERO {
        return Err(CoreError::MissingStopPrice(format!(
            "{:?}",
            spec.contingent_condition
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use ftg_core::{ContingentCondition, Direction, LoginInfo, OffsetFlag};
    use ftg_transport::{TransportError, TransportResult};
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

    #[derive(Debug, Default)]
    struct FailingTransport;

    impl GatewayTransport for FailingTransport {
        fn connect(&self) -> TransportResult<()> {
            Ok(())
        }

        fn send(&self, _request: OutboundRequest) -> TransportResult<()> {
            Err(TransportError::NetworkFailure)
        }
    }

    /// Accepts a fixed number of sends, then the link is gone.
    #[derive(Debug)]
    struct FailAfterTransport {
        sends_left: Mutex<usize>,
    }

    impl FailAfterTransport {
        fn new(sends: usize) -> Self {
            Self {
                sends_left: Mutex::new(sends),
            }
        }
    }

    impl GatewayTransport for FailAfterTransport {
        fn connect(&self) -> TransportResult<()> {
            Ok(())
        }

        fn send(&self, _request: OutboundRequest) -> TransportResult<()> {
            let mut left = self.sends_left.lock();
            if *left == 0 {
                return Err(TransportError::NetworkFailure);
            }
            *left -= 1;
            Ok(())
        }
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

    fn ready_client(transport: Arc<dyn GatewayTransport>) -> GatewayClient {
        let client = GatewayClient::new(transport, ClientConfig::default()).unwrap();
        {
            let mut td = client.shared.td_session.lock();
            let _ = td.on_front_connected();
            let _ = td.on_login_success(sample_login(1, 100));
        }
        client.shared.tracker.lock().seed_order_ref("1");
        client
    }

    #[tokio::test]
    async fn test_insert_requires_ready_session() {
        let transport = Arc::new(RecordingTransport::default());
        let client = GatewayClient::new(transport.clone(), ClientConfig::default()).unwrap();

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 1);
        assert!(matches!(
            client.insert_order(&spec),
            Err(ClientError::NotReady(Channel::Trading))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_insert_allocates_sequential_refs() {
        let transport = Arc::new(RecordingTransport::default());
        let client = ready_client(transport.clone());

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 1);
        let first = client.insert_order(&spec).unwrap();
        let second = client.insert_order(&spec).unwrap();

        assert_eq!(first, OrderRef::new(2));
        assert_eq!(second, OrderRef::new(3));
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(client.orders().len(), 2);
    }

    #[tokio::test]
    async fn test_insert_validation_rejects_bad_volume() {
        let transport = Arc::new(RecordingTransport::default());
        let client = ready_client(transport.clone());

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 0);
        assert!(matches!(
            client.insert_order(&spec),
            Err(ClientError::InvalidOrder(CoreError::InvalidVolume(0)))
        ));

        let spec = OrderSpec::new("IF2609", Direction::Sell, OffsetFlag::Close, dec!(3700), 2)
            .with_stop(ContingentCondition::LastGreaterThanStop, dec!(0));
        assert!(matches!(
            client.insert_order(&spec),
            Err(ClientError::InvalidOrder(CoreError::MissingStopPrice(_)))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_insert_send_failure_kills_record() {
        let client = ready_client(Arc::new(FailingTransport));

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 1);
        assert!(client.insert_order(&spec).is_err());
        assert!(client.active_orders().is_empty());
        assert_eq!(client.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_parks_until_login() {
        let transport = Arc::new(RecordingTransport::default());
        let client = GatewayClient::new(transport.clone(), ClientConfig::default()).unwrap();

        client.subscribe(&["IF2609".to_string()]).unwrap();
        assert!(transport.sent().is_empty());
        assert_eq!(client.subscriptions(), vec!["IF2609".to_string()]);
    }

    #[tokio::test]
    async fn test_query_requires_ready_session() {
        let transport = Arc::new(RecordingTransport::default());
        let client = GatewayClient::new(transport.clone(), ClientConfig::default()).unwrap();

        assert!(matches!(
            client.query_trading_account(),
            Err(ClientError::NotReady(Channel::Trading))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_order() {
        let client = ready_client(Arc::new(RecordingTransport::default()));
        assert!(matches!(
            client.delete_order(&OrderRef::new(99)),
            Err(ClientError::UnknownOrder(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_marks_action_submitted() {
        let transport = Arc::new(RecordingTransport::default());
        let client = ready_client(transport.clone());

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 1);
        let order_ref = client.insert_order(&spec).unwrap();
        let _ = client.delete_order(&order_ref).unwrap();

        let order = client.order(&order_ref).unwrap();
        assert_eq!(
            order.action_status,
            Some(ftg_core::OrderActionStatus::Submitted)
        );
        let sent = transport.sent();
        assert!(matches!(
            sent.last(),
            Some(OutboundRequest::OrderAction { .. })
        ));
    }

    #[tokio::test]
    async fn test_action_send_failure_clears_in_flight_marker() {
        let client = ready_client(Arc::new(FailAfterTransport::new(1)));

        let spec = OrderSpec::new("IF2609", Direction::Buy, OffsetFlag::Open, dec!(3700), 1);
        let order_ref = client.insert_order(&spec).unwrap();

        assert!(matches!(
            client.delete_order(&order_ref),
            Err(ClientError::Transport(TransportError::NetworkFailure))
        ));
        let order = client.order(&order_ref).unwrap();
        assert_eq!(
            order.action_status,
            Some(ftg_core::OrderActionStatus::Rejected)
        );
    }
}
