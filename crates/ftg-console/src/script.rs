//! Scripted gateway side for the demo run.
//!
//! Plays the far end of a conventional session against the client:
//! - Both fronts come up as soon as the client connects
//! - Logins, subscriptions, and the settlement confirmation are acked
//! - Queries get canned pages (two position pages, empty order/trade books)
//! - After the subscription ack, a short tick tape runs for each subscribed
//!   instrument, crossing the 09:30 -> 09:31 boundary so a closed bar shows
//!   up while the demo is running

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{Local, NaiveTime};
use rust_decimal::Decimal;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use ftg_core::{
    Channel, Direction, HedgeFlag, InvestorPosition, InvestorPositionDetail, LoginInfo,
    LogoutInfo, MarketDataSnapshot, PositionDirection, QueryKind, RequestId, RspError,
    SettlementInfoConfirm, TradingAccount,
};
use ftg_transport::{
    Credentials, OutboundRequest, QueryPayload, SimGateway, TransportEvent, TransportResult,
};

/// Spacing between scripted ticks.
const TAPE_INTERVAL: Duration = Duration::from_millis(400);

/// The gateway side of the demo session.
pub struct GatewayScript {
    broker_id: String,
    user_id: String,
    trading_day: String,
    /// Instrument used for the canned position records.
    instrument: String,
}

impl GatewayScript {
    #[must_use]
    pub fn new(credentials: &Credentials, trading_day: String, instrument: String) -> Self {
        Self {
            broker_id: credentials.broker_id.clone(),
            user_id: credentials.user_id.clone(),
            trading_day,
            instrument,
        }
    }

    /// Run until the client side goes away. Emit failures end the script;
    /// they mean the event loop has already shut down.
    pub async fn run(self, mut gateway: SimGateway) {
        gateway.wait_for_connect().await;
        if let Err(e) = self.play(&mut gateway).await {
            warn!(error = %e, "gateway script stopped early");
        }
        debug!("gateway script finished");
    }

    async fn play(&self, gateway: &mut SimGateway) -> TransportResult<()> {
        gateway.open_front(Channel::MarketData).await?;
        gateway.open_front(Channel::Trading).await?;

        let mut tape: VecDeque<MarketDataSnapshot> = VecDeque::new();
        let mut tape_timer = tokio::time::interval(TAPE_INTERVAL);
        tape_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                request = gateway.recv_request() => {
                    let Some(request) = request else { break };
                    if let OutboundRequest::Subscribe { instruments } = &request {
                        tape.extend(tick_tape(&self.trading_day, instruments));
                        tape_timer.reset();
                    }
                    self.answer(gateway, request).await?;
                }
                _ = tape_timer.tick(), if !tape.is_empty() => {
                    if let Some(snapshot) = tape.pop_front() {
                        gateway.emit(TransportEvent::PushTick(snapshot)).await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn answer(
        &self,
        gateway: &mut SimGateway,
        request: OutboundRequest,
    ) -> TransportResult<()> {
        debug!(kind = request.kind(), "script answering");
        match request {
            OutboundRequest::MdLogin => {
                gateway
                    .emit(TransportEvent::LoginResponse {
                        channel: Channel::MarketData,
                        info: Some(self.login_info(Channel::MarketData)),
                        error: None,
                    })
                    .await
            }
            OutboundRequest::TdLogin => {
                gateway
                    .emit(TransportEvent::LoginResponse {
                        channel: Channel::Trading,
                        info: Some(self.login_info(Channel::Trading)),
                        error: None,
                    })
                    .await
            }
            OutboundRequest::MdLogout => {
                gateway
                    .emit(TransportEvent::LogoutResponse {
                        channel: Channel::MarketData,
                        info: Some(self.logout_info()),
                        error: None,
                    })
                    .await
            }
            OutboundRequest::TdLogout => {
                gateway
                    .emit(TransportEvent::LogoutResponse {
                        channel: Channel::Trading,
                        info: Some(self.logout_info()),
                        error: None,
                    })
                    .await
            }
            OutboundRequest::Subscribe { instruments } => {
                let last = instruments.len().saturating_sub(1);
                for (i, instrument) in instruments.into_iter().enumerate() {
                    gateway
                        .emit(TransportEvent::SubscribeResponse {
                            instrument,
                            error: None,
                            is_last: i == last,
                        })
                        .await?;
                }
                Ok(())
            }
            OutboundRequest::Unsubscribe { instruments } => {
                let last = instruments.len().saturating_sub(1);
                for (i, instrument) in instruments.into_iter().enumerate() {
                    gateway
                        .emit(TransportEvent::UnsubscribeResponse {
                            instrument,
                            error: None,
                            is_last: i == last,
                        })
                        .await?;
                }
                Ok(())
            }
            OutboundRequest::ConfirmSettlementInfo => {
                gateway
                    .emit(TransportEvent::SettlementConfirmResponse {
                        confirm: Some(SettlementInfoConfirm {
                            broker_id: self.broker_id.clone(),
                            investor_id: self.user_id.clone(),
                            confirm_date: self.trading_day.clone(),
                            confirm_time: Local::now().time(),
                        }),
                        error: None,
                    })
                    .await
            }
            OutboundRequest::Query {
                kind,
                instrument,
                request_id,
            } => self.answer_query(gateway, kind, instrument, request_id).await,
            OutboundRequest::InsertOrder { input, .. } => {
                gateway
                    .emit(TransportEvent::InsertOrderError {
                        input,
                        error: RspError::new(99, "order entry is not scripted"),
                    })
                    .await
            }
            OutboundRequest::OrderAction { input, .. } => {
                gateway
                    .emit(TransportEvent::OrderActionError {
                        input,
                        error: RspError::new(99, "order actions are not scripted"),
                    })
                    .await
            }
        }
    }

    async fn answer_query(
        &self,
        gateway: &SimGateway,
        kind: QueryKind,
        instrument: Option<String>,
        request_id: RequestId,
    ) -> TransportResult<()> {
        match kind {
            QueryKind::TradingAccount => {
                let payload = QueryPayload::TradingAccount(self.trading_account());
                self.page(gateway, kind, Some(payload), request_id, true).await
            }
            QueryKind::InvestorPosition => {
                let long = QueryPayload::InvestorPosition(self.position(
                    PositionDirection::Long,
                    6,
                    2,
                ));
                self.page(gateway, kind, Some(long), request_id, false).await?;
                let short = QueryPayload::InvestorPosition(self.position(
                    PositionDirection::Short,
                    1,
                    1,
                ));
                self.page(gateway, kind, Some(short), request_id, true).await
            }
            QueryKind::InvestorPositionDetail => {
                let payload = QueryPayload::InvestorPositionDetail(self.position_detail());
                self.page(gateway, kind, Some(payload), request_id, true).await
            }
            // The demo day starts with clean books: a legitimate empty
            // result, one page with no payload.
            QueryKind::Order | QueryKind::Trade => {
                self.page(gateway, kind, None, request_id, true).await
            }
            QueryKind::MarketData => {
                let instrument = instrument.unwrap_or_else(|| self.instrument.clone());
                let snapshot = tick_tape(&self.trading_day, std::slice::from_ref(&instrument))
                    .into_iter()
                    .next();
                self.page(
                    gateway,
                    kind,
                    snapshot.map(QueryPayload::MarketData),
                    request_id,
                    true,
                )
                .await
            }
        }
    }

    async fn page(
        &self,
        gateway: &SimGateway,
        kind: QueryKind,
        payload: Option<QueryPayload>,
        request_id: RequestId,
        is_last: bool,
    ) -> TransportResult<()> {
        gateway
            .emit(TransportEvent::QueryResponsePage {
                kind,
                payload,
                error: None,
                request_id,
                is_last,
            })
            .await
    }

    fn login_info(&self, channel: Channel) -> LoginInfo {
        let (front_id, session_id) = match channel {
            Channel::MarketData => (1, 101),
            Channel::Trading => (2, 102),
        };
        LoginInfo {
            trading_day: self.trading_day.clone(),
            login_time: Local::now().time(),
            broker_id: self.broker_id.clone(),
            user_id: self.user_id.clone(),
            system_name: "ftg-sim".to_string(),
            front_id,
            session_id,
            max_order_ref: "1".to_string(),
        }
    }

    fn logout_info(&self) -> LogoutInfo {
        LogoutInfo {
            broker_id: self.broker_id.clone(),
            user_id: self.user_id.clone(),
        }
    }

    fn trading_account(&self) -> TradingAccount {
        TradingAccount {
            broker_id: self.broker_id.clone(),
            account_id: self.user_id.clone(),
            pre_balance: Decimal::from(1_000_000),
            deposit: Decimal::ZERO,
            withdraw: Decimal::ZERO,
            frozen_margin: Decimal::ZERO,
            current_margin: Decimal::from(388_500),
            commission: Decimal::new(819, 1),
            close_profit: Decimal::ZERO,
            position_profit: Decimal::from(5_400),
            balance: Decimal::from(1_005_318),
            available: Decimal::from(616_818),
            trading_day: self.trading_day.clone(),
        }
    }

    fn position(&self, direction: PositionDirection, total: i64, today: i64) -> InvestorPosition {
        InvestorPosition {
            instrument_id: self.instrument.clone(),
            broker_id: self.broker_id.clone(),
            investor_id: self.user_id.clone(),
            position_direction: direction,
            hedge_flag: HedgeFlag::Speculation,
            yd_position: total - today,
            position: total,
            today_position: today,
            open_volume: today,
            close_volume: 0,
            position_cost: Decimal::from(total * 370_000),
            use_margin: Decimal::from(total * 55_500),
            trading_day: self.trading_day.clone(),
        }
    }

    fn position_detail(&self) -> InvestorPositionDetail {
        InvestorPositionDetail {
            instrument_id: self.instrument.clone(),
            broker_id: self.broker_id.clone(),
            investor_id: self.user_id.clone(),
            hedge_flag: HedgeFlag::Speculation,
            direction: Direction::Buy,
            open_date: self.trading_day.clone(),
            trade_id: "88001".to_string(),
            volume: 2,
            open_price: Decimal::new(36980, 1),
            trading_day: self.trading_day.clone(),
            close_volume: 0,
            exchange_id: "CFFEX".to_string(),
        }
    }
}

/// Six steps per instrument: two minutes of trading with a rising tape and
/// one dip, cumulative volume counters, the second minute opening at
/// 09:31:03.
fn tick_tape(trading_day: &str, instruments: &[String]) -> Vec<MarketDataSnapshot> {
    let steps: [(u32, u32, u32, i64, i64); 6] = [
        (9, 30, 5, 37002, 5),
        (9, 30, 21, 37008, 9),
        (9, 30, 47, 37014, 14),
        (9, 31, 3, 37006, 18),
        (9, 31, 29, 37020, 25),
        (9, 31, 58, 37028, 31),
    ];

    let mut tape = Vec::with_capacity(steps.len() * instruments.len());
    for (h, m, s, price_tenths, volume) in steps {
        let price = Decimal::new(price_tenths, 1);
        for instrument in instruments {
            tape.push(snapshot(trading_day, instrument, at(h, m, s), price, volume));
        }
    }
    tape
}

fn snapshot(
    trading_day: &str,
    instrument: &str,
    update_time: NaiveTime,
    price: Decimal,
    volume: i64,
) -> MarketDataSnapshot {
    let half_spread = Decimal::new(2, 1);
    MarketDataSnapshot {
        trading_day: trading_day.to_string(),
        instrument_id: instrument.to_string(),
        exchange_id: "CFFEX".to_string(),
        last_price: price,
        pre_settlement_price: Decimal::new(36900, 1),
        pre_close_price: Decimal::new(36886, 1),
        open_price: Decimal::new(36920, 1),
        highest_price: Decimal::new(37058, 1),
        lowest_price: Decimal::new(36880, 1),
        volume,
        turnover: price * Decimal::from(volume),
        open_interest: Decimal::from(98_765),
        upper_limit_price: Decimal::new(40590, 1),
        lower_limit_price: Decimal::new(33210, 1),
        bid_price1: price - half_spread,
        bid_volume1: 12,
        ask_price1: price + half_spread,
        ask_volume1: 8,
        update_time,
        update_millisec: 0,
        action_day: trading_day.to_string(),
    }
}

fn at(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or_default()
}
