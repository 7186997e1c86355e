//! In-process transport adapter.
//!
//! `SimTransport` implements `GatewayTransport` over a pair of channels;
//! `SimGateway` is the far side, used by tests and the console demo to
//! script gateway behavior: answer requests, push ticks and order events,
//! drop and restore fronts.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

use ftg_core::Channel;

use crate::adapter::GatewayTransport;
use crate::connection::ConnectionConfig;
use crate::error::{TransportError, TransportResult};
use crate::event::{DisconnectReason, TransportEvent};
use crate::request::OutboundRequest;

const REQUEST_QUEUE_CAPACITY: usize = 64;

/// Client-side half: the `GatewayTransport` the runtime talks to.
pub struct SimTransport {
    request_tx: mpsc::Sender<OutboundRequest>,
    connect_notify: Arc<Notify>,
}

/// Gateway-side half: injects events and consumes requests.
pub struct SimGateway {
    event_tx: mpsc::Sender<TransportEvent>,
    request_rx: mpsc::Receiver<OutboundRequest>,
    connect_notify: Arc<Notify>,
    config: ConnectionConfig,
    auto_reconnect: bool,
    attempts: HashMap<Channel, u32>,
}

/// Create a connected transport/gateway pair.
///
/// `event_tx` is the queue into the client's event loop.
pub fn sim_pair(
    config: ConnectionConfig,
    event_tx: mpsc::Sender<TransportEvent>,
) -> (SimTransport, SimGateway) {
    let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
    let connect_notify = Arc::new(Notify::new());

    let transport = SimTransport {
        request_tx,
        connect_notify: connect_notify.clone(),
    };
    let gateway = SimGateway {
        event_tx,
        request_rx,
        connect_notify,
        config,
        auto_reconnect: false,
        attempts: HashMap::new(),
    };
    (transport, gateway)
}

impl GatewayTransport for SimTransport {
    fn connect(&self) -> TransportResult<()> {
        debug!("sim transport connect requested");
        self.connect_notify.notify_one();
        Ok(())
    }

    fn send(&self, request: OutboundRequest) -> TransportResult<()> {
        debug!(kind = request.kind(), channel = %request.channel(), "sim send");
        // 0 accepted, -2 queue full, -1 link gone.
        let rc = match self.request_tx.try_send(request) {
            Ok(()) => 0,
            Err(mpsc::error::TrySendError::Full(_)) => -2,
            Err(mpsc::error::TrySendError::Closed(_)) => -1,
        };
        TransportError::check_return_code(rc)
    }
}

impl SimGateway {
    /// Reconnect dropped fronts automatically after the configured backoff.
    #[must_use]
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Wait until the client has called `connect()`.
    pub async fn wait_for_connect(&self) {
        self.connect_notify.notified().await;
    }

    /// Deliver one event into the client's queue.
    pub async fn emit(&self, event: TransportEvent) -> TransportResult<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| TransportError::EventChannelClosed)
    }

    /// Bring a front up and reset its retry counter.
    pub async fn open_front(&mut self, channel: Channel) -> TransportResult<()> {
        self.attempts.insert(channel, 0);
        self.emit(TransportEvent::FrontConnected { channel }).await
    }

    /// Drop a front. With auto-reconnect enabled, schedules a
    /// `FrontConnected` after the backoff delay for this attempt.
    pub async fn drop_front(
        &mut self,
        channel: Channel,
        reason: DisconnectReason,
    ) -> TransportResult<()> {
        self.emit(TransportEvent::FrontDisconnected { channel, reason })
            .await?;

        if self.auto_reconnect {
            let attempt = self.attempts.entry(channel).or_insert(0);
            *attempt += 1;
            if !self.config.may_retry(*attempt) {
                warn!(%channel, attempt, "retry budget exhausted, front stays down");
                return Ok(());
            }
            let delay = self.config.backoff_delay(*attempt);
            let event_tx = self.event_tx.clone();
            debug!(%channel, attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = event_tx.send(TransportEvent::FrontConnected { channel }).await;
            });
        }
        Ok(())
    }

    /// Next request submitted by the client, or `None` once the client side
    /// is gone.
    pub async fn recv_request(&mut self) -> Option<OutboundRequest> {
        self.request_rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_reaches_gateway() {
        let (event_tx, _event_rx) = mpsc::channel(16);
        let (transport, mut gateway) = sim_pair(ConnectionConfig::default(), event_tx);

        transport.send(OutboundRequest::MdLogin).unwrap();
        let req = gateway.recv_request().await.unwrap();
        assert_eq!(req, OutboundRequest::MdLogin);
    }

    #[tokio::test]
    async fn test_send_queue_full() {
        let (event_tx, _event_rx) = mpsc::channel(16);
        let (transport, _gateway) = sim_pair(ConnectionConfig::default(), event_tx);

        for _ in 0..REQUEST_QUEUE_CAPACITY {
            transport.send(OutboundRequest::TdLogin).unwrap();
        }
        let err = transport.send(OutboundRequest::TdLogin).unwrap_err();
        assert!(matches!(err, TransportError::QueueFull));
    }

    #[tokio::test]
    async fn test_send_after_gateway_gone() {
        let (event_tx, _event_rx) = mpsc::channel(16);
        let (transport, gateway) = sim_pair(ConnectionConfig::default(), event_tx);
        drop(gateway);

        let err = transport.send(OutboundRequest::TdLogin).unwrap_err();
        assert!(matches!(err, TransportError::NetworkFailure));
    }

    #[tokio::test]
    async fn test_connect_notifies_gateway() {
        let (event_tx, _event_rx) = mpsc::channel(16);
        let (transport, gateway) = sim_pair(ConnectionConfig::default(), event_tx);

        transport.connect().unwrap();
        tokio::time::timeout(Duration::from_millis(100), gateway.wait_for_connect())
            .await
            .expect("connect notification should arrive");
    }

    #[tokio::test]
    async fn test_auto_reconnect_after_drop() {
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let config = ConnectionConfig {
            reconnect_base_delay_ms: 1,
            reconnect_max_delay_ms: 5,
            ..Default::default()
        };
        let (_transport, gateway) = sim_pair(config, event_tx);
        let mut gateway = gateway.with_auto_reconnect(true);

        gateway
            .drop_front(Channel::MarketData, DisconnectReason::HeartbeatTimeout)
            .await
            .unwrap();

        let first = event_rx.recv().await.unwrap();
        assert!(matches!(first, TransportEvent::FrontDisconnected { .. }));

        let second = tokio::time::timeout(Duration::from_secs(2), event_rx.recv())
            .await
            .expect("reconnect should be scheduled")
            .unwrap();
        assert!(matches!(
            second,
            TransportEvent::FrontConnected {
                channel: Channel::MarketData
            }
        ));
    }
}
