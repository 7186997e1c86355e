//! Per-channel session lifecycle.
//!
//! One `SessionManager` per gateway channel owns the
//! Disconnected → Connecting → Authenticating → Ready machine. It reacts
//! to connectivity events and answers with the requests to send: login on
//! front-connected, resubscription or settlement confirmation on login.
//! Retry scheduling belongs to the transport; a disconnect simply parks
//! the manager until the next front-connected arrives.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{info, warn};

use ftg_core::{Channel, LoginInfo};
use ftg_transport::OutboundRequest;

/// Authentication posture of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
}

impl SessionState {
    /// Label for metrics and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session state machine for one channel.
///
/// The subscription set and credentials survive disconnects; transient
/// state (login identity, posture) resets.
#[derive(Debug)]
pub struct SessionManager {
    channel: Channel,
    state: SessionState,
    subscriptions: BTreeSet<String>,
    login: Option<LoginInfo>,
}

impl SessionManager {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            state: SessionState::Disconnected,
            subscriptions: BTreeSet::new(),
            login: None,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Identity of the current login, while authenticated.
    pub fn login_info(&self) -> Option<&LoginInfo> {
        self.login.as_ref()
    }

    /// Instruments that will be (re)subscribed after login.
    pub fn subscriptions(&self) -> &BTreeSet<String> {
        &self.subscriptions
    }

    /// The login request for this channel.
    #[must_use]
    pub fn login_request(&self) -> OutboundRequest {
        match self.channel {
            Channel::MarketData => OutboundRequest::MdLogin,
            Channel::Trading => OutboundRequest::TdLogin,
        }
    }

    /// The logout request for this channel.
    #[must_use]
    pub fn logout_request(&self) -> OutboundRequest {
        match self.channel {
            Channel::MarketData => OutboundRequest::MdLogout,
            Channel::Trading => OutboundRequest::TdLogout,
        }
    }

    /// The client issued `connect()`; the transport is dialing.
    pub fn connect_started(&mut self) {
        self.state = SessionState::Connecting;
    }

    /// Front is live: authenticate immediately.
    #[must_use]
    pub fn on_front_connected(&mut self) -> OutboundRequest {
        info!(channel = %self.channel, "front connected, sending login");
        self.state = SessionState::Authenticating;
        self.login_request()
    }

    /// Login accepted. Market data replays the subscription set (gateway
    /// subscriptions do not survive reconnect); trading confirms
    /// settlement info so the day's queries become meaningful.
    #[must_use]
    pub fn on_login_success(&mut self, info: LoginInfo) -> Option<OutboundRequest> {
        info!(
            channel = %self.channel,
            trading_day = %info.trading_day,
            front_id = info.front_id,
            session_id = info.session_id,
            "login ok"
        );
        self.state = SessionState::Ready;
        self.login = Some(info);

        match self.channel {
            Channel::MarketData if !self.subscriptions.is_empty() => {
                Some(OutboundRequest::Subscribe {
                    instruments: self.subscriptions.iter().cloned().collect(),
                })
            }
            Channel::MarketData => None,
            Channel::Trading => Some(OutboundRequest::ConfirmSettlementInfo),
        }
    }

    /// Login rejected: fail closed. Recovery is transport-level reconnect,
    /// never a login retry from here.
    pub fn on_login_failure(&mut self) {
        warn!(channel = %self.channel, "login rejected, session stays down");
        self.state = SessionState::Disconnected;
        self.login = None;
    }

    /// Front dropped. Subscriptions persist for replay; login identity is
    /// void.
    pub fn on_front_disconnected(&mut self) {
        self.state = SessionState::Disconnected;
        self.login = None;
    }

    /// Logout acknowledged: socket stays up, session is unauthenticated.
    /// No auto-login from here; the application asks explicitly.
    pub fn on_logout(&mut self) {
        self.state = SessionState::Connecting;
        self.login = None;
    }

    /// Add instruments to the subscription set. Returns the request to
    /// send now when the channel is ready; otherwise the set is replayed
    /// after the next login.
    #[must_use]
    pub fn add_subscriptions(&mut self, instruments: &[String]) -> Option<OutboundRequest> {
        for id in instruments {
            self.subscriptions.insert(id.clone());
        }
        if self.is_ready() && !instruments.is_empty() {
            Some(OutboundRequest::Subscribe {
                instruments: instruments.to_vec(),
            })
        } else {
            None
        }
    }

    /// Remove instruments from the subscription set.
    #[must_use]
    pub fn remove_subscriptions(&mut self, instruments: &[String]) -> Option<OutboundRequest> {
        for id in instruments {
            self.subscriptions.remove(id);
        }
        if self.is_ready() && !instruments.is_empty() {
            Some(OutboundRequest::Unsubscribe {
                instruments: instruments.to_vec(),
            })
        } else {
            None
        }
    }
}
