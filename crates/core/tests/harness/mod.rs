//! In-memory platform for exercising the shim without a WebRTC stack
//!
//! The mock records every platform call and lets a test fire the events a
//! real platform would deliver (state changes, candidates, remote channels).

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use peerf_core::platform::{
    ChannelEventHandler, ChannelMessageHandler, ConnectionStateHandler, DataChannelHandler,
    IceCandidateHandler,
};
use peerf_core::{
    ChannelMessage, ConnectionState, DataChannel, Error, IceCandidate, PeerConnection,
    PeerFactory, Result, RtcConfiguration, SessionDescription,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Initialize tracing for tests
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Capability provider handing out [`MockConnection`]s
#[derive(Default)]
pub struct MockFactory {
    connections: Mutex<Vec<Arc<MockConnection>>>,
    descriptions_built: AtomicUsize,
    fail_connections: bool,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A factory whose peer-connection constructor always fails
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_connections: true,
            ..Default::default()
        })
    }

    pub fn connection(&self, index: usize) -> Arc<MockConnection> {
        Arc::clone(&self.connections.lock()[index])
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn descriptions_built(&self) -> usize {
        self.descriptions_built.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerFactory for MockFactory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_peer_connection(
        &self,
        _configuration: &RtcConfiguration,
    ) -> Result<Arc<dyn PeerConnection>> {
        if self.fail_connections {
            return Err(Error::Platform("peer connections disabled".to_string()));
        }
        let connection = Arc::new(MockConnection::default());
        self.connections.lock().push(Arc::clone(&connection));
        Ok(connection)
    }

    fn create_session_description(&self, init: SessionDescription) -> Result<SessionDescription> {
        self.descriptions_built.fetch_add(1, Ordering::SeqCst);
        Ok(init)
    }
}

#[derive(Default)]
pub struct MockConnection {
    state: Mutex<ConnectionState>,
    calls: Mutex<Vec<String>>,
    local: Mutex<Option<SessionDescription>>,
    remote: Mutex<Option<SessionDescription>>,
    remote_candidates: Mutex<Vec<IceCandidate>>,
    channels: Mutex<Vec<Arc<MockChannel>>>,
    state_handler: Mutex<Option<ConnectionStateHandler>>,
    candidate_handler: Mutex<Option<IceCandidateHandler>>,
    channel_handler: Mutex<Option<DataChannelHandler>>,
    close_calls: AtomicUsize,
}

impl MockConnection {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.local.lock().clone()
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.remote.lock().clone()
    }

    pub fn remote_candidates(&self) -> Vec<IceCandidate> {
        self.remote_candidates.lock().clone()
    }

    pub fn channel(&self, index: usize) -> Arc<MockChannel> {
        Arc::clone(&self.channels.lock()[index])
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn has_data_channel_handler(&self) -> bool {
        self.channel_handler.lock().is_some()
    }

    /// Fire a connection state change
    pub fn emit_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
        if let Some(handler) = self.state_handler.lock().as_ref() {
            handler(state);
        }
    }

    /// Fire a candidate event; `None` ends gathering
    pub fn emit_candidate(&self, candidate: Option<IceCandidate>) {
        if let Some(handler) = self.candidate_handler.lock().as_ref() {
            handler(candidate);
        }
    }

    /// Deliver a channel created by the remote peer
    pub fn announce_channel(&self, label: &str) -> Arc<MockChannel> {
        let channel = Arc::new(MockChannel::new(label));
        if let Some(handler) = self.channel_handler.lock().as_ref() {
            handler(Arc::clone(&channel) as Arc<dyn DataChannel>);
        }
        channel
    }
}

#[async_trait]
impl PeerConnection for MockConnection {
    fn connection_state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn on_connection_state_change(&self, handler: ConnectionStateHandler) {
        *self.state_handler.lock() = Some(handler);
    }

    fn on_ice_candidate(&self, handler: IceCandidateHandler) {
        *self.candidate_handler.lock() = Some(handler);
    }

    fn on_data_channel(&self, handler: DataChannelHandler) {
        *self.channel_handler.lock() = Some(handler);
    }

    async fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannel>> {
        self.record(format!("create_data_channel:{}", label));
        let channel = Arc::new(MockChannel::new(label));
        self.channels.lock().push(Arc::clone(&channel));
        Ok(channel)
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record("create_offer");
        Ok(SessionDescription::offer("v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\n"))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record("create_answer");
        if self.remote.lock().is_none() {
            return Err(Error::Platform("no remote description".to_string()));
        }
        Ok(SessionDescription::answer("v=0\r\no=- 2 1 IN IP4 127.0.0.1\r\n"))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.record("set_local_description");
        *self.local.lock() = Some(description);
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.record("set_remote_description");
        *self.remote.lock() = Some(description);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record("add_ice_candidate");
        self.remote_candidates.lock().push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record("close");
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.lock() = ConnectionState::Closed;
        Ok(())
    }
}

pub struct MockChannel {
    label: String,
    open_handler: Mutex<Option<ChannelEventHandler>>,
    close_handler: Mutex<Option<ChannelEventHandler>>,
    message_handler: Mutex<Option<ChannelMessageHandler>>,
    sent: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MockChannel {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            open_handler: Mutex::new(None),
            close_handler: Mutex::new(None),
            message_handler: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Fire the platform's open event
    pub fn open(&self) {
        if let Some(handler) = self.open_handler.lock().as_ref() {
            handler();
        }
    }

    /// Fire the close event as if the remote side closed
    pub fn remote_close(&self) {
        if let Some(handler) = self.close_handler.lock().as_ref() {
            handler();
        }
    }

    pub fn deliver(&self, message: ChannelMessage) {
        if let Some(handler) = self.message_handler.lock().as_ref() {
            handler(message);
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataChannel for MockChannel {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn on_open(&self, handler: ChannelEventHandler) {
        *self.open_handler.lock() = Some(handler);
    }

    fn on_close(&self, handler: ChannelEventHandler) {
        *self.close_handler.lock() = Some(handler);
    }

    fn on_message(&self, handler: ChannelMessageHandler) {
        *self.message_handler.lock() = Some(handler);
    }

    async fn send_text(&self, text: String) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Platform("channel closed".to_string()));
        }
        self.sent.lock().push(text);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.remote_close();
        Ok(())
    }
}

/// Host candidate line for tests
pub fn host_candidate(port: u16) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:1 1 udp 2130706431 192.168.1.10 {} typ host", port),
        sdp_mid: Some("0".to_string()),
        sdp_mline_index: Some(0),
        username_fragment: Some("abcd".to_string()),
    }
}
