//! Capability provider contract
//!
//! The shim never talks to a concrete WebRTC implementation. Each deployment
//! target supplies a [`PeerFactory`] exposing the two primitives the shim
//! needs: a peer-connection constructor and a session-description
//! constructor. Everything behind these traits (ICE, DTLS, SCTP) is the
//! platform's business.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RtcConfiguration;
use crate::state::ConnectionState;
use crate::{Error, Result};

/// Handler for connection state changes
pub type ConnectionStateHandler = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// Handler for locally discovered candidates; `None` marks end of gathering
pub type IceCandidateHandler = Box<dyn Fn(Option<IceCandidate>) + Send + Sync>;

/// Handler for data channels announced by the remote peer
pub type DataChannelHandler = Box<dyn Fn(Arc<dyn DataChannel>) + Send + Sync>;

/// Handler for channel open/close events
pub type ChannelEventHandler = Box<dyn Fn() + Send + Sync>;

/// Handler for inbound channel messages
pub type ChannelMessageHandler = Box<dyn Fn(ChannelMessage) + Send + Sync>;

/// Capability provider: constructs platform objects
#[async_trait]
pub trait PeerFactory: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Peer-connection constructor
    async fn create_peer_connection(
        &self,
        configuration: &RtcConfiguration,
    ) -> Result<Arc<dyn PeerConnection>>;

    /// Session-description constructor
    ///
    /// Validates a decoded description and returns the form this platform
    /// accepts for `set_remote_description`.
    fn create_session_description(&self, init: SessionDescription) -> Result<SessionDescription>;
}

/// One end of a platform peer connection
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Live state as reported by the platform
    fn connection_state(&self) -> ConnectionState;

    fn on_connection_state_change(&self, handler: ConnectionStateHandler);

    fn on_ice_candidate(&self, handler: IceCandidateHandler);

    fn on_data_channel(&self, handler: DataChannelHandler);

    async fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannel>>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// A platform data channel
#[async_trait]
pub trait DataChannel: Send + Sync {
    fn label(&self) -> String;

    fn on_open(&self, handler: ChannelEventHandler);

    fn on_close(&self, handler: ChannelEventHandler);

    fn on_message(&self, handler: ChannelMessageHandler);

    async fn send_text(&self, text: String) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Kind of session description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description in the platform's JSON shape
///
/// Serializes as `{"type":"offer","sdp":"v=0..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    /// Serialize to the signaling string
    pub fn to_signal(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a signaling string
    ///
    /// Empty input and malformed JSON are both `InvalidArgument`.
    pub fn from_signal(payload: &str) -> Result<Self> {
        if payload.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "session description payload is empty".to_string(),
            ));
        }
        serde_json::from_str(payload).map_err(|e| {
            Error::InvalidArgument(format!("malformed session description: {}", e))
        })
    }
}

/// A discovered network candidate, kept exactly as the platform produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
            username_fragment: None,
        }
    }

    /// Serialize to the signaling string
    pub fn to_signal(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a candidate received over signaling
    pub fn from_signal(payload: &str) -> Result<Self> {
        if payload.trim().is_empty() {
            return Err(Error::InvalidArgument("candidate payload is empty".to_string()));
        }
        serde_json::from_str(payload)
            .map_err(|e| Error::InvalidArgument(format!("malformed ICE candidate: {}", e)))
    }
}

/// An inbound data channel message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub data: Bytes,
    pub is_string: bool,
}

impl ChannelMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(text.into()),
            is_string: true,
        }
    }

    /// Payload as UTF-8, if it is valid
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Decode a JSON payload sent by a peer's `send`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.data)?)
    }
}
