//! Lifecycle states mirrored from the platform
//!
//! Both enums serialize in lower case, matching the spelling the platform
//! itself reports, so UI layers can forward them verbatim.

use serde::{Deserialize, Serialize};

use crate::platform::IceCandidate;

/// Coarse state of a peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Connection constructed, nothing negotiated yet
    #[default]
    New,
    /// ICE/DTLS in progress
    Connecting,
    /// Transport established
    Connected,
    /// Transport lost, may recover
    Disconnected,
    /// Transport failed
    Failed,
    /// Connection closed
    Closed,
}

impl ConnectionState {
    /// Lower-case name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::New => "new",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        }
    }

    /// True once the connection cannot make further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Failed | ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locally tracked state of the data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataChannelState {
    /// Channel requested but not yet open
    #[default]
    Create,
    /// Channel open, sends allowed
    Open,
    /// Channel closed or not yet received from the remote peer
    Closed,
}

impl DataChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataChannelState::Create => "create",
            DataChannelState::Open => "open",
            DataChannelState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for DataChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value copy of a peer's observable state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSnapshot {
    pub connection_state: ConnectionState,
    pub data_channel_state: DataChannelState,
    pub ice_candidates: Vec<IceCandidate>,
}
