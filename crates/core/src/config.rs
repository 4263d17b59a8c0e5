//! Peer connection configuration
//!
//! Field names follow the platform's `RTCConfiguration` dictionary in
//! camelCase, so a configuration object written for a browser peer
//! deserializes unchanged:
//!
//! ```
//! use peerf_core::RtcConfiguration;
//!
//! let config: RtcConfiguration = serde_json::from_str(
//!     r#"{"iceServers":[{"urls":["stun:stun.l.google.com:19302"]}]}"#,
//! ).unwrap();
//! assert_eq!(config.ice_servers.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Public STUN server used when nothing else is configured
pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Configuration handed to the peer-connection constructor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtcConfiguration {
    /// STUN/TURN servers
    #[serde(default)]
    pub ice_servers: Vec<IceServer>,

    /// Which candidates ICE may use
    #[serde(default)]
    pub ice_transport_policy: IceTransportPolicy,

    /// Number of candidates to pre-gather
    #[serde(default)]
    pub ice_candidate_pool_size: u8,
}

impl RtcConfiguration {
    /// Configuration with one STUN server per URL
    pub fn with_stun<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ice_servers: urls.into_iter().map(IceServer::new).collect(),
            ..Default::default()
        }
    }

    /// Add a TURN server with credentials
    pub fn with_turn(
        mut self,
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        self.ice_servers.push(IceServer {
            urls: vec![url.into()],
            username: Some(username.into()),
            credential: Some(credential.into()),
        });
        self
    }

    /// Load a JSON `RTCConfiguration` object from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::InvalidArgument(format!("invalid configuration {}: {}", path.display(), e))
        })
    }
}

/// A single STUN or TURN server entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceServer {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// ICE candidate filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IceTransportPolicy {
    /// Any candidate type
    #[default]
    All,
    /// Only TURN relay candidates
    Relay,
}
