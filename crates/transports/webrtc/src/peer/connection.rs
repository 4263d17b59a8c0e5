//! webrtc-rs peer connection adapter
//!
//! Presents an `RTCPeerConnection` as a platform [`PeerConnection`]. Event
//! handlers are invoked synchronously from webrtc-rs callback tasks; every
//! platform error is mapped to `Error::Platform` with the failing step in the
//! message.

use async_trait::async_trait;
use peerf_core::platform::{ConnectionStateHandler, DataChannelHandler, IceCandidateHandler};
use peerf_core::{
    ConnectionState, DataChannel, Error, IceCandidate, PeerConnection, Result, SessionDescription,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::RTCPeerConnection;

use crate::adapters;
use crate::channels::WebRtcDataChannel;

/// Platform peer connection backed by webrtc-rs
pub struct WebRtcPeerConnection {
    /// Short identifier used in logs
    id: String,

    /// WebRTC peer connection
    pc: Arc<RTCPeerConnection>,
}

impl WebRtcPeerConnection {
    pub fn new(id: String, pc: RTCPeerConnection) -> Self {
        info!("Created WebRTC peer connection {}", id);
        Self {
            id,
            pc: Arc::new(pc),
        }
    }
}

#[async_trait]
impl PeerConnection for WebRtcPeerConnection {
    fn connection_state(&self) -> ConnectionState {
        adapters::connection_state_from_rtc(self.pc.connection_state())
    }

    fn on_connection_state_change(&self, handler: ConnectionStateHandler) {
        let id = self.id.clone();
        self.pc
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                info!("Peer {} connection state: {}", id, state);
                handler(adapters::connection_state_from_rtc(state));
                Box::pin(async {})
            }));
    }

    fn on_ice_candidate(&self, handler: IceCandidateHandler) {
        let id = self.id.clone();
        self.pc
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                match candidate {
                    Some(candidate) => match adapters::candidate_from_rtc(&candidate) {
                        Ok(candidate) => handler(Some(candidate)),
                        Err(e) => warn!("Peer {} dropped unserializable candidate: {}", id, e),
                    },
                    None => handler(None),
                }
                Box::pin(async {})
            }));
    }

    fn on_data_channel(&self, handler: DataChannelHandler) {
        let id = self.id.clone();
        self.pc.on_data_channel(Box::new(move |rtc_channel| {
            info!(
                "Data channel announced: label={}, id={} for peer {}",
                rtc_channel.label(),
                rtc_channel.id(),
                id
            );
            let channel: Arc<dyn DataChannel> = Arc::new(WebRtcDataChannel::new(rtc_channel));
            handler(channel);
            Box::pin(async {})
        }));
    }

    async fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannel>> {
        let rtc_channel = self
            .pc
            .create_data_channel(label, None)
            .await
            .map_err(|e| Error::platform("Failed to create data channel", e))?;

        debug!("Peer {} created data channel '{}'", self.id, label);
        Ok(Arc::new(WebRtcDataChannel::new(rtc_channel)))
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| Error::platform("Failed to create offer", e))?;
        adapters::description_from_rtc(&offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| Error::platform("Failed to create answer", e))?;
        adapters::description_from_rtc(&answer)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let description = adapters::description_to_rtc(description)?;
        self.pc
            .set_local_description(description)
            .await
            .map_err(|e| Error::platform("Failed to set local description", e))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let description = adapters::description_to_rtc(description)?;
        self.pc
            .set_remote_description(description)
            .await
            .map_err(|e| Error::platform("Failed to set remote description", e))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        debug!("Peer {} adding ICE candidate: {}", self.id, candidate.candidate);
        self.pc
            .add_ice_candidate(adapters::candidate_to_rtc(candidate))
            .await
            .map_err(|e| Error::platform("Failed to add ICE candidate", e))
    }

    async fn close(&self) -> Result<()> {
        self.pc
            .close()
            .await
            .map_err(|e| Error::platform("Failed to close peer connection", e))?;
        info!("Peer connection {} closed", self.id);
        Ok(())
    }
}

impl Drop for WebRtcPeerConnection {
    fn drop(&mut self) {
        debug!("WebRtcPeerConnection {} dropped", self.id);
    }
}
