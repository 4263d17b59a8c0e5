//! Adapters for converting between peerf-core and webrtc-rs types
//!
//! webrtc-rs has its own spelling for every value the shim tracks. These
//! functions map configuration, states, descriptions and candidates in both
//! directions.

use peerf_core::{
    ConnectionState, Error, IceCandidate, IceTransportPolicy, Result, RtcConfiguration, SdpType,
    SessionDescription,
};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Convert core configuration to webrtc-rs configuration
pub fn configuration_to_rtc(configuration: &RtcConfiguration) -> RTCConfiguration {
    let ice_servers = configuration
        .ice_servers
        .iter()
        .map(|server| RTCIceServer {
            urls: server.urls.clone(),
            username: server.username.clone().unwrap_or_default(),
            credential: server.credential.clone().unwrap_or_default(),
            ..Default::default()
        })
        .collect();

    let ice_transport_policy = match configuration.ice_transport_policy {
        IceTransportPolicy::All => RTCIceTransportPolicy::All,
        IceTransportPolicy::Relay => RTCIceTransportPolicy::Relay,
    };

    RTCConfiguration {
        ice_servers,
        ice_transport_policy,
        ice_candidate_pool_size: configuration.ice_candidate_pool_size,
        ..Default::default()
    }
}

/// Convert webrtc-rs connection state to core state
pub fn connection_state_from_rtc(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => ConnectionState::New,
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
    }
}

/// Build a webrtc-rs description, parsing the SDP
///
/// Unparseable SDP and rollback descriptions are `InvalidArgument`.
pub fn description_to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let parsed = match description.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp),
        SdpType::Answer => RTCSessionDescription::answer(description.sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp),
        SdpType::Rollback => {
            return Err(Error::InvalidArgument(
                "rollback descriptions are not supported".to_string(),
            ))
        }
    };
    parsed.map_err(|e| Error::InvalidArgument(format!("invalid SDP: {}", e)))
}

/// Convert a webrtc-rs description to core
pub fn description_from_rtc(description: &RTCSessionDescription) -> Result<SessionDescription> {
    let sdp_type = match description.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => {
            return Err(Error::Platform(
                "platform produced a description without a type".to_string(),
            ))
        }
    };
    Ok(SessionDescription {
        sdp_type,
        sdp: description.sdp.clone(),
    })
}

/// Convert a locally gathered candidate to its JSON form
pub fn candidate_from_rtc(candidate: &RTCIceCandidate) -> Result<IceCandidate> {
    let init = candidate
        .to_json()
        .map_err(|e| Error::platform("Failed to serialize ICE candidate", e))?;
    Ok(IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_mline_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    })
}

/// Convert a remote candidate for `add_ice_candidate`
pub fn candidate_to_rtc(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_mline_index,
        username_fragment: candidate.username_fragment,
    }
}
