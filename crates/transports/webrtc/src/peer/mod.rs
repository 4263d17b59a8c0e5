//! Peer connection adapter

mod connection;

pub use connection::WebRtcPeerConnection;
