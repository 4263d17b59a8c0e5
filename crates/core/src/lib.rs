//! Typed facade over platform WebRTC peer connections
//!
//! This crate does not implement ICE, DTLS or SCTP. It tracks the coarse
//! lifecycle of one peer connection and its data channel, collects local ICE
//! candidates, and turns offers and answers into strings for an
//! application-supplied signaling channel. The platform itself is reached
//! through the [`PeerFactory`] capability provider.
//!
//! # Overview
//!
//! - [`Peer`] - the connection state shim
//! - [`PeerHook`] - polled handle for UI layers
//! - [`FactorySource`] - selects the capability provider per environment
//! - [`platform`] - traits a platform backend implements
//!
//! # Example
//!
//! ```ignore
//! use peerf_core::{FactorySource, HookOptions, PeerHook, RtcConfiguration};
//!
//! let options = HookOptions::new(RtcConfiguration::with_stun(["stun:stun.l.google.com:19302"]));
//! let hook: PeerHook<String> = PeerHook::mount(&source, options).await?;
//! hook.create_data_channel("chat").await?;
//! let offer = hook.create_offer().await?;
//! // move `offer` to the remote peer, receive its answer
//! hook.set_remote_description(&answer).await?;
//! ```

pub mod config;
pub mod error;
pub mod hook;
pub mod peer;
pub mod platform;
pub mod provider;
pub mod state;

pub use config::{IceServer, IceTransportPolicy, RtcConfiguration, DEFAULT_STUN_SERVER};
pub use error::{Error, Result};
pub use hook::{HookOptions, PeerHook, DEFAULT_POLL_INTERVAL};
pub use peer::{MessageCallback, Peer, PeerRole};
pub use platform::{
    ChannelMessage, DataChannel, IceCandidate, PeerConnection, PeerFactory, SdpType,
    SessionDescription,
};
pub use provider::FactorySource;
pub use state::{ConnectionState, DataChannelState, PeerSnapshot};
