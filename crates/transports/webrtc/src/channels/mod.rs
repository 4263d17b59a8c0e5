//! WebRTC data channel adapter

mod data_channel;

pub use data_channel::WebRtcDataChannel;
