//! webrtc-rs data channel adapter
//!
//! Wraps an `RTCDataChannel` as a platform [`DataChannel`], forwarding the
//! open/close/message events to the shim's handlers.

use async_trait::async_trait;
use peerf_core::platform::{ChannelEventHandler, ChannelMessageHandler};
use peerf_core::{ChannelMessage, DataChannel, Error, Result};
use std::sync::Arc;
use tracing::{debug, error};
use webrtc::data_channel::RTCDataChannel;

/// Platform data channel backed by webrtc-rs
pub struct WebRtcDataChannel {
    /// Channel label/name
    label: String,
    /// The underlying RTCDataChannel
    rtc_channel: Arc<RTCDataChannel>,
}

impl WebRtcDataChannel {
    /// Wrap a channel created locally or announced by the remote peer
    pub fn new(rtc_channel: Arc<RTCDataChannel>) -> Self {
        let label = rtc_channel.label().to_string();

        let channel = Self {
            label,
            rtc_channel,
        };
        channel.setup_error_handler();
        channel
    }

    fn setup_error_handler(&self) {
        let label = self.label.clone();
        self.rtc_channel.on_error(Box::new(move |err| {
            error!("Data channel '{}' error: {}", label, err);
            Box::pin(async {})
        }));
    }
}

#[async_trait]
impl DataChannel for WebRtcDataChannel {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn on_open(&self, handler: ChannelEventHandler) {
        let label = self.label.clone();
        self.rtc_channel.on_open(Box::new(move || {
            debug!("Data channel '{}' opened", label);
            handler();
            Box::pin(async {})
        }));
    }

    fn on_close(&self, handler: ChannelEventHandler) {
        let label = self.label.clone();
        self.rtc_channel.on_close(Box::new(move || {
            debug!("Data channel '{}' closed", label);
            handler();
            Box::pin(async {})
        }));
    }

    fn on_message(&self, handler: ChannelMessageHandler) {
        let label = self.label.clone();

        self.rtc_channel.on_message(Box::new(move |msg| {
            debug!("Received {} bytes on data channel '{}'", msg.data.len(), label);

            handler(ChannelMessage {
                data: msg.data,
                is_string: msg.is_string,
            });
            Box::pin(async {})
        }));
    }

    async fn send_text(&self, text: String) -> Result<()> {
        let sent = self
            .rtc_channel
            .send_text(text)
            .await
            .map_err(|e| Error::platform("Failed to send message", e))?;

        debug!("Sent {} bytes on data channel '{}'", sent, self.label);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.rtc_channel
            .close()
            .await
            .map_err(|e| Error::platform("Failed to close channel", e))?;

        debug!("Data channel '{}' closed", self.label);
        Ok(())
    }
}
