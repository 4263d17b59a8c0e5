//! In-process loopback harness
//!
//! Runs an offering and an answering peer on one host and plays the part of
//! the application's signaling channel: offer and answer strings are handed
//! across directly, and newly discovered ICE candidates are forwarded as
//! they appear in each peer's candidate list.

#![allow(dead_code)]

use peerf_core::{
    ChannelMessage, ConnectionState, DataChannelState, MessageCallback, Peer, PeerFactory,
    RtcConfiguration,
};
use peerf_webrtc::WebRtcFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Harness error type
#[derive(Debug)]
pub enum HarnessError {
    Peer(peerf_core::Error),
    Timeout(&'static str),
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::Peer(e) => write!(f, "peer error: {}", e),
            HarnessError::Timeout(what) => write!(f, "timed out waiting for {}", what),
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<peerf_core::Error> for HarnessError {
    fn from(e: peerf_core::Error) -> Self {
        HarnessError::Peer(e)
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Initialize tracing for tests (call once per test)
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info,webrtc=warn")
        .with_test_writer()
        .try_init();
}

/// Factory that gathers loopback candidates, so the pair connects without a LAN
pub fn loopback_factory() -> Arc<dyn PeerFactory> {
    Arc::new(
        WebRtcFactory::builder()
            .loopback_candidates(true)
            .build()
            .expect("webrtc factory should build"),
    )
}

/// An offerer/answerer pair sharing one factory
pub struct LoopbackPair {
    pub offerer: Peer<String>,
    pub answerer: Peer<String>,
    pub inbox: mpsc::UnboundedReceiver<ChannelMessage>,
    forwarded_to_answerer: usize,
    forwarded_to_offerer: usize,
}

impl LoopbackPair {
    pub async fn new() -> HarnessResult<Self> {
        let factory = loopback_factory();
        let configuration = RtcConfiguration::default();

        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let callback: MessageCallback = Arc::new(move |msg| {
            let _ = inbox_tx.send(msg);
        });

        let offerer = Peer::new(&configuration, Arc::clone(&factory), None).await?;
        let answerer = Peer::new(&configuration, factory, Some(callback)).await?;

        Ok(Self {
            offerer,
            answerer,
            inbox,
            forwarded_to_answerer: 0,
            forwarded_to_offerer: 0,
        })
    }

    /// Channel, offer, answer
    pub async fn negotiate(&mut self, label: &str) -> HarnessResult<()> {
        self.offerer.create_data_channel(label).await?;
        let offer = self.offerer.create_offer().await?;
        let answer = self.answerer.create_answer(&offer).await?;
        self.offerer.set_remote_description(&answer).await?;
        info!("Offer/answer exchanged");
        Ok(())
    }

    /// Forward candidates discovered since the last call
    pub async fn forward_candidates(&mut self) -> HarnessResult<()> {
        let from_offerer = self.offerer.ice_candidates();
        for candidate in from_offerer.into_iter().skip(self.forwarded_to_answerer) {
            self.answerer.add_remote_ice_candidate(candidate).await?;
            self.forwarded_to_answerer += 1;
        }

        let from_answerer = self.answerer.ice_candidates();
        for candidate in from_answerer.into_iter().skip(self.forwarded_to_offerer) {
            self.offerer.add_remote_ice_candidate(candidate).await?;
            self.forwarded_to_offerer += 1;
        }
        Ok(())
    }

    fn ready(&self) -> bool {
        self.offerer.connection_state() == ConnectionState::Connected
            && self.answerer.connection_state() == ConnectionState::Connected
            && self.offerer.data_channel_state() == DataChannelState::Open
            && self.answerer.data_channel_state() == DataChannelState::Open
    }

    /// Keep trickling candidates until both sides are connected with open channels
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> HarnessResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            self.forward_candidates().await?;
            if self.ready() {
                info!("Loopback pair connected");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(HarnessError::Timeout("connected state"));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    pub async fn next_message(&mut self, timeout: Duration) -> HarnessResult<ChannelMessage> {
        tokio::time::timeout(timeout, self.inbox.recv())
            .await
            .ok()
            .flatten()
            .ok_or(HarnessError::Timeout("inbound message"))
    }

    pub async fn close(&self) -> HarnessResult<()> {
        self.offerer.close().await?;
        self.answerer.close().await?;
        Ok(())
    }
}
