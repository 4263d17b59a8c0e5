//! Native WebRTC backend for peerf
//!
//! Implements the peerf-core capability provider on top of webrtc-rs and
//! exposes ready-wired entry points for native applications.
//!
//! # Usage
//!
//! ```ignore
//! use peerf_core::{HookOptions, RtcConfiguration};
//!
//! // Offering side
//! let offerer = peerf_webrtc::use_peer::<String>(HookOptions::new(config.clone())).await?;
//! offerer.create_data_channel("chat").await?;
//! let offer = offerer.create_offer().await?;
//!
//! // Answering side
//! let answerer = peerf_webrtc::use_peer::<String>(
//!     HookOptions::new(config).with_message_callback(|msg| println!("{:?}", msg.as_text())),
//! )
//! .await?;
//! let answer = answerer.create_answer(&offer).await?;
//! offerer.set_remote_description(&answer).await?;
//! ```

pub mod adapters;
pub mod channels;
pub mod factory;
pub mod peer;

pub use channels::WebRtcDataChannel;
pub use factory::{WebRtcFactory, WebRtcFactoryBuilder};
pub use peer::WebRtcPeerConnection;

use peerf_core::{
    FactorySource, HookOptions, MessageCallback, Peer, PeerFactory, PeerHook, Result,
    RtcConfiguration,
};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::warn;

static DEFAULT_FACTORY: OnceLock<Option<Arc<WebRtcFactory>>> = OnceLock::new();

/// Process-wide default provider, built on first use
fn default_factory() -> Option<Arc<WebRtcFactory>> {
    DEFAULT_FACTORY
        .get_or_init(|| match WebRtcFactory::new() {
            Ok(factory) => Some(Arc::new(factory)),
            Err(e) => {
                warn!("WebRTC factory unavailable: {}", e);
                None
            }
        })
        .clone()
}

/// Factory source for native applications
pub fn factory_source() -> FactorySource {
    FactorySource::Static(default_factory().map(|factory| factory as Arc<dyn PeerFactory>))
}

/// Build a peer on the default native provider
pub async fn new_peer<T: Serialize>(
    configuration: &RtcConfiguration,
    message_callback: Option<MessageCallback>,
) -> Result<Peer<T>> {
    Peer::from_source(configuration, &factory_source(), message_callback).await
}

/// Mount a polled peer hook on the default native provider
pub async fn use_peer<T>(options: HookOptions) -> Result<PeerHook<T>>
where
    T: Serialize + Send + Sync + 'static,
{
    PeerHook::mount(&factory_source(), options).await
}
