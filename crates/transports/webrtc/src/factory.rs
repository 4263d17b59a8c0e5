//! Native capability provider
//!
//! [`WebRtcFactory`] owns one webrtc-rs `API` (default codecs and
//! interceptors) and hands out peer connections built from it.

use async_trait::async_trait;
use peerf_core::{Error, PeerConnection, PeerFactory, Result, RtcConfiguration, SessionDescription};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::interceptor::registry::Registry;

use crate::adapters;
use crate::peer::WebRtcPeerConnection;

/// Builder for [`WebRtcFactory`]
#[derive(Debug, Clone, Default)]
pub struct WebRtcFactoryBuilder {
    include_loopback_candidates: bool,
}

impl WebRtcFactoryBuilder {
    /// Gather candidates on loopback interfaces
    ///
    /// Needed when both peers run on one host without a routable interface.
    pub fn loopback_candidates(mut self, include: bool) -> Self {
        self.include_loopback_candidates = include;
        self
    }

    pub fn build(self) -> Result<WebRtcFactory> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::platform("Failed to register codecs", e))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| Error::platform("Failed to register interceptors", e))?;

        let mut setting_engine = SettingEngine::default();
        setting_engine.set_include_loopback_candidate(self.include_loopback_candidates);

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .with_setting_engine(setting_engine)
            .build();

        Ok(WebRtcFactory { api: Arc::new(api) })
    }
}

/// Capability provider backed by webrtc-rs
#[derive(Clone)]
pub struct WebRtcFactory {
    api: Arc<API>,
}

impl WebRtcFactory {
    /// Factory with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> WebRtcFactoryBuilder {
        WebRtcFactoryBuilder::default()
    }
}

#[async_trait]
impl PeerFactory for WebRtcFactory {
    fn name(&self) -> &str {
        "webrtc-rs"
    }

    async fn create_peer_connection(
        &self,
        configuration: &RtcConfiguration,
    ) -> Result<Arc<dyn PeerConnection>> {
        let pc = self
            .api
            .new_peer_connection(adapters::configuration_to_rtc(configuration))
            .await
            .map_err(|e| Error::platform("Failed to create peer connection", e))?;

        let id = Uuid::new_v4().simple().to_string()[..8].to_string();
        Ok(Arc::new(WebRtcPeerConnection::new(id, pc)))
    }

    fn create_session_description(&self, init: SessionDescription) -> Result<SessionDescription> {
        let parsed = adapters::description_to_rtc(init)?;
        debug!("Validated {} description", parsed.sdp_type);
        adapters::description_from_rtc(&parsed)
    }
}
