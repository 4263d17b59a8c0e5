//! Polled peer handle for UI layers
//!
//! [`PeerHook`] decouples a consumer's render cycle from platform event
//! cadence: it copies the shim's state into its own [`PeerSnapshot`] once per
//! polling interval and publishes that copy through a `watch` channel. What a
//! consumer reads may therefore be up to one interval stale. A framework
//! adapter turns `watch()` into whatever reactive primitive it uses.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::RtcConfiguration;
use crate::peer::{MessageCallback, Peer};
use crate::platform::{ChannelMessage, IceCandidate};
use crate::provider::FactorySource;
use crate::state::PeerSnapshot;
use crate::{Error, Result};

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Options for [`PeerHook::mount`]
#[derive(Clone)]
pub struct HookOptions {
    /// Peer-connection configuration (ICE servers etc.)
    pub configuration: RtcConfiguration,
    /// Inbound message callback; makes the peer the answering side
    pub message_callback: Option<MessageCallback>,
    /// How often state is copied out of the peer
    pub interval: Duration,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            configuration: RtcConfiguration::default(),
            message_callback: None,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl HookOptions {
    pub fn new(configuration: RtcConfiguration) -> Self {
        Self {
            configuration,
            ..Default::default()
        }
    }

    pub fn with_message_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ChannelMessage) + Send + Sync + 'static,
    {
        self.message_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl std::fmt::Debug for HookOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookOptions")
            .field("configuration", &self.configuration)
            .field("message_callback", &self.message_callback.is_some())
            .field("interval", &self.interval)
            .finish()
    }
}

type PeerSlot<T> = Arc<RwLock<Option<Arc<Peer<T>>>>>;

/// A mounted peer with polled state and stable action handles
pub struct PeerHook<T> {
    peer: PeerSlot<T>,
    state: watch::Receiver<PeerSnapshot>,
    poller: JoinHandle<()>,
    interval: Duration,
}

impl<T> PeerHook<T>
where
    T: Serialize + Send + Sync + 'static,
{
    /// Resolve the provider, build the peer and start polling
    ///
    /// Fails fast with `Unavailable` when `source` has no provider; no peer
    /// is constructed in that case. A zero polling interval is rejected with
    /// `InvalidArgument`. Must be called inside a tokio runtime.
    pub async fn mount(source: &FactorySource, options: HookOptions) -> Result<Self> {
        let factory = source.resolve()?;
        if options.interval.is_zero() {
            return Err(Error::InvalidArgument(
                "polling interval must be non-zero".to_string(),
            ));
        }
        let peer = Peer::new(&options.configuration, factory, options.message_callback).await?;
        let peer: PeerSlot<T> = Arc::new(RwLock::new(Some(Arc::new(peer))));

        let (state_tx, state) = watch::channel(PeerSnapshot::default());
        let poller = tokio::spawn(poll_peer(Arc::clone(&peer), state_tx, options.interval));

        info!(interval_ms = options.interval.as_millis() as u64, "Mounted peer hook");

        Ok(Self {
            peer,
            state,
            poller,
            interval: options.interval,
        })
    }

    fn peer(&self) -> Result<Arc<Peer<T>>> {
        self.peer.read().clone().ok_or(Error::NotInitialized)
    }

    /// Last polled state
    pub fn state(&self) -> PeerSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified when a poll observes a change
    pub fn watch(&self) -> watch::Receiver<PeerSnapshot> {
        self.state.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_mounted(&self) -> bool {
        self.peer.read().is_some()
    }

    pub async fn create_data_channel(&self, label: &str) -> Result<()> {
        self.peer()?.create_data_channel(label).await
    }

    pub async fn create_offer(&self) -> Result<String> {
        self.peer()?.create_offer().await
    }

    pub async fn set_remote_description(&self, answer: &str) -> Result<()> {
        self.peer()?.set_remote_description(answer).await
    }

    pub async fn send(&self, data: &T) -> Result<()> {
        self.peer()?.send(data).await
    }

    pub async fn create_answer(&self, offer: &str) -> Result<String> {
        self.peer()?.create_answer(offer).await
    }

    pub async fn add_remote_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.peer()?.add_remote_ice_candidate(candidate).await
    }

    /// Stop polling and close the peer
    ///
    /// Actions called afterwards fail with `NotInitialized`.
    pub async fn unmount(&self) -> Result<()> {
        self.poller.abort();
        let peer = self.peer.write().take();
        match peer {
            Some(peer) => {
                info!("Unmounting peer hook");
                peer.close().await
            }
            None => Ok(()),
        }
    }
}

impl<T> Drop for PeerHook<T> {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

/// Copy peer state into the hook once per interval
async fn poll_peer<T>(
    peer: PeerSlot<T>,
    state_tx: watch::Sender<PeerSnapshot>,
    interval: Duration,
) where
    T: Serialize + Send + Sync + 'static,
{
    // First copy happens one full interval after mount.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let current = peer.read().clone();
        let Some(current) = current else {
            debug!("Peer unmounted, stopping poll");
            return;
        };

        let snapshot = current.snapshot();
        state_tx.send_if_modified(|state| {
            if *state == snapshot {
                false
            } else {
                *state = snapshot;
                true
            }
        });
    }
}
