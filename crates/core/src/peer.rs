//! Connection state shim
//!
//! [`Peer`] wraps one platform peer connection. It mirrors the connection
//! and data channel lifecycle from platform events, collects locally
//! discovered ICE candidates, and turns session descriptions into the opaque
//! strings an application moves over its own signaling channel.
//!
//! A peer constructed with a message callback is the answering side: it
//! adopts the data channel announced by the remote peer. A peer without one
//! is the offering side and creates the channel itself.
//!
//! ```ignore
//! let offerer: Peer<Chat> = Peer::new(&config, factory.clone(), None).await?;
//! offerer.create_data_channel("chat").await?;
//! let offer = offerer.create_offer().await?;
//!
//! let answerer: Peer<Chat> = Peer::new(&config, factory, Some(on_message)).await?;
//! let answer = answerer.create_answer(&offer).await?;
//! offerer.set_remote_description(&answer).await?;
//! ```

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::RtcConfiguration;
use crate::platform::{
    ChannelMessage, DataChannel, IceCandidate, PeerConnection, PeerFactory, SessionDescription,
};
use crate::provider::FactorySource;
use crate::state::{ConnectionState, DataChannelState, PeerSnapshot};
use crate::{Error, Result};

/// Callback receiving inbound data channel messages
pub type MessageCallback = Arc<dyn Fn(ChannelMessage) + Send + Sync>;

/// Which half of the negotiation this peer performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    /// Creates the data channel and the offer
    Offerer,
    /// Answers an offer and adopts the remote data channel
    Answerer,
}

/// State shared with platform event handlers
struct Shared {
    state: RwLock<PeerSnapshot>,
    channel: Mutex<Option<Arc<dyn DataChannel>>>,
    /// Bumped whenever the channel reference is replaced
    channel_generation: AtomicU64,
    closed: AtomicBool,
    updates: watch::Sender<PeerSnapshot>,
}

impl Shared {
    fn new(initial: PeerSnapshot) -> Self {
        let (updates, _) = watch::channel(initial.clone());
        Self {
            state: RwLock::new(initial),
            channel: Mutex::new(None),
            channel_generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            updates,
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Apply a mutation and publish the resulting snapshot
    fn update(&self, mutate: impl FnOnce(&mut PeerSnapshot)) {
        let mut state = self.state.write();
        mutate(&mut state);
        self.updates.send_replace(state.clone());
    }

    fn snapshot(&self) -> PeerSnapshot {
        self.state.read().clone()
    }

    fn observe_connection_state(&self, connection_state: ConnectionState) {
        if self.is_closed() {
            return;
        }
        debug!(state = %connection_state, "Peer connection state changed");
        self.update(|s| s.connection_state = connection_state);
    }

    fn observe_candidate(&self, candidate: Option<IceCandidate>) {
        match candidate {
            Some(candidate) => {
                if self.is_closed() {
                    return;
                }
                debug!(candidate = %candidate.candidate, "Discovered local ICE candidate");
                self.update(|s| s.ice_candidates.push(candidate));
            }
            None => debug!("ICE candidate gathering complete"),
        }
    }

    fn observe_channel_state(&self, generation: u64, label: &str, channel_state: DataChannelState) {
        if self.is_closed() {
            return;
        }
        if self.channel_generation.load(Ordering::SeqCst) != generation {
            debug!(label, "Ignoring event from replaced data channel");
            return;
        }
        debug!(label, state = %channel_state, "Data channel state changed");
        self.update(|s| s.data_channel_state = channel_state);
    }

    /// Make `channel` the tracked channel and wire its events
    ///
    /// Returns the channel it replaced, if any.
    fn adopt_channel(
        self: &Arc<Self>,
        channel: Arc<dyn DataChannel>,
        initial_state: Option<DataChannelState>,
        callback: Option<MessageCallback>,
    ) -> Option<Arc<dyn DataChannel>> {
        let generation = self.channel_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(channel_state) = initial_state {
            self.update(|s| s.data_channel_state = channel_state);
        }
        let previous = self.channel.lock().replace(Arc::clone(&channel));

        let label = channel.label();
        let weak: Weak<Self> = Arc::downgrade(self);

        channel.on_open(Box::new({
            let weak = weak.clone();
            let label = label.clone();
            move || {
                if let Some(shared) = weak.upgrade() {
                    shared.observe_channel_state(generation, &label, DataChannelState::Open);
                }
            }
        }));

        channel.on_close(Box::new({
            let label = label.clone();
            move || {
                if let Some(shared) = weak.upgrade() {
                    shared.observe_channel_state(generation, &label, DataChannelState::Closed);
                }
            }
        }));

        if let Some(callback) = callback {
            channel.on_message(Box::new(move |msg| callback(msg)));
        }

        previous
    }
}

/// Typed facade over one platform peer connection
///
/// `T` is the type of values passed to [`Peer::send`]; they travel as JSON
/// text over the data channel.
pub struct Peer<T> {
    factory: Arc<dyn PeerFactory>,
    connection: Arc<dyn PeerConnection>,
    role: PeerRole,
    shared: Arc<Shared>,
    _data: PhantomData<fn(&T)>,
}

impl<T: Serialize> Peer<T> {
    /// Build a peer on the given capability provider
    ///
    /// Supplying `message_callback` makes this the answering peer.
    pub async fn new(
        configuration: &RtcConfiguration,
        factory: Arc<dyn PeerFactory>,
        message_callback: Option<MessageCallback>,
    ) -> Result<Self> {
        let role = if message_callback.is_some() {
            PeerRole::Answerer
        } else {
            PeerRole::Offerer
        };

        let connection = factory.create_peer_connection(configuration).await?;

        // The answering side has no channel until the remote peer announces one.
        let initial = PeerSnapshot {
            data_channel_state: match role {
                PeerRole::Offerer => DataChannelState::Create,
                PeerRole::Answerer => DataChannelState::Closed,
            },
            ..Default::default()
        };
        let shared = Arc::new(Shared::new(initial));

        let weak = Arc::downgrade(&shared);
        connection.on_connection_state_change(Box::new(move |connection_state| {
            if let Some(shared) = weak.upgrade() {
                shared.observe_connection_state(connection_state);
            }
        }));

        let weak = Arc::downgrade(&shared);
        connection.on_ice_candidate(Box::new(move |candidate| {
            if let Some(shared) = weak.upgrade() {
                shared.observe_candidate(candidate);
            }
        }));

        if let Some(callback) = message_callback {
            let weak = Arc::downgrade(&shared);
            connection.on_data_channel(Box::new(move |channel| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if shared.is_closed() {
                    return;
                }
                info!(label = %channel.label(), "Adopting remote data channel");
                if let Some(previous) = shared.adopt_channel(channel, None, Some(Arc::clone(&callback))) {
                    close_detached(previous);
                }
            }));
        }

        info!(factory = factory.name(), role = ?role, "Created peer");

        Ok(Self {
            factory,
            connection,
            role,
            shared,
            _data: PhantomData,
        })
    }

    /// Build a peer after resolving the provider from `source`
    ///
    /// Fails with `Unavailable` before anything is constructed when the
    /// source has no provider.
    pub async fn from_source(
        configuration: &RtcConfiguration,
        source: &FactorySource,
        message_callback: Option<MessageCallback>,
    ) -> Result<Self> {
        let factory = source.resolve()?;
        Self::new(configuration, factory, message_callback).await
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state.read().connection_state
    }

    pub fn data_channel_state(&self) -> DataChannelState {
        self.shared.state.read().data_channel_state
    }

    /// Candidates discovered so far, in discovery order
    ///
    /// The returned vector is a copy.
    pub fn ice_candidates(&self) -> Vec<IceCandidate> {
        self.shared.state.read().ice_candidates.clone()
    }

    pub fn snapshot(&self) -> PeerSnapshot {
        self.shared.snapshot()
    }

    /// Receiver notified on every tracked state change
    pub fn subscribe(&self) -> watch::Receiver<PeerSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Create the local data channel (offering peer only)
    ///
    /// An existing channel is closed and replaced.
    pub async fn create_data_channel(&self, label: &str) -> Result<()> {
        if self.role == PeerRole::Answerer {
            return Err(Error::WrongRole(
                "the answering peer adopts the remote data channel",
            ));
        }

        let channel = self.connection.create_data_channel(label).await?;
        info!(label, "Created data channel");

        if let Some(previous) =
            self.shared
                .adopt_channel(channel, Some(DataChannelState::Create), None)
        {
            debug!(label = %previous.label(), "Closing replaced data channel");
            if let Err(e) = previous.close().await {
                warn!("Failed to close replaced data channel: {}", e);
            }
        }

        Ok(())
    }

    /// Create an offer, commit it locally and return it serialized
    pub async fn create_offer(&self) -> Result<String> {
        let offer = self.connection.create_offer().await?;
        self.connection.set_local_description(offer.clone()).await?;
        debug!("Local offer committed");
        offer.to_signal()
    }

    /// Commit a serialized answer as the remote description
    pub async fn set_remote_description(&self, answer: &str) -> Result<()> {
        if answer.is_empty() {
            return Err(Error::InvalidArgument("answer not provided".to_string()));
        }
        let description = SessionDescription::from_signal(answer)?;
        let description = self.factory.create_session_description(description)?;
        self.connection.set_remote_description(description).await?;
        debug!("Remote description committed");
        Ok(())
    }

    /// Accept a serialized offer and return the serialized answer
    ///
    /// Commits the offer as remote description, then creates and commits the
    /// local answer.
    pub async fn create_answer(&self, offer: &str) -> Result<String> {
        let description = SessionDescription::from_signal(offer)?;
        let description = self.factory.create_session_description(description)?;
        self.connection.set_remote_description(description).await?;

        let answer = self.connection.create_answer().await?;
        self.connection.set_local_description(answer.clone()).await?;
        debug!("Local answer committed");
        answer.to_signal()
    }

    /// Hand a candidate received from the remote peer to the platform
    pub async fn add_remote_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.connection.add_ice_candidate(candidate).await
    }

    /// Serialize `data` as JSON and send it over the data channel
    ///
    /// Checks the locally tracked channel state, which can lag the platform.
    pub async fn send(&self, data: &T) -> Result<()> {
        let channel = self.shared.channel.lock().clone();
        let open = self.data_channel_state() == DataChannelState::Open;

        match channel {
            Some(channel) if open => {
                let payload = serde_json::to_string(data)?;
                channel.send_text(payload).await
            }
            _ => Err(Error::ChannelNotOpen),
        }
    }

    /// Close the channel and the connection
    ///
    /// Both tracked states become `closed` immediately. Repeated calls are
    /// no-ops.
    pub async fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            debug!("Peer already closed");
            return Ok(());
        }

        self.shared.update(|s| {
            s.connection_state = ConnectionState::Closed;
            s.data_channel_state = DataChannelState::Closed;
        });

        let channel = self.shared.channel.lock().clone();
        let mut result = Ok(());
        if let Some(channel) = channel {
            result = channel.close().await;
        }
        if let Err(e) = self.connection.close().await {
            if result.is_ok() {
                result = Err(e);
            }
        }

        info!("Peer closed");
        result
    }
}

impl<T> std::fmt::Debug for Peer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("factory", &self.factory.name())
            .field("role", &self.role)
            .field("state", &*self.shared.state.read())
            .finish()
    }
}

/// Close a channel from a synchronous event handler
fn close_detached(channel: Arc<dyn DataChannel>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = channel.close().await {
                    warn!("Failed to close replaced data channel: {}", e);
                }
            });
        }
        Err(_) => warn!(
            label = %channel.label(),
            "No runtime available to close replaced data channel"
        ),
    }
}
