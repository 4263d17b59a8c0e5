//! Loopback demo entry point
//!
//! Mounts an offering and an answering peer in one process and acts as their
//! signaling channel: the serialized offer and answer are handed across in
//! memory, and ICE candidates observed through each hook's polled state are
//! forwarded to the other side.
//!
//! # Usage
//!
//! ```bash
//! # Exchange three messages over loopback candidates
//! cargo run -p peerf-loopback
//!
//! # Use a browser-style RTCConfiguration file and a faster poll
//! cargo run -p peerf-loopback -- --config ./rtc.json --interval-ms 50 --messages 10
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use peerf_core::{
    ChannelMessage, ConnectionState, DataChannelState, FactorySource, HookOptions, PeerHook,
    RtcConfiguration,
};
use peerf_webrtc::WebRtcFactory;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// peerf loopback demo
///
/// Negotiates two WebRTC peers in one process and sends chat messages from
/// the offering peer to the answering peer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// STUN servers (comma-separated)
    #[arg(long, value_delimiter = ',', env = "PEERF_STUN_SERVERS")]
    stun_servers: Vec<String>,

    /// JSON RTCConfiguration file; overrides --stun-servers
    #[arg(long, env = "PEERF_RTC_CONFIG")]
    config: Option<PathBuf>,

    /// Data channel label
    #[arg(long, default_value = "chat")]
    label: String,

    /// Number of messages to send
    #[arg(long, default_value_t = 3)]
    messages: u32,

    /// Hook polling interval in milliseconds
    #[arg(
        long,
        default_value_t = 250,
        env = "PEERF_POLL_INTERVAL_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval_ms: u64,

    /// Seconds to wait for the connection
    #[arg(long, default_value_t = 20)]
    timeout_secs: u64,

    /// Gather loopback candidates
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    loopback_candidates: bool,
}

/// Payload exchanged over the data channel
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    seq: u32,
    text: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("peerf-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    init_tracing();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        label = %args.label,
        messages = args.messages,
        interval_ms = args.interval_ms,
        "peerf loopback starting"
    );

    tokio::select! {
        result = run(args) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl+C received, exiting");
            Ok(())
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let configuration = match &args.config {
        Some(path) => RtcConfiguration::from_json_file(path)?,
        None => RtcConfiguration::with_stun(args.stun_servers.iter().cloned()),
    };
    info!(ice_servers = configuration.ice_servers.len(), "Loaded RTC configuration");

    let factory = WebRtcFactory::builder()
        .loopback_candidates(args.loopback_candidates)
        .build()?;
    let source = FactorySource::from_factory(Arc::new(factory));
    let interval = Duration::from_millis(args.interval_ms);

    let (inbox_tx, mut inbox) = mpsc::unbounded_channel::<ChannelMessage>();

    let offerer: PeerHook<ChatMessage> = PeerHook::mount(
        &source,
        HookOptions::new(configuration.clone()).with_interval(interval),
    )
    .await?;
    let answerer: PeerHook<ChatMessage> = PeerHook::mount(
        &source,
        HookOptions::new(configuration)
            .with_interval(interval)
            .with_message_callback(move |msg| {
                let _ = inbox_tx.send(msg);
            }),
    )
    .await?;

    offerer.create_data_channel(&args.label).await?;
    let offer = offerer.create_offer().await?;
    info!(bytes = offer.len(), "Offer created");

    let answer = answerer.create_answer(&offer).await?;
    info!(bytes = answer.len(), "Answer created");
    offerer.set_remote_description(&answer).await?;

    let timeout = Duration::from_secs(args.timeout_secs);
    let outcome = match tokio::time::timeout(
        timeout,
        trickle_until_open(&offerer, &answerer, interval),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("no connection after {:?}", timeout)),
    };
    if let Err(e) = outcome {
        let (o, a) = (offerer.state(), answerer.state());
        offerer.unmount().await.ok();
        answerer.unmount().await.ok();
        bail!(
            "{} (offerer {}/{}, answerer {}/{})",
            e,
            o.connection_state,
            o.data_channel_state,
            a.connection_state,
            a.data_channel_state
        );
    }
    info!("Peers connected");

    for seq in 0..args.messages {
        let message = ChatMessage {
            seq,
            text: format!("hello #{}", seq),
        };
        offerer.send(&message).await?;
    }

    for _ in 0..args.messages {
        let msg = tokio::time::timeout(Duration::from_secs(5), inbox.recv())
            .await
            .context("timed out waiting for a message")?
            .context("message callback dropped")?;
        let chat: ChatMessage = msg.decode()?;
        info!(seq = chat.seq, text = %chat.text, "Answerer received message");
    }

    offerer.unmount().await?;
    answerer.unmount().await?;
    info!("Both peers closed");
    Ok(())
}

/// Forward candidates each poll until both sides report an open channel
async fn trickle_until_open(
    offerer: &PeerHook<ChatMessage>,
    answerer: &PeerHook<ChatMessage>,
    interval: Duration,
) -> anyhow::Result<()> {
    let mut to_answerer = 0;
    let mut to_offerer = 0;
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        let (offer_side, answer_side) = (offerer.state(), answerer.state());

        for candidate in offer_side.ice_candidates.iter().skip(to_answerer) {
            answerer.add_remote_ice_candidate(candidate.clone()).await?;
            to_answerer += 1;
        }
        for candidate in answer_side.ice_candidates.iter().skip(to_offerer) {
            offerer.add_remote_ice_candidate(candidate.clone()).await?;
            to_offerer += 1;
        }

        if offer_side.connection_state.is_terminal() || answer_side.connection_state.is_terminal() {
            bail!(
                "negotiation ended early (offerer {}, answerer {})",
                offer_side.connection_state,
                answer_side.connection_state
            );
        }

        if offer_side.connection_state == ConnectionState::Connected
            && answer_side.connection_state == ConnectionState::Connected
            && offer_side.data_channel_state == DataChannelState::Open
        {
            info!(
                forwarded_to_answerer = to_answerer,
                forwarded_to_offerer = to_offerer,
                "Candidate exchange complete"
            );
            return Ok(());
        }
    }
}

fn init_tracing() {
    // RUST_LOG overrides the default filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,webrtc=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
