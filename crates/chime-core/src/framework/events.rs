//! Event types and the channels frontends push them through.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::foundation::message::{Message, Personifier, Placer};
use crate::framework::hooks::Hooks;

/// A channel-points style redemption was claimed.
#[derive(Clone)]
pub struct RedeemClaim {
    /// Identifier of the redeemable.
    pub id: String,
    /// Text the viewer entered, if any.
    pub input: String,
    /// When the claim happened.
    pub when: DateTime<Utc>,
    /// Who claimed it.
    pub author: Arc<dyn Personifier>,
    /// Where it was claimed.
    pub here: Arc<dyn Placer>,
}

impl fmt::Debug for RedeemClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedeemClaim")
            .field("id", &self.id)
            .field("input", &self.input)
            .field("when", &self.when)
            .field("author", &self.author.id())
            .field("here", &self.here.id_exact())
            .finish()
    }
}

/// A stream went live.
#[derive(Clone)]
pub struct StreamOnline {
    /// When the stream went live.
    pub when: DateTime<Utc>,
    /// The channel that went live.
    pub here: Arc<dyn Placer>,
}

/// A stream ended.
#[derive(Clone)]
pub struct StreamOffline {
    /// When the stream ended.
    pub when: DateTime<Utc>,
    /// The channel that went offline.
    pub here: Arc<dyn Placer>,
}

impl fmt::Debug for StreamOnline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOnline")
            .field("when", &self.when)
            .field("here", &self.here.id_exact())
            .finish()
    }
}

impl fmt::Debug for StreamOffline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOffline")
            .field("when", &self.when)
            .field("here", &self.here.id_exact())
            .finish()
    }
}

/// Hook lists for every event type.
#[derive(Debug, Default)]
pub struct EventHooks {
    /// Run for every inbound raw message, before command dispatch.
    pub message: Hooks<Message>,
    /// Run for every redemption claim.
    pub redeem_claim: Hooks<RedeemClaim>,
    /// Run when a stream goes live.
    pub stream_online: Hooks<StreamOnline>,
    /// Run when a stream ends.
    pub stream_offline: Hooks<StreamOffline>,
}

impl EventHooks {
    /// Creates empty hook lists.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Receives inbound messages once their hooks have run.
///
/// The command pipeline implements this; tests can plug in anything else.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes a single message.
    async fn handle(&self, message: Arc<Message>);
}

/// Returned when pushing into an event loop that has shut down.
#[derive(Debug, Clone, Copy, Error)]
#[error("event loop is closed")]
pub struct EventLoopClosed;

/// Cloneable handle frontends use to push events into the loop.
#[derive(Clone, Debug)]
pub struct EventSender {
    pub(crate) message: mpsc::Sender<Message>,
    pub(crate) redeem_claim: mpsc::Sender<RedeemClaim>,
    pub(crate) stream_online: mpsc::Sender<StreamOnline>,
    pub(crate) stream_offline: mpsc::Sender<StreamOffline>,
}

impl EventSender {
    /// Pushes an inbound raw message.
    pub async fn message(&self, message: Message) -> Result<(), EventLoopClosed> {
        self.message.send(message).await.map_err(|_| EventLoopClosed)
    }

    /// Pushes a redemption claim.
    pub async fn redeem_claim(&self, claim: RedeemClaim) -> Result<(), EventLoopClosed> {
        self.redeem_claim
            .send(claim)
            .await
            .map_err(|_| EventLoopClosed)
    }

    /// Pushes a stream-online notification.
    pub async fn stream_online(&self, event: StreamOnline) -> Result<(), EventLoopClosed> {
        self.stream_online
            .send(event)
            .await
            .map_err(|_| EventLoopClosed)
    }

    /// Pushes a stream-offline notification.
    pub async fn stream_offline(&self, event: StreamOffline) -> Result<(), EventLoopClosed> {
        self.stream_offline
            .send(event)
            .await
            .map_err(|_| EventLoopClosed)
    }
}

/// Receiving halves owned by the event loop.
#[derive(Debug)]
pub struct EventReceivers {
    pub(crate) message: mpsc::Receiver<Message>,
    pub(crate) redeem_claim: mpsc::Receiver<RedeemClaim>,
    pub(crate) stream_online: mpsc::Receiver<StreamOnline>,
    pub(crate) stream_offline: mpsc::Receiver<StreamOffline>,
}

/// Creates the event channels, each with the given capacity.
pub fn event_channels(buffer: usize) -> (EventSender, EventReceivers) {
    let (message_tx, message_rx) = mpsc::channel(buffer);
    let (redeem_tx, redeem_rx) = mpsc::channel(buffer);
    let (online_tx, online_rx) = mpsc::channel(buffer);
    let (offline_tx, offline_rx) = mpsc::channel(buffer);

    let sender = EventSender {
        message: message_tx,
        redeem_claim: redeem_tx,
        stream_online: online_tx,
        stream_offline: offline_tx,
    };

    let receivers = EventReceivers {
        message: message_rx,
        redeem_claim: redeem_rx,
        stream_online: online_rx,
        stream_offline: offline_rx,
    };

    (sender, receivers)
}
