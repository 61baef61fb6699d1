//! The event loop.
//!
//! A single [`EventLoop`] owns the receiving side of every event channel.
//! On receipt it runs that event type's hooks in registration order. Inbound
//! raw messages are then handed to the [`MessageHandler`], after the hooks,
//! so hook side effects always see a message even if it is not a command.
//!
//! Each raw message is processed on its own task; auxiliary events run their
//! hooks inline on the loop in arrival order.
//!
//! ```rust,ignore
//! let (sender, receivers) = event_channels(64);
//! let event_loop = EventLoop::new(receivers, hooks, pipeline);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(event_loop.run(shutdown.clone()));
//!
//! sender.message(message).await?;
//! ```

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Level, debug, info, span};

use crate::framework::events::{EventHooks, EventReceivers, MessageHandler};

/// Drives hooks and the message handler from the event channels.
pub struct EventLoop {
    receivers: EventReceivers,
    hooks: Arc<EventHooks>,
    handler: Arc<dyn MessageHandler>,
    tasks: TaskTracker,
}

impl EventLoop {
    /// Creates a loop over the given receivers.
    pub fn new(
        receivers: EventReceivers,
        hooks: Arc<EventHooks>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            receivers,
            hooks,
            handler,
            tasks: TaskTracker::new(),
        }
    }

    /// Runs until `shutdown` is cancelled or every sender has been dropped.
    ///
    /// Message tasks still in flight are awaited before returning.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Event loop started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested, leaving event loop");
                    break;
                }

                Some(message) = self.receivers.message.recv() => {
                    let hooks = Arc::clone(&self.hooks);
                    let handler = Arc::clone(&self.handler);
                    let span = span!(
                        Level::DEBUG,
                        "message",
                        id = %message.id,
                        frontend = %message.frontend(),
                    );
                    let message = Arc::new(message);

                    self.tasks.spawn(
                        async move {
                            hooks.message.run_all(Arc::clone(&message)).await;
                            handler.handle(message).await;
                        }
                        .instrument(span),
                    );
                }

                Some(claim) = self.receivers.redeem_claim.recv() => {
                    debug!(redeem = %claim.id, "Redeem claimed");
                    self.hooks.redeem_claim.run_all(Arc::new(claim)).await;
                }

                Some(event) = self.receivers.stream_online.recv() => {
                    debug!(place = %event.here.id_exact(), "Stream online");
                    self.hooks.stream_online.run_all(Arc::new(event)).await;
                }

                Some(event) = self.receivers.stream_offline.recv() => {
                    debug!(place = %event.here.id_exact(), "Stream offline");
                    self.hooks.stream_offline.run_all(Arc::new(event)).await;
                }

                else => {
                    debug!("All event senders dropped");
                    break;
                }
            }
        }

        self.tasks.close();
        self.tasks.wait().await;
        info!("Event loop stopped");
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("hooks", &self.hooks)
            .field("in_flight", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::{SendError, UserError};
    use crate::foundation::message::{Message, Messenger, Personifier, Placer, Reply};
    use crate::framework::events::{StreamOnline, event_channels};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Someone;

    impl Personifier for Someone {
        fn frontend(&self) -> &str {
            "test"
        }
        fn id(&self) -> &str {
            "someone"
        }
    }

    struct Room;

    impl Placer for Room {
        fn frontend(&self) -> &str {
            "test"
        }
        fn id_exact(&self) -> &str {
            "room"
        }
    }

    struct Void;

    #[async_trait]
    impl Messenger for Void {
        async fn send(&self, _: &Reply, _: Option<&UserError>) -> Result<(), SendError> {
            Ok(())
        }
    }

    struct Recorder(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, message: Arc<Message>) {
            self.0.lock().push(format!("handler:{}", message.raw));
        }
    }

    fn message(raw: &str) -> Message {
        Message::new("1", raw, Arc::new(Someone), Arc::new(Room), Arc::new(Void))
    }

    #[tokio::test]
    async fn test_hooks_run_before_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = Arc::new(EventHooks::new());

        let hook_log = Arc::clone(&log);
        hooks
            .message
            .register_sync(move |m: &Message| hook_log.lock().push(format!("hook:{}", m.raw)));

        let (sender, receivers) = event_channels(4);
        let event_loop = EventLoop::new(receivers, hooks, Arc::new(Recorder(Arc::clone(&log))));
        let running = tokio::spawn(event_loop.run(CancellationToken::new()));

        sender.message(message("hello there")).await.unwrap();
        drop(sender);
        running.await.unwrap();

        assert_eq!(*log.lock(), vec!["hook:hello there", "handler:hello there"]);
    }

    #[tokio::test]
    async fn test_aux_events_run_their_hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hooks = Arc::new(EventHooks::new());

        let s = Arc::clone(&seen);
        hooks
            .stream_online
            .register_sync(move |e: &StreamOnline| s.lock().push(e.here.id_exact().to_string()));

        let (sender, receivers) = event_channels(4);
        let handler = Arc::new(Recorder(Arc::new(Mutex::new(Vec::new()))));
        let running = tokio::spawn(EventLoop::new(receivers, hooks, handler).run(CancellationToken::new()));

        sender
            .stream_online(StreamOnline {
                when: chrono::Utc::now(),
                here: Arc::new(Room),
            })
            .await
            .unwrap();
        drop(sender);
        running.await.unwrap();

        assert_eq!(*seen.lock(), vec!["room"]);
    }

    #[tokio::test]
    async fn test_shutdown_closes_senders() {
        let (sender, receivers) = event_channels(4);
        let handler = Arc::new(Recorder(Arc::new(Mutex::new(Vec::new()))));
        let shutdown = CancellationToken::new();
        let running = tokio::spawn(
            EventLoop::new(receivers, Arc::new(EventHooks::new()), handler).run(shutdown.clone()),
        );

        shutdown.cancel();
        running.await.unwrap();

        assert!(sender.message(message("late")).await.is_err());
    }
}
