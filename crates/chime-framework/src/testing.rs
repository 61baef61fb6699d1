//! Frontend doubles shared by the unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use chime_core::{Message, Messenger, Personifier, Placer, Reply, SendError, UserError};
use parking_lot::Mutex;

pub(crate) struct TestUser {
    pub id: String,
    pub admin: bool,
}

impl Personifier for TestUser {
    fn frontend(&self) -> &str {
        "test"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn is_bot_admin(&self) -> bool {
        self.admin
    }
}

pub(crate) struct TestPlace {
    pub exact: String,
    pub logical: String,
}

impl Placer for TestPlace {
    fn frontend(&self) -> &str {
        "test"
    }

    fn id_exact(&self) -> &str {
        &self.exact
    }

    fn id_logical(&self) -> &str {
        &self.logical
    }
}

/// Records everything sent through it.
#[derive(Default)]
pub(crate) struct Outbox {
    pub sent: Mutex<Vec<(Reply, Option<UserError>)>>,
}

impl Outbox {
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(r, _)| r.to_string()).collect()
    }
}

#[async_trait]
impl Messenger for Outbox {
    async fn send(&self, reply: &Reply, urr: Option<&UserError>) -> Result<(), SendError> {
        self.sent.lock().push((reply.clone(), urr.cloned()));
        Ok(())
    }
}

pub(crate) fn message(raw: &str) -> (Message, Arc<Outbox>) {
    message_from("someone", raw)
}

pub(crate) fn message_from(author: &str, raw: &str) -> (Message, Arc<Outbox>) {
    build(author, false, "room", raw)
}

pub(crate) fn build(author: &str, admin: bool, place: &str, raw: &str) -> (Message, Arc<Outbox>) {
    let outbox = Arc::new(Outbox::default());
    let message = Message::new(
        "1",
        raw,
        Arc::new(TestUser {
            id: author.to_string(),
            admin,
        }),
        Arc::new(TestPlace {
            exact: place.to_string(),
            logical: place.to_string(),
        }),
        outbox.clone(),
    );
    (message, outbox)
}
