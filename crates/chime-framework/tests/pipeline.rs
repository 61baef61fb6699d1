//! End-to-end behavior of the pipeline with the builtin commands.

use std::sync::Arc;

use chime_core::{
    CancellationToken, CommandType, EventHooks, EventLoop, IdentityResolver, MemoryStore, Message,
    Messenger, Personifier, Placer, Reply, SendError, UserError, async_trait, event_channels,
};
use chime_framework::{
    Command, CommandTree, Dispatch, FAILURE_NOTICE, Operators, Outcome, Pipeline, PrefixDefaults,
    PrefixRegistry, Services, builtin,
};
use parking_lot::Mutex;

struct User {
    id: String,
}

impl Personifier for User {
    fn frontend(&self) -> &str {
        "test"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

struct Room {
    id: String,
}

impl Placer for Room {
    fn frontend(&self) -> &str {
        "test"
    }

    fn id_exact(&self) -> &str {
        &self.id
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(Reply, Option<UserError>)>>,
}

impl Outbox {
    fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(r, _)| r.to_string()).collect()
    }

    fn last(&self) -> Option<(String, Option<UserError>)> {
        self.sent
            .lock()
            .last()
            .map(|(r, urr)| (r.to_string(), urr.clone()))
    }
}

#[async_trait]
impl Messenger for Outbox {
    async fn send(&self, reply: &Reply, urr: Option<&UserError>) -> Result<(), SendError> {
        self.sent.lock().push((reply.clone(), urr.cloned()));
        Ok(())
    }
}

struct Bot {
    pipeline: Pipeline,
    outbox: Arc<Outbox>,
}

impl Bot {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let mut builder = CommandTree::builder();
        builtin::register(&mut builder);
        builder.register(
            CommandType::Normal,
            Command::with_names(["ping", "p"])
                .description("Check that the bot is alive.")
                .action(|_| async { Ok(Outcome::text("pong")) }),
        );

        let services = Services::new(
            builder.build().unwrap(),
            IdentityResolver::new(store.clone()),
            PrefixRegistry::new(store, PrefixDefaults::default()),
            Operators::new().with("test", "op"),
        );

        Self {
            pipeline: Pipeline::new(Arc::new(services)),
            outbox: Arc::new(Outbox::default()),
        }
    }

    fn message(&self, author: &str, room: &str, raw: &str) -> Message {
        Message::new(
            "1",
            raw,
            Arc::new(User { id: author.into() }),
            Arc::new(Room { id: room.into() }),
            self.outbox.clone(),
        )
    }

    async fn send_as(&self, author: &str, room: &str, raw: &str) -> Dispatch {
        self.pipeline
            .run(Arc::new(self.message(author, room, raw)))
            .await
    }

    async fn send(&self, raw: &str) -> Dispatch {
        self.send_as("someone", "room", raw).await
    }

    fn reply(&self) -> String {
        self.outbox.last().map(|(text, _)| text).unwrap_or_default()
    }
}

#[tokio::test]
async fn test_prefix_lifecycle() {
    let bot = Bot::new();

    bot.send("!prefix add ?").await;
    assert_eq!(bot.reply(), "Added prefix ?");

    bot.send("?ping").await;
    assert_eq!(bot.reply(), "pong");
    bot.send("!p").await;
    assert_eq!(bot.reply(), "pong");

    bot.send("!prefix list").await;
    assert_eq!(bot.reply(), "Prefixes: ! ?");

    bot.send("!prefix delete !").await;
    assert_eq!(bot.reply(), "Deleted prefix !");
    assert_eq!(bot.send("!ping").await, Dispatch::NotCommand);

    let dispatch = bot.send("?prefix rm ?").await;
    assert!(matches!(dispatch, Dispatch::Replied { urr: Some(_) }));
    assert_eq!(
        bot.reply(),
        "Can't delete, ? is the only prefix left. \
         If you wish to reset to the default prefixes run: ?prefix reset"
    );

    bot.send("?prefix reset").await;
    assert_eq!(
        bot.reply(),
        "Prefixes have been reset. \
         To view the list of the currently available prefixes run: !prefix list"
    );
    bot.send("!ping").await;
    assert_eq!(bot.reply(), "pong");
    assert_eq!(bot.send("?ping").await, Dispatch::NotCommand);
}

#[tokio::test]
async fn test_prefix_errors_are_user_errors() {
    let bot = Bot::new();

    bot.send("!prefix add $").await;
    assert_eq!(
        bot.outbox.last(),
        Some((
            "Prefix $ already exists.".to_string(),
            Some(UserError::new("prefix exists already"))
        ))
    );

    bot.send("!prefix delete ?").await;
    assert_eq!(
        bot.outbox.last(),
        Some(("Prefix ? doesn't exist.".to_string(), Some(UserError::NOT_FOUND)))
    );

    bot.send("!prefix add").await;
    assert_eq!(
        bot.outbox.last(),
        Some((
            "Usage: !prefix add <prefix>".to_string(),
            Some(UserError::MISSING_ARGS)
        ))
    );

    bot.send("!prefix").await;
    assert_eq!(bot.reply(), "Usage: !prefix (add | delete | list | reset)");
}

#[tokio::test]
async fn test_prefixes_are_per_place() {
    let bot = Bot::new();

    bot.send_as("someone", "kitchen", "!prefix add ?").await;
    bot.send_as("someone", "kitchen", "?ping").await;
    assert_eq!(bot.reply(), "pong");

    assert_eq!(
        bot.send_as("someone", "garden", "?ping").await,
        Dispatch::NotCommand
    );
}

#[tokio::test]
async fn test_advanced_prefix_management() {
    let bot = Bot::new();

    bot.send("$prefix advanced add %%").await;
    assert_eq!(bot.reply(), "Added prefix %%");

    bot.send("%%search alive").await;
    assert_eq!(bot.outbox.last().map(|(_, urr)| urr), Some(Some(UserError::NOT_FOUND)));

    bot.send("%%prefix normal list").await;
    assert_eq!(bot.reply(), "Prefixes: !");
    bot.send("$prefix advanced list").await;
    assert_eq!(bot.reply(), "Prefixes: %% $");

    bot.send("$prefix advanced delete $").await;
    assert_eq!(bot.reply(), "Deleted prefix $");
    assert_eq!(bot.send("$prefix reset").await, Dispatch::NotCommand);
}

#[tokio::test]
async fn test_help() {
    let bot = Bot::new();

    bot.send("!help p").await;
    assert_eq!(bot.reply(), "Usage: !p. Check that the bot is alive. Aliases: ping.");

    bot.send("!help prefix RM").await;
    assert_eq!(
        bot.reply(),
        "Usage: !prefix RM <prefix>. Delete a prefix. Aliases: delete, del, remove."
    );

    bot.send("!help teleport").await;
    assert_eq!(
        bot.outbox.last(),
        Some(("Command could not be found.".to_string(), Some(UserError::NOT_FOUND)))
    );

    bot.send("!help").await;
    assert_eq!(bot.reply(), "Usage: !help <command...>");
}

#[tokio::test]
async fn test_help_follows_invoking_type() {
    let bot = Bot::new();

    bot.send("$help prefix normal add").await;
    assert_eq!(
        bot.reply(),
        "Usage: $prefix normal add <prefix>. Add a prefix. Aliases: new, create."
    );

    bot.send("$help ping").await;
    assert_eq!(
        bot.outbox.last(),
        Some(("Command could not be found.".to_string(), Some(UserError::NOT_FOUND)))
    );

    assert_eq!(bot.send("##help tp").await, Dispatch::Unauthorized);

    bot.send_as("op", "room", "##help tp ->").await;
    assert_eq!(
        bot.reply(),
        "Usage: ##tp -> <frontend> <exact-id> [logical-id]. Teleport to a place. Aliases: to."
    );
}

#[tokio::test]
async fn test_search() {
    let bot = Bot::new();

    bot.send("$search reset").await;
    assert_eq!(bot.reply(), "$prefix reset");

    bot.send("$find ADVANCED").await;
    assert_eq!(bot.reply(), "$prefix advanced (add | delete | list)");

    bot.send("$search advanced prefixes").await;
    assert_eq!(
        bot.reply(),
        "$prefix normal list █ $prefix advanced list █ $prefix reset"
    );

    bot.send("$search zzz").await;
    assert_eq!(
        bot.outbox.last(),
        Some(("No commands found.".to_string(), Some(UserError::NOT_FOUND)))
    );
}

#[tokio::test]
async fn test_teleport() {
    let bot = Bot::new();

    assert_eq!(bot.send("##tp show").await, Dispatch::Unauthorized);
    assert_eq!(bot.reply(), FAILURE_NOTICE);

    bot.send_as("op", "room", "##tp show").await;
    assert_eq!(bot.reply(), "Home sweet home.");

    bot.send_as("op", "room", "##tp to test").await;
    assert_eq!(
        bot.reply(),
        "Usage: ##tp to <frontend> <exact-id> [logical-id]"
    );

    bot.send_as("op", "room", "##teleport -> test garden").await;
    assert!(bot.reply().starts_with("Teleported to exact="));

    bot.send_as("op", "room", "!prefix add ?").await;
    bot.send_as("someone", "garden", "?ping").await;
    assert_eq!(bot.reply(), "pong");
    assert_eq!(bot.send("?ping").await, Dispatch::NotCommand);

    bot.send_as("op", "room", "##tp show").await;
    assert!(bot.reply().starts_with("Currently teleported to: exact="));

    bot.send_as("op", "room", "##tp home").await;
    assert_eq!(bot.reply(), "Teleported back home.");
    assert_eq!(bot.send_as("op", "room", "?ping").await, Dispatch::NotCommand);
}

#[tokio::test]
async fn test_emergency_reset_through_event_loop() {
    let bot = Bot::new();
    bot.send("!prefix add ?").await;
    bot.send("!prefix delete !").await;
    assert_eq!(bot.send("!ping").await, Dispatch::NotCommand);

    let hooks = Arc::new(EventHooks::new());
    builtin::register_hooks(&hooks, Arc::clone(bot.pipeline.services()));
    let (sender, receivers) = event_channels(8);
    let event_loop = EventLoop::new(receivers, hooks, Arc::new(bot.pipeline.clone()));
    let running = tokio::spawn(event_loop.run(CancellationToken::new()));

    sender
        .message(bot.message("someone", "room", builtin::EMERGENCY_RESET))
        .await
        .unwrap();
    drop(sender);
    running.await.unwrap();

    assert!(bot.reply().starts_with("Prefixes have been reset."));
    assert_eq!(bot.send("!ping").await, Dispatch::Replied { urr: None });
    assert_eq!(bot.outbox.texts().last().map(String::as_str), Some("pong"));
}
