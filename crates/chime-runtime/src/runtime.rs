//! Main runtime orchestration.
//!
//! [`ChimeRuntime`] wires configuration, logging, storage, the command tree,
//! the prefix registry and the pipeline together, then drives the event loop
//! until shutdown.
//!
//! ```text
//!   frontends ──▶ EventSender ──▶ EventLoop ──▶ hooks ──▶ Pipeline ──▶ replies
//!                                     ▲
//!                       Ctrl+C / SIGTERM / custom future
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chime_runtime::ChimeRuntime;
//!
//! let runtime = ChimeRuntime::builder()
//!     .config_file("config/chime.toml")
//!     .command(CommandType::Normal, ping())
//!     .build()
//!     .await?;
//!
//! let sender = runtime.sender();
//! tokio::spawn(my_frontend(sender));
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use chime_core::{
    CancellationToken, CommandType, EventHooks, EventLoop, EventReceivers, EventSender,
    IdentityResolver, event_channels,
};
use chime_framework::{
    Command, Pipeline, PrefixRegistry, Services, TreeBuilder, builtin,
};
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::{ChimeConfig, ConfigLoader, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::store::{self, Backend};

/// The chime runtime.
///
/// Built once, then consumed by [`run`](Self::run) or
/// [`run_until`](Self::run_until). Grab the [`sender`](Self::sender) and
/// register [`hooks`](Self::hooks) before running.
pub struct ChimeRuntime {
    config: ChimeConfig,
    backend: Backend,
    services: Arc<Services>,
    pipeline: Pipeline,
    hooks: Arc<EventHooks>,
    sender: EventSender,
    receivers: EventReceivers,
    shutdown: CancellationToken,
}

impl ChimeRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration and the commands to
    /// serve. Builtin commands are not added.
    pub async fn from_config(config: ChimeConfig, commands: TreeBuilder) -> RuntimeResult<Self> {
        Self::assemble(config, commands, false).await
    }

    async fn assemble(
        config: ChimeConfig,
        mut commands: TreeBuilder,
        builtins: bool,
    ) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        validate_config(&config)?;

        let defaults = config.prefixes.to_defaults()?;
        let backend = Backend::open(&config.storage).await?;
        let resolver =
            IdentityResolver::with_cache(backend.scopes(), store::cache(config.storage.cache));
        let prefixes = PrefixRegistry::new(backend.prefixes(), defaults);

        if builtins {
            builtin::register(&mut commands);
        }
        let tree = commands.build()?;
        let command_count = tree.len();

        let services = Arc::new(Services::new(tree, resolver, prefixes, config.operators()));
        let pipeline =
            Pipeline::new(Arc::clone(&services)).action_timeout(config.pipeline.action_timeout());

        let hooks = Arc::new(EventHooks::new());
        if builtins {
            builtin::register_hooks(&hooks, Arc::clone(&services));
        }

        let (sender, receivers) = event_channels(config.pipeline.event_buffer);

        info!(
            commands = command_count,
            storage = ?config.storage.backend,
            action_timeout = ?config.pipeline.action_timeout(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            backend,
            services,
            pipeline,
            hooks,
            sender,
            receivers,
            shutdown: CancellationToken::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ChimeConfig {
        &self.config
    }

    /// Returns the shared services.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Returns the pipeline, e.g. to run it outside the event loop.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the hook registry. Hooks may be added at any time.
    pub fn hooks(&self) -> &Arc<EventHooks> {
        &self.hooks
    }

    /// Returns a handle frontends use to submit events.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Returns a token that stops the runtime when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs until Ctrl+C, SIGTERM or the shutdown token.
    pub async fn run(self) -> RuntimeResult<()> {
        info!("chime runtime is now running. Press Ctrl+C to stop.");
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes or the shutdown token is cancelled.
    ///
    /// Messages already being processed are awaited before returning.
    pub async fn run_until<F>(self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            backend,
            pipeline,
            hooks,
            sender,
            receivers,
            shutdown: token,
            ..
        } = self;

        // Frontends hold their own clones; ours would keep the loop alive.
        drop(sender);

        let event_loop = EventLoop::new(receivers, hooks, Arc::new(pipeline));
        let running = tokio::spawn(event_loop.run(token.clone()));

        tokio::select! {
            _ = shutdown => info!("Shutdown requested"),
            _ = token.cancelled() => info!("Shutdown token cancelled"),
        }
        token.cancel();

        let result = running.await;
        backend.close().await;
        info!("Runtime stopped");

        result.map_err(Into::into)
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

impl std::fmt::Debug for ChimeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChimeRuntime")
            .field("config", &self.config)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`ChimeRuntime`].
///
/// ```rust,ignore
/// let runtime = ChimeRuntime::builder()
///     .config_file("config/chime.toml")
///     .profile("production")
///     .command(CommandType::Normal, ping())
///     .build()
///     .await?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    commands: TreeBuilder,
    builtins: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder with the default config search.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            commands: TreeBuilder::new(),
            builtins: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ChimeConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Registers a root command.
    pub fn command(mut self, kind: CommandType, command: Command) -> Self {
        self.commands.register(kind, command);
        self
    }

    /// Leaves out the builtin commands and the emergency reset hook.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    /// Loads the configuration and builds the runtime.
    pub async fn build(self) -> RuntimeResult<ChimeRuntime> {
        let config = self.config_loader.load()?;
        ChimeRuntime::assemble(config, self.commands, self.builtins).await
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StorageBackend, StorageConfig};
    use chime_core::{
        Message, Messenger, Personifier, Placer, Reply, SendError, UserError, async_trait,
    };
    use chime_framework::Outcome;
    use tokio::sync::{mpsc, oneshot};

    struct Me;

    impl Personifier for Me {
        fn frontend(&self) -> &str {
            "test"
        }
        fn id(&self) -> &str {
            "me"
        }
    }

    struct Here;

    impl Placer for Here {
        fn frontend(&self) -> &str {
            "test"
        }
        fn id_exact(&self) -> &str {
            "here"
        }
    }

    struct Forward(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl Messenger for Forward {
        async fn send(&self, reply: &Reply, _: Option<&UserError>) -> Result<(), SendError> {
            self.0
                .send(reply.to_string())
                .map_err(|_| SendError::NotConnected)
        }
    }

    fn memory_config() -> ChimeConfig {
        ChimeConfig {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn ping() -> Command {
        Command::new("ping").action(|_| async { Ok(Outcome::text("pong")) })
    }

    #[tokio::test]
    async fn test_runtime_round_trip() {
        let runtime = ChimeRuntime::builder()
            .without_env()
            .merge(memory_config())
            .command(CommandType::Normal, ping())
            .build()
            .await
            .unwrap();

        let sender = runtime.sender();
        let (stop, stopped) = oneshot::channel::<()>();
        let running = tokio::spawn(runtime.run_until(async {
            let _ = stopped.await;
        }));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let messenger = Arc::new(Forward(tx));
        for raw in ["!ping", "!prefix list"] {
            sender
                .message(Message::new("1", raw, Arc::new(Me), Arc::new(Here), messenger.clone()))
                .await
                .unwrap();
        }

        let mut replies = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        replies.sort();
        assert_eq!(replies, vec!["Prefixes: !", "pong"]);

        stop.send(()).unwrap();
        running.await.unwrap().unwrap();
        assert!(sender.message(Message::new("2", "!ping", Arc::new(Me), Arc::new(Here), messenger)).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_runtime() {
        let runtime = ChimeRuntime::from_config(memory_config(), TreeBuilder::new())
            .await
            .unwrap();
        let token = runtime.shutdown_token();

        let running = tokio::spawn(runtime.run_until(std::future::pending()));
        token.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_invalid_tree_is_rejected() {
        let result = ChimeRuntime::builder()
            .without_env()
            .merge(memory_config())
            .command(CommandType::Normal, Command::new("Prefix"))
            .build()
            .await;
        assert!(matches!(result, Err(crate::RuntimeError::Tree(_))));
    }
}
