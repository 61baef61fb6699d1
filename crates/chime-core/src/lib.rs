//! # Chime Core
//!
//! The core engine of the chime chat-command bot.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Core abstractions and type system:
//! - **Scopes**: stable identities for people and places ([`Scope`], [`Place`])
//! - **Command types and prefixes** ([`CommandType`], [`Prefix`])
//! - **Frontend handles**: [`Personifier`], [`Placer`], [`Messenger`]
//! - **Messages and replies** ([`Message`], [`Reply`], [`UserError`])
//!
//! ### Framework Layer
//!
//! Event processing:
//! - **Hooks**: ordered side-effect callbacks ([`Hooks`])
//! - **Event loop**: typed event channels driven by [`EventLoop`]
//!
//! ### Integration Layer
//!
//! External system interfaces:
//! - **Storage**: [`ScopeStore`], [`PrefixStore`], [`MemoryStore`]
//! - **Caching**: [`ScopeCache`]
//! - **Identity**: [`IdentityResolver`] and [`Teleports`]
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌───────┐     ┌─────────────────┐
//! │ Frontend │────▶│ EventLoop │────▶│ Hooks │────▶│ MessageHandler  │
//! │          │     │           │     └───────┘     │ (command        │
//! └──────────┘     └───────────┘                   │  pipeline)      │
//!                                                  └─────────────────┘
//! ```

pub mod foundation;
pub mod framework;
pub mod integration;

pub use foundation::{
    CommandType, Message, Messenger, Personifier, Place, Placer, Prefix, Reply, Scope, ScopeKey,
    ScopeKind, SendError, StoreError, StoreResult, TypeMask, UserError,
};
pub use framework::{
    EventHooks, EventLoop, EventLoopClosed, EventReceivers, EventSender, HookFn, HookId, Hooks,
    MessageHandler, RedeemClaim, StreamOffline, StreamOnline, event_channels,
};
pub use integration::{
    IdentityResolver, MemoryCache, MemoryStore, NoCache, PrefixStore, ScopeCache, ScopeStore,
    Store, Teleports, get_or_compute,
};

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
