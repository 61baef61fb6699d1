//! Framework layer - hooks and event dispatch.
//!
//! - [`Hooks`]: ordered, copy-on-write callback lists
//! - [`EventHooks`]: one hook list per event type
//! - [`EventLoop`]: receives events from frontends and drives hooks and the
//!   message handler

pub mod event_loop;
pub mod events;
pub mod hooks;

pub use event_loop::EventLoop;
pub use events::{
    EventHooks, EventLoopClosed, EventReceivers, EventSender, MessageHandler, RedeemClaim,
    StreamOffline, StreamOnline, event_channels,
};
pub use hooks::{HookFn, HookId, Hooks};
