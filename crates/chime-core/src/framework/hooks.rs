//! Hook registry.
//!
//! Hooks are callbacks applied one by one to every event of a given type.
//! Features use them to react to raw messages and auxiliary events without
//! going through command matching.
//!
//! # Concurrency
//!
//! The backing list lives behind an `Arc` inside a read-write lock. Running
//! the hooks only takes the read lock long enough to clone that `Arc`, so
//! concurrent runs never block each other and a registration that happens
//! while hooks are running never disturbs the iteration in flight: writers
//! build a new list and swap it in.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::trace;

/// Identifier returned by [`Hooks::register`].
///
/// Identifiers increase monotonically and are never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(u64);

impl HookId {
    /// Returns the raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type-erased hook callback.
pub type HookFn<T> = Arc<dyn Fn(Arc<T>) -> BoxFuture<'static, ()> + Send + Sync>;

struct Hook<T> {
    id: HookId,
    run: HookFn<T>,
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            run: Arc::clone(&self.run),
        }
    }
}

/// An ordered, thread-safe list of hooks for events of type `T`.
pub struct Hooks<T> {
    hooks: RwLock<Arc<Vec<Hook<T>>>>,
    // Incremented on every registration, never decremented.
    total: AtomicU64,
}

impl<T> Default for Hooks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Hooks<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(Arc::new(Vec::new())),
            total: AtomicU64::new(0),
        }
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    /// Returns whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    /// Removes the hook with the given id.
    ///
    /// Returns `false` if no such hook exists.
    pub fn deregister(&self, id: HookId) -> bool {
        let mut guard = self.hooks.write();
        let Some(index) = guard.iter().position(|h| h.id == id) else {
            return false;
        };
        Arc::make_mut(&mut *guard).remove(index);
        trace!(hook_id = %id, "Deregistered hook");
        true
    }

    fn snapshot(&self) -> Arc<Vec<Hook<T>>> {
        Arc::clone(&self.hooks.read())
    }
}

impl<T: Send + Sync + 'static> Hooks<T> {
    /// Registers an async hook, returning the id to deregister it with.
    pub fn register<F, Fut>(&self, f: F) -> HookId
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let run: HookFn<T> = Arc::new(move |arg| f(arg).boxed());
        self.register_boxed(run)
    }

    /// Registers a synchronous hook.
    pub fn register_sync<F>(&self, f: F) -> HookId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.register(move |arg: Arc<T>| {
            let f = Arc::clone(&f);
            async move { f(&arg) }
        })
    }

    /// Registers an already type-erased hook.
    pub fn register_boxed(&self, run: HookFn<T>) -> HookId {
        let mut guard = self.hooks.write();
        let id = HookId(self.total.fetch_add(1, Ordering::SeqCst) + 1);
        Arc::make_mut(&mut *guard).push(Hook { id, run });
        trace!(hook_id = %id, "Registered hook");
        id
    }

    /// Runs every hook in registration order, awaiting each before the next.
    pub async fn run_all(&self, arg: Arc<T>) {
        let hooks = self.snapshot();
        for hook in hooks.iter() {
            trace!(hook_id = %hook.id, "Running hook");
            (hook.run)(Arc::clone(&arg)).await;
        }
    }
}

impl<T> fmt::Debug for Hooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("count", &self.len())
            .field("total", &self.total.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_run_in_registration_order() {
        let hooks = Hooks::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            hooks.register_sync(move |n: &u32| seen.lock().push(format!("{tag}{n}")));
        }

        hooks.run_all(Arc::new(1)).await;
        assert_eq!(*seen.lock(), vec!["a1", "b1", "c1"]);
    }

    #[tokio::test]
    async fn test_deregister_keeps_others() {
        let hooks = Hooks::<()>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        let a = hooks.register_sync(move |_| seen_a.lock().push("a"));
        let seen_b = Arc::clone(&seen);
        let b = hooks.register_sync(move |_| seen_b.lock().push("b"));

        assert!(hooks.deregister(a));
        hooks.run_all(Arc::new(())).await;

        assert_eq!(*seen.lock(), vec!["b"]);
        assert_eq!(hooks.len(), 1);

        let c = hooks.register_sync(|_| {});
        assert!(c > b, "ids must never be reused");
        assert!(!hooks.deregister(a));
    }

    #[tokio::test]
    async fn test_register_during_run_does_not_affect_iteration() {
        let hooks = Arc::new(Hooks::<()>::new());
        let count = Arc::new(AtomicU64::new(0));

        let inner = Arc::clone(&hooks);
        let counter = Arc::clone(&count);
        hooks.register(move |_| {
            let inner = Arc::clone(&inner);
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                inner.register_sync(|_| {});
            }
        });

        hooks.run_all(Arc::new(())).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_runs() {
        let hooks = Arc::new(Hooks::<u64>::new());
        let sum = Arc::new(AtomicU64::new(0));
        let s = Arc::clone(&sum);
        hooks.register_sync(move |n: &u64| {
            s.fetch_add(*n, Ordering::SeqCst);
        });

        let mut tasks = Vec::new();
        for n in 1..=10u64 {
            let hooks = Arc::clone(&hooks);
            tasks.push(tokio::spawn(async move { hooks.run_all(Arc::new(n)).await }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(sum.load(Ordering::SeqCst), 55);
    }
}
