//! The store engine.
//!
//! A [`Store`] owns three things: the current state tree, the subscriber
//! registry, and the batch of changes not yet published. `set` replaces the
//! state, queues a [`Change`] and, unless publication is suppressed, flushes
//! the batch synchronously before returning.
//!
//! Flushing takes the pending batch out of the store before dispatching
//! anything, and every change dispatches over a snapshot of its subscriber
//! list. Callbacks are therefore free to call back into the store: a nested
//! `set` publishes its own batch immediately, and an `unsubscribe` only
//! affects later dispatches.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use pathstore_path::{get_at, remove_at, set_at, validate_path, IntoPath, Path};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::devtools::{DevtoolsBridge, DevtoolsPort};
use crate::error::panic_message;
use crate::registry::{Registry, Subscriber, SubscriptionId};
use crate::{Change, Notification, StoreConfig, StoreError, SubscriberFailure};

/// Receives subscriber panics caught during dispatch.
pub type FailureReporter = Rc<dyn Fn(&SubscriberFailure)>;

/// Per-call options for [`Store::set_with`] and [`Store::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Apply the write but keep its change queued until the next publishing
    /// write (or [`Store::flush`]).
    pub no_publish: bool,
    /// Free-text label, used only for display. When this call publishes,
    /// every change in the flushed batch carries it.
    pub identifier: Option<String>,
}

impl SetOptions {
    /// Publishing write with no identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the change instead of publishing it.
    pub fn no_publish(mut self) -> Self {
        self.no_publish = true;
        self
    }

    /// Labels the notifications published by this call.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

struct Inner {
    config: StoreConfig,
    state: RefCell<Rc<Value>>,
    registry: RefCell<Registry>,
    pending: RefCell<Vec<Change>>,
    failure_reporter: Option<FailureReporter>,
    devtools: RefCell<Option<DevtoolsBridge>>,
}

/// Observable state container. Cloning yields another handle to the same
/// store; independent stores share nothing.
#[derive(Clone)]
pub struct Store {
    inner: Rc<Inner>,
}

/// Non-owning handle, used by callbacks that must not keep the store alive.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<Inner>,
}

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.borrow())
            .field("subscribers", &self.inner.registry.borrow())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}

impl Store {
    /// Empty store (`{}`) with the default configuration and no devtools.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Empty store with `config`. When `config.devtools` is set a warning is
    /// logged, since no port can be supplied this way; use
    /// [`Store::builder`] to attach one.
    pub fn with_config(config: StoreConfig) -> Self {
        StoreBuilder::new().config(config).build()
    }

    /// Starts a [`StoreBuilder`] for initial state, devtools port and
    /// failure reporter.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Converts and validates a path against this store's limits.
    ///
    /// # Errors
    ///
    /// [`StoreError::Path`] when the path cannot be converted, is deeper than
    /// `max_path_depth`, or addresses an array position above
    /// `max_array_index`.
    pub fn resolve(&self, path: impl IntoPath) -> Result<Path, StoreError> {
        let path = path.into_path()?;
        let config = &self.inner.config;
        validate_path(&path, config.max_path_depth, config.max_array_index)?;
        Ok(path)
    }

    /// Value at `path`, or `None` when nothing is stored there.
    ///
    /// Missing intermediates are not an error.
    ///
    /// # Errors
    ///
    /// [`StoreError::Path`] for a path [`Store::resolve`] rejects.
    pub fn get(&self, path: impl IntoPath) -> Result<Option<Value>, StoreError> {
        let path = self.resolve(path)?;
        let state = self.state();
        Ok(get_at(&state, path.segments()).cloned())
    }

    /// Current state tree.
    pub fn state(&self) -> Rc<Value> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Writes `value` at `path` and publishes. `None` removes the slot.
    ///
    /// Missing levels are created. Subscribers at ancestors of `path`, at
    /// `path` and below it are notified before this returns.
    ///
    /// # Errors
    ///
    /// [`StoreError::Path`] for a rejected path. The state is unchanged and
    /// nothing is published.
    pub fn set(&self, path: impl IntoPath, value: impl Into<Option<Value>>) -> Result<(), StoreError> {
        self.set_with(path, value, SetOptions::default())
    }

    /// [`Store::set`] with per-call options.
    pub fn set_with(
        &self,
        path: impl IntoPath,
        value: impl Into<Option<Value>>,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let path = self.resolve(path)?;
        self.apply(path, value.into(), options)
    }

    /// Removes the slot at `path`: the key is deleted from its object, an
    /// array element becomes a `null` hole.
    pub fn remove(&self, path: impl IntoPath) -> Result<(), StoreError> {
        self.set_with(path, None::<Value>, SetOptions::default())
    }

    /// Functional update: `f` maps the current value at `path` to the new
    /// one. `f` must not touch the store.
    ///
    /// # Errors
    ///
    /// [`StoreError::Path`] for a rejected path; `f` is not called.
    pub fn update<F>(&self, path: impl IntoPath, f: F, options: SetOptions) -> Result<(), StoreError>
    where
        F: FnOnce(Option<&Value>) -> Option<Value>,
    {
        let path = self.resolve(path)?;
        let state = self.state();
        let next = f(get_at(&state, path.segments()));
        self.apply(path, next, options)
    }

    /// Publishes any queued changes without writing.
    pub fn flush(&self) {
        self.flush_batch(None);
    }

    /// Number of changes waiting to be published.
    pub fn pending(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Queued changes, oldest first.
    pub fn pending_changes(&self) -> Vec<Change> {
        self.inner.pending.borrow().clone()
    }

    /// Registers `callback` at `path`. It fires on later writes at any
    /// ancestor of, at, or below `path`; never on subscribe itself.
    ///
    /// # Errors
    ///
    /// [`StoreError::Path`] for a rejected path. Nothing is registered.
    pub fn subscribe<F>(&self, path: impl IntoPath, callback: F) -> Result<Subscription, StoreError>
    where
        F: Fn(&Notification) + 'static,
    {
        self.subscribe_shared(path, Rc::new(callback))
    }

    /// Like [`Store::subscribe`] for an already shared callback. The same
    /// callback registered at several paths fires once per change.
    pub fn subscribe_shared(
        &self,
        path: impl IntoPath,
        callback: Subscriber,
    ) -> Result<Subscription, StoreError> {
        let path = self.resolve(path)?;
        let id = self.inner.registry.borrow_mut().register(&path, callback);
        debug!(path = %path.to_pointer(), ?id, "subscribed");
        Ok(Subscription {
            store: self.downgrade(),
            path,
            id,
            active: Cell::new(true),
        })
    }

    /// Read-only snapshot of the registry.
    pub fn subscribers(&self) -> Registry {
        self.inner.registry.borrow().clone()
    }

    /// The devtools bridge, when a port was attached at construction.
    pub fn devtools(&self) -> Option<DevtoolsBridge> {
        self.inner.devtools.borrow().clone()
    }

    fn unregister(&self, path: &Path, id: SubscriptionId) -> bool {
        let removed = self.inner.registry.borrow_mut().unregister(path, id);
        debug!(path = %path.to_pointer(), ?id, removed, "unsubscribed");
        removed
    }

    fn apply(&self, path: Path, value: Option<Value>, options: SetOptions) -> Result<(), StoreError> {
        let old_state = self.state();
        let state = Rc::new(match &value {
            Some(value) => set_at(&old_state, path.segments(), value.clone())?,
            None => remove_at(&old_state, path.segments()),
        });
        *self.inner.state.borrow_mut() = Rc::clone(&state);
        debug!(
            path = %path.to_pointer(),
            removed = value.is_none(),
            no_publish = options.no_publish,
            "set"
        );
        self.inner.pending.borrow_mut().push(Change {
            path,
            value,
            old_state,
            state,
            identifier: options.identifier.clone(),
        });
        if !options.no_publish {
            self.flush_batch(options.identifier.as_deref());
        }
        Ok(())
    }

    fn flush_batch(&self, identifier: Option<&str>) {
        let batch = std::mem::take(&mut *self.inner.pending.borrow_mut());
        if batch.is_empty() {
            return;
        }
        let state = self.state();
        debug!(records = batch.len(), "flushing changes");
        for change in batch {
            let subscribers = self.inner.registry.borrow().subscribers_for(&change.path);
            let notification = Notification {
                state: Rc::clone(&state),
                old_state: change.old_state,
                path: change.path,
                value: change.value,
                identifier: identifier.map(str::to_string),
            };
            debug!(
                path = %notification.path.to_pointer(),
                subscribers = subscribers.len(),
                "dispatching change"
            );
            for subscriber in &subscribers {
                self.invoke(subscriber, &notification);
            }
        }
    }

    fn invoke(&self, subscriber: &Subscriber, notification: &Notification) {
        if !self.inner.config.catch_panics {
            subscriber(notification);
            return;
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber(notification)));
        if let Err(payload) = outcome {
            let failure = SubscriberFailure {
                path: notification.path.clone(),
                message: panic_message(&*payload),
            };
            error!(
                path = %failure.path.to_pointer(),
                message = %failure.message,
                "subscriber panicked"
            );
            if let Some(report) = &self.inner.failure_reporter {
                report(&failure);
            }
        }
    }
}

/// Unsubscribe capability for one registration.
///
/// Dropping the handle leaves the subscription in place.
pub struct Subscription {
    store: WeakStore,
    path: Path,
    id: SubscriptionId,
    active: Cell<bool>,
}

impl Subscription {
    /// Removes this registration. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        if let Some(store) = self.store.upgrade() {
            store.unregister(&self.path, self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

#[derive(Default)]
pub struct StoreBuilder {
    config: StoreConfig,
    initial: Option<Value>,
    devtools: Option<Rc<dyn DevtoolsPort>>,
    failure_reporter: Option<FailureReporter>,
}

impl StoreBuilder {
    /// Builder with the default configuration, an empty initial state and
    /// no devtools port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default [`StoreConfig`].
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Starting state. Defaults to an empty object.
    pub fn initial_state(mut self, state: Value) -> Self {
        self.initial = Some(state);
        self
    }

    /// Attaches a devtools port. Supplying one enables the bridge.
    pub fn devtools<P: DevtoolsPort + 'static>(mut self, port: P) -> Self {
        self.devtools = Some(Rc::new(port));
        self
    }

    /// Like [`StoreBuilder::devtools`] for an already shared port.
    pub fn devtools_port(mut self, port: Rc<dyn DevtoolsPort>) -> Self {
        self.devtools = Some(port);
        self
    }

    /// Called with every subscriber panic caught during dispatch.
    pub fn on_subscriber_failure<F>(mut self, report: F) -> Self
    where
        F: Fn(&SubscriberFailure) + 'static,
    {
        self.failure_reporter = Some(Rc::new(report));
        self
    }

    /// Builds the store and attaches the devtools port, if any. A bridge
    /// that fails to attach is logged and skipped.
    pub fn build(self) -> Store {
        let state = self.initial.unwrap_or_else(|| Value::Object(Map::new()));
        let store = Store {
            inner: Rc::new(Inner {
                config: self.config,
                state: RefCell::new(Rc::new(state)),
                registry: RefCell::new(Registry::new()),
                pending: RefCell::new(Vec::new()),
                failure_reporter: self.failure_reporter,
                devtools: RefCell::new(None),
            }),
        };
        match self.devtools {
            Some(port) => match DevtoolsBridge::attach(&store, port) {
                Ok(bridge) => *store.inner.devtools.borrow_mut() = Some(bridge),
                Err(err) => warn!(%err, "failed to attach devtools bridge"),
            },
            None if store.inner.config.devtools => {
                warn!("devtools enabled but no devtools port was supplied; continuing without bridge");
            }
            None => {}
        }
        store
    }
}
