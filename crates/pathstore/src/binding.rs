//! Stateful binding of one path, for UI layers with a mount/unmount
//! lifecycle.
//!
//! A [`Binding`] keeps the last value it has seen at its path and reports a
//! change only when the stored value stops being deeply equal to it.
//!
//! ```
//! use pathstore::{BindOptions, Binding, Store};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let store = Store::new();
//! let mut count = Binding::new(&store, ["counter"], json!(0), BindOptions::default()).unwrap();
//! let renders = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&renders);
//! count.mount(move |v| sink.borrow_mut().push(v.cloned())).unwrap();
//!
//! assert_eq!(store.get(["counter"]).unwrap(), Some(json!(0)));
//! count.set(json!(1)).unwrap();
//! assert_eq!(count.value(), Some(json!(1)));
//! assert_eq!(*renders.borrow(), vec![Some(json!(1))]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use pathstore_path::{IntoPath, Path};
use serde_json::Value;
use tracing::warn;

use crate::{SetOptions, Store, StoreError, Subscription};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Write the default even when the store already holds a value.
    pub override_existing: bool,
    /// Remove the value from the store on unmount.
    pub cleanup: bool,
    /// Identifier attached to every write made through the binding.
    pub identifier: Option<String>,
}

pub struct Binding {
    store: Store,
    path: Path,
    default: Option<Value>,
    options: BindOptions,
    current: Rc<RefCell<Option<Value>>>,
    subscription: Option<Subscription>,
}

impl Binding {
    /// Binds `path` of `store` without subscribing yet.
    ///
    /// The initial value is `default` when `override_existing` is set or
    /// nothing is stored at `path`, else the stored value.
    ///
    /// # Errors
    ///
    /// [`StoreError::Path`] when `path` fails conversion or validation.
    pub fn new(
        store: &Store,
        path: impl IntoPath,
        default: impl Into<Option<Value>>,
        options: BindOptions,
    ) -> Result<Self, StoreError> {
        let path = store.resolve(path)?;
        let binding = Self {
            store: store.clone(),
            path,
            default: default.into(),
            options,
            current: Rc::new(RefCell::new(None)),
            subscription: None,
        };
        let (initial, _) = binding.initial_value()?;
        *binding.current.borrow_mut() = initial;
        Ok(binding)
    }

    /// Value the binding starts from, and whether it comes from the default.
    fn initial_value(&self) -> Result<(Option<Value>, bool), StoreError> {
        let stored = self.store.get(&self.path)?;
        let use_default =
            self.options.override_existing || (stored.is_none() && self.default.is_some());
        if use_default {
            Ok((self.default.clone(), true))
        } else {
            Ok((stored, false))
        }
    }

    fn write_options(&self, identifier: Option<String>) -> SetOptions {
        SetOptions {
            no_publish: false,
            identifier: identifier.or_else(|| self.options.identifier.clone()),
        }
    }

    /// Starts tracking the store. Writes the default first when it applies.
    /// `on_change` runs whenever the stored value stops being equal to the
    /// last one seen. Mounting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Fails when writing the default or subscribing fails.
    pub fn mount<F>(&mut self, on_change: F) -> Result<(), StoreError>
    where
        F: Fn(Option<&Value>) + 'static,
    {
        if self.subscription.is_some() {
            return Ok(());
        }
        let (initial, from_default) = self.initial_value()?;
        *self.current.borrow_mut() = initial.clone();
        if from_default {
            self.store
                .set_with(&self.path, initial, self.write_options(None))?;
        }

        let store = self.store.downgrade();
        let path = self.path.clone();
        let current = Rc::clone(&self.current);
        let subscription = self.store.subscribe(&self.path, move |_| {
            let Some(store) = store.upgrade() else {
                return;
            };
            let latest = match store.get(&path) {
                Ok(latest) => latest,
                Err(err) => {
                    warn!(%err, "binding could not read its path");
                    return;
                }
            };
            if *current.borrow() == latest {
                return;
            }
            *current.borrow_mut() = latest.clone();
            on_change(latest.as_ref());
        })?;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Stops tracking. With `cleanup`, the value is removed from the store
    /// after the binding has stopped listening.
    ///
    /// # Errors
    ///
    /// Fails when the cleanup write fails.
    pub fn unmount(&mut self) -> Result<(), StoreError> {
        let Some(subscription) = self.subscription.take() else {
            return Ok(());
        };
        subscription.unsubscribe();
        if self.options.cleanup {
            self.store
                .set_with(&self.path, None::<Value>, self.write_options(None))?;
        }
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Last value seen. Only refreshed while mounted.
    pub fn value(&self) -> Option<Value> {
        self.current.borrow().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes through the store with the binding's identifier.
    ///
    /// # Errors
    ///
    /// As [`Store::set`].
    pub fn set(&self, value: impl Into<Option<Value>>) -> Result<(), StoreError> {
        self.store.set_with(&self.path, value, self.write_options(None))
    }

    /// Writes with a one-off identifier instead of the binding's own.
    pub fn set_identified(
        &self,
        value: impl Into<Option<Value>>,
        identifier: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.store
            .set_with(&self.path, value, self.write_options(Some(identifier.into())))
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        if let Err(err) = self.unmount() {
            warn!(%err, path = %self.path.to_pointer(), "binding cleanup failed");
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("path", &self.path)
            .field("value", &self.current.borrow())
            .field("mounted", &self.subscription.is_some())
            .finish()
    }
}
