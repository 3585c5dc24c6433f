//! Observable JSON state container addressed by structural paths.
//!
//! A [`Store`] holds one JSON tree. Values are read and written at
//! [`Path`]s, and callbacks subscribe to paths. A write at path `P` notifies
//! every subscriber registered at an ancestor of `P`, at `P` itself, or
//! anywhere below `P`, each exactly once.
//!
//! # Example
//!
//! ```
//! use pathstore::{Path, Store};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let store = Store::new();
//! store.set(Path::root(), json!({"a": 1})).unwrap();
//! store.set(["b", "c"], json!("d")).unwrap();
//! assert_eq!(*store.state(), json!({"a": 1, "b": {"c": "d"}}));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! store
//!     .subscribe(["b"], move |n| sink.borrow_mut().push((*n.state).clone()))
//!     .unwrap();
//! store.set(["b", "c"], json!("e")).unwrap();
//! assert_eq!(*seen.borrow(), vec![json!({"a": 1, "b": {"c": "e"}})]);
//! ```
//!
//! # Modules
//!
//! - [`registry`]: the subscriber trie and the fan-out query.
//! - [`store`]: state ownership, batching and dispatch.
//! - [`binding`]: mount/unmount binding of one path for UI layers.
//! - [`devtools`]: bridge to an external state-debugging tool.

pub mod binding;
pub mod config;
pub mod devtools;
mod error;
mod events;
pub mod registry;
pub mod store;

pub use binding::{BindOptions, Binding};
pub use config::StoreConfig;
pub use devtools::{DevtoolsBridge, DevtoolsMessage, DevtoolsPort};
pub use error::{StoreError, SubscriberFailure};
pub use events::{Change, Notification};
pub use registry::{Registry, Subscriber, SubscriptionId};
pub use store::{SetOptions, Store, StoreBuilder, Subscription, WeakStore};

pub use pathstore_path::{IntoPath, Path, PathError, Segment};
