//! Bridge to an external state-debugging tool.
//!
//! The tool is reached only through a [`DevtoolsPort`] handed to
//! [`StoreBuilder::devtools`](crate::StoreBuilder::devtools). Once attached,
//! the bridge mirrors every published change to the port, and feeds
//! messages coming back from the tool into the store through
//! [`DevtoolsBridge::receive`].
//!
//! ```text
//! store.set ──► root subscription ──► port.send(label, state)
//! tool ──► bridge.receive(DISPATCH) ──► store.set(root, state)
//!                                        └─ echo suppressed for jumps
//! ```

use std::cell::Cell;
use std::rc::Rc;

use pathstore_path::Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::store::WeakStore;
use crate::{Notification, Store, StoreError};

/// Label sent for changes at the root that carry no identifier.
pub const ROOT_LABEL: &str = "__ROOT__";

const DISPATCH: &str = "DISPATCH";
const JUMP_TO_STATE: &str = "JUMP_TO_STATE";
const JUMP_TO_ACTION: &str = "JUMP_TO_ACTION";

/// The tool side of the bridge.
pub trait DevtoolsPort {
    /// Called once on attach with the current state.
    fn init(&self, state: &Value);

    /// Called for every published change.
    fn send(&self, label: &str, state: &Value);
}

/// Message sent by the tool.
///
/// Mirrors the wire shape `{"type": "DISPATCH", "state": "<json>",
/// "payload": {"type": "JUMP_TO_STATE"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevtoolsMessage {
    #[serde(rename = "type")]
    pub kind: String,
    /// Serialized state tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DispatchPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPayload {
    #[serde(rename = "type")]
    pub kind: String,
}

impl DevtoolsMessage {
    /// `DISPATCH` message with the given payload type and serialized state.
    pub fn dispatch(payload_kind: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            kind: DISPATCH.to_string(),
            state: Some(state.into()),
            payload: Some(DispatchPayload {
                kind: payload_kind.into(),
            }),
        }
    }

    /// `DISPATCH` / `JUMP_TO_STATE` with a serialized state.
    pub fn jump_to_state(state: impl Into<String>) -> Self {
        Self::dispatch(JUMP_TO_STATE, state)
    }

    pub fn jump_to_action(state: impl Into<String>) -> Self {
        Self::dispatch(JUMP_TO_ACTION, state)
    }

    /// Time-travel messages whose resulting change must not be echoed back.
    pub fn is_jump(&self) -> bool {
        self.payload
            .as_ref()
            .is_some_and(|p| p.kind == JUMP_TO_STATE || p.kind == JUMP_TO_ACTION)
    }
}

/// Label shown in the tool: identifier, else dotted path, else [`ROOT_LABEL`].
pub fn devtools_label(notification: &Notification) -> String {
    if let Some(identifier) = &notification.identifier {
        return identifier.clone();
    }
    if notification.path.is_root() {
        return ROOT_LABEL.to_string();
    }
    notification.path.to_string()
}

/// Store-side handle of an attached tool.
#[derive(Clone)]
pub struct DevtoolsBridge {
    store: WeakStore,
    suppress_next: Rc<Cell<bool>>,
}

impl DevtoolsBridge {
    pub(crate) fn attach(store: &Store, port: Rc<dyn DevtoolsPort>) -> Result<Self, StoreError> {
        port.init(&store.state());
        let suppress_next = Rc::new(Cell::new(false));
        let suppress = Rc::clone(&suppress_next);
        // Lives as long as the store; never unsubscribed.
        store.subscribe(Path::root(), move |notification: &Notification| {
            if suppress.replace(false) {
                return;
            }
            port.send(&devtools_label(notification), &notification.state);
        })?;
        debug!("devtools bridge attached");
        Ok(Self {
            store: store.downgrade(),
            suppress_next,
        })
    }

    /// Applies a message from the tool.
    ///
    /// Only `DISPATCH` messages carrying a state are acted on; the state
    /// replaces the whole tree. Jump messages are not echoed back.
    ///
    /// # Errors
    ///
    /// [`StoreError::DevtoolsState`] when the state is not valid JSON.
    pub fn receive(&self, message: &DevtoolsMessage) -> Result<(), StoreError> {
        if message.kind != DISPATCH {
            return Ok(());
        }
        let Some(raw) = &message.state else {
            return Ok(());
        };
        let state: Value = serde_json::from_str(raw)?;
        let Some(store) = self.store.upgrade() else {
            return Ok(());
        };
        // Publish anything queued first so the suppressed notification is
        // the one produced by this write.
        store.flush();
        self.suppress_next.set(message.is_jump());
        debug!(jump = message.is_jump(), "applying devtools state");
        store.set(Path::root(), state)
    }

    /// Parses and applies a raw JSON message.
    ///
    /// # Errors
    ///
    /// [`StoreError::DevtoolsState`] when the message or its state is not
    /// valid JSON.
    pub fn receive_json(&self, raw: &str) -> Result<(), StoreError> {
        let message: DevtoolsMessage = serde_json::from_str(raw)?;
        self.receive(&message)
    }
}

impl std::fmt::Debug for DevtoolsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevtoolsBridge")
            .field("suppress_next", &self.suppress_next.get())
            .finish()
    }
}
