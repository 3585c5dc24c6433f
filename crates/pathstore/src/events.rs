use std::rc::Rc;

use pathstore_path::Path;
use serde_json::Value;

/// One `set` call, queued until the batch is flushed.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: Path,
    /// `None` when the write removed the slot.
    pub value: Option<Value>,
    pub old_state: Rc<Value>,
    /// State right after this write.
    pub state: Rc<Value>,
    /// Identifier given to the write itself. Notifications use the
    /// publishing call's identifier instead.
    pub identifier: Option<String>,
}

/// What a subscriber receives for each flushed change.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// State after the whole flushed batch.
    pub state: Rc<Value>,
    /// State right before this change.
    pub old_state: Rc<Value>,
    pub path: Path,
    pub value: Option<Value>,
    /// Identifier of the call that published the batch.
    pub identifier: Option<String>,
}
