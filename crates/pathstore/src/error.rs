use pathstore_path::{Path, PathError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid path: {0}")]
    Path(#[from] PathError),
    #[error("devtools state is not valid JSON: {0}")]
    DevtoolsState(#[from] serde_json::Error),
    #[error("invalid store config: {0}")]
    Config(#[source] serde_json::Error),
}

/// A subscriber that panicked while being notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberFailure {
    /// Path of the change being dispatched.
    pub path: Path,
    pub message: String,
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
