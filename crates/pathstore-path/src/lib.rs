//! Structural paths into JSON trees.
//!
//! A [`Path`] is a sequence of [`Segment`]s, each either an object key or an
//! array index. This crate reads and immutably writes values at such paths,
//! converts paths to and from JSON pointers (RFC 6901) and validates them.
//!
//! # Example
//!
//! ```
//! use pathstore_path::{get_at, set_at, remove_at, IntoPath};
//! use serde_json::json;
//!
//! let path = json!(["b", "c"]).into_path().unwrap();
//! let doc = set_at(&json!({"a": 1}), path.segments(), json!("d")).unwrap();
//! assert_eq!(doc, json!({"a": 1, "b": {"c": "d"}}));
//! assert_eq!(get_at(&doc, path.segments()), Some(&json!("d")));
//!
//! let doc = remove_at(&doc, path.segments());
//! assert_eq!(doc, json!({"a": 1, "b": {}}));
//! ```

mod get;
mod into_path;
mod pointer;
mod set;

pub mod types;
pub use types::{Path, Segment};

pub mod validate;
pub use validate::{
    validate_path, validate_pointer, PathError, MAX_ARRAY_INDEX, MAX_PATH_LENGTH, MAX_POINTER_LENGTH,
};

pub use get::{get_at, get_at_mut};
pub use into_path::IntoPath;
pub use pointer::{escape_component, is_valid_index, unescape_component};
pub use set::{remove_at, set_at};
