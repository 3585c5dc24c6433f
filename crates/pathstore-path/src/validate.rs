//! Limits on paths and pointer text.

use thiserror::Error;

use crate::get::array_index;
use crate::Path;

/// Longest pointer string accepted, in bytes.
pub const MAX_POINTER_LENGTH: usize = 1024;

/// Default depth limit for store paths.
pub const MAX_PATH_LENGTH: usize = 256;

/// Default upper bound for array positions addressed by a path.
pub const MAX_ARRAY_INDEX: usize = 1 << 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path segment: {0}")]
    InvalidSegment(String),
    #[error("pointer must be empty or start with '/'")]
    PointerInvalid,
    #[error("pointer longer than 1024 bytes")]
    PointerTooLong,
    #[error("path depth {depth} exceeds limit {max}")]
    PathTooLong { depth: usize, max: usize },
    #[error("array index {index} exceeds limit {max}")]
    IndexTooLarge { index: usize, max: usize },
}

/// Checks pointer text before it is split into tokens. The empty string
/// is the root.
///
/// ```
/// use pathstore_path::{validate_pointer, PathError};
///
/// assert!(validate_pointer("").is_ok());
/// assert!(validate_pointer("/todos/0").is_ok());
/// assert_eq!(validate_pointer("todos"), Err(PathError::PointerInvalid));
/// ```
pub fn validate_pointer(pointer: &str) -> Result<(), PathError> {
    match pointer {
        "" => Ok(()),
        p if !p.starts_with('/') => Err(PathError::PointerInvalid),
        p if p.len() > MAX_POINTER_LENGTH => Err(PathError::PointerTooLong),
        _ => Ok(()),
    }
}

/// Checks a path against a depth limit and an array-index limit.
///
/// Every [`Segment::Index`](crate::Segment::Index) counts against `max_index`, and so does a key
/// that is a canonical decimal, since it addresses the same array slot.
///
/// # Errors
///
/// - [`PathError::PathTooLong`] when the path has more than `max_depth`
///   segments
/// - [`PathError::IndexTooLarge`] for the first position above `max_index`
///
/// ```
/// use pathstore_path::{validate_path, Path, PathError, Segment};
///
/// let path = Path::new(vec!["rows".into(), Segment::Index(7)]);
/// assert!(validate_path(&path, 2, 10).is_ok());
/// assert_eq!(
///     validate_path(&path, 2, 5),
///     Err(PathError::IndexTooLarge { index: 7, max: 5 })
/// );
/// ```
pub fn validate_path(path: &Path, max_depth: usize, max_index: usize) -> Result<(), PathError> {
    if path.len() > max_depth {
        return Err(PathError::PathTooLong {
            depth: path.len(),
            max: max_depth,
        });
    }
    match path.segments().iter().filter_map(array_index).find(|&i| i > max_index) {
        Some(index) => Err(PathError::IndexTooLarge {
            index,
            max: max_index,
        }),
        None => Ok(()),
    }
}
