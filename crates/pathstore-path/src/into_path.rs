//! Conversions from loosely typed inputs into a validated [`Path`].

use serde_json::Value;

use crate::validate::validate_pointer;
use crate::{unescape_component, Path, PathError, Segment};

impl Path {
    /// Parse a JSON pointer. Canonical decimal tokens become indices.
    ///
    /// # Example
    ///
    /// ```
    /// use pathstore_path::{Path, Segment};
    ///
    /// let path = Path::parse_pointer("/e/1/a~1b").unwrap();
    /// assert_eq!(path.segments(), &["e".into(), Segment::Index(1), "a/b".into()]);
    /// assert!(Path::parse_pointer("").unwrap().is_root());
    /// ```
    pub fn parse_pointer(pointer: &str) -> Result<Path, PathError> {
        validate_pointer(pointer)?;
        if pointer.is_empty() {
            return Ok(Path::root());
        }
        Ok(pointer[1..]
            .split('/')
            .map(|token| Segment::from_token(&unescape_component(token)))
            .collect())
    }

    /// Build a path from a JSON array of strings and non-negative integers.
    ///
    /// # Errors
    ///
    /// [`PathError::InvalidSegment`] for anything that is not an array, and
    /// for elements that are floats, negative numbers, booleans, nulls or
    /// containers.
    pub fn from_json(value: &Value) -> Result<Path, PathError> {
        let Value::Array(items) = value else {
            return Err(PathError::InvalidSegment(value.to_string()));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(key) => Ok(Segment::Key(key.clone())),
                Value::Number(n) => n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .map(Segment::Index)
                    .ok_or_else(|| PathError::InvalidSegment(n.to_string())),
                other => Err(PathError::InvalidSegment(other.to_string())),
            })
            .collect()
    }
}

/// Anything a store operation accepts as a path.
pub trait IntoPath {
    fn into_path(self) -> Result<Path, PathError>;
}

impl IntoPath for Path {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(self.clone())
    }
}

impl IntoPath for Vec<Segment> {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::new(self))
    }
}

impl IntoPath for &[Segment] {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::from(self))
    }
}

impl<const N: usize> IntoPath for [Segment; N] {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::new(self.into()))
    }
}

/// Key-only paths, e.g. `["user", "name"]`.
impl<const N: usize> IntoPath for [&str; N] {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(self.into_iter().map(Segment::from).collect())
    }
}

/// JSON pointer syntax, e.g. `"/todos/0/title"`.
impl IntoPath for &str {
    fn into_path(self) -> Result<Path, PathError> {
        Path::parse_pointer(self)
    }
}

/// JSON array syntax, e.g. `json!(["todos", 0, "title"])`.
impl IntoPath for &Value {
    fn into_path(self) -> Result<Path, PathError> {
        Path::from_json(self)
    }
}

impl IntoPath for Value {
    fn into_path(self) -> Result<Path, PathError> {
        Path::from_json(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_mixed_segments() {
        let path = Path::from_json(&json!(["a", 0, "b"])).unwrap();
        assert_eq!(
            path.segments(),
            &["a".into(), Segment::Index(0), "b".into()]
        );
    }

    #[test]
    fn test_from_json_rejects_bad_segments() {
        for bad in [json!([-1]), json!([1.5]), json!([true]), json!([null]), json!([{}])] {
            assert!(
                matches!(Path::from_json(&bad), Err(PathError::InvalidSegment(_))),
                "{bad} should be rejected"
            );
        }
        assert!(Path::from_json(&json!("a")).is_err());
    }

    #[test]
    fn test_pointer_requires_leading_slash() {
        assert_eq!("a/b".into_path(), Err(PathError::PointerInvalid));
    }

    #[test]
    fn test_pointer_roundtrip_of_mixed_path() {
        let path = Path::new(vec!["x~y".into(), Segment::Index(3)]);
        assert_eq!(Path::parse_pointer(&path.to_pointer()).unwrap(), path);
    }

    #[test]
    fn test_key_array() {
        let path = ["a", "b"].into_path().unwrap();
        assert_eq!(path.to_string(), "a.b");
    }
}
