use serde_json::Value;

use crate::{is_valid_index, Segment};

/// Get a value from a JSON tree by path.
///
/// Returns `None` (the absent marker) when any step is missing. An index
/// addressing an object reads its decimal key; a key addressing an array
/// resolves only if it is a canonical decimal index.
///
/// # Example
///
/// ```
/// use pathstore_path::{get_at, Segment};
/// use serde_json::json;
///
/// let doc = json!({"e": ["f", "g", "h"]});
/// assert_eq!(get_at(&doc, &["e".into(), Segment::Index(1)]), Some(&json!("g")));
/// assert_eq!(get_at(&doc, &["e".into(), Segment::Index(4)]), None);
/// assert_eq!(get_at(&doc, &["z".into()]), None);
/// ```
pub fn get_at<'a>(val: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match (current, step) {
            (Value::Object(map), Segment::Key(key)) => map.get(key)?,
            (Value::Object(map), Segment::Index(idx)) => map.get(&idx.to_string())?,
            (Value::Array(arr), step) => arr.get(array_index(step)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a mutable reference to a value in a JSON tree by path.
pub fn get_at_mut<'a>(val: &'a mut Value, path: &[Segment]) -> Option<&'a mut Value> {
    let mut current = val;
    for step in path {
        current = match (current, step) {
            (Value::Object(map), Segment::Key(key)) => map.get_mut(key)?,
            (Value::Object(map), Segment::Index(idx)) => map.get_mut(&idx.to_string())?,
            (Value::Array(arr), step) => arr.get_mut(array_index(step)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Array position addressed by `segment`: an index, or a key that is a
/// canonical decimal.
pub(crate) fn array_index(segment: &Segment) -> Option<usize> {
    match segment {
        Segment::Index(idx) => Some(*idx),
        Segment::Key(key) if is_valid_index(key) => key.parse().ok(),
        Segment::Key(_) => None,
    }
}
