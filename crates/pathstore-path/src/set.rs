//! Immutable writes into a JSON tree.
//!
//! Both functions leave the input untouched and return the new tree.

use serde_json::{Map, Value};

use crate::get::{array_index, get_at_mut};
use crate::{PathError, Segment};

/// Returns a copy of `tree` holding `value` at `path`.
///
/// Missing or scalar levels are replaced by a fresh container picked by the
/// segment that addresses into them: an object for a key, an array for an
/// index. Arrays grow with `null` holes up to the written index.
///
/// # Errors
///
/// [`PathError::IndexTooLarge`] when an array would have to grow past
/// `usize::MAX` elements. Indices are not otherwise bounded here; bound
/// them first with [`validate_path`](crate::validate_path).
///
/// # Example
///
/// ```
/// use pathstore_path::{set_at, Segment};
/// use serde_json::json;
///
/// let doc = json!({"a": 1});
/// let path = ["c".into(), "c1".into(), Segment::Index(1), "c3".into()];
/// let next = set_at(&doc, &path, json!("cv")).unwrap();
/// assert_eq!(next, json!({"a": 1, "c": {"c1": [null, {"c3": "cv"}]}}));
/// assert_eq!(doc, json!({"a": 1}));
/// ```
pub fn set_at(tree: &Value, path: &[Segment], value: Value) -> Result<Value, PathError> {
    let mut out = tree.clone();
    assign(&mut out, path, value)?;
    Ok(out)
}

/// Returns a copy of `tree` with the slot at `path` cleared.
///
/// A key is deleted from its object. An array index becomes a `null` hole
/// so sibling indices never shift. Missing intermediates make this a no-op.
/// Clearing the root yields an empty object.
pub fn remove_at(tree: &Value, path: &[Segment]) -> Value {
    let Some((leaf, parent)) = path.split_last() else {
        return Value::Object(Map::new());
    };
    let mut out = tree.clone();
    let Some(container) = get_at_mut(&mut out, parent) else {
        return out;
    };
    match (container, leaf) {
        (Value::Object(map), Segment::Key(key)) => {
            map.shift_remove(key);
        }
        (Value::Object(map), Segment::Index(idx)) => {
            map.shift_remove(&idx.to_string());
        }
        (Value::Array(arr), leaf) => {
            if let Some(slot) = array_index(leaf).and_then(|i| arr.get_mut(i)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
    out
}

fn assign(slot: &mut Value, path: &[Segment], value: Value) -> Result<(), PathError> {
    let Some((head, rest)) = path.split_first() else {
        *slot = value;
        return Ok(());
    };
    prepare_container(slot, head);
    let child = child_slot(slot, head)?;
    assign(child, rest, value)
}

/// Makes `slot` a container that `head` can address into.
fn prepare_container(slot: &mut Value, head: &Segment) {
    let replacement = match (&*slot, head) {
        (Value::Object(_), _) => return,
        (Value::Array(_), head) if array_index(head).is_some() => return,
        (Value::Array(arr), _) => Value::Object(
            arr.iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
        ),
        (_, Segment::Key(_)) => Value::Object(Map::new()),
        (_, Segment::Index(_)) => Value::Array(Vec::new()),
    };
    *slot = replacement;
}

fn child_slot<'a>(container: &'a mut Value, head: &Segment) -> Result<&'a mut Value, PathError> {
    match container {
        Value::Object(map) => Ok(map.entry(head.as_key()).or_insert(Value::Null)),
        Value::Array(arr) => {
            let Some(idx) = array_index(head) else {
                unreachable!("prepare_container turns key-addressed arrays into objects");
            };
            let len = idx.checked_add(1).ok_or(PathError::IndexTooLarge {
                index: idx,
                max: usize::MAX - 1,
            })?;
            if len > arr.len() {
                arr.resize(len, Value::Null);
            }
            Ok(&mut arr[idx])
        }
        _ => unreachable!("prepare_container always leaves a container"),
    }
}
