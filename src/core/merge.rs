//! Path-aware deep merge of JSON mappings
//!
//! Used to combine user-supplied metadata with collected metadata. Nested
//! objects are merged key by key; everything else is replaced. Override
//! paths force a full replacement at a specific location even when both
//! sides are objects.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

/// A sequence of keys from the root of a mapping.
pub type KeyPath = Vec<String>;

/// Which merge argument was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSide {
    Into,
    From,
}

impl std::fmt::Display for MergeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeSide::Into => write!(f, "merge_into"),
            MergeSide::From => write!(f, "merge_from"),
        }
    }
}

/// Errors that can occur when merging
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("{side} must be a mapping")]
    InvalidArgument { side: MergeSide },
}

/// Build a [`KeyPath`] from string slices.
pub fn key_path(keys: &[&str]) -> KeyPath {
    keys.iter().map(|k| k.to_string()).collect()
}

/// Merge `from` into `into`, honoring `override_paths`.
///
/// `current_path` is the location of `into` relative to the root. For each
/// key in `from`, the value replaces the one in `into` when its full path is
/// an override path, when either side is not an object, or when `into` has
/// no value for it. Otherwise the two objects are merged recursively. Keys
/// only present in `into` are left untouched.
pub fn merge_with_paths<'a>(
    into: &'a mut Value,
    from: &Value,
    current_path: &[String],
    override_paths: &HashSet<KeyPath>,
) -> Result<&'a mut Value, MergeError> {
    if !into.is_object() {
        return Err(MergeError::InvalidArgument {
            side: MergeSide::Into,
        });
    }
    let from_map = from.as_object().ok_or(MergeError::InvalidArgument {
        side: MergeSide::From,
    })?;

    let mut path = current_path.to_vec();
    merge_objects(into, from_map, &mut path, override_paths);
    Ok(into)
}

/// Merge with override paths, starting at the root.
pub fn merge<'a>(
    into: &'a mut Value,
    from: &Value,
    override_paths: &HashSet<KeyPath>,
) -> Result<&'a mut Value, MergeError> {
    merge_with_paths(into, from, &[], override_paths)
}

/// Plain recursive merge: `from` wins on every non-object conflict.
///
/// ```
/// use serde_json::json;
/// use gitstamp::core::merge::merge_dicts;
///
/// let mut into = json!({"a": 1, "b": {"c": 2}});
/// merge_dicts(&mut into, &json!({"b": {"d": 3}, "e": 4})).unwrap();
/// assert_eq!(into, json!({"a": 1, "b": {"c": 2, "d": 3}, "e": 4}));
/// ```
pub fn merge_dicts<'a>(into: &'a mut Value, from: &Value) -> Result<&'a mut Value, MergeError> {
    merge(into, from, &HashSet::new())
}

// Both sides have already been checked to be objects.
fn merge_objects(
    into: &mut Value,
    from: &serde_json::Map<String, Value>,
    path: &mut KeyPath,
    override_paths: &HashSet<KeyPath>,
) {
    let Some(into_map) = into.as_object_mut() else {
        return;
    };

    for (key, from_value) in from {
        path.push(key.clone());

        let recurse = from_value.is_object()
            && into_map.get(key).is_some_and(Value::is_object)
            && !override_paths.contains(path.as_slice());

        if recurse {
            if let (Some(into_value), Some(from_child)) =
                (into_map.get_mut(key), from_value.as_object())
            {
                merge_objects(into_value, from_child, path, override_paths);
            }
        } else {
            into_map.insert(key.clone(), from_value.clone());
        }

        path.pop();
    }
}
