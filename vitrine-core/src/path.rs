//! Dotted-path addressing into JSON content trees.
//!
//! A path like `section2.expertisePoints.0` names one location inside a
//! nested tree: each segment is a mapping key or a decimal sequence index.
//! Paths are how editable fields read their current value and how the
//! store persists a single-field update.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("array index out of bounds: {index} in path {path}")]
    IndexOutOfBounds { index: usize, path: String },

    #[error("invalid path segment: {segment} in path {path}")]
    InvalidSegment { segment: String, path: String },

    #[error("cannot descend into non-container at {segment} in path {path}")]
    NotAContainer { segment: String, path: String },
}

/// A parsed dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath {
    raw: String,
    segments: Vec<String>,
}

impl ContentPath {
    /// Split a dotted string into segments. Empty segments are discarded,
    /// so `"a..b"` addresses the same location as `"a.b"`.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            raw: path.to_string(),
            segments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolve the value at this path, or `None` if any segment is absent.
    ///
    /// Numeric segments index arrays; against a mapping they fall back to a
    /// plain key lookup, which is what makes reads tolerant of the sparse
    /// array encoding.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at this path, creating missing intermediates.
    ///
    /// A missing intermediate always becomes a mapping, even for a numeric
    /// segment; that is where the numeric-keyed sparse array encoding
    /// originates when a single array element is updated in a document
    /// that never stored the array. Numeric segments on an existing array
    /// index into it, growing the array with nulls as needed.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), PathError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(PathError::Empty);
        };

        let mut current = root;
        for segment in parents {
            current = descend_or_create(current, segment);
        }
        assign(current, last, value);
        Ok(())
    }

    /// Write `value` at this path without creating anything: every
    /// intermediate must exist, array indices must be in bounds, and
    /// mapping keys must already be present. Used for whole-document
    /// read-modify-write updates where silently growing the tree would
    /// corrupt its array typing.
    pub fn set_strict(&self, root: &mut Value, value: Value) -> Result<(), PathError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(PathError::Empty);
        };

        let mut current = root;
        for segment in parents {
            current = self.descend_strict(current, segment)?;
        }

        match current {
            Value::Array(items) => {
                let index = last.parse::<usize>().map_err(|_| PathError::InvalidSegment {
                    segment: last.clone(),
                    path: self.raw.clone(),
                })?;
                let slot = items.get_mut(index).ok_or(PathError::IndexOutOfBounds {
                    index,
                    path: self.raw.clone(),
                })?;
                *slot = value;
            }
            Value::Object(map) => {
                if !map.contains_key(last) {
                    return Err(PathError::InvalidSegment {
                        segment: last.clone(),
                        path: self.raw.clone(),
                    });
                }
                map.insert(last.clone(), value);
            }
            _ => {
                return Err(PathError::NotAContainer {
                    segment: last.clone(),
                    path: self.raw.clone(),
                })
            }
        }
        Ok(())
    }

    fn descend_strict<'a>(
        &self,
        current: &'a mut Value,
        segment: &str,
    ) -> Result<&'a mut Value, PathError> {
        match current {
            Value::Array(items) => {
                let index = segment.parse::<usize>().map_err(|_| PathError::InvalidSegment {
                    segment: segment.to_string(),
                    path: self.raw.clone(),
                })?;
                items.get_mut(index).ok_or(PathError::IndexOutOfBounds {
                    index,
                    path: self.raw.clone(),
                })
            }
            Value::Object(map) => map.get_mut(segment).ok_or_else(|| PathError::InvalidSegment {
                segment: segment.to_string(),
                path: self.raw.clone(),
            }),
            _ => Err(PathError::NotAContainer {
                segment: segment.to_string(),
                path: self.raw.clone(),
            }),
        }
    }
}

fn descend_or_create<'a>(current: &'a mut Value, segment: &str) -> &'a mut Value {
    // Arrays accept numeric segments in place; anything else is rebuilt as
    // a mapping keyed by the segment text.
    let index = segment.parse::<usize>().ok();
    if current.is_array() {
        if let Some(index) = index {
            return match current {
                Value::Array(items) => {
                    if items.len() <= index {
                        items.resize(index + 1, Value::Null);
                    }
                    let slot = &mut items[index];
                    if !slot.is_object() && !slot.is_array() {
                        *slot = Value::Object(Map::new());
                    }
                    slot
                }
                other => other,
            };
        }
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            let entry = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() && !entry.is_array() {
                *entry = Value::Object(Map::new());
            }
            entry
        }
        other => other,
    }
}

fn assign(target: &mut Value, segment: &str, value: Value) {
    if let Value::Array(items) = target {
        if let Ok(index) = segment.parse::<usize>() {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
            return;
        }
    }

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Some(map) = target.as_object_mut() {
        map.insert(segment.to_string(), value);
    }
}
