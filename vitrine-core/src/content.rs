//! Override merge and list normalization over JSON content trees.
//!
//! The remote document store persists single-field edits by dotted path,
//! which means an edit to one element of an array frequently lands as a
//! mapping with decimal-digit keys (`{"1": "new"}`) instead of an array.
//! Everything in this module exists to reconcile that dual encoding:
//! [`merge_content`] layers a partial override tree onto a base tree, and
//! [`to_array`] turns either encoding into one ordered sequence before any
//! rendering code touches the data.
//!
//! Both functions are total. Unrecognized shapes degrade to "keep base" or
//! "replace with override", never to an error, so a malformed override can
//! at worst render a stale or empty section.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// Normalize a value that may be stored as a native array or as a
/// numeric-keyed mapping into one ordered sequence.
///
/// Mappings are sorted with a numeric-aware, case-insensitive key
/// comparator, so `{"2": c, "0": a, "10": k}` comes back in index order.
/// Anything that is neither an array nor a mapping (including an absent
/// value) yields an empty vector; callers treat that as "nothing to
/// render".
pub fn to_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));
            entries.into_iter().map(|(_, v)| v.clone()).collect()
        }
        _ => Vec::new(),
    }
}

/// Merge a partial override tree onto a base tree.
///
/// `None` means "no override here" and yields the base unchanged; an
/// explicit `Value::Null` override clears the field. The cases, in
/// priority order:
///
/// 1. absent override: base is kept;
/// 2. null override: null;
/// 3. array override: merged element-by-element onto the base array (or
///    an empty one), preserving base elements past the override's length;
/// 4. mapping override: if every key is a decimal-digit string (and there
///    is at least one), or the base is an array, the mapping is treated as
///    sparse array-index edits; otherwise it merges key-by-key;
/// 5. any other override replaces base outright.
pub fn merge_content(base: &Value, override_value: Option<&Value>) -> Value {
    let Some(override_value) = override_value else {
        return base.clone();
    };

    match override_value {
        Value::Null => Value::Null,
        Value::Array(items) => {
            let mut result = base_as_array(base);
            if result.len() < items.len() {
                result.resize(items.len(), Value::Null);
            }
            for (index, item) in items.iter().enumerate() {
                result[index] = merge_content(&result[index], Some(item));
            }
            Value::Array(result)
        }
        Value::Object(map) => {
            let sparse_array = !map.is_empty() && map.keys().all(|key| is_numeric_key(key));
            if sparse_array || base.is_array() {
                merge_sparse_array(base, map)
            } else {
                merge_mapping(base, map)
            }
        }
        primitive => primitive.clone(),
    }
}

/// Apply numeric-keyed edits onto a base array, growing it as needed.
/// Keys that do not parse as indices are dropped rather than failing the
/// whole merge.
fn merge_sparse_array(base: &Value, edits: &Map<String, Value>) -> Value {
    let mut result = base_as_array(base);
    for (key, value) in edits {
        let Ok(index) = key.parse::<usize>() else {
            continue;
        };
        if result.len() <= index {
            result.resize(index + 1, Value::Null);
        }
        result[index] = merge_content(&result[index], Some(value));
    }
    Value::Array(result)
}

fn merge_mapping(base: &Value, edits: &Map<String, Value>) -> Value {
    let mut result = match base {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in edits {
        // A key absent from the base behaves like a null base: every merge
        // case treats the two identically.
        let prior = result.get(key).cloned().unwrap_or(Value::Null);
        result.insert(key.clone(), merge_content(&prior, Some(value)));
    }
    Value::Object(result)
}

fn base_as_array(base: &Value) -> Vec<Value> {
    match base {
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric-aware, case-insensitive key ordering for [`to_array`].
///
/// Every numeric key orders before every non-numeric one, so the
/// comparator stays a total order even when a mapping mixes both kinds
/// (mixing numeric-vs-string comparison per pair would be cyclic).
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ContentPath;
    use serde_json::json;

    #[test]
    fn absent_override_keeps_base() {
        let base = json!({"hero": {"heading": "Welcome", "points": ["a", "b"]}});
        assert_eq!(merge_content(&base, None), base);
    }

    #[test]
    fn null_override_clears_field_distinct_from_absent() {
        let base = json!({"tagline": "hello"});
        let cleared = merge_content(&base, Some(&json!({"tagline": null})));
        assert_eq!(cleared, json!({"tagline": null}));

        let untouched = merge_content(&base, Some(&json!({})));
        assert_eq!(untouched, base);
    }

    #[test]
    fn primitive_override_replaces_regardless_of_base_shape() {
        let base = json!({"nested": {"deep": true}});
        assert_eq!(
            merge_content(&base, Some(&json!({"nested": "flat"}))),
            json!({"nested": "flat"})
        );
    }

    #[test]
    fn sparse_numeric_mapping_edits_array_indices() {
        let base = json!(["a", "b", "c"]);
        let merged = merge_content(&base, Some(&json!({"1": "X"})));
        assert_eq!(merged, json!(["a", "X", "c"]));
    }

    #[test]
    fn sparse_mapping_grows_array_beyond_base_length() {
        let base = json!(["a"]);
        let merged = merge_content(&base, Some(&json!({"3": "d"})));
        assert_eq!(merged, json!(["a", null, null, "d"]));
    }

    #[test]
    fn sparse_mapping_without_array_base_builds_from_empty() {
        let merged = merge_content(&json!("not an array"), Some(&json!({"1": "b"})));
        assert_eq!(merged, json!([null, "b"]));
    }

    #[test]
    fn shorter_override_array_preserves_base_tail() {
        let base = json!([{"title": "A"}, {"title": "B"}]);
        let merged = merge_content(&base, Some(&json!([{"title": "Z"}])));
        assert_eq!(merged, json!([{"title": "Z"}, {"title": "B"}]));
    }

    #[test]
    fn array_elements_merge_rather_than_clobber() {
        let base = json!([{"title": "A", "body": "keep"}]);
        let merged = merge_content(&base, Some(&json!([{"title": "Z"}])));
        assert_eq!(merged, json!([{"title": "Z", "body": "keep"}]));
    }

    #[test]
    fn sparse_encoding_nested_inside_override_array() {
        // A tab list overridden as a sequence whose element carries a
        // numeric-keyed bullet edit.
        let base = json!([{"label": "tab", "bullets": ["one", "two"]}]);
        let merged = merge_content(&base, Some(&json!([{"bullets": {"0": "new bullet"}}])));
        assert_eq!(
            merged,
            json!([{"label": "tab", "bullets": ["new bullet", "two"]}])
        );
    }

    #[test]
    fn non_numeric_keys_on_array_base_are_dropped() {
        let base = json!(["a", "b"]);
        let merged = merge_content(&base, Some(&json!({"0": "x", "oops": "y"})));
        assert_eq!(merged, json!(["x", "b"]));
    }

    #[test]
    fn mapping_merge_recurses_and_adds_new_keys() {
        let base = json!({"section": {"title": "old", "summary": "keep"}});
        let merged = merge_content(
            &base,
            Some(&json!({"section": {"title": "new"}, "extra": 7})),
        );
        assert_eq!(
            merged,
            json!({"section": {"title": "new", "summary": "keep"}, "extra": 7})
        );
    }

    #[test]
    fn merge_is_idempotent_under_absent_override() {
        let base = json!({"a": [1, 2], "b": {"c": true}});
        let once = merge_content(&base, Some(&json!({"a": {"1": 9}})));
        assert_eq!(merge_content(&once, None), once);
    }

    #[test]
    fn merged_output_round_trips_through_path_reads() {
        let base = json!({
            "section2": {"title": "old", "expertisePoints": ["p", "q", "r"]}
        });
        let override_value = json!({
            "section2": {"title": "New Title", "expertisePoints": {"2": "z"}}
        });
        let merged = merge_content(&base, Some(&override_value));

        let title = ContentPath::parse("section2.title").get(&merged);
        assert_eq!(title, Some(&json!("New Title")));
        let point = ContentPath::parse("section2.expertisePoints.2").get(&merged);
        assert_eq!(point, Some(&json!("z")));
        let untouched = ContentPath::parse("section2.expertisePoints.0").get(&merged);
        assert_eq!(untouched, Some(&json!("p")));
    }

    #[test]
    fn to_array_sorts_numeric_keys_regardless_of_insertion_order() {
        let value = json!({"2": "c", "0": "a", "1": "b"});
        assert_eq!(to_array(Some(&value)), vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn to_array_sorts_ten_after_two() {
        let value = json!({"10": "k", "2": "c"});
        assert_eq!(to_array(Some(&value)), vec![json!("c"), json!("k")]);
    }

    #[test]
    fn to_array_orders_mixed_keys_deterministically() {
        // "2" vs "10" is numeric, "10" vs "1a" is lexical; the comparator
        // must still agree with itself across all pairs.
        let value = json!({"1a": "s", "10": "k", "2": "c"});
        assert_eq!(
            to_array(Some(&value)),
            vec![json!("c"), json!("k"), json!("s")]
        );

        // Larger mixed maps must sort without tripping the standard
        // library's total-order check.
        let mut map = Map::new();
        for i in 0..40 {
            map.insert(i.to_string(), json!(i));
        }
        for i in 0..40 {
            map.insert(format!("{i}a"), json!(format!("{i}a")));
        }
        let sorted = to_array(Some(&Value::Object(map)));
        assert_eq!(sorted.len(), 80);
        assert_eq!(sorted[0], json!(0));
        assert_eq!(sorted[39], json!(39));
        assert_eq!(sorted[40], json!("0a"));
    }

    #[test]
    fn to_array_passes_arrays_through() {
        let value = json!(["x", "y"]);
        assert_eq!(to_array(Some(&value)), vec![json!("x"), json!("y")]);
    }

    #[test]
    fn to_array_degrades_to_empty_for_everything_else() {
        assert!(to_array(None).is_empty());
        assert!(to_array(Some(&Value::Null)).is_empty());
        assert!(to_array(Some(&json!("x"))).is_empty());
        assert!(to_array(Some(&json!(42))).is_empty());
    }
}
