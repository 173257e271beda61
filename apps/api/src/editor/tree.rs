//! A small interpreter that applies edit paths to a JSON tree.
//!
//! Rules:
//! - Missing or `null` nodes along the path are created (object for a key
//!   segment, array for an index segment).
//! - An index equal to the array length appends; anything beyond is rejected so
//!   arrays never get holes. A freshly created array only accepts index 0.
//! - A key segment on an array, an index on an object, or descending into a
//!   scalar is a type mismatch.
//! - A rejected edit leaves the tree exactly as it was.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::editor::path::PathSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    Applied,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditRejection {
    #[error("index {index} is out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("segment '{segment}' cannot address a {found}")]
    TypeMismatch { segment: String, found: String },

    #[error("no array at the addressed path")]
    NotAnArray,

    #[error("no item with id '{id}'")]
    ItemNotFound { id: String },
}

/// Assigns `value` at `path`, creating intermediate containers as needed.
pub fn assign(root: &mut Value, path: &[PathSegment], value: Value) -> Result<Change, EditRejection> {
    let Some((head, rest)) = path.split_first() else {
        if *root == value {
            return Ok(Change::Unchanged);
        }
        *root = value;
        return Ok(Change::Applied);
    };

    if root.is_null() {
        check_fresh(path)?;
        *root = build_fresh(path, value);
        return Ok(Change::Applied);
    }

    match (head, root) {
        (PathSegment::Key(key), Value::Object(map)) => {
            if let Some(child) = map.get_mut(key) {
                return assign(child, rest, value);
            }
            check_fresh(rest)?;
            map.insert(key.clone(), build_fresh(rest, value));
            Ok(Change::Applied)
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            let len = items.len();
            if *index < len {
                assign(&mut items[*index], rest, value)
            } else if *index == len {
                check_fresh(rest)?;
                items.push(build_fresh(rest, value));
                Ok(Change::Applied)
            } else {
                Err(EditRejection::IndexOutOfBounds { index: *index, len })
            }
        }
        (segment, other) => Err(EditRejection::TypeMismatch {
            segment: segment.to_string(),
            found: kind_of(other).to_string(),
        }),
    }
}

/// Looks up the node at `path`, if every segment resolves.
pub fn lookup<'a>(root: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| match (segment, node) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key),
        (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
        _ => None,
    })
}

/// Appends `item` to the array at `path`, creating the array when absent.
/// Object items without an `id` receive a fresh one.
pub fn push_item(root: &mut Value, path: &[PathSegment], item: Value) -> Result<String, EditRejection> {
    let (item, id) = with_item_id(item);

    let existing_len = match lookup(root, path) {
        Some(Value::Array(items)) => Some(items.len()),
        None | Some(Value::Null) => None,
        Some(_) => return Err(EditRejection::NotAnArray),
    };

    match existing_len {
        Some(len) => {
            let mut target = path.to_vec();
            target.push(PathSegment::Index(len));
            assign(root, &target, item)?;
        }
        None => {
            assign(root, path, Value::Array(vec![item]))?;
        }
    }

    Ok(id)
}

/// Removes the element of the array at `path` whose `id` equals `id`.
pub fn remove_item(root: &mut Value, path: &[PathSegment], id: &str) -> Result<Change, EditRejection> {
    let items = lookup_mut(root, path)
        .and_then(Value::as_array_mut)
        .ok_or(EditRejection::NotAnArray)?;

    let position = items
        .iter()
        .position(|item| item.get("id").and_then(Value::as_str) == Some(id))
        .ok_or_else(|| EditRejection::ItemNotFound { id: id.to_string() })?;

    items.remove(position);
    Ok(Change::Applied)
}

/// Removes the element at `index` of the array at `path`.
pub fn remove_at(root: &mut Value, path: &[PathSegment], index: usize) -> Result<Change, EditRejection> {
    let items = lookup_mut(root, path)
        .and_then(Value::as_array_mut)
        .ok_or(EditRejection::NotAnArray)?;

    if index >= items.len() {
        return Err(EditRejection::IndexOutOfBounds {
            index,
            len: items.len(),
        });
    }
    items.remove(index);
    Ok(Change::Applied)
}

fn lookup_mut<'a>(root: &'a mut Value, path: &[PathSegment]) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |node, segment| match (segment, node) {
        (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key),
        (PathSegment::Index(index), Value::Array(items)) => items.get_mut(*index),
        _ => None,
    })
}

fn with_item_id(item: Value) -> (Value, String) {
    match item {
        Value::Object(mut map) => {
            let id = match map.get("id").and_then(Value::as_str) {
                Some(existing) if !existing.is_empty() => existing.to_string(),
                _ => {
                    let id = Uuid::new_v4().to_string();
                    map.insert("id".to_string(), Value::String(id.clone()));
                    id
                }
            };
            (Value::Object(map), id)
        }
        other => (other, String::new()),
    }
}

/// A path below a node that does not exist yet may only use index 0.
fn check_fresh(path: &[PathSegment]) -> Result<(), EditRejection> {
    for segment in path {
        if let PathSegment::Index(index) = segment {
            if *index != 0 {
                return Err(EditRejection::IndexOutOfBounds {
                    index: *index,
                    len: 0,
                });
            }
        }
    }
    Ok(())
}

fn build_fresh(path: &[PathSegment], value: Value) -> Value {
    path.iter().rev().fold(value, |acc, segment| match segment {
        PathSegment::Key(key) => {
            let mut map = Map::new();
            map.insert(key.clone(), acc);
            Value::Object(map)
        }
        PathSegment::Index(_) => Value::Array(vec![acc]),
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::path::EditPath;
    use proptest::prelude::*;
    use serde_json::json;

    fn set(root: &mut Value, path: &str, value: Value) -> Result<Change, EditRejection> {
        let path = EditPath::parse(path).unwrap();
        assign(root, path.segments(), value)
    }

    #[test]
    fn test_replaces_existing_leaf() {
        let mut doc = json!({ "experience": [{ "position": "Dev" }, { "position": "Lead", "highlights": ["a"] }] });
        assert_eq!(set(&mut doc, "experience.1.highlights.0", json!("b")), Ok(Change::Applied));
        assert_eq!(doc["experience"][1]["highlights"][0], "b");
        assert_eq!(doc["experience"][0]["position"], "Dev");
    }

    #[test]
    fn test_creates_missing_containers() {
        let mut doc = json!({});
        set(&mut doc, "personalInfo.linkedin", json!("in/ada")).unwrap();
        set(&mut doc, "awards.0.title", json!("Turing")).unwrap();
        assert_eq!(doc, json!({ "personalInfo": { "linkedin": "in/ada" }, "awards": [{ "title": "Turing" }] }));
    }

    #[test]
    fn test_null_is_treated_as_absent() {
        let mut doc = json!({ "personalInfo": null });
        set(&mut doc, "personalInfo.fullName", json!("Ada")).unwrap();
        assert_eq!(doc["personalInfo"]["fullName"], "Ada");
    }

    #[test]
    fn test_index_equal_to_len_appends() {
        let mut doc = json!({ "skills": [{ "name": "Rust" }] });
        set(&mut doc, "skills.1.name", json!("Go")).unwrap();
        assert_eq!(doc["skills"].as_array().unwrap().len(), 2);
        assert_eq!(doc["skills"][1]["name"], "Go");
    }

    #[test]
    fn test_index_past_len_is_rejected_without_side_effects() {
        let mut doc = json!({ "skills": [{ "name": "Rust" }] });
        let before = doc.clone();
        assert_eq!(
            set(&mut doc, "skills.3.name", json!("Go")),
            Err(EditRejection::IndexOutOfBounds { index: 3, len: 1 })
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_fresh_array_with_nonzero_index_leaves_no_partial_containers() {
        let mut doc = json!({ "personalInfo": {} });
        let before = doc.clone();
        assert!(set(&mut doc, "projects.2.name", json!("x")).is_err());
        assert!(set(&mut doc, "personalInfo.links.1", json!("x")).is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let mut doc = json!({ "skills": [{ "name": "Rust" }], "personalInfo": { "fullName": "Ada" } });
        let before = doc.clone();
        assert!(matches!(
            set(&mut doc, "skills.name", json!("x")),
            Err(EditRejection::TypeMismatch { .. })
        ));
        assert!(matches!(
            set(&mut doc, "personalInfo.0", json!("x")),
            Err(EditRejection::TypeMismatch { .. })
        ));
        assert!(matches!(
            set(&mut doc, "personalInfo.fullName.first", json!("x")),
            Err(EditRejection::TypeMismatch { .. })
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_same_value_twice_is_unchanged() {
        let mut doc = json!({ "volunteer": [] });
        assert_eq!(set(&mut doc, "volunteer.0.role", json!("Tutor")), Ok(Change::Applied));
        let once = doc.clone();
        assert_eq!(set(&mut doc, "volunteer.0.role", json!("Tutor")), Ok(Change::Unchanged));
        assert_eq!(doc, once);
    }

    #[test]
    fn test_lookup() {
        let doc = json!({ "languages": [{ "language": "French" }] });
        let path = EditPath::parse("languages.0.language").unwrap();
        assert_eq!(lookup(&doc, path.segments()), Some(&json!("French")));
        let missing = EditPath::parse("languages.4.language").unwrap();
        assert_eq!(lookup(&doc, missing.segments()), None);
    }

    #[test]
    fn test_push_item_assigns_id_and_creates_array() {
        let mut doc = json!({});
        let path = EditPath::parse("volunteer").unwrap();
        let id = push_item(&mut doc, path.segments(), json!({ "role": "Tutor" })).unwrap();
        assert!(!id.is_empty());
        assert_eq!(doc["volunteer"][0]["id"], id.as_str());

        let kept = push_item(&mut doc, path.segments(), json!({ "id": "v2" })).unwrap();
        assert_eq!(kept, "v2");
        assert_eq!(doc["volunteer"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_push_item_on_scalar_is_rejected() {
        let mut doc = json!({ "personalInfo": { "fullName": "Ada" } });
        let path = EditPath::parse("personalInfo.fullName").unwrap();
        assert_eq!(
            push_item(&mut doc, path.segments(), json!("x")),
            Err(EditRejection::NotAnArray)
        );
    }

    #[test]
    fn test_remove_item_by_id() {
        let mut doc = json!({ "languages": [{ "id": "a" }, { "id": "b" }, { "id": "c" }] });
        let path = EditPath::parse("languages").unwrap();
        remove_item(&mut doc, path.segments(), "b").unwrap();
        assert_eq!(doc["languages"], json!([{ "id": "a" }, { "id": "c" }]));
        assert_eq!(
            remove_item(&mut doc, path.segments(), "zzz"),
            Err(EditRejection::ItemNotFound { id: "zzz".into() })
        );
    }

    #[test]
    fn test_remove_at_index() {
        let mut doc = json!({ "sections": [{ "data": { "stats": ["10+ years", "3 patents", "40 talks"] } }] });
        let path = EditPath::parse("sections.0.data.stats").unwrap();
        assert_eq!(remove_at(&mut doc, path.segments(), 1), Ok(Change::Applied));
        assert_eq!(doc["sections"][0]["data"]["stats"], json!(["10+ years", "40 talks"]));

        let before = doc.clone();
        assert_eq!(
            remove_at(&mut doc, path.segments(), 2),
            Err(EditRejection::IndexOutOfBounds { index: 2, len: 2 })
        );
        let scalar = EditPath::parse("sections.0.data").unwrap();
        assert_eq!(remove_at(&mut doc, scalar.segments(), 0), Err(EditRejection::NotAnArray));
        assert_eq!(doc, before);
    }

    fn arb_path() -> impl Strategy<Value = String> {
        let segment = prop_oneof![
            Just("experience".to_string()),
            Just("skills".to_string()),
            Just("personalInfo".to_string()),
            Just("name".to_string()),
            Just("highlights".to_string()),
            (0usize..3).prop_map(|i| i.to_string()),
        ];
        prop::collection::vec(segment, 1..5).prop_map(|parts| parts.join("."))
    }

    proptest! {
        #[test]
        fn prop_assign_is_idempotent(path in arb_path(), text in "[a-z ]{0,12}") {
            let mut doc = json!({
                "personalInfo": { "name": "Ada" },
                "experience": [{ "highlights": ["x"] }],
                "skills": []
            });
            let parsed = EditPath::parse(&path).unwrap();
            let first = assign(&mut doc, parsed.segments(), json!(text.clone()));
            let once = doc.clone();
            let second = assign(&mut doc, parsed.segments(), json!(text));
            prop_assert_eq!(&doc, &once);
            if first.is_ok() {
                prop_assert_eq!(second, Ok(Change::Unchanged));
            }
        }
    }
}
