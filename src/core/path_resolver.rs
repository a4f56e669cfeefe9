// src/core/path_resolver.rs

//! Parses path strings such as `myTable.mySubTable[2]` into key sequences and
//! walks (or builds) the chain of nested tables they describe.

use crate::models::{Key, Table, Value, render_path};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    // An identifier followed by zero or more `[..]` suffixes. Dots are split beforehand.
    static ref SEGMENT_RE: Regex =
        Regex::new(r"^([^\.\[\]]+)((?:\[[^\[\]]+\])*)$").expect("segment regex is valid");
    static ref BRACKET_RE: Regex = Regex::new(r"\[([^\[\]]+)\]").expect("bracket regex is valid");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path '{path}': {reason}.")]
    InvalidPath { path: String, reason: String },
    #[error("Cannot index into '{path}': expected a table but found a {found}.")]
    TypeMismatch { path: String, found: &'static str },
}

pub type PathResult<T> = Result<T, PathError>;

/// How [`resolve`] treats missing intermediate containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Missing containers are created as empty tables. Used for writes.
    Create,
    /// The walk stops at the first missing container and nothing is mutated.
    Lookup,
}

/// Splits a path string into its keys.
///
/// Grammar: `segment ("." segment)*`, `segment := identifier bracket*`,
/// `bracket := "[" (integer | bareword) "]"`. There is no escaping.
pub fn parse_path(path: &str) -> PathResult<Vec<Key>> {
    if path.is_empty() {
        return Err(invalid(path, "path is empty"));
    }

    let mut keys = Vec::new();
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(invalid(path, "empty segment"));
        }
        let caps = SEGMENT_RE
            .captures(segment)
            .ok_or_else(|| invalid(path, &diagnose_segment(segment)))?;

        let ident = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        keys.push(Key::Name(ident.to_string()));

        if let Some(suffixes) = caps.get(2) {
            for bracket in BRACKET_RE.captures_iter(suffixes.as_str()) {
                let content = bracket.get(1).map(|m| m.as_str()).unwrap_or_default();
                keys.push(parse_index(content));
            }
        }
    }
    Ok(keys)
}

fn parse_index(content: &str) -> Key {
    match content.parse::<i64>() {
        Ok(i) => Key::Index(i),
        Err(_) => Key::Name(content.to_string()),
    }
}

fn diagnose_segment(segment: &str) -> String {
    let opens = segment.matches('[').count();
    let closes = segment.matches(']').count();
    if segment.starts_with('[') {
        format!("segment '{}' has no identifier before its index", segment)
    } else if opens != closes {
        format!("unbalanced brackets in segment '{}'", segment)
    } else if segment.contains("[]") {
        format!("empty index in segment '{}'", segment)
    } else {
        format!("malformed bracket syntax in segment '{}'", segment)
    }
}

fn invalid(path: &str, reason: &str) -> PathError {
    PathError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Walks `keys` from `root` down to the second-to-last key and returns the
/// container holding the final key, together with that key.
///
/// A scalar in the way is a [`PathError::TypeMismatch`] in both modes, so a
/// read and a write of the same path fail the same way. It is never
/// overwritten. A missing intermediate yields `Ok(None)` in [`Mode::Lookup`]
/// and is materialized in [`Mode::Create`].
pub fn resolve(root: &Table, keys: &[Key], mode: Mode) -> PathResult<Option<(Table, Key)>> {
    let Some((last, parents)) = keys.split_last() else {
        return Err(invalid("", "path is empty"));
    };

    let mut current = root.clone();
    for (depth, key) in parents.iter().enumerate() {
        let next = match current.get(key) {
            Some(Value::Table(t)) => t,
            Some(other) => {
                let walked = keys.get(..=depth).unwrap_or(keys);
                return Err(PathError::TypeMismatch {
                    path: render_path(walked),
                    found: other.type_name(),
                });
            }
            None => match mode {
                Mode::Lookup => return Ok(None),
                Mode::Create => {
                    let created = Table::new();
                    current.insert(key.clone(), Value::Table(created.clone()));
                    log::debug!(
                        "Materialized missing table at '{}'.",
                        render_path(keys.get(..=depth).unwrap_or(keys))
                    );
                    created
                }
            },
        };
        current = next;
    }
    Ok(Some((current, last.clone())))
}

/// Writes `value` at `keys` below `root`, creating intermediate tables.
pub fn set_keys(root: &Table, keys: &[Key], value: Value) -> PathResult<()> {
    if let Some((container, key)) = resolve(root, keys, Mode::Create)? {
        container.insert(key, value);
    }
    Ok(())
}

/// Reads the value at `keys` below `root` without mutating anything.
pub fn get_keys(root: &Table, keys: &[Key]) -> PathResult<Option<Value>> {
    Ok(resolve(root, keys, Mode::Lookup)?.and_then(|(container, key)| container.get(&key)))
}

/// Parses `path` and writes `value` there, creating intermediate tables.
pub fn set_path(root: &Table, path: &str, value: Value) -> PathResult<()> {
    set_keys(root, &parse_path(path)?, value)
}

/// Parses `path` and reads the value stored there.
pub fn get_path(root: &Table, path: &str) -> PathResult<Option<Value>> {
    get_keys(root, &parse_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_and_bracketed_segments() {
        let keys = parse_path("myTable.mySubTable[2]").unwrap();
        assert_eq!(
            keys,
            vec![Key::from("myTable"), Key::from("mySubTable"), Key::Index(2)]
        );

        let keys = parse_path("a[1][name].b").unwrap();
        assert_eq!(
            keys,
            vec![Key::from("a"), Key::Index(1), Key::from("name"), Key::from("b")]
        );
    }

    #[test]
    fn test_parse_negative_index_is_numeric() {
        assert_eq!(
            parse_path("a[-3]").unwrap(),
            vec![Key::from("a"), Key::Index(-3)]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        for bad in ["", "a..b", ".a", "a.", "a[", "a]", "a[]", "[1]", "a[1]b", "a[[1]]"] {
            let err = parse_path(bad).unwrap_err();
            assert!(
                matches!(err, PathError::InvalidPath { .. }),
                "'{}' should be invalid, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_create_mode_only_creates_missing_containers() {
        let root = Table::new();
        let existing = Table::new();
        existing.insert("keep".into(), Value::from(1));
        root.insert("a".into(), Value::Table(existing.clone()));

        let keys = parse_path("a.b.c.leaf").unwrap();
        let (container, key) = resolve(&root, &keys, Mode::Create).unwrap().unwrap();
        assert_eq!(key, Key::from("leaf"));

        let a = root.get_table(&"a".into()).unwrap();
        assert!(a.ptr_eq(&existing));
        assert_eq!(a.get(&"keep".into()), Some(Value::from(1)));
        let c = a
            .get_table(&"b".into())
            .and_then(|b| b.get_table(&"c".into()))
            .unwrap();
        assert!(c.ptr_eq(&container));
        assert!(c.is_empty());
    }

    #[test]
    fn test_lookup_mode_never_mutates() {
        let root = Table::new();
        let keys = parse_path("a.b.c").unwrap();
        assert!(resolve(&root, &keys, Mode::Lookup).unwrap().is_none());
        assert!(root.is_empty());
    }

    #[test]
    fn test_create_mode_refuses_to_overwrite_scalar() {
        let root = Table::new();
        set_path(&root, "a.b", Value::from("scalar")).unwrap();

        let err = set_path(&root, "a.b.c", Value::from(1)).unwrap_err();
        assert_eq!(
            err,
            PathError::TypeMismatch {
                path: "a.b".to_string(),
                found: "string"
            }
        );
        assert_eq!(get_path(&root, "a.b").unwrap(), Some(Value::from("scalar")));
    }

    #[test]
    fn test_lookup_mode_reports_scalar_mid_path() {
        let root = Table::new();
        set_path(&root, "a.b", Value::from("scalar")).unwrap();

        let keys = parse_path("a.b.c").unwrap();
        let err = resolve(&root, &keys, Mode::Lookup).unwrap_err();
        assert_eq!(
            err,
            PathError::TypeMismatch {
                path: "a.b".to_string(),
                found: "string"
            }
        );
        assert_eq!(get_path(&root, "a.b.c"), Err(err));
        assert_eq!(get_path(&root, "a.x.c").unwrap(), None);
        assert_eq!(get_path(&root, "a.b").unwrap(), Some(Value::from("scalar")));
    }

    #[test]
    fn test_set_then_get_round_trip_with_indices() {
        let root = Table::new();
        set_path(&root, "frames[3].anchor.x", Value::from(12.5)).unwrap();
        assert_eq!(
            get_path(&root, "frames[3].anchor.x").unwrap(),
            Some(Value::from(12.5))
        );
        let frames = root.get_table(&"frames".into()).unwrap();
        assert!(frames.get_table(&Key::Index(3)).is_some());
    }
}
