//! Reusable migration step primitives.
//!
//! Each step is a pure function over a [`Document`]: rename tables, field
//! deletion, composite-enum splitting and merging, and helpers for
//! aggregate steps. Steps that presuppose a key raise a [`MigrationError`];
//! the pipeline stops at the first failure and the document is rejected
//! rather than partially migrated.

use std::fmt;

use crate::document::{Document, Mapping, Node};

/// Error type for migration steps
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// A step required a key that the rule presupposes to be present.
    MissingKey { group: String, key: String },
    /// A key was present but held a node of the wrong kind.
    WrongKind {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::MissingKey { group, key } => {
                write!(f, "required key '{}' is missing from group '{}'", key, group)
            }
            MigrationError::WrongKind { key, expected, actual } => {
                write!(f, "key '{}' is a {}, expected a {}", key, actual, expected)
            }
        }
    }
}

impl std::error::Error for MigrationError {}

/// Overwrite the document version with the literal target token.
pub fn bump_version(doc: &mut Document, target: &str) {
    doc.set_version(target);
}

/// Remove deprecated keys from a group; a no-op for keys (or the group)
/// that are absent.
pub fn delete_fields(doc: &mut Document, group: &str, names: &[&str]) {
    if let Some(map) = doc.group_mut(group) {
        for name in names {
            map.shift_remove(*name);
        }
    }
}

/// Apply a rename table to the keys of a group, preserving iteration order
/// and values. Keys not in the table are left unchanged.
pub fn rename_fields(doc: &mut Document, group: &str, table: &[(&str, &str)]) {
    let Some(map) = doc.group_mut(group) else {
        return;
    };

    let renamed: Mapping = map
        .drain(..)
        .map(|(key, value)| {
            let key = table
                .iter()
                .find(|(from, _)| *from == key)
                .map(|(_, to)| (*to).to_string())
                .unwrap_or(key);
            (key, value)
        })
        .collect();
    *map = renamed;
}

/// Split a composite enum value encoding both a quantity and a unit into a
/// canonical quantity field and a unit-code field.
///
/// The unit is recognized by substring containment against a fixed
/// token-to-code table; the first matching token wins. The quantity keeps
/// the composite value minus its `_IN_<TOKEN>` suffix. When no token is
/// contained the step is a no-op, which makes a second application over
/// already-split data safe.
///
/// # Errors
/// The field must be present and hold a string whenever the group exists.
pub fn split_type_unit(
    doc: &mut Document,
    group: &str,
    field: &str,
    unit_field: &str,
    table: &[(&str, &str)],
) -> Result<(), MigrationError> {
    let Some(map) = doc.group_mut(group) else {
        return Ok(());
    };

    let value = match map.get(field) {
        Some(Node::String(s)) => s.clone(),
        Some(other) => {
            return Err(MigrationError::WrongKind {
                key: field.to_string(),
                expected: "string",
                actual: other.kind(),
            })
        }
        None => {
            return Err(MigrationError::MissingKey {
                group: group.to_string(),
                key: field.to_string(),
            })
        }
    };

    for (token, code) in table {
        if value.contains(token) {
            let quantity = value.replace(&format!("_IN_{}", token), "");
            map.insert(field.to_string(), Node::String(quantity));
            map.insert(unit_field.to_string(), Node::String((*code).to_string()));
            return Ok(());
        }
    }
    Ok(())
}

/// Rebuild a composite enum value from a quantity field and a unit-code
/// field, removing the unit field. The reverse of [`split_type_unit`];
/// a no-op when the unit field is absent.
pub fn merge_type_unit(
    doc: &mut Document,
    group: &str,
    field: &str,
    unit_field: &str,
    table: &[(&str, &str)],
) -> Result<(), MigrationError> {
    let Some(map) = doc.group_mut(group) else {
        return Ok(());
    };
    let Some(unit) = map.get(unit_field).cloned() else {
        return Ok(());
    };

    let code = unit.as_str().ok_or_else(|| MigrationError::WrongKind {
        key: unit_field.to_string(),
        expected: "string",
        actual: unit.kind(),
    })?;
    let token = table
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(token, _)| *token)
        .ok_or_else(|| MigrationError::MissingKey {
            group: group.to_string(),
            key: format!("unit code '{}'", code),
        })?;

    let quantity = match map.get(field) {
        Some(Node::String(s)) => s.clone(),
        Some(other) => {
            return Err(MigrationError::WrongKind {
                key: field.to_string(),
                expected: "string",
                actual: other.kind(),
            })
        }
        None => {
            return Err(MigrationError::MissingKey {
                group: group.to_string(),
                key: field.to_string(),
            })
        }
    };

    map.insert(
        field.to_string(),
        Node::String(format!("{}_IN_{}", quantity, token)),
    );
    map.shift_remove(unit_field);
    Ok(())
}

/// Read an integer field from a group mapping, with a default for absent
/// fields. Used by aggregate steps.
pub fn int_field(map: &Mapping, name: &str, default: i64) -> i64 {
    map.get(name).and_then(Node::as_i64).unwrap_or(default)
}

/// Read a float field from a group mapping, with a default for absent
/// fields. Integer nodes are widened.
pub fn float_field(map: &Mapping, name: &str, default: f64) -> f64 {
    map.get(name).and_then(Node::as_f64).unwrap_or(default)
}
