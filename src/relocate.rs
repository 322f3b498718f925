//! Namespace relocation primitives.
//!
//! Moves parameter groups, or selected fields of a group, between the
//! document root and the versioned extension entry nested under
//! `extensions`. Containers are created lazily, later moves merge into
//! existing destinations, and any container emptied by a relocation is
//! deleted rather than left behind as `{}`.

use crate::document::{Document, Mapping, Node, EXTENSIONS_KEY};
use crate::steps::MigrationError;

/// Relocation primitives bound to one named extension entry
/// (e.g. `open-rao-search-tree-parameters`).
#[derive(Debug, Clone)]
pub struct Relocator {
    extension: String,
}

impl Relocator {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Name of the extension entry this relocator targets.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Move a top-level group, or selected fields of it, into
    /// `extensions[<extension>][group]`.
    ///
    /// With `fields = None` the whole group mapping moves and the top-level
    /// key is deleted. With a field list, only the listed keys move, in
    /// listed order, and only if at least one of them is present — so no
    /// empty extension entry is created for untouched groups; the source
    /// group is deleted entirely if the move empties it.
    ///
    /// # Errors
    /// The group and the traversed containers must be mappings.
    pub fn relocate(
        &self,
        doc: &mut Document,
        group: &str,
        fields: Option<&[&str]>,
    ) -> Result<(), MigrationError> {
        check_is_mapping(doc, EXTENSIONS_KEY)?;
        check_is_mapping(doc, group)?;

        match fields {
            None => {
                let Some(Node::Mapping(source)) = doc.remove_group(group) else {
                    return Ok(());
                };
                self.extension_group_mut(doc, group).extend(source);
            }
            Some(names) => {
                let Some(source) = doc.group_mut(group) else {
                    return Ok(());
                };
                if !names.iter().any(|name| source.contains_key(*name)) {
                    return Ok(());
                }

                let mut moved = Mapping::new();
                for name in names {
                    if let Some(value) = source.shift_remove(*name) {
                        moved.insert((*name).to_string(), value);
                    }
                }
                let emptied = source.is_empty();

                self.extension_group_mut(doc, group).extend(moved);
                if emptied {
                    doc.remove_group(group);
                }
            }
        }
        Ok(())
    }

    /// Dispatch the fields of an extension entry back towards the main
    /// schema.
    ///
    /// The entry is looked up first directly under `extensions` (the
    /// old-style layout dissolved by a migration), then under the named
    /// extension (where [`Relocator::relocate`] places groups). Each field
    /// named in `main_fields` moves to the top-level group (created on
    /// demand); every other field moves to `extensions[<extension>][group]`,
    /// the implementation-private home. The source entry is deleted
    /// afterwards regardless of content, since all its fields have been
    /// dispatched somewhere, and containers left empty are pruned.
    pub fn relocate_back(
        &self,
        doc: &mut Document,
        group: &str,
        main_fields: &[&str],
    ) -> Result<(), MigrationError> {
        check_is_mapping(doc, EXTENSIONS_KEY)?;
        check_is_mapping(doc, group)?;

        let source = match self.take_extension_entry(doc, group) {
            None => return Ok(()),
            Some(Node::Mapping(source)) => source,
            Some(other) => {
                return Err(MigrationError::WrongKind {
                    key: group.to_string(),
                    expected: "mapping",
                    actual: other.kind(),
                })
            }
        };

        for (name, value) in source {
            if main_fields.contains(&name.as_str()) {
                doc.root_mut()
                    .entry(group.to_string())
                    .or_insert_with(|| Node::Mapping(Mapping::new()))
                    .as_mapping_mut()
                    .expect("checked to be a mapping above")
                    .insert(name, value);
            } else {
                self.extension_group_mut(doc, group).insert(name, value);
            }
        }

        self.prune_empty_containers(doc);
        Ok(())
    }

    /// Remove and return `extensions[group]`, falling back to
    /// `extensions[<extension>][group]`.
    fn take_extension_entry(&self, doc: &mut Document, group: &str) -> Option<Node> {
        let extensions = doc.group_mut(EXTENSIONS_KEY)?;
        if let Some(node) = extensions.shift_remove(group) {
            return Some(node);
        }
        extensions
            .get_mut(&self.extension)
            .and_then(Node::as_mapping_mut)
            .and_then(|ext| ext.shift_remove(group))
    }

    /// `extensions[<extension>][group]`, all levels created on demand.
    fn extension_group_mut<'a>(&self, doc: &'a mut Document, group: &str) -> &'a mut Mapping {
        doc.extensions_mut()
            .entry(self.extension.clone())
            .or_insert_with(|| Node::Mapping(Mapping::new()))
            .as_mapping_mut()
            .expect("extension entry is always a mapping")
            .entry(group.to_string())
            .or_insert_with(|| Node::Mapping(Mapping::new()))
            .as_mapping_mut()
            .expect("extension group is always a mapping")
    }

    /// Drop the named extension entry, then `extensions` itself, when a
    /// relocation left them empty.
    fn prune_empty_containers(&self, doc: &mut Document) {
        if let Some(extensions) = doc.group_mut(EXTENSIONS_KEY) {
            let ext_is_empty = extensions
                .get(&self.extension)
                .and_then(Node::as_mapping)
                .is_some_and(Mapping::is_empty);
            if ext_is_empty {
                extensions.shift_remove(&self.extension);
            }
            if extensions.is_empty() {
                doc.remove_group(EXTENSIONS_KEY);
            }
        }
    }
}

/// Guard: a root entry, when present, must be a mapping before the
/// relocator traverses or moves it.
fn check_is_mapping(doc: &Document, key: &str) -> Result<(), MigrationError> {
    match doc.root().get(key) {
        None | Some(Node::Mapping(_)) => Ok(()),
        Some(other) => Err(MigrationError::WrongKind {
            key: key.to_string(),
            expected: "mapping",
            actual: other.kind(),
        }),
    }
}
