//! In-memory document model shared by the eligibility classifier, the
//! migration steps and the canonical serializer.
//!
//! A document is a tree of nodes: mappings (ordered, unique keys),
//! sequences, and scalars. Key order is significant — the serializer emits
//! mappings exactly in insertion order, so every transformation preserves it.

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;

/// Root key holding vendor/implementation-specific sub-groups.
pub const EXTENSIONS_KEY: &str = "extensions";

/// Root key holding the schema version token.
pub const VERSION_KEY: &str = "version";

/// An ordered mapping of field names to nodes.
pub type Mapping = IndexMap<String, Node>;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Vec<Node>),
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Null,
}

impl Node {
    /// Short node-kind label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::String(_) => "string",
            Node::Bool(_) => "boolean",
            Node::Int(_) => "integer",
            Node::Float(_) => "float",
            Node::Null => "null",
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or float node.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Int(i) => Some(*i as f64),
            Node::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn from_json(value: serde_json::Value) -> Node {
        match value {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Int(i)
                } else {
                    // u64 beyond i64 range or fractional
                    Node::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Node::String(s),
            serde_json::Value::Array(items) => {
                Node::Sequence(items.into_iter().map(Node::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut mapping = Mapping::new();
                for (key, value) in map {
                    mapping.insert(key, Node::from_json(value));
                }
                Node::Mapping(mapping)
            }
        }
    }

    fn from_yaml(value: serde_yaml::Value) -> Result<Node, ParseError> {
        match value {
            serde_yaml::Value::Null => Ok(Node::Null),
            serde_yaml::Value::Bool(b) => Ok(Node::Bool(b)),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Node::Int(i))
                } else {
                    Ok(Node::Float(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_yaml::Value::String(s) => Ok(Node::String(s)),
            serde_yaml::Value::Sequence(items) => {
                let nodes: Result<Vec<Node>, ParseError> =
                    items.into_iter().map(Node::from_yaml).collect();
                Ok(Node::Sequence(nodes?))
            }
            serde_yaml::Value::Mapping(map) => {
                let mut mapping = Mapping::new();
                for (key, value) in map {
                    let key = match key {
                        serde_yaml::Value::String(s) => s,
                        other => return Err(ParseError::NonStringKey(format!("{:?}", other))),
                    };
                    mapping.insert(key, Node::from_yaml(value)?);
                }
                Ok(Node::Mapping(mapping))
            }
            serde_yaml::Value::Tagged(tagged) => {
                Err(ParseError::UnsupportedNode(format!("tagged value {}", tagged.tag)))
            }
        }
    }

    /// Convert the node back to a YAML value, preserving mapping order.
    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            Node::Null => serde_yaml::Value::Null,
            Node::Bool(b) => serde_yaml::Value::Bool(*b),
            Node::Int(i) => serde_yaml::Value::Number(serde_yaml::Number::from(*i)),
            Node::Float(f) => serde_yaml::Value::Number(serde_yaml::Number::from(*f)),
            Node::String(s) => serde_yaml::Value::String(s.clone()),
            Node::Sequence(items) => {
                serde_yaml::Value::Sequence(items.iter().map(Node::to_yaml).collect())
            }
            Node::Mapping(map) => {
                let mut out = serde_yaml::Mapping::new();
                for (key, value) in map {
                    out.insert(serde_yaml::Value::String(key.clone()), value.to_yaml());
                }
                serde_yaml::Value::Mapping(out)
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::String(s) => write!(f, "{}", s),
            Node::Bool(b) => write!(f, "{}", b),
            Node::Int(i) => write!(f, "{}", i),
            Node::Float(fl) => write!(f, "{}", fl),
            Node::Null => write!(f, "null"),
            Node::Sequence(items) => write!(f, "{:?}", items),
            Node::Mapping(map) => write!(f, "{:?}", map),
        }
    }
}

/// Input text format, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Json,
    Yaml,
}

impl FileType {
    /// Determine the file type from a path extension (`.json`, `.yml`, `.yaml`).
    ///
    /// Returns `None` for anything else.
    pub fn from_path(path: &Path) -> Option<FileType> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(FileType::Json),
            Some("yml") | Some("yaml") => Some(FileType::Yaml),
            _ => None,
        }
    }
}

/// Error type for document parsing
#[derive(Debug)]
pub enum ParseError {
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    RootNotMapping,
    NonStringKey(String),
    UnsupportedNode(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Json(e) => write!(f, "JSON error: {}", e),
            ParseError::Yaml(e) => write!(f, "YAML error: {}", e),
            ParseError::RootNotMapping => write!(f, "document root is not a mapping"),
            ParseError::NonStringKey(key) => write!(f, "mapping key is not a string: {}", key),
            ParseError::UnsupportedNode(node) => write!(f, "unsupported node: {}", node),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Json(err)
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        ParseError::Yaml(err)
    }
}

/// A configuration document: a root mapping with a `version` scalar, named
/// parameter groups, and an optional `extensions` mapping.
///
/// Documents are built fresh from parsed text for each run, mutated in place
/// by a migration, then discarded after serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Mapping,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-built root mapping.
    pub fn from_root(root: Mapping) -> Self {
        Self { root }
    }

    /// Parse raw document text into the model.
    ///
    /// # Errors
    /// Returns an error for malformed input, a non-mapping root, or (YAML)
    /// non-string mapping keys.
    pub fn parse(text: &str, file_type: FileType) -> Result<Self, ParseError> {
        let node = match file_type {
            FileType::Json => {
                let value: serde_json::Value = serde_json::from_str(text)?;
                Node::from_json(value)
            }
            FileType::Yaml => {
                let value: serde_yaml::Value = serde_yaml::from_str(text)?;
                Node::from_yaml(value)?
            }
        };

        match node {
            Node::Mapping(root) => Ok(Self { root }),
            _ => Err(ParseError::RootNotMapping),
        }
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    /// The declared schema version, if present and a string.
    pub fn version(&self) -> Option<&str> {
        self.root.get(VERSION_KEY).and_then(Node::as_str)
    }

    /// Overwrite the schema version with a literal target token.
    ///
    /// An existing `version` entry keeps its position in the mapping.
    pub fn set_version(&mut self, version: &str) {
        self.root
            .insert(VERSION_KEY.to_string(), Node::String(version.to_string()));
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.root.contains_key(name)
    }

    /// A top-level parameter group, if present and a mapping.
    pub fn group(&self, name: &str) -> Option<&Mapping> {
        self.root.get(name).and_then(Node::as_mapping)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Mapping> {
        self.root.get_mut(name).and_then(Node::as_mapping_mut)
    }

    /// Remove a top-level group entirely, preserving the order of the rest.
    pub fn remove_group(&mut self, name: &str) -> Option<Node> {
        self.root.shift_remove(name)
    }

    /// The `extensions` mapping, if present.
    pub fn extensions(&self) -> Option<&Mapping> {
        self.root.get(EXTENSIONS_KEY).and_then(Node::as_mapping)
    }

    /// The `extensions` mapping, created on demand.
    pub fn extensions_mut(&mut self) -> &mut Mapping {
        self.root
            .entry(EXTENSIONS_KEY.to_string())
            .or_insert_with(|| Node::Mapping(Mapping::new()))
            .as_mapping_mut()
            .expect("extensions entry is always a mapping")
    }

    /// Re-insert `extensions` as the last root key (delete-then-append), or
    /// drop it entirely if it ended up empty.
    pub fn finalize_extensions(&mut self) {
        match self.root.shift_remove(EXTENSIONS_KEY) {
            Some(Node::Mapping(map)) if map.is_empty() => {}
            Some(node) => {
                self.root.insert(EXTENSIONS_KEY.to_string(), node);
            }
            None => {}
        }
    }
}
