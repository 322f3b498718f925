//! Eligibility classification for migration candidates.
//!
//! A document is migrated only when its declared `version` exactly matches
//! the accepted source-version set of a migration and at least one marker
//! group from the migration's allow-list is present at the root. Paths
//! containing an exclusion token (generated build artifacts) are never
//! candidates. All checks are pure predicates with no side effects.

use serde::Deserialize;
use std::path::Path;

use crate::document::{Document, FileType};

/// Default path-exclusion tokens: generated output trees are never
/// migration sources.
pub const DEFAULT_EXCLUSION_TOKENS: &[&str] = &["target"];

/// Minimal typed view of a document used to probe the version field
/// without building the full tree.
#[derive(Debug, Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: Option<String>,
}

/// Pure eligibility predicate for one migration step.
#[derive(Debug, Clone)]
pub struct Classifier {
    source_versions: &'static [&'static str],
    markers: &'static [&'static str],
    exclusion_tokens: &'static [&'static str],
}

impl Classifier {
    pub fn new(
        source_versions: &'static [&'static str],
        markers: &'static [&'static str],
    ) -> Self {
        Self {
            source_versions,
            markers,
            exclusion_tokens: DEFAULT_EXCLUSION_TOKENS,
        }
    }

    pub fn with_exclusion_tokens(mut self, tokens: &'static [&'static str]) -> Self {
        self.exclusion_tokens = tokens;
        self
    }

    /// Whether a path contains an exclusion token and must be skipped.
    pub fn excluded_path(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.exclusion_tokens.iter().any(|token| path.contains(token))
    }

    /// Exact string match of the document version against the accepted set.
    ///
    /// Comparison is by literal token, not semantic ordering — each
    /// migration targets one specific transition.
    pub fn version_matches(&self, doc: &Document) -> bool {
        match doc.version() {
            Some(version) => self.source_versions.contains(&version),
            None => false,
        }
    }

    /// Whether at least one marker group is present at the document root.
    pub fn has_marker(&self, doc: &Document) -> bool {
        self.markers.iter().any(|marker| doc.has_group(marker))
    }

    /// Full document-level eligibility: version match plus marker presence.
    pub fn is_eligible(&self, doc: &Document) -> bool {
        self.version_matches(doc) && self.has_marker(doc)
    }

    /// Raw-text eligibility check.
    ///
    /// A cheap serde probe of the `version` field short-circuits before the
    /// full parse. Text that does not parse is simply not eligible here; the
    /// driver reports parse failures separately when it loads a document.
    pub fn is_eligible_text(&self, text: &str, file_type: FileType) -> bool {
        let probe = match file_type {
            FileType::Json => serde_json::from_str::<VersionProbe>(text).ok(),
            FileType::Yaml => serde_yaml::from_str::<VersionProbe>(text).ok(),
        };
        match probe.and_then(|p| p.version) {
            Some(version) if self.source_versions.contains(&version.as_str()) => {}
            _ => return false,
        }

        match Document::parse(text, file_type) {
            Ok(doc) => self.has_marker(&doc),
            Err(_) => false,
        }
    }
}
