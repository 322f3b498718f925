//! Versioned migration registry.
//!
//! Each schema transition owns one [`Migration`] descriptor: the accepted
//! source versions (exact-match), the target version, the marker groups
//! used for eligibility, and a pure rule function over the document. A
//! migration handles exactly one transition per invocation; chained
//! transitions are separate sequential runs, each re-checking eligibility
//! against the new version.

pub mod rao_parameters_v3;

use crate::classifier::Classifier;
use crate::document::Document;
use crate::steps::{self, MigrationError};

/// One schema-version transition.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Stable identifier, usable from the command line.
    pub id: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Source versions accepted by exact string match.
    pub source_versions: &'static [&'static str],
    /// Version written into migrated documents.
    pub target_version: &'static str,
    /// Eligibility allow-list of top-level group names.
    pub markers: &'static [&'static str],
    /// Ordered rule list for this transition.
    pub apply: fn(&mut Document) -> Result<(), MigrationError>,
}

impl Migration {
    /// Eligibility predicate for this transition.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.source_versions, self.markers)
    }

    /// Run the rule list, bump the version to the target and re-append
    /// `extensions` as the last root key.
    ///
    /// A failing rule leaves the in-memory document in an undefined
    /// intermediate state; callers must discard it and keep the original
    /// bytes. Re-running a completed migration is prevented upstream: the
    /// new version no longer matches the accepted set, so the classifier
    /// rejects the document before this is ever reached again.
    pub fn migrate(&self, doc: &mut Document) -> Result<(), MigrationError> {
        (self.apply)(doc)?;
        steps::bump_version(doc, self.target_version);
        doc.finalize_extensions();
        Ok(())
    }
}

/// All documented transitions, in chronological order.
pub fn all_migrations() -> Vec<Migration> {
    vec![rao_parameters_v3::migration()]
}

/// Look up a registered transition by identifier.
pub fn find(id: &str) -> Option<Migration> {
    all_migrations().into_iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FileType;

    #[test]
    fn test_registry_lookup() {
        assert!(find("rao-parameters-2.4-to-3.0").is_some());
        assert!(find("no-such-transition").is_none());
    }

    #[test]
    fn test_migrated_document_is_no_longer_eligible() {
        let migration = rao_parameters_v3::migration();
        let mut doc = Document::parse(
            r#"{"version": "2.4", "objective-function": {"type": "SECURE_FLOW"}}"#,
            FileType::Json,
        )
        .unwrap();

        assert!(migration.classifier().is_eligible(&doc));
        migration.migrate(&mut doc).unwrap();
        assert_eq!(doc.version(), Some("3.0"));
        assert!(!migration.classifier().is_eligible(&doc));
    }
}
