//! Per-file and per-directory migration orchestration.
//!
//! The driver owns everything the core deliberately does not: directory
//! walking, file I/O and per-file error reporting. Each document is read,
//! classified, transformed and written back in place, sequentially and
//! independently — a failure in one file is logged and collected, and
//! processing continues with the rest. Output is only persisted after the
//! full pipeline and serialization succeed, so a failed file keeps its
//! original bytes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{Document, FileType, ParseError};
use crate::migrations::Migration;
use crate::render;

/// What happened to a single candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was eligible and has been rewritten in place.
    Migrated,
    /// Classification miss: the file was left untouched.
    Skipped,
}

/// Summary of a directory run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub migrated: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Apply one migration to a single file.
///
/// Files without a recognized extension, files on excluded paths and
/// ineligible documents are skipped silently. Parse failures and
/// schema-assumption violations are reported with the offending path; the
/// file is left unchanged on disk in every non-migrated case.
pub fn migrate_file(path: &Path, migration: &Migration) -> Result<FileOutcome, String> {
    let Some(file_type) = FileType::from_path(path) else {
        return Ok(FileOutcome::Skipped);
    };
    let classifier = migration.classifier();
    if classifier.excluded_path(path) {
        return Ok(FileOutcome::Skipped);
    }

    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let mut doc = match Document::parse(&text, file_type) {
        Ok(doc) => doc,
        // a well-formed file that is not a mapping is simply not a candidate
        Err(ParseError::RootNotMapping) => return Ok(FileOutcome::Skipped),
        Err(e) => return Err(format!("Failed to parse {}: {}", path.display(), e)),
    };
    if !classifier.is_eligible(&doc) {
        return Ok(FileOutcome::Skipped);
    }

    migration
        .migrate(&mut doc)
        .map_err(|e| format!("Failed to migrate {}: {}", path.display(), e))?;
    let rendered = render::render(&doc, file_type)
        .map_err(|e| format!("Failed to serialize {}: {}", path.display(), e))?;
    fs::write(path, rendered)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    tracing::info!(
        "migrated {} to version {}",
        path.display(),
        migration.target_version
    );
    Ok(FileOutcome::Migrated)
}

/// Apply one migration to every candidate file under a directory.
///
/// Files are visited in sorted order for deterministic reporting. Per-file
/// failures are logged and collected in the report; they never abort the
/// run (fail-fast per document, not globally).
pub fn migrate_directory(dir: &Path, migration: &Migration) -> Result<MigrationReport, String> {
    if !dir.is_dir() {
        return Err(format!("Not a directory: {}", dir.display()));
    }

    let mut files = Vec::new();
    collect_candidate_files(dir, &mut files)?;
    files.sort();

    let mut report = MigrationReport::default();
    for path in files {
        match migrate_file(&path, migration) {
            Ok(FileOutcome::Migrated) => report.migrated.push(path),
            Ok(FileOutcome::Skipped) => report.skipped += 1,
            Err(message) => {
                tracing::error!("{}", message);
                report.failed.push((path, message));
            }
        }
    }
    Ok(report)
}

/// Recursively gather files with a recognized extension.
fn collect_candidate_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory {}: {}", dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read directory entry: {}", e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_candidate_files(&path, files)?;
        } else if FileType::from_path(&path).is_some() {
            files.push(path);
        }
    }
    Ok(())
}
