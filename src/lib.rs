//! # Paramshift: Schema-Version Migration for Parameter Documents
//!
//! Paramshift migrates structured configuration documents (JSON or YAML)
//! from an older schema version to a newer one and re-serializes them in a
//! byte-stable canonical format.
//!
//! ## Features
//!
//! - **Ordered document model**: mappings, sequences and scalars with
//!   insertion order preserved end to end
//! - **Eligibility classification**: exact version matching plus marker
//!   groups, so unrelated files are never touched
//! - **Namespace relocation**: move groups or individual fields between the
//!   main schema and the `extensions` namespace
//! - **Versioned rule lists**: each schema transition owns an ordered list
//!   of pure migration steps (rename, split, derive, relocate)
//! - **Canonical serialization**: `" : "` separators, single-line arrays
//!   and `1.0E-4`-style floats, byte-comparable with hand-authored files
//!
//! ## Example
//!
//! A version 2.4 document:
//!
//! ```json
//! {
//!   "version" : "2.4",
//!   "objective-function" : {
//!     "type" : "MAX_MIN_MARGIN_IN_MEGAWATT",
//!     "forbid-cost-increase" : true
//!   }
//! }
//! ```
//!
//! migrates to:
//!
//! ```json
//! {
//!   "version" : "3.0",
//!   "objective-function" : {
//!     "type" : "MAX_MIN_MARGIN",
//!     "unit" : "MW"
//!   }
//! }
//! ```
//!
//! Re-running is safe by construction: once migrated, the version no longer
//! matches the transition's accepted source set and the classifier skips
//! the file.

// Core modules
pub mod classifier;
pub mod document;
pub mod relocate;
pub mod render;
pub mod steps;

// Versioned rule lists
pub mod migrations;

// File orchestration around the core
pub mod driver;

// Re-export key types
pub use classifier::Classifier;
pub use document::{Document, FileType, Mapping, Node, ParseError};
pub use driver::{migrate_directory, migrate_file, FileOutcome, MigrationReport};
pub use migrations::{all_migrations, Migration};
pub use relocate::Relocator;
pub use render::{render, RenderError};
pub use steps::MigrationError;
