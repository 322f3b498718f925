//! Parameter schema transition from version 2.4 to 3.0.
//!
//! Version 3.0 splits business parameters from search-tree implementation
//! parameters: implementation-only fields move under the
//! `open-rao-search-tree-parameters` extension, penalty costs are renamed
//! to impact thresholds, the composite objective-function type is split
//! into a quantity and a unit, and the legacy stop criteria collapse into a
//! single `enforce-curative-security` flag.

use super::Migration;
use crate::document::{Document, Mapping, Node};
use crate::relocate::Relocator;
use crate::steps::{self, MigrationError};

pub const SOURCE_VERSIONS: &[&str] = &["2.4"];
pub const TARGET_VERSION: &str = "3.0";

/// Extension entry hosting implementation-only groups from 3.0 onwards.
pub const SEARCH_TREE_EXTENSION: &str = "open-rao-search-tree-parameters";

const OBJECTIVE_FUNCTION: &str = "objective-function";
const RANGE_ACTIONS_OPTIMIZATION: &str = "range-actions-optimization";
const TOPOLOGICAL_ACTIONS_OPTIMIZATION: &str = "topological-actions-optimization";
const MULTI_THREADING: &str = "multi-threading";
const SECOND_PREVENTIVE_RAO: &str = "second-preventive-rao";
const LOAD_FLOW_AND_SENSITIVITY: &str = "load-flow-and-sensitivity-computation";

const MARKERS: &[&str] = &[
    OBJECTIVE_FUNCTION,
    RANGE_ACTIONS_OPTIMIZATION,
    TOPOLOGICAL_ACTIONS_OPTIMIZATION,
    MULTI_THREADING,
    SECOND_PREVENTIVE_RAO,
    LOAD_FLOW_AND_SENSITIVITY,
];

const UNIT_CODES: &[(&str, &str)] = &[("MEGAWATT", "MW"), ("AMPERE", "A")];

const PREVENTIVE_STOP_CRITERION: &str = "preventive-stop-criterion";
const CURATIVE_STOP_CRITERION: &str = "curative-stop-criterion";
const OPTIMIZE_CURATIVE_IF_PREVENTIVE_UNSECURE: &str = "optimize-curative-if-preventive-unsecure";
const ENFORCE_CURATIVE_SECURITY: &str = "enforce-curative-security";
const CURATIVE_MIN_OBJ_IMPROVEMENT: &str = "curative-min-obj-improvement";

const SECURE: &str = "SECURE";
const PREVENTIVE_OBJECTIVE_AND_SECURE: &str = "PREVENTIVE_OBJECTIVE_AND_SECURE";
const MIN_OBJECTIVE: &str = "MIN_OBJECTIVE";

/// Offset applied to the curative improvement threshold when the legacy
/// curative stop criterion asked for a full minimization; large enough that
/// curative results are only retained on a genuine improvement.
const CURATIVE_MIN_OBJ_IMPROVEMENT_OFFSET: f64 = 10_000_000.0;

pub fn migration() -> Migration {
    Migration {
        id: "rao-parameters-2.4-to-3.0",
        description: "split business parameters from search-tree implementation parameters",
        source_versions: SOURCE_VERSIONS,
        target_version: TARGET_VERSION,
        markers: MARKERS,
        apply,
    }
}

fn apply(doc: &mut Document) -> Result<(), MigrationError> {
    let relocator = Relocator::new(SEARCH_TREE_EXTENSION);

    migrate_objective_function(doc, &relocator)?;
    migrate_range_actions(doc, &relocator)?;
    migrate_topological_actions(doc, &relocator)?;
    migrate_multi_threading(doc, &relocator)?;
    relocator.relocate(doc, SECOND_PREVENTIVE_RAO, None)?;
    relocator.relocate(doc, LOAD_FLOW_AND_SENSITIVITY, None)?;

    // 2.4 kept these as extensions of their own; 3.0 splits each between
    // the main schema and the search-tree extension
    relocator.relocate_back(doc, "mnec-parameters", &["acceptable-margin-decrease"])?;
    relocator.relocate_back(doc, "relative-margins-parameters", &["ptdf-boundaries"])?;
    relocator.relocate_back(doc, "loop-flow-parameters", &["acceptable-increase", "countries"])?;
    Ok(())
}

fn migrate_objective_function(
    doc: &mut Document,
    relocator: &Relocator,
) -> Result<(), MigrationError> {
    steps::delete_fields(doc, OBJECTIVE_FUNCTION, &["forbid-cost-increase"]);
    steps::split_type_unit(doc, OBJECTIVE_FUNCTION, "type", "unit", UNIT_CODES)?;
    derive_enforce_curative_security(doc);
    steps::delete_fields(
        doc,
        OBJECTIVE_FUNCTION,
        &[
            PREVENTIVE_STOP_CRITERION,
            CURATIVE_STOP_CRITERION,
            OPTIMIZE_CURATIVE_IF_PREVENTIVE_UNSECURE,
        ],
    );
    relocator.relocate(doc, OBJECTIVE_FUNCTION, Some(&[CURATIVE_MIN_OBJ_IMPROVEMENT]))
}

/// Collapse the legacy stop criteria into `enforce-curative-security`.
///
/// A missing preventive criterion counts as secure, matching the historic
/// loader defaults. When the preventive side is secure the legacy
/// `optimize-curative-if-preventive-unsecure` flag carries over verbatim
/// (and nothing is written when that flag is absent). Otherwise curative
/// security is enforced exactly for the curative criteria that demanded a
/// secure outcome, and a `MIN_OBJECTIVE` criterion additionally pushes the
/// improvement threshold out of reach.
fn derive_enforce_curative_security(doc: &mut Document) {
    let Some(group) = doc.group_mut(OBJECTIVE_FUNCTION) else {
        return;
    };

    let preventive = group
        .get(PREVENTIVE_STOP_CRITERION)
        .and_then(Node::as_str)
        .map(String::from);
    let curative = group
        .get(CURATIVE_STOP_CRITERION)
        .and_then(Node::as_str)
        .map(String::from);
    let optimize_curative = group
        .get(OPTIMIZE_CURATIVE_IF_PREVENTIVE_UNSECURE)
        .and_then(Node::as_bool);

    match preventive.as_deref() {
        None | Some(SECURE) => {
            if let Some(flag) = optimize_curative {
                group.insert(ENFORCE_CURATIVE_SECURITY.to_string(), Node::Bool(flag));
            }
        }
        Some(_) => match curative.as_deref() {
            Some(SECURE) | Some(PREVENTIVE_OBJECTIVE_AND_SECURE) => {
                group.insert(ENFORCE_CURATIVE_SECURITY.to_string(), Node::Bool(true));
            }
            other => {
                group.insert(ENFORCE_CURATIVE_SECURITY.to_string(), Node::Bool(false));
                if other == Some(MIN_OBJECTIVE) {
                    let threshold = steps::float_field(group, CURATIVE_MIN_OBJ_IMPROVEMENT, 0.0);
                    group.insert(
                        CURATIVE_MIN_OBJ_IMPROVEMENT.to_string(),
                        Node::Float(CURATIVE_MIN_OBJ_IMPROVEMENT_OFFSET + threshold),
                    );
                }
            }
        },
    }
}

fn migrate_range_actions(doc: &mut Document, relocator: &Relocator) -> Result<(), MigrationError> {
    steps::rename_fields(
        doc,
        RANGE_ACTIONS_OPTIMIZATION,
        &[
            ("pst-penalty-cost", "pst-ra-min-impact-threshold"),
            ("hvdc-penalty-cost", "hvdc-ra-min-impact-threshold"),
            ("injection-ra-penalty-cost", "injection-ra-min-impact-threshold"),
        ],
    );
    relocator.relocate(
        doc,
        RANGE_ACTIONS_OPTIMIZATION,
        Some(&[
            "max-mip-iterations",
            "pst-sensitivity-threshold",
            "pst-model",
            "hvdc-sensitivity-threshold",
            "injection-ra-sensitivity-threshold",
            "linear-optimization-solver",
            "ra-range-shrinking",
        ]),
    )
}

fn migrate_topological_actions(
    doc: &mut Document,
    relocator: &Relocator,
) -> Result<(), MigrationError> {
    // the composite depth now applies per instant kind
    if let Some(group) = doc.group_mut(TOPOLOGICAL_ACTIONS_OPTIMIZATION) {
        if let Some(depth) = group.shift_remove("max-search-tree-depth") {
            group.insert("max-preventive-search-tree-depth".to_string(), depth.clone());
            group.insert("max-curative-search-tree-depth".to_string(), depth);
        }
    }
    relocator.relocate(
        doc,
        TOPOLOGICAL_ACTIONS_OPTIMIZATION,
        Some(&[
            "max-preventive-search-tree-depth",
            "max-auto-search-tree-depth",
            "max-curative-search-tree-depth",
            "predefined-combinations",
            "skip-actions-far-from-most-limiting-element",
            "max-number-of-boundaries-for-skipping-actions",
        ]),
    )
}

/// Aggregate-then-discard: the per-feature parallelism counts collapse into
/// a single CPU budget, and the whole group becomes implementation-only.
fn migrate_multi_threading(doc: &mut Document, relocator: &Relocator) -> Result<(), MigrationError> {
    if let Some(group) = doc.group_mut(MULTI_THREADING) {
        let cpus = steps::int_field(group, "contingency-scenarios-in-parallel", 1)
            .max(steps::int_field(group, "preventive-leaves-in-parallel", 1));
        let mut replaced = Mapping::new();
        replaced.insert("available-cpus".to_string(), Node::Int(cpus));
        *group = replaced;
    }
    relocator.relocate(doc, MULTI_THREADING, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FileType;

    fn parse(text: &str) -> Document {
        Document::parse(text, FileType::Json).unwrap()
    }

    fn objective(doc: &Document) -> &Mapping {
        doc.group(OBJECTIVE_FUNCTION).unwrap()
    }

    fn search_tree_group<'a>(doc: &'a Document, group: &str) -> Option<&'a Mapping> {
        doc.extensions()?
            .get(SEARCH_TREE_EXTENSION)
            .and_then(Node::as_mapping)?
            .get(group)
            .and_then(Node::as_mapping)
    }

    #[test]
    fn test_secure_preventive_copies_the_legacy_flag() {
        let mut doc = parse(
            r#"{"objective-function": {"preventive-stop-criterion": "SECURE", "optimize-curative-if-preventive-unsecure": true}}"#,
        );
        derive_enforce_curative_security(&mut doc);
        assert_eq!(
            objective(&doc).get(ENFORCE_CURATIVE_SECURITY),
            Some(&Node::Bool(true))
        );
    }

    #[test]
    fn test_missing_preventive_criterion_counts_as_secure() {
        let mut doc = parse(r#"{"objective-function": {"curative-stop-criterion": "SECURE"}}"#);
        derive_enforce_curative_security(&mut doc);
        // secure branch without the legacy flag writes nothing at all
        assert!(objective(&doc).get(ENFORCE_CURATIVE_SECURITY).is_none());
    }

    #[test]
    fn test_secure_curative_criterion_enforces() {
        for criterion in [SECURE, PREVENTIVE_OBJECTIVE_AND_SECURE] {
            let mut doc = parse(&format!(
                r#"{{"objective-function": {{"preventive-stop-criterion": "MIN_OBJECTIVE", "curative-stop-criterion": "{}"}}}}"#,
                criterion
            ));
            derive_enforce_curative_security(&mut doc);
            assert_eq!(
                objective(&doc).get(ENFORCE_CURATIVE_SECURITY),
                Some(&Node::Bool(true)),
                "criterion {}",
                criterion
            );
        }
    }

    #[test]
    fn test_min_objective_criterion_pushes_the_threshold() {
        let mut doc = parse(
            r#"{"objective-function": {"preventive-stop-criterion": "MIN_OBJECTIVE", "curative-stop-criterion": "MIN_OBJECTIVE", "curative-min-obj-improvement": 123.0}}"#,
        );
        derive_enforce_curative_security(&mut doc);

        let group = objective(&doc);
        assert_eq!(group.get(ENFORCE_CURATIVE_SECURITY), Some(&Node::Bool(false)));
        assert_eq!(
            group.get(CURATIVE_MIN_OBJ_IMPROVEMENT),
            Some(&Node::Float(10_000_123.0))
        );
    }

    #[test]
    fn test_min_objective_threshold_defaults_to_zero() {
        let mut doc = parse(
            r#"{"objective-function": {"preventive-stop-criterion": "PREVENTIVE_OBJECTIVE", "curative-stop-criterion": "MIN_OBJECTIVE"}}"#,
        );
        derive_enforce_curative_security(&mut doc);
        assert_eq!(
            objective(&doc).get(CURATIVE_MIN_OBJ_IMPROVEMENT),
            Some(&Node::Float(10_000_000.0))
        );
    }

    #[test]
    fn test_unsecure_preventive_with_plain_curative_criterion() {
        let mut doc = parse(
            r#"{"objective-function": {"preventive-stop-criterion": "MIN_OBJECTIVE", "curative-stop-criterion": "PREVENTIVE_OBJECTIVE"}}"#,
        );
        derive_enforce_curative_security(&mut doc);

        let group = objective(&doc);
        assert_eq!(group.get(ENFORCE_CURATIVE_SECURITY), Some(&Node::Bool(false)));
        assert!(group.get(CURATIVE_MIN_OBJ_IMPROVEMENT).is_none());
    }

    #[test]
    fn test_objective_function_end_to_end() {
        let mut doc = parse(
            r#"{"version": "2.4", "objective-function": {"type": "MAX_MIN_MARGIN_IN_MEGAWATT", "forbid-cost-increase": true}}"#,
        );
        migration().migrate(&mut doc).unwrap();

        assert_eq!(doc.version(), Some("3.0"));
        let group = objective(&doc);
        assert_eq!(group.get("type"), Some(&Node::String("MAX_MIN_MARGIN".to_string())));
        assert_eq!(group.get("unit"), Some(&Node::String("MW".to_string())));
        assert_eq!(group.len(), 2);
        assert!(doc.extensions().is_none());
    }

    #[test]
    fn test_curative_threshold_moves_to_the_extension() {
        let mut doc = parse(
            r#"{"version": "2.4", "objective-function": {"type": "MAX_MIN_MARGIN_IN_AMPERE", "curative-min-obj-improvement": 10.0}}"#,
        );
        migration().migrate(&mut doc).unwrap();

        assert!(objective(&doc).get(CURATIVE_MIN_OBJ_IMPROVEMENT).is_none());
        assert_eq!(
            search_tree_group(&doc, OBJECTIVE_FUNCTION)
                .unwrap()
                .get(CURATIVE_MIN_OBJ_IMPROVEMENT),
            Some(&Node::Float(10.0))
        );
    }

    #[test]
    fn test_range_actions_renames_and_relocates() {
        let mut doc = parse(
            r#"{"version": "2.4", "range-actions-optimization": {"max-mip-iterations": 4, "pst-penalty-cost": 0.01, "pst-model": "APPROXIMATED_INTEGERS", "linear-optimization-solver": {"solver": "XPRESS"}}}"#,
        );
        migration().migrate(&mut doc).unwrap();

        let main = doc.group(RANGE_ACTIONS_OPTIMIZATION).unwrap();
        assert_eq!(main.get("pst-ra-min-impact-threshold"), Some(&Node::Float(0.01)));
        assert_eq!(main.len(), 1);

        let ext = search_tree_group(&doc, RANGE_ACTIONS_OPTIMIZATION).unwrap();
        assert_eq!(ext.get("max-mip-iterations"), Some(&Node::Int(4)));
        assert!(ext.get("linear-optimization-solver").is_some());
        assert!(ext.get("pst-ra-min-impact-threshold").is_none());
    }

    #[test]
    fn test_search_tree_depth_expansion() {
        let mut doc = parse(
            r#"{"version": "2.4", "topological-actions-optimization": {"max-search-tree-depth": 3, "relative-minimum-impact-threshold": 0.9}}"#,
        );
        migration().migrate(&mut doc).unwrap();

        let main = doc.group(TOPOLOGICAL_ACTIONS_OPTIMIZATION).unwrap();
        assert_eq!(main.get("relative-minimum-impact-threshold"), Some(&Node::Float(0.9)));
        assert_eq!(main.len(), 1);

        let ext = search_tree_group(&doc, TOPOLOGICAL_ACTIONS_OPTIMIZATION).unwrap();
        assert_eq!(ext.get("max-preventive-search-tree-depth"), Some(&Node::Int(3)));
        assert_eq!(ext.get("max-curative-search-tree-depth"), Some(&Node::Int(3)));
        assert!(ext.get("max-search-tree-depth").is_none());
    }

    #[test]
    fn test_multi_threading_aggregation() {
        let mut doc = parse(
            r#"{"version": "2.4", "multi-threading": {"contingency-scenarios-in-parallel": 4, "preventive-leaves-in-parallel": 2, "curative-leaves-in-parallel": 8}}"#,
        );
        migration().migrate(&mut doc).unwrap();

        assert!(!doc.has_group(MULTI_THREADING));
        let ext = search_tree_group(&doc, MULTI_THREADING).unwrap();
        // curative parallelism does not count towards the budget
        assert_eq!(ext.get("available-cpus"), Some(&Node::Int(4)));
        assert_eq!(ext.len(), 1);
    }

    #[test]
    fn test_old_style_extensions_are_dissolved() {
        let mut doc = parse(
            r#"{"version": "2.4", "objective-function": {"type": "SECURE_FLOW"}, "extensions": {"loop-flow-parameters": {"acceptable-increase": 10.0, "ptdf-approximation": "FIXED_PTDF", "countries": ["FR", "BE"]}}}"#,
        );
        migration().migrate(&mut doc).unwrap();

        let main = doc.group("loop-flow-parameters").unwrap();
        assert_eq!(main.get("acceptable-increase"), Some(&Node::Float(10.0)));
        assert!(main.get("countries").is_some());
        assert_eq!(main.len(), 2);

        let ext = search_tree_group(&doc, "loop-flow-parameters").unwrap();
        assert_eq!(
            ext.get("ptdf-approximation"),
            Some(&Node::String("FIXED_PTDF".to_string()))
        );
        assert!(doc.extensions().unwrap().get("loop-flow-parameters").is_none());
    }

    #[test]
    fn test_extensions_end_up_last() {
        let mut doc = parse(
            r#"{"version": "2.4", "multi-threading": {"preventive-leaves-in-parallel": 2}, "not-optimized-cnecs": {"do-not-optimize-curative-cnecs-for-tsos-without-cras": false}}"#,
        );
        migration().migrate(&mut doc).unwrap();

        let keys: Vec<&String> = doc.root().keys().collect();
        assert_eq!(keys.last().map(|k| k.as_str()), Some("extensions"));
        // untouched groups pass through unchanged
        assert!(doc.has_group("not-optimized-cnecs"));
    }
}
