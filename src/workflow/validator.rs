//! Workflow graph validation.
//!
//! Structural defects are collected, not raised. Checks run in a fixed order
//! and every defect is reported in the order it is found:
//! 1. top-level presence (short-circuits)
//! 2. action ID uniqueness
//! 3. branching cardinality, in action order
//! 4. edge references, in edge order

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::BranchingKind;
use super::types::{Action, Edge, WorkflowDocument, WorkflowGraph};

/// Outcome of validating a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate a typed workflow graph.
pub fn validate(graph: &WorkflowGraph) -> ValidationReport {
    let mut errors = Vec::new();
    check_structure(&graph.actions, &graph.edges, &mut errors);
    finish(errors)
}

/// Validate a raw workflow document, including top-level field presence.
pub fn validate_document(doc: &WorkflowDocument) -> ValidationReport {
    let mut errors = Vec::new();
    if doc.trigger.is_none() {
        errors.push("Missing 'trigger' field".to_string());
    }
    if doc.actions.is_none() {
        errors.push("Missing 'actions' field".to_string());
    }
    if doc.edges.is_none() {
        errors.push("Missing 'edges' field".to_string());
    }

    if !errors.is_empty() {
        return finish(errors);
    }

    if let (Some(actions), Some(edges)) = (&doc.actions, &doc.edges) {
        check_structure(actions, edges, &mut errors);
    }

    finish(errors)
}

fn finish(errors: Vec<String>) -> ValidationReport {
    if errors.is_empty() {
        debug!("workflow graph is valid");
    } else {
        warn!(defects = errors.len(), "workflow graph has structural defects");
    }
    ValidationReport::from_errors(errors)
}

fn check_structure(actions: &[Action], edges: &[Edge], errors: &mut Vec<String>) {
    // Unique action IDs
    let mut ids: HashSet<&str> = HashSet::with_capacity(actions.len());
    let mut duplicates: Vec<&str> = Vec::new();
    for action in actions {
        if !ids.insert(action.id.as_str()) && !duplicates.contains(&action.id.as_str()) {
            duplicates.push(action.id.as_str());
        }
    }
    if !duplicates.is_empty() {
        let listed: Vec<String> = duplicates.iter().map(|id| format!("'{}'", id)).collect();
        errors.push(format!(
            "Action IDs must be unique (duplicate: {})",
            listed.join(", ")
        ));
    }

    // Branching actions fan out to exactly two successors
    for action in actions {
        if let Some(branching) = BranchingKind::classify(&action.kind) {
            let outgoing = edges.iter().filter(|e| e.from == action.id).count();
            if outgoing != BranchingKind::REQUIRED_EDGES {
                errors.push(format!(
                    "{} action '{}' must have exactly {} outgoing edges (has {})",
                    branching.label(),
                    action.id,
                    BranchingKind::REQUIRED_EDGES,
                    outgoing
                ));
            }
        }
    }

    // Edge endpoints exist
    for edge in edges {
        if !edge.is_from_trigger() && !ids.contains(edge.from.as_str()) {
            errors.push(format!(
                "Edge 'from' references unknown source: {}",
                edge.from
            ));
        }
        if !ids.contains(edge.to.as_str()) {
            errors.push(format!("Edge 'to' references unknown action: {}", edge.to));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{Inputs, Trigger};
    use crate::workflow::parse_workflow;

    fn action(id: &str, kind: &str) -> Action {
        Action::new(id, kind, "", Inputs::new())
    }

    fn graph(actions: Vec<Action>, edges: Vec<Edge>) -> WorkflowGraph {
        WorkflowGraph {
            trigger: Trigger::new_post(),
            actions,
            edges,
        }
    }

    #[test]
    fn test_validate_valid_graph() {
        let g = graph(
            vec![
                action("s", "get_sentiment"),
                action("if1", "builtin:if"),
                action("p", "slack_send_channel_message"),
                action("n", "slack_send_channel_message"),
            ],
            vec![
                Edge::from_trigger("s"),
                Edge::new("s", "if1"),
                Edge::labeled("if1", "p", "True"),
                Edge::labeled("if1", "n", "False"),
            ],
        );
        let report = validate(&g);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let g = graph(
            vec![action("a1", "http_request"), action("a1", "http_request")],
            vec![Edge::from_trigger("a1")],
        );
        let report = validate(&g);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Action IDs must be unique (duplicate: 'a1')"]);
    }

    #[test]
    fn test_validate_duplicates_listed_once() {
        let g = graph(
            vec![
                action("b", "x"),
                action("a", "x"),
                action("b", "x"),
                action("a", "x"),
                action("b", "x"),
            ],
            vec![],
        );
        let report = validate(&g);
        assert_eq!(
            report.errors,
            vec!["Action IDs must be unique (duplicate: 'b', 'a')"]
        );
    }

    #[test]
    fn test_validate_if_with_one_edge() {
        let g = graph(
            vec![action("if1", "builtin:if"), action("p", "slack_send_channel_message")],
            vec![Edge::from_trigger("if1"), Edge::labeled("if1", "p", "True")],
        );
        let report = validate(&g);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["IF action 'if1' must have exactly 2 outgoing edges (has 1)"]
        );
    }

    #[test]
    fn test_validate_loop_with_three_edges() {
        let g = graph(
            vec![
                action("loop1", "builtin:loop"),
                action("a", "x"),
                action("b", "x"),
                action("c", "x"),
            ],
            vec![
                Edge::from_trigger("loop1"),
                Edge::new("loop1", "a"),
                Edge::new("loop1", "b"),
                Edge::new("loop1", "c"),
            ],
        );
        let report = validate(&g);
        assert_eq!(
            report.errors,
            vec!["Loop action 'loop1' must have exactly 2 outgoing edges (has 3)"]
        );
    }

    #[test]
    fn test_validate_branch_with_no_edges() {
        let g = graph(vec![action("if1", "builtin:if")], vec![]);
        let report = validate(&g);
        assert!(report.errors[0].contains("(has 0)"));
    }

    #[test]
    fn test_ordinary_actions_fan_out_freely() {
        let g = graph(
            vec![action("a", "x"), action("b", "x"), action("c", "x"), action("d", "x")],
            vec![
                Edge::from_trigger("a"),
                Edge::new("a", "b"),
                Edge::new("a", "c"),
                Edge::new("a", "d"),
            ],
        );
        assert!(validate(&g).valid);
    }

    #[test]
    fn test_validate_unknown_target() {
        let g = graph(vec![action("a", "x")], vec![Edge::from_trigger("ghost")]);
        let report = validate(&g);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Edge 'to' references unknown action: ghost"]);
    }

    #[test]
    fn test_validate_unknown_source() {
        let g = graph(vec![action("a", "x")], vec![Edge::new("nobody", "a")]);
        let report = validate(&g);
        assert_eq!(
            report.errors,
            vec!["Edge 'from' references unknown source: nobody"]
        );
    }

    #[test]
    fn test_trigger_sentinel_is_not_a_valid_target() {
        let g = graph(vec![action("a", "x")], vec![Edge::new("a", "$trigger")]);
        let report = validate(&g);
        assert_eq!(
            report.errors,
            vec!["Edge 'to' references unknown action: $trigger"]
        );
    }

    #[test]
    fn test_error_order() {
        let g = graph(
            vec![
                action("loop1", "builtin:loop"),
                action("if1", "builtin:if"),
                action("loop1", "x"),
            ],
            vec![
                Edge::new("ghost", "phantom"),
                Edge::labeled("if1", "loop1", "True"),
                Edge::new("loop1", "missing"),
            ],
        );
        let report = validate(&g);
        assert_eq!(
            report.errors,
            vec![
                "Action IDs must be unique (duplicate: 'loop1')",
                "Loop action 'loop1' must have exactly 2 outgoing edges (has 1)",
                "IF action 'if1' must have exactly 2 outgoing edges (has 1)",
                "Edge 'from' references unknown source: ghost",
                "Edge 'to' references unknown action: phantom",
                "Edge 'to' references unknown action: missing",
            ]
        );
    }

    #[test]
    fn test_validate_is_idempotent() {
        let g = graph(
            vec![action("if1", "builtin:if")],
            vec![Edge::from_trigger("if1"), Edge::new("if1", "x")],
        );
        assert_eq!(validate(&g), validate(&g));
    }

    #[test]
    fn test_document_missing_fields_short_circuit() {
        let doc = parse_workflow(r#"{"actions": [{"id": "a", "kind": "builtin:if"}]}"#).unwrap();
        let report = validate_document(&doc);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["Missing 'trigger' field", "Missing 'edges' field"]
        );
    }

    #[test]
    fn test_document_null_trigger_is_missing() {
        let doc = parse_workflow(r#"{"trigger": null, "actions": [], "edges": []}"#).unwrap();
        let report = validate_document(&doc);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Missing 'trigger' field"]);
    }

    #[test]
    fn test_document_all_fields_missing() {
        let report = validate_document(&WorkflowDocument::default());
        assert_eq!(
            report.errors,
            vec![
                "Missing 'trigger' field",
                "Missing 'actions' field",
                "Missing 'edges' field"
            ]
        );
    }

    #[test]
    fn test_document_matches_graph_validation() {
        let g = graph(
            vec![action("a1", "x"), action("a1", "builtin:if")],
            vec![Edge::from_trigger("ghost")],
        );
        let doc = WorkflowDocument::from(g.clone());
        assert_eq!(validate_document(&doc), validate(&g));
    }

    #[test]
    fn test_report_serializes() {
        let report = ValidationReport::from_errors(vec!["boom".into()]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({"valid": false, "errors": ["boom"]}));
    }
}
