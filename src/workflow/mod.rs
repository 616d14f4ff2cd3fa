//! Workflow graph model, parsing, and validation.
//!
//! A workflow graph consists of:
//! - Trigger: the event that starts the workflow
//! - Actions: the units of work, each with a kind and opaque inputs
//! - Edges: directed connections from the trigger or an action to an action

mod catalog;
mod ids;
mod parser;
pub mod reference;
mod types;
mod validator;

pub use catalog::{is_branching_kind, BranchingKind, IF_KIND, LOOP_KIND};
pub use ids::new_action_id;
pub use parser::{
    is_yaml_path, parse_workflow, parse_workflow_file, parse_workflow_yaml, to_json, to_yaml,
};
pub use types::*;
pub use validator::{validate, validate_document, ValidationReport};
