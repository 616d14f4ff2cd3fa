//! Workflow graph type definitions.
//!
//! The serialized shape is the wire contract with the workflow-running
//! platform: `{ "trigger": {..}, "actions": [..], "edges": [..] }`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel used as an edge's `from` to mean "the trigger".
pub const TRIGGER_SENTINEL: &str = "$trigger";

/// The one trigger kind every built-in template reacts to.
pub const NEW_POST_TRIGGER: &str = "workflows/new-post";

/// Opaque input mapping carried by triggers and actions.
pub type Inputs = Map<String, Value>;

/// A complete workflow graph.
///
/// # Example JSON
///
/// ```json
/// {
///   "trigger": { "kind": "workflows/new-post", "inputs": {} },
///   "actions": [
///     { "id": "slack_1a2b3c4d", "kind": "slack_send_channel_message",
///       "name": "Send Slack Notification",
///       "inputs": { "channel": "#alerts", "message": "hi" } }
///   ],
///   "edges": [ { "from": "$trigger", "to": "slack_1a2b3c4d" } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Event that starts the workflow
    pub trigger: Trigger,

    /// Action nodes, in insertion order. Execution order comes from `edges`.
    pub actions: Vec<Action>,

    /// Directed connections between the trigger and actions
    pub edges: Vec<Edge>,
}

/// The entry-point event definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Event type tag (e.g. `workflows/new-post`)
    pub kind: String,

    #[serde(default)]
    pub inputs: Inputs,
}

/// One node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique action ID within this graph
    pub id: String,

    /// Platform action type (e.g. `http_request`, `builtin:if`)
    pub kind: String,

    /// Human-readable label
    #[serde(default)]
    pub name: String,

    /// Action-specific inputs, possibly holding deferred references
    #[serde(default)]
    pub inputs: Inputs,
}

/// A directed connection from the trigger or an action to an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// `$trigger` or an action ID
    pub from: String,

    /// Target action ID
    pub to: String,

    /// Branch label for edges leaving a branching action ("True", "Completed", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Trigger {
    /// A trigger on newly posted content, with no inputs.
    pub fn new_post() -> Self {
        Self {
            kind: NEW_POST_TRIGGER.to_string(),
            inputs: Inputs::new(),
        }
    }
}

impl Action {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        inputs: Inputs,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: name.into(),
            inputs,
        }
    }
}

impl Edge {
    /// An unlabeled edge.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            name: None,
        }
    }

    /// An edge leaving the trigger.
    pub fn from_trigger(to: impl Into<String>) -> Self {
        Self::new(TRIGGER_SENTINEL, to)
    }

    /// A labeled edge, used for the two branches of a branching action.
    pub fn labeled(from: impl Into<String>, to: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            name: Some(name.into()),
        }
    }

    /// Whether this edge starts at the trigger.
    pub fn is_from_trigger(&self) -> bool {
        self.from == TRIGGER_SENTINEL
    }
}

impl WorkflowGraph {
    /// Get an action by ID.
    pub fn get_action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Edges leaving the given action (or `$trigger`), in declaration order.
    pub fn outgoing<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == from)
    }
}

/// A workflow document read whole from an external source.
///
/// Top-level fields are optional so that a missing one is reported by the
/// validator as a defect rather than failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<Edge>>,
}

impl WorkflowDocument {
    /// Convert into a graph if every top-level field is present.
    pub fn into_graph(self) -> Option<WorkflowGraph> {
        Some(WorkflowGraph {
            trigger: self.trigger?,
            actions: self.actions?,
            edges: self.edges?,
        })
    }
}

impl From<WorkflowGraph> for WorkflowDocument {
    fn from(graph: WorkflowGraph) -> Self {
        Self {
            trigger: Some(graph.trigger),
            actions: Some(graph.actions),
            edges: Some(graph.edges),
        }
    }
}
