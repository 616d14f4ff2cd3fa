//! Action catalog: which action kinds branch.
//!
//! A branching action must have exactly two outgoing edges. Adding a new
//! branching kind means adding a variant to [`BranchingKind`] and its tag to
//! [`BranchingKind::ALL`].

/// Conditional branch action kind.
pub const IF_KIND: &str = "builtin:if";

/// Iteration action kind.
pub const LOOP_KIND: &str = "builtin:loop";

/// The closed set of action kinds that fan out to exactly two successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchingKind {
    /// `builtin:if` - "True"/"False" branches
    Conditional,
    /// `builtin:loop` - "For Each Item"/"Completed" branches
    Iteration,
}

impl BranchingKind {
    pub const ALL: [BranchingKind; 2] = [BranchingKind::Conditional, BranchingKind::Iteration];

    /// Number of outgoing edges every instance must have.
    pub const REQUIRED_EDGES: usize = 2;

    /// The action `kind` tag on the wire.
    pub fn kind(self) -> &'static str {
        match self {
            BranchingKind::Conditional => IF_KIND,
            BranchingKind::Iteration => LOOP_KIND,
        }
    }

    /// Short label used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            BranchingKind::Conditional => "IF",
            BranchingKind::Iteration => "Loop",
        }
    }

    /// Classify an action kind; `None` for ordinary actions.
    pub fn classify(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.kind() == kind)
    }
}

/// Whether actions of this kind must have exactly two outgoing edges.
pub fn is_branching_kind(kind: &str) -> bool {
    BranchingKind::classify(kind).is_some()
}
