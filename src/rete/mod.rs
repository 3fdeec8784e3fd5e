//! Incremental discrimination network (Rete-style) over compiled patterns.

pub mod network;

pub use network::Network;

use std::collections::BTreeMap;

/// The node taxonomy making up the network.
///
/// `CheckAttr` and `CheckEdge` carry no variable identity: two patterns
/// checking the same class/attribute predicate or the same relation share
/// the node regardless of what they locally call the variable. A
/// variable only becomes pattern-specific at the `Alias` step, where it
/// is given its `"<patternId>:v"` name.
#[derive(Debug, Clone, PartialEq)]
pub enum ReteNode {
    Root,
    /// Filters entities by class.
    CheckType { class: String },
    /// Filters entities whose literal attributes match a sorted tuple of
    /// `(attr, op, value)` predicates.
    CheckAttr {
        predicates: Vec<(String, crate::expr::CmpOp, crate::value::Value)>,
    },
    /// Filters on the presence of a named relation between two entities.
    CheckEdge { relation: String },
    /// Generic intermediate accumulation node between a check chain and
    /// its alias: `arity` is 1 for a per-variable chain, 2 for a per-edge
    /// chain.
    Accumulate { arity: usize },
    /// Terminal node recording a fully-bound match for a compiled pattern.
    Store { pattern_vars: Vec<String> },
    /// Assigns the pattern-scoped name(s) a token carries past this point
    /// (one name for a variable chain, two for an edge chain).
    Alias { vars: Vec<String> },
    /// Joins two partial-binding streams on their shared variables.
    Merge {
        left_vars: Vec<String>,
        right_vars: Vec<String>,
    },
    /// Cross-pattern containment (`helper.contains(...)`): anchored at the
    /// referenced helper pattern's own terminal node, remapping the
    /// helper's local variable names onto this pattern's.
    IsIn {
        remap: BTreeMap<String, String>,
        negated: bool,
    },
}

pub type NodeId = usize;

#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    pub nodes: Vec<ReteNode>,
    pub children: Vec<Vec<NodeId>>,
    pub parents: BTreeMap<NodeId, NodeId>,
}
