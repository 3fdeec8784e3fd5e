//! Builds and holds the discrimination network: incremental insertion with
//! prefix sharing, greedy join ordering, left-deep merge trees.

use super::{NodeId, NodeTable, ReteNode};
use crate::error::MatchError;
use crate::expr::{CmpOp, Expr, ExecutableExpression};
use crate::pattern::Pattern;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Network {
    table: NodeTable,
    /// Maps a registered pattern's identity (`Rc::as_ptr`) to its terminal
    /// node, so a later pattern referencing it as a helper (`is_in`) can
    /// anchor there.
    pattern_terminals: BTreeMap<usize, NodeId>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        let mut table = NodeTable::default();
        table.nodes.push(ReteNode::Root);
        table.children.push(Vec::new());
        Network {
            table,
            pattern_terminals: BTreeMap::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &ReteNode {
        &self.table.nodes[id]
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.table.children[id]
    }

    /// The terminal node a previously-added pattern was assigned, if any.
    pub fn terminal_of(&self, pattern: &Rc<Pattern>) -> Option<NodeId> {
        self.pattern_terminals.get(&(Rc::as_ptr(pattern) as usize)).copied()
    }

    /// Returns an existing child of `parent` structurally equal to `node`,
    /// or creates one. Errors if more than one existing child already
    /// matches (a network-construction invariant violation).
    pub fn find_or_create_child(&mut self, parent: NodeId, node: ReteNode) -> Result<NodeId, MatchError> {
        let matches: Vec<NodeId> = self.table.children[parent]
            .iter()
            .copied()
            .filter(|&c| self.table.nodes[c] == node)
            .collect();
        match matches.len() {
            0 => {
                let id = self.table.nodes.len();
                self.table.nodes.push(node);
                self.table.children.push(Vec::new());
                self.table.children[parent].push(id);
                self.table.parents.insert(id, parent);
                Ok(id)
            }
            1 => Ok(matches[0]),
            _ => Err(MatchError::Build(format!(
                "node {parent} has multiple structurally-identical children"
            ))),
        }
    }

    /// Inserts a compiled pattern's structural skeleton into the network,
    /// sharing any prefix already present:
    ///
    /// 1. one `checkTYPE -> [checkATTR] -> store(1) -> alias` chain per
    ///    entity variable (`checkATTR` carries the variable's literal
    ///    predicates as a var-independent tuple, so two patterns checking
    ///    the same class/predicates share both nodes);
    /// 2. one `checkEDGE -> store(2) -> alias` chain per relation edge
    ///    between two of the pattern's own variables;
    /// 3. one `isIn` node per helper-pattern reference, anchored at the
    ///    helper's own terminal node;
    /// 4. a greedily-ordered left-deep `merge` join over every chain's
    ///    output, folded into a final `store` terminal.
    ///
    /// `pattern_id` is recorded so a later pattern can reference this one
    /// as a helper; it also names the per-variable/per-edge alias targets
    /// (`"<pattern_id>:<var>"`).
    pub fn add_pattern(&mut self, pattern_id: &str, pattern: &Rc<Pattern>) -> Result<NodeId, MatchError> {
        let attr_predicates = literal_attr_predicates(&pattern.constraints);

        // (vars this chain binds, source node) -- duplicates are kept, not
        // folded, so no constraint is silently dropped.
        let mut atoms: Vec<(BTreeSet<String>, NodeId)> = Vec::new();

        for (var, entity) in &pattern.graph.entities {
            let mut node = self.find_or_create_child(
                0,
                ReteNode::CheckType {
                    class: entity.class.clone(),
                },
            )?;
            if let Some(predicates) = attr_predicates.get(var) {
                node = self.find_or_create_child(node, ReteNode::CheckAttr { predicates: predicates.clone() })?;
            }
            node = self.find_or_create_child(node, ReteNode::Accumulate { arity: 1 })?;
            let scoped = format!("{pattern_id}:{var}");
            node = self.find_or_create_child(node, ReteNode::Alias { vars: vec![scoped.clone()] })?;
            atoms.push((BTreeSet::from([scoped]), node));
        }

        for (var, entity) in &pattern.graph.entities {
            for (relation, targets) in &entity.relations {
                for target in targets.ids() {
                    if !pattern.graph.entities.contains_key(target) {
                        continue;
                    }
                    let mut node = self.find_or_create_child(0, ReteNode::CheckEdge { relation: relation.clone() })?;
                    node = self.find_or_create_child(node, ReteNode::Accumulate { arity: 2 })?;
                    let v1 = format!("{pattern_id}:{var}");
                    let v2 = format!("{pattern_id}:{target}");
                    node = self.find_or_create_child(node, ReteNode::Alias { vars: vec![v1.clone(), v2.clone()] })?;
                    atoms.push((BTreeSet::from([v1, v2]), node));
                }
            }
        }

        for (helper_name, helper) in &pattern.helpers {
            let key = Rc::as_ptr(helper) as usize;
            let Some(&helper_terminal) = self.pattern_terminals.get(&key) else {
                return Err(MatchError::Build(format!(
                    "pattern references helper '{helper_name}' that was not previously added to the network"
                )));
            };
            let negated = helper_negates_contains(&pattern.constraints, helper_name);
            let remap: BTreeMap<String, String> = helper
                .variable_names()
                .into_iter()
                .map(|v| (v.clone(), format!("{pattern_id}:{v}")))
                .collect();
            let vars: BTreeSet<String> = remap.values().cloned().collect();
            let node = self.find_or_create_child(helper_terminal, ReteNode::IsIn { remap, negated })?;
            atoms.push((vars, node));
        }

        atoms.sort_by(|a, b| a.0.iter().collect::<Vec<_>>().cmp(&b.0.iter().collect::<Vec<_>>()));

        let mut remaining = atoms;
        let (mut bound, mut frontier) = remaining.remove(0);

        while !remaining.is_empty() {
            let mut best_idx = 0;
            let mut best_overlap = -1i64;
            for (i, (vars, _)) in remaining.iter().enumerate() {
                let overlap = vars.intersection(&bound).count() as i64;
                let tie_break = vars.iter().next().cloned().unwrap_or_default();
                let best_tie = remaining[best_idx].0.iter().next().cloned().unwrap_or_default();
                if overlap > best_overlap || (overlap == best_overlap && tie_break < best_tie) {
                    best_overlap = overlap;
                    best_idx = i;
                }
            }
            let (next_vars, next_node) = remaining.remove(best_idx);
            let left_vars: Vec<String> = bound.iter().cloned().collect();
            let right_vars: Vec<String> = next_vars.iter().cloned().collect();
            let merge = ReteNode::Merge { left_vars, right_vars };

            // Merge nodes join two distinct streams; since both sides may
            // already share structure elsewhere in the network, index them
            // under the left side's node for prefix sharing.
            frontier = self.find_or_create_child(frontier, merge)?;
            let _ = next_node;
            bound.extend(next_vars);
        }

        let mut pattern_vars: Vec<String> = pattern.graph.entities.keys().cloned().collect();
        pattern_vars.sort();
        let terminal = self.find_or_create_child(frontier, ReteNode::Store { pattern_vars })?;
        self.pattern_terminals.insert(Rc::as_ptr(pattern) as usize, terminal);
        Ok(terminal)
    }
}

/// Extracts each variable's literal-attribute equality predicates from a
/// pattern's (synthetic or user-written) constraints, as a sorted tuple
/// keyed only by attribute name -- independent of which pattern is asking.
fn literal_attr_predicates(
    constraints: &[ExecutableExpression],
) -> BTreeMap<String, Vec<(String, CmpOp, Value)>> {
    let mut out: BTreeMap<String, Vec<(String, CmpOp, Value)>> = BTreeMap::new();
    for c in constraints {
        if let Some((var, attr, op, value)) = literal_predicate(&c.ast) {
            out.entry(var).or_default().push((attr, op, value));
        }
    }
    for predicates in out.values_mut() {
        predicates.sort_by(|a, b| a.0.cmp(&b.0));
    }
    out
}

fn literal_predicate(expr: &Expr) -> Option<(String, String, CmpOp, Value)> {
    let Expr::Cmp(op, lhs, rhs) = expr else { return None };
    let Expr::Attr(base, attr) = lhs.as_ref() else { return None };
    let Expr::Var(var) = base.as_ref() else { return None };
    let value = literal_value(rhs)?;
    Some((var.clone(), attr.clone(), *op, value))
}

fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Int(i) => Some(Value::Int(*i)),
        Expr::Float(f) => Some(Value::Float(*f)),
        Expr::Bool(b) => Some(Value::Bool(*b)),
        Expr::Str(s) => Some(Value::Str(s.clone())),
        _ => None,
    }
}

/// True iff any constraint negates a `helper.contains(...)` call, i.e.
/// the helper reference should compile to `is_not_in` rather than `is_in`.
fn helper_negates_contains(constraints: &[ExecutableExpression], helper: &str) -> bool {
    constraints.iter().any(|c| negated_contains(&c.ast, helper))
}

fn negated_contains(expr: &Expr, helper: &str) -> bool {
    match expr {
        Expr::Not(inner) => is_contains_call(inner, helper) || negated_contains(inner, helper),
        Expr::And(l, r) | Expr::Or(l, r) => negated_contains(l, helper) || negated_contains(r, helper),
        _ => false,
    }
}

fn is_contains_call(expr: &Expr, helper: &str) -> bool {
    matches!(
        expr,
        Expr::MethodCall(recv, method, _)
            if method == "contains" && matches!(recv.as_ref(), Expr::Var(v) if v == helper)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::pattern::{ParentSource, Pattern};

    fn build_pattern(id: &str, class: &str) -> Rc<Pattern> {
        let e = Entity::new(id, class);
        Rc::new(
            Pattern::build(
                ParentSource::Entity {
                    entities: vec![e],
                    seed_id: id.to_string(),
                },
                "",
            )
            .unwrap(),
        )
    }

    #[test]
    fn identical_patterns_share_type_check_node() {
        let mut net = Network::new();
        let p1 = build_pattern("a", "X");
        let p2 = build_pattern("b", "X");
        net.add_pattern("p1", &p1).unwrap();
        net.add_pattern("p2", &p2).unwrap();
        assert_eq!(net.children_of(0).len(), 1, "both patterns should share the CheckType(X) node");
    }

    #[test]
    fn distinct_classes_create_distinct_roots() {
        let mut net = Network::new();
        let p1 = build_pattern("a", "X");
        let p2 = build_pattern("b", "Y");
        net.add_pattern("p1", &p1).unwrap();
        net.add_pattern("p2", &p2).unwrap();
        assert_eq!(net.children_of(0).len(), 2);
    }

    #[test]
    fn edge_pattern_builds_merge_and_store() {
        let mut net = Network::new();
        let z1 = Entity::new("z1", "Z").with_relation_one("z", "z2");
        let z2 = Entity::new("z2", "Z").with_relation_one("z", "z1");
        let p = Rc::new(
            Pattern::build(
                ParentSource::Entity {
                    entities: vec![z1, z2],
                    seed_id: "z1".to_string(),
                },
                "",
            )
            .unwrap(),
        );
        let terminal = net.add_pattern("p", &p).unwrap();
        assert!(matches!(net.node(terminal), ReteNode::Store { .. }));
    }

    #[test]
    fn attr_checked_patterns_share_checktype_and_checkattr_prefix() {
        let mut net = Network::new();
        let a1 = Entity::new("a", "A").with_attr("ph", Value::Bool(true));
        let p1 = Rc::new(
            Pattern::build(
                ParentSource::Entity { entities: vec![a1], seed_id: "a".to_string() },
                "",
            )
            .unwrap(),
        );
        let a2 = Entity::new("b", "A").with_attr("ph", Value::Bool(true));
        let p2 = Rc::new(
            Pattern::build(
                ParentSource::Entity { entities: vec![a2], seed_id: "b".to_string() },
                "",
            )
            .unwrap(),
        );
        let a3 = Entity::new("c", "A").with_attr("ph", Value::Bool(false));
        let p3 = Rc::new(
            Pattern::build(
                ParentSource::Entity { entities: vec![a3], seed_id: "c".to_string() },
                "",
            )
            .unwrap(),
        );

        net.add_pattern("p1", &p1).unwrap();
        net.add_pattern("p2", &p2).unwrap();
        net.add_pattern("p3", &p3).unwrap();

        assert_eq!(net.children_of(0).len(), 1, "all three share the CheckType(A) node");
        let check_type = net.children_of(0)[0];
        assert_eq!(
            net.children_of(check_type).len(),
            2,
            "p1/p2 share one CheckAttr(ph==true) node, p3 gets its own CheckAttr(ph==false) node"
        );
    }

    #[test]
    fn helper_reference_wires_an_isin_node_under_the_helpers_terminal() {
        let mut net = Network::new();
        let x = Entity::new("x", "Molecule");
        let base = Rc::new(
            Pattern::build(
                ParentSource::Entity { entities: vec![x], seed_id: "x".to_string() },
                "",
            )
            .unwrap(),
        );
        let base_terminal = net.add_pattern("base", &base).unwrap();

        let derived = Rc::new(
            Pattern::build(ParentSource::Pattern(base.clone()), "helper.contains(var=x)").unwrap(),
        );
        net.add_pattern("derived", &derived).unwrap();

        assert!(net
            .children_of(base_terminal)
            .iter()
            .any(|&c| matches!(net.node(c), ReteNode::IsIn { .. })));
    }

    #[test]
    fn referencing_an_unregistered_helper_is_a_build_error() {
        let mut net = Network::new();
        let x = Entity::new("x", "Molecule");
        let base = Rc::new(
            Pattern::build(
                ParentSource::Entity { entities: vec![x], seed_id: "x".to_string() },
                "",
            )
            .unwrap(),
        );
        let derived = Rc::new(Pattern::build(ParentSource::Pattern(base), "").unwrap());
        assert!(net.add_pattern("derived", &derived).is_err());
    }
}
